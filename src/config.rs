use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::model::Priority;
use crate::paths;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: TaskDefaults,
}

/// Values filled into new tasks when the command line leaves them out.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TaskDefaults {
    pub estimated_duration: u32,
    pub break_duration: u32,
    pub priority: Priority,
    pub reminder_minutes: u32,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            estimated_duration: 25,
            break_duration: 5,
            priority: Priority::Medium,
            reminder_minutes: 0,
        }
    }
}

impl Config {
    /// Load config from `ZENITH_CONFIG` or `~/.zenith/config.toml`.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(&paths::config_path()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.defaults.estimated_duration == 0 {
            bail!(
                "failed to parse {}: defaults.estimated_duration must be positive",
                path.display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(toml: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(toml.as_bytes()).unwrap();
        f
    }

    #[test]
    fn missing_file_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.defaults.estimated_duration, 25);
        assert_eq!(config.defaults.break_duration, 5);
        assert_eq!(config.defaults.priority, Priority::Medium);
        assert_eq!(config.defaults.reminder_minutes, 0);
    }

    #[test]
    fn parse_full_config() {
        let f = write_config(
            r#"
[defaults]
estimated_duration = 50
break_duration = 10
priority = "high"
reminder_minutes = 15
"#,
        );
        let config = Config::load_from(f.path()).unwrap();
        assert_eq!(config.defaults.estimated_duration, 50);
        assert_eq!(config.defaults.break_duration, 10);
        assert_eq!(config.defaults.priority, Priority::High);
        assert_eq!(config.defaults.reminder_minutes, 15);
    }

    #[test]
    fn parse_partial_config() {
        let f = write_config("[defaults]\npriority = \"low\"\n");
        let config = Config::load_from(f.path()).unwrap();
        assert_eq!(config.defaults.priority, Priority::Low);
        assert_eq!(config.defaults.estimated_duration, 25);
    }

    #[test]
    fn unknown_field_rejected() {
        let f = write_config("[defaults]\ncolour = \"blue\"\n");
        let err = Config::load_from(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[test]
    fn zero_duration_rejected() {
        let f = write_config("[defaults]\nestimated_duration = 0\n");
        assert!(Config::load_from(f.path()).is_err());
    }
}
