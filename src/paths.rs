//! Centralized path resolution for zenith's on-disk files.

fn home() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".into())
}

/// Resolve the zenith database path.
/// Checks `ZENITH_DB` env var, falls back to `$HOME/.zenith/zenith.db`.
pub fn db_path() -> String {
    std::env::var("ZENITH_DB").unwrap_or_else(|_| format!("{}/.zenith/zenith.db", home()))
}

/// Resolve the config file path.
/// Checks `ZENITH_CONFIG` env var, falls back to `$HOME/.zenith/config.toml`.
pub fn config_path() -> String {
    std::env::var("ZENITH_CONFIG").unwrap_or_else(|_| format!("{}/.zenith/config.toml", home()))
}
