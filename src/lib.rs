pub mod affirmation;
pub mod config;
pub mod db;
pub mod export;
pub mod filter;
pub mod insight;
pub mod model;
pub mod output;
pub mod paths;
pub mod progress;
pub mod reminder;
pub mod store;
pub mod streak;
pub mod validate;
pub mod watch;
