//! Adapters: configuration providers.

pub mod config;

pub use config::{ConfigError, StaticConfigProvider, TomlConfigProvider};
