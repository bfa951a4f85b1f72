use crate::config::DomainLayerConfig;
use crate::ports::ConfigProvider;
use std::fs;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Static configuration provider.
///
/// Useful for testing and development. For deployments, use
/// `TomlConfigProvider`.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: DomainLayerConfig,
}

impl StaticConfigProvider {
    /// Create with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with the given config.
    #[must_use]
    pub fn with_config(mut self, config: DomainLayerConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn domain_layer_config(&self) -> DomainLayerConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Config file loading
// ============================================================================

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read {path}: {error}")]
    Io { path: String, error: String },

    /// TOML parsing error.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Parsed values are inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration loaded from a TOML file with `[wrl]` and `[registry]`
/// tables. Missing tables and keys keep their defaults.
///
/// ```toml
/// [wrl]
/// rate = 100000
///
/// [registry]
/// priv_domid = 1
/// ```
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    config: DomainLayerConfig,
}

impl TomlConfigProvider {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: DomainLayerConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate().map_err(ConfigError::Invalid)?;

        tracing::debug!(
            rate = config.wrl.rate,
            priv_domid = %config.registry.priv_domid,
            "Loaded domain layer config"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &DomainLayerConfig {
        &self.config
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn domain_layer_config(&self) -> DomainLayerConfig {
        self.config.clone()
    }
}
