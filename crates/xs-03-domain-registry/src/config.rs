//! Configuration for the domain layer.

use serde::{Deserialize, Serialize};
use shared_types::DomainId;
use xs_02_write_rate_limit::WrlConfig;

/// Default home prefix of domain paths.
pub const DEFAULT_DOMAIN_PATH_PREFIX: &str = "/local/domain";

/// Registry configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Domain hosting the store's bootstrap page.
    pub master_domid: DomainId,
    /// Domain that inherits nodes of departed owners; exempt from quotas.
    pub priv_domid: DomainId,
    /// Prefix of every domain's home path.
    pub domain_path_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            master_domid: DomainId::CONTROL,
            priv_domid: DomainId::CONTROL,
            domain_path_prefix: DEFAULT_DOMAIN_PATH_PREFIX.to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.domain_path_prefix.starts_with('/') {
            return Err(format!(
                "domain_path_prefix must be absolute, got {:?}",
                self.domain_path_prefix
            ));
        }
        if self.domain_path_prefix.len() > 1 && self.domain_path_prefix.ends_with('/') {
            return Err("domain_path_prefix must not end with '/'".to_string());
        }
        Ok(())
    }
}

/// Complete domain layer configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainLayerConfig {
    pub wrl: WrlConfig,
    pub registry: RegistryConfig,
}

impl DomainLayerConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.wrl.validate()?;
        self.registry.validate()
    }
}
