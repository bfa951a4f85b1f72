//! Configuration for Write Rate Limiting
//!
//! Credits are fixed point with `WRL_FACTOR` units per write.

use serde::{Deserialize, Serialize};

/// Fixed-point scale: one write costs this many credit units by default.
pub const WRL_FACTOR: i64 = 1000;
/// Writes per second a lone domain may sustain.
pub const WRL_RATE: i64 = 200;
/// Writes a domain may save up.
pub const WRL_DBURST: i64 = 10;
/// Writes the reserve may save up.
pub const WRL_GBURST: i64 = 1000;
/// New domains the reserve may pre-pay for.
pub const WRL_NEWDOMS: i64 = 5;
/// Seconds of quiet before "not in force" is logged.
pub const WRL_LOGEVERY: u64 = 120;
/// Saturation point for any credit value.
pub const WRL_CREDIT_MAX: i64 = 1000 * 1000 * 1000;

/// Write rate limit configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrlConfig {
    /// Credit charged per committed write.
    pub write_cost: i64,
    /// Credit accrued per second, shared among all live domains.
    pub rate: i64,
    /// Per-domain credit ceiling.
    pub domain_burst: i64,
    /// Reserve ceiling.
    pub global_burst: i64,
    /// How far below zero the reserve may go to seed new domains.
    pub new_domains_burst: i64,
    /// Log suppression window in seconds.
    pub log_every_secs: u64,
    /// Saturation point for accrual.
    pub credit_max: i64,
}

impl Default for WrlConfig {
    fn default() -> Self {
        Self {
            write_cost: WRL_FACTOR,
            rate: WRL_RATE * WRL_FACTOR,
            domain_burst: WRL_DBURST * WRL_FACTOR,
            global_burst: WRL_GBURST * WRL_FACTOR,
            new_domains_burst: WRL_DBURST * WRL_NEWDOMS * WRL_FACTOR,
            log_every_secs: WRL_LOGEVERY,
            credit_max: WRL_CREDIT_MAX,
        }
    }
}

impl WrlConfig {
    /// Reject settings that would make the arithmetic meaningless.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate <= 0 {
            return Err(format!("rate must be positive, got {}", self.rate));
        }
        if self.write_cost < 0 {
            return Err(format!("write_cost must not be negative, got {}", self.write_cost));
        }
        if self.domain_burst < 0 || self.global_burst < 0 || self.new_domains_burst < 0 {
            return Err("burst limits must not be negative".to_string());
        }
        if self.domain_burst > self.credit_max || self.global_burst > self.credit_max {
            return Err("burst limits exceed credit_max".to_string());
        }
        Ok(())
    }
}
