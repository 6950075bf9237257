use serde::Deserialize;

/// Intervals for the background maintenance loops: health probing, session
/// expiry, and dynamic priority rescaling.
#[derive(Debug, Deserialize, Clone)]
pub struct MaintenanceConfig {
    /// How often the health loop probes back-ends. Default: 5s.
    #[serde(default = "default_alive_secs")]
    pub alive_secs: u64,
    /// Connect timeout used by the health loop's probes. Default: 2s.
    #[serde(default = "default_health_connect_secs")]
    pub health_connect_secs: u64,
    /// How often the expiry loop sweeps session tables. Default: 30s.
    #[serde(default = "default_expire_secs")]
    pub expire_secs: u64,
    /// How often the rescale loop re-weighs back-end priorities. Default: 60s.
    #[serde(default = "default_rescale_secs")]
    pub rescale_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            alive_secs: default_alive_secs(),
            health_connect_secs: default_health_connect_secs(),
            expire_secs: default_expire_secs(),
            rescale_secs: default_rescale_secs(),
        }
    }
}

fn default_alive_secs() -> u64 {
    5
}

fn default_health_connect_secs() -> u64 {
    2
}

fn default_expire_secs() -> u64 {
    30
}

fn default_rescale_secs() -> u64 {
    60
}
