use serde::Deserialize;

/// Configuration for the operator control channel.
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    /// Path of the Unix domain socket the control server listens on.
    /// If omitted, the control server is not started.
    pub socket_path: Option<String>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { socket_path: None }
    }
}
