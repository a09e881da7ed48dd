use serde_json::Value;

use crate::error::ConfigError;

/// Default devcontainer definition shipped with the binary.
pub const TEMPLATE: &str = include_str!("../assets/devcontainer.json");

pub fn load_template() -> Result<Value, ConfigError> {
    serde_json::from_str(TEMPLATE).map_err(ConfigError::Template)
}
