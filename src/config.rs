//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::WEBMASTER_ROLE;
use crate::error::{PermtreeError, Result};
use crate::permission::PermissionDefinitions;

/// Settings shared by the gate, resolver and bootstrap.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the protected super-user role kept alive by bootstrap
    pub webmaster_role: String,
    /// Known components and the actions each accepts
    pub definitions: PermissionDefinitions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            webmaster_role: WEBMASTER_ROLE.to_string(),
            definitions: PermissionDefinitions::default(),
        }
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| PermtreeError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| PermtreeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&s)
    }
}
