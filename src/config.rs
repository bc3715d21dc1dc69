//! Top-level configuration.
//!
//! Settings come from an optional JSON file; command line flags are applied
//! on top by the binary.

use crate::error::Result;
use crate::patch::PatchConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "transpatch.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub patch: PatchConfig,
    /// Remove the patched copy when a run fails
    pub cleanup: bool,
    /// Translation dictionary used when none is passed on the command line
    pub dictionary: Option<String>,
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let cfg: AppConfig = serde_json::from_str(&text)?;
                debug!(path = %path.display(), "Config loaded");
                Ok(cfg)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Config not found, using CLI options only");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
