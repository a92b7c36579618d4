use std::error::Error;
use std::path::PathBuf;
use std::{env, fs, io};

use serde::{Deserialize, Serialize};
use wifiguard_core::checker::RetryPolicy;
use wifiguard_core::wifi::TargetProfile;

/// Environment variable naming a TOML file that replaces the bundled config.
pub const CONFIG_ENV: &str = "WIFIGUARD_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consent {
    /// Answer given to every reconnection prompt.
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub capabilities: String,
    #[serde(default)]
    pub secret: Option<String>,
    /// Whether the radio starts out with a stored profile for this network.
    #[serde(default)]
    pub remembered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Radio {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub connected_to: Option<String>,
    #[serde(default)]
    pub enable_delay_ms: u64,
    #[serde(default)]
    pub scan_delay_ms: u64,
    #[serde(default)]
    pub association_delay_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
    #[serde(default)]
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub target: TargetProfile,
    pub consent: Consent,
    #[serde(default)]
    pub checker: RetryPolicy,
    pub radio: Radio,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        match env::var(CONFIG_ENV) {
            Ok(path) => {
                let path = Self::normalize_path(&path)?;
                tracing::debug!("Loading settings from {}", path.display());
                Self::from_toml(&fs::read_to_string(path)?)
            }
            Err(_) => Self::from_toml(include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../",
                "configs/default.toml"
            ))),
        }
    }

    pub fn from_toml(source: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(source)?)
    }

    fn normalize_path(path: &str) -> io::Result<PathBuf> {
        let path_buf = PathBuf::from(path);

        Ok(if path_buf.is_absolute() {
            path_buf
        } else {
            env::current_dir()?.join(path_buf)
        })
    }
}
