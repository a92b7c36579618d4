pub mod platform;

use serde::{Deserialize, Serialize};

use crate::error::FailureReason;

/// Handle the radio subsystem assigns to a stored network profile.
pub type ProfileId = i32;

/// Id carried by a profile that has not been committed to the device yet.
pub const UNASSIGNED_PROFILE_ID: ProfileId = -1;

/// The network a check should end up associated with.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Absent means any network is acceptable.
    pub name: Option<String>,
    /// Only used when a new profile has to be provisioned.
    pub secret: Option<String>,
}

impl TargetProfile {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: Some(name.into()),
            secret: None,
        }
    }

    pub fn with_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// A target that accepts whatever network the device is on.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn secret(&self) -> &str {
        self.secret.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub network_name: Option<String>,
    pub ip_assigned: bool,
    pub auth_completed: bool,
    pub radio_enabled: bool,
}

impl ConnectionSnapshot {
    /// Snapshot of a fully established association.
    pub fn associated<S: Into<String>>(network_name: S) -> Self {
        Self {
            network_name: Some(network_name.into()),
            ip_assigned: true,
            auth_completed: true,
            radio_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub name: String,
    /// Raw capability string as advertised, e.g. `[WPA2-PSK-CCMP][ESS]`.
    pub capabilities: String,
}

impl ScanEntry {
    pub fn new<N: Into<String>, C: Into<String>>(name: N, capabilities: C) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum SecurityMode {
    Wep,
    Psk,
    Eap,
    Open,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Protocol {
    Rsn,
    Wpa,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cipher {
    Wep40,
    Tkip,
    Ccmp,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum AuthParams {
    /// No key management
    #[default]
    Open,
    /// Shared WEP key
    Wep {
        key: String,
        tx_key_index: u8,
        group_ciphers: Vec<Cipher>,
    },
    /// WPA/WPA2 pre-shared key
    Wpa {
        pre_shared_key: String,
        hidden: bool,
        protocols: Vec<Protocol>,
        group_ciphers: Vec<Cipher>,
        pairwise_ciphers: Vec<Cipher>,
    },
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub id: ProfileId,
    pub name: String,
    /// Higher is preferred.
    pub priority: i32,
    pub auth: AuthParams,
    pub enabled: bool,
}

impl StoredProfile {
    pub fn is_committed(&self) -> bool {
        self.id != UNASSIGNED_PROFILE_ID
    }
}

/// Terminal result of one check.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }
}
