use serde::{Deserialize, Serialize};

/// Faults raised by a [`WifiBackend`](crate::wifi::platform::WifiBackend).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Generic failure reported by the radio subsystem
    #[error("{message}")]
    Backend { message: String },

    /// No wireless interface is present
    #[error("No wireless interface found")]
    NoInterface,

    /// The subsystem refused to service the request right now
    #[error("WiFi service unavailable: {0}")]
    Unavailable(String),
}

impl DeviceError {
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// Reasons a run stops before reaching a terminal state on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    #[error("target network not present in scan results")]
    NotFound,

    #[error("scan request rejected and target network never appeared")]
    ScanFailed,

    #[error("device rejected the new network profile")]
    AddRejected,

    #[error(transparent)]
    Interrupted(#[from] RunError),
}

impl From<DeviceError> for ProvisionError {
    fn from(err: DeviceError) -> Self {
        ProvisionError::Interrupted(RunError::Device(err))
    }
}

/// Terminal failure of a check. `Display` yields the reason string handed to
/// [`CheckerHandler::on_failure`](crate::checker::CheckerHandler::on_failure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FailureReason {
    #[error("Wrong WiFi network")]
    UserDeclined,

    #[error("Un-able to enable to WiFi")]
    RadioEnableTimeout,

    #[error("WiFi network not found")]
    ProfileNotFound,

    #[error("wifi scan fail")]
    ScanTriggerFailed,

    #[error("Failed to add the WiFi configure")]
    ProfileAddRejected,

    #[error("Failed to enable network")]
    ProfileEnableRejected,

    #[error("WiFi connection timed out")]
    AssociationTimeout,

    #[error("exception: {0}")]
    UnexpectedFault(String),
}

impl FailureReason {
    pub fn fault<S: Into<String>>(detail: S) -> Self {
        Self::UnexpectedFault(detail.into())
    }
}

impl From<DeviceError> for FailureReason {
    fn from(err: DeviceError) -> Self {
        FailureReason::UnexpectedFault(err.to_string())
    }
}
