pub mod checker;
pub mod error;
pub mod wifi;

pub use checker::{
    CheckerHandler, CheckerSession, CheckerState, ReconnectionPolicy, RetryPolicy, StateChange,
};
pub use error::{DeviceError, FailureReason, ProvisionError, Result, RunError};
pub use wifi::platform::WifiBackend;
pub use wifi::{ConnectionSnapshot, Outcome, ScanEntry, StoredProfile, TargetProfile};
