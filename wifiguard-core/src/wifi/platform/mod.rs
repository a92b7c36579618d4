use crate::error::Result;

pub use super::*;

/// Capability interface over the host's radio management subsystem.
///
/// Implementations own the radio; the checker only issues requests and reads
/// back reported state. Every call may fail with a
/// [`DeviceError`](crate::error::DeviceError), which ends the current check.
#[async_trait::async_trait]
pub trait WifiBackend: Send + Sync {
    /// Current association as seen by the supplicant
    async fn connection_snapshot(&self) -> Result<ConnectionSnapshot>;

    async fn is_radio_enabled(&self) -> Result<bool>;

    async fn set_radio_enabled(&self, enabled: bool) -> Result<()>;

    /// Saved profiles on the device
    async fn list_profiles(&self) -> Result<Vec<StoredProfile>>;

    async fn update_profile(&self, profile: &StoredProfile) -> Result<()>;

    /// Commit a new profile, returning its id or
    /// [`UNASSIGNED_PROFILE_ID`] when the device rejects it
    async fn add_profile(&self, profile: &StoredProfile) -> Result<ProfileId>;

    /// Enable a stored profile; `exclusive` disables every other profile
    async fn enable_profile(&self, id: ProfileId, exclusive: bool) -> Result<bool>;

    async fn reconnect(&self) -> Result<()>;

    /// Ask the radio for a fresh scan. Results arrive asynchronously.
    async fn start_scan(&self) -> Result<bool>;

    /// Latest scan results, possibly empty while a scan is in progress
    async fn scan_results(&self) -> Result<Vec<ScanEntry>>;
}
