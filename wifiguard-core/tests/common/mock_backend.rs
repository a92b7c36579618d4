use std::sync::{Arc, Mutex};

use wifiguard_core::error::{DeviceError, Result};
use wifiguard_core::wifi::platform::WifiBackend;
use wifiguard_core::wifi::{
    AuthParams, ConnectionSnapshot, ProfileId, ScanEntry, StoredProfile, UNASSIGNED_PROFILE_ID,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Snapshot,
    IsRadioEnabled,
    SetRadioEnabled(bool),
    ListProfiles,
    UpdateProfile(StoredProfile),
    AddProfile(StoredProfile),
    EnableProfile(ProfileId, bool),
    Reconnect,
    StartScan,
    ScanResults,
}

/// Scripted radio behaviour. Counters are 1-based call numbers.
#[derive(Debug, Clone)]
pub struct Script {
    pub snapshot: ConnectionSnapshot,
    /// Snapshot reported from the n-th poll after `reconnect` onwards.
    pub after_reconnect: Option<(u32, ConnectionSnapshot)>,
    pub radio_enabled: bool,
    /// Radio reports enabled on the n-th `is_radio_enabled` call after the
    /// enable request. `None` keeps it off forever.
    pub radio_enables_on: Option<u32>,
    pub profiles: Vec<StoredProfile>,
    pub scan_accepted: bool,
    pub scan_results: Vec<ScanEntry>,
    /// Results appear on the n-th `scan_results` call. `None` keeps them
    /// empty forever.
    pub scan_results_on: Option<u32>,
    pub add_profile_id: ProfileId,
    pub enable_accepted: bool,
    /// The n-th `connection_snapshot` call fails.
    pub snapshot_fault_on: Option<u32>,
}

impl Script {
    /// Device on `current` with the radio on, that associates with `target`
    /// on the first poll after reconnecting.
    pub fn on_network(current: &str, target: &str) -> Self {
        Self {
            snapshot: ConnectionSnapshot::associated(current),
            after_reconnect: Some((1, ConnectionSnapshot::associated(target))),
            radio_enabled: true,
            radio_enables_on: Some(1),
            profiles: Vec::new(),
            scan_accepted: true,
            scan_results: Vec::new(),
            scan_results_on: Some(1),
            add_profile_id: 42,
            enable_accepted: true,
            snapshot_fault_on: None,
        }
    }
}

#[derive(Debug)]
struct MockState {
    script: Script,
    calls: Vec<Call>,
    snapshot_calls: u32,
    radio_polls: u32,
    scan_polls: u32,
    polls_since_reconnect: Option<u32>,
}

pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                script,
                calls: Vec::new(),
                snapshot_calls: 0,
                radio_polls: 0,
                scan_polls: 0,
                polls_since_reconnect: None,
            }),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn profiles(&self) -> Vec<StoredProfile> {
        self.state.lock().unwrap().script.profiles.clone()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

pub fn profile(id: ProfileId, name: &str, priority: i32) -> StoredProfile {
    StoredProfile {
        id,
        name: name.to_string(),
        priority,
        auth: AuthParams::Open,
        enabled: true,
    }
}

#[async_trait::async_trait]
impl WifiBackend for MockBackend {
    async fn connection_snapshot(&self) -> Result<ConnectionSnapshot> {
        let mut state = self.record(Call::Snapshot);
        state.snapshot_calls += 1;

        if state.script.snapshot_fault_on == Some(state.snapshot_calls) {
            return Err(DeviceError::backend("supplicant connection lost"));
        }

        if let Some(polls) = state.polls_since_reconnect.as_mut() {
            *polls += 1;
            let polls = *polls;
            if let Some((on, snapshot)) = &state.script.after_reconnect {
                if polls >= *on {
                    return Ok(snapshot.clone());
                }
            }
        }

        let mut snapshot = state.script.snapshot.clone();
        snapshot.radio_enabled = state.script.radio_enabled;
        Ok(snapshot)
    }

    async fn is_radio_enabled(&self) -> Result<bool> {
        let mut state = self.record(Call::IsRadioEnabled);
        state.radio_polls += 1;

        if let Some(on) = state.script.radio_enables_on {
            if state.radio_polls >= on {
                state.script.radio_enabled = true;
            }
        }
        Ok(state.script.radio_enabled)
    }

    async fn set_radio_enabled(&self, enabled: bool) -> Result<()> {
        let _state = self.record(Call::SetRadioEnabled(enabled));
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<StoredProfile>> {
        let state = self.record(Call::ListProfiles);
        Ok(state.script.profiles.clone())
    }

    async fn update_profile(&self, profile: &StoredProfile) -> Result<()> {
        let mut state = self.record(Call::UpdateProfile(profile.clone()));
        if let Some(stored) = state
            .script
            .profiles
            .iter_mut()
            .find(|stored| stored.id == profile.id)
        {
            *stored = profile.clone();
        }
        Ok(())
    }

    async fn add_profile(&self, profile: &StoredProfile) -> Result<ProfileId> {
        let mut state = self.record(Call::AddProfile(profile.clone()));
        let id = state.script.add_profile_id;
        if id != UNASSIGNED_PROFILE_ID {
            state.script.profiles.push(StoredProfile {
                id,
                ..profile.clone()
            });
        }
        Ok(id)
    }

    async fn enable_profile(&self, id: ProfileId, exclusive: bool) -> Result<bool> {
        let state = self.record(Call::EnableProfile(id, exclusive));
        Ok(state.script.enable_accepted)
    }

    async fn reconnect(&self) -> Result<()> {
        let mut state = self.record(Call::Reconnect);
        state.polls_since_reconnect = Some(0);
        Ok(())
    }

    async fn start_scan(&self) -> Result<bool> {
        let state = self.record(Call::StartScan);
        Ok(state.script.scan_accepted)
    }

    async fn scan_results(&self) -> Result<Vec<ScanEntry>> {
        let mut state = self.record(Call::ScanResults);
        state.scan_polls += 1;

        match state.script.scan_results_on {
            Some(on) if state.scan_polls >= on => Ok(state.script.scan_results.clone()),
            _ => Ok(Vec::new()),
        }
    }
}
