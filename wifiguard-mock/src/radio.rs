use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, info};
use wifiguard_core::checker::classify;
use wifiguard_core::checker::provision::build_profile;
use wifiguard_core::error::{DeviceError, Result};
use wifiguard_core::wifi::platform::WifiBackend;
use wifiguard_core::wifi::{
    AuthParams, ConnectionSnapshot, ProfileId, ScanEntry, StoredProfile, UNASSIGNED_PROFILE_ID,
};

use crate::settings::{Network, Radio};

#[derive(Debug)]
struct Association {
    profile: ProfileId,
    ready_at: Instant,
}

#[derive(Debug)]
struct RadioState {
    enabled: bool,
    enabling_until: Option<Instant>,
    profiles: Vec<StoredProfile>,
    next_id: ProfileId,
    scan_ready_at: Option<Instant>,
    scan_cache: Vec<ScanEntry>,
    pending: Option<Association>,
    associated: Option<String>,
}

impl RadioState {
    fn is_enabled(&mut self, now: Instant) -> bool {
        if let Some(until) = self.enabling_until {
            if now >= until {
                self.enabled = true;
                self.enabling_until = None;
            }
        }
        self.enabled
    }
}

/// In-memory radio that answers like a real supplicant, only slower or
/// faster depending on its settings.
pub struct SimulatedRadio {
    settings: Radio,
    state: Mutex<RadioState>,
}

impl SimulatedRadio {
    pub fn new(settings: Radio) -> Self {
        let profiles: Vec<StoredProfile> = settings
            .networks
            .iter()
            .filter(|network| network.remembered)
            .enumerate()
            .map(|(index, network)| {
                let mut profile = build_profile(
                    &network.name,
                    network.secret.as_deref().unwrap_or_default(),
                    classify(&network.capabilities),
                );
                profile.id = index as ProfileId;
                profile.priority = index as i32;
                profile
            })
            .collect();

        let state = RadioState {
            enabled: settings.enabled,
            enabling_until: None,
            next_id: profiles.len() as ProfileId,
            profiles,
            scan_ready_at: None,
            scan_cache: Vec::new(),
            pending: None,
            associated: settings
                .connected_to
                .clone()
                .filter(|_| settings.enabled),
        };

        Self {
            settings,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, RadioState>> {
        self.state
            .lock()
            .map_err(|_| DeviceError::unavailable("radio state poisoned"))
    }

    fn delay(&self, base_ms: u64) -> Duration {
        let jitter = match self.settings.jitter_ms {
            0 => 0,
            jitter_ms => rand::rng().random_range(0..=jitter_ms),
        };
        Duration::from_millis(base_ms + jitter)
    }

    fn network(&self, name: &str) -> Option<&Network> {
        self.settings
            .networks
            .iter()
            .find(|network| network.name == name)
    }

    fn accepts(&self, profile: &StoredProfile) -> bool {
        let Some(network) = self.network(&profile.name) else {
            return false;
        };
        let expected = network.secret.as_deref();

        match &profile.auth {
            AuthParams::Open => expected.is_none(),
            AuthParams::Wep { key, .. } => expected == Some(key.as_str()),
            AuthParams::Wpa { pre_shared_key, .. } => expected == Some(pre_shared_key.as_str()),
        }
    }

    /// Settle an association attempt whose latency has elapsed.
    fn settle(&self, state: &mut RadioState, now: Instant) {
        let Some(pending) = state.pending.as_ref() else {
            return;
        };
        if now < pending.ready_at {
            return;
        }

        let profile = state
            .profiles
            .iter()
            .find(|profile| profile.id == pending.profile);
        state.associated = match profile {
            Some(profile) if self.accepts(profile) => {
                info!("Simulated radio associated with {}", profile.name);
                Some(profile.name.clone())
            }
            Some(profile) => {
                info!("Simulated radio failed to authenticate with {}", profile.name);
                None
            }
            None => None,
        };
        state.pending = None;
    }
}

#[async_trait::async_trait]
impl WifiBackend for SimulatedRadio {
    async fn connection_snapshot(&self) -> Result<ConnectionSnapshot> {
        let now = Instant::now();
        let mut state = self.lock()?;
        self.settle(&mut state, now);

        let radio_enabled = state.is_enabled(now);
        let associated = state.associated.is_some() && radio_enabled;

        Ok(ConnectionSnapshot {
            network_name: state.associated.clone().filter(|_| radio_enabled),
            ip_assigned: associated,
            auth_completed: associated,
            radio_enabled,
        })
    }

    async fn is_radio_enabled(&self) -> Result<bool> {
        let now = Instant::now();
        Ok(self.lock()?.is_enabled(now))
    }

    async fn set_radio_enabled(&self, enabled: bool) -> Result<()> {
        let now = Instant::now();
        let mut state = self.lock()?;

        if enabled {
            if !state.is_enabled(now) && state.enabling_until.is_none() {
                let delay = self.delay(self.settings.enable_delay_ms);
                debug!("Simulated radio powering up in {:?}", delay);
                state.enabling_until = Some(now + delay);
            }
        } else {
            state.enabled = false;
            state.enabling_until = None;
            state.pending = None;
            state.associated = None;
        }
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<StoredProfile>> {
        Ok(self.lock()?.profiles.clone())
    }

    async fn update_profile(&self, profile: &StoredProfile) -> Result<()> {
        let mut state = self.lock()?;
        let stored = state
            .profiles
            .iter_mut()
            .find(|stored| stored.id == profile.id)
            .ok_or_else(|| DeviceError::backend(format!("Unknown profile {}", profile.id)))?;

        *stored = profile.clone();
        Ok(())
    }

    async fn add_profile(&self, profile: &StoredProfile) -> Result<ProfileId> {
        if profile.name.is_empty() {
            return Ok(UNASSIGNED_PROFILE_ID);
        }

        let mut state = self.lock()?;
        let id = state.next_id;
        state.next_id += 1;
        state.profiles.push(StoredProfile {
            id,
            ..profile.clone()
        });

        debug!("Simulated radio stored profile {} for {}", id, profile.name);
        Ok(id)
    }

    async fn enable_profile(&self, id: ProfileId, exclusive: bool) -> Result<bool> {
        let now = Instant::now();
        let mut state = self.lock()?;
        if !state.is_enabled(now) || !state.profiles.iter().any(|profile| profile.id == id) {
            return Ok(false);
        }

        for profile in state.profiles.iter_mut() {
            if profile.id == id {
                profile.enabled = true;
            } else if exclusive {
                profile.enabled = false;
            }
        }
        Ok(true)
    }

    async fn reconnect(&self) -> Result<()> {
        let now = Instant::now();
        let mut state = self.lock()?;
        if !state.is_enabled(now) {
            return Err(DeviceError::unavailable("radio is off"));
        }

        let candidate = state
            .profiles
            .iter()
            .filter(|profile| profile.enabled)
            .max_by_key(|profile| profile.priority)
            .map(|profile| profile.id);

        state.associated = None;
        state.pending = candidate.map(|profile| Association {
            profile,
            ready_at: now + self.delay(self.settings.association_delay_ms),
        });
        Ok(())
    }

    async fn start_scan(&self) -> Result<bool> {
        let now = Instant::now();
        let mut state = self.lock()?;
        if !state.is_enabled(now) {
            return Ok(false);
        }

        state.scan_ready_at = Some(now + self.delay(self.settings.scan_delay_ms));
        Ok(true)
    }

    async fn scan_results(&self) -> Result<Vec<ScanEntry>> {
        let now = Instant::now();
        let mut state = self.lock()?;

        if state.scan_ready_at.is_some_and(|ready_at| now >= ready_at) {
            state.scan_cache = self
                .settings
                .networks
                .iter()
                .map(|network| ScanEntry::new(&network.name, &network.capabilities))
                .collect();
            state.scan_ready_at = None;
        }
        Ok(state.scan_cache.clone())
    }
}
