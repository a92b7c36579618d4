use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::checker::poll::PollPolicy;
use crate::checker::security::classify;
use crate::error::ProvisionError;
use crate::wifi::platform::WifiBackend;
use crate::wifi::{
    AuthParams, Cipher, ProfileId, Protocol, SecurityMode, StoredProfile, TargetProfile,
    UNASSIGNED_PROFILE_ID,
};

/// Makes sure the device holds a usable profile for the target network.
pub struct NetworkProvisioner<'a> {
    backend: &'a dyn WifiBackend,
    scan_poll: PollPolicy,
    cancel: &'a CancellationToken,
}

impl<'a> NetworkProvisioner<'a> {
    pub fn new(
        backend: &'a dyn WifiBackend,
        scan_poll: PollPolicy,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            backend,
            scan_poll,
            cancel,
        }
    }

    /// Resolve the target to a profile id, reusing an `existing` profile when
    /// one matches and provisioning a new one from scan results otherwise.
    pub async fn ensure_profile(
        &self,
        target: &TargetProfile,
        existing: &[StoredProfile],
    ) -> Result<ProfileId, ProvisionError> {
        let Some(name) = target.name() else {
            return Err(ProvisionError::NotFound);
        };

        let max_priority = existing.iter().map(|profile| profile.priority).max();

        match existing.iter().find(|profile| profile.name == name) {
            Some(profile) => {
                self.promote(profile, max_priority.unwrap_or(profile.priority))
                    .await
            }
            None => self.provision(target, name, max_priority).await,
        }
    }

    /// Raise an existing profile above every other one. The profile is also
    /// disabled so the supplicant re-authenticates instead of reusing state.
    async fn promote(
        &self,
        profile: &StoredProfile,
        max_priority: i32,
    ) -> Result<ProfileId, ProvisionError> {
        if profile.priority >= max_priority {
            debug!(
                "Profile {} ({}) already has top priority {}",
                profile.name, profile.id, profile.priority
            );
            return Ok(profile.id);
        }

        let updated = StoredProfile {
            priority: max_priority.saturating_add(1),
            enabled: false,
            ..profile.clone()
        };

        info!(
            "Raising profile {} ({}) priority {} -> {}",
            updated.name, updated.id, profile.priority, updated.priority
        );
        self.backend.update_profile(&updated).await?;

        Ok(updated.id)
    }

    async fn provision(
        &self,
        target: &TargetProfile,
        name: &str,
        max_priority: Option<i32>,
    ) -> Result<ProfileId, ProvisionError> {
        info!("No stored profile for {}, scanning", name);

        let scan_accepted = self.backend.start_scan().await?;
        if !scan_accepted {
            warn!("Scan request rejected, falling back to cached scan results");
        }

        let backend = self.backend;
        let results = self
            .scan_poll
            .poll("scan_results", self.cancel, move || async move {
                backend
                    .scan_results()
                    .await
                    .map(|results| (!results.is_empty()).then_some(results))
            })
            .await?
            .unwrap_or_default();

        let Some(entry) = results.iter().find(|entry| entry.name == name) else {
            warn!("{} not among {} scan results", name, results.len());
            return Err(if scan_accepted {
                ProvisionError::NotFound
            } else {
                ProvisionError::ScanFailed
            });
        };

        let security = classify(&entry.capabilities);
        debug!("{} advertises {:?} ({})", name, security, entry.capabilities);

        let mut profile = build_profile(name, target.secret(), security);
        profile.priority = max_priority.map_or(0, |priority| priority.saturating_add(1));

        let id = self.backend.add_profile(&profile).await?;
        if id == UNASSIGNED_PROFILE_ID {
            warn!("Device rejected new profile for {}", name);
            return Err(ProvisionError::AddRejected);
        }

        info!("Added profile {} for {} ({:?})", id, name, security);
        Ok(id)
    }
}

/// Uncommitted profile with auth parameters matching `security`.
pub fn build_profile(name: &str, secret: &str, security: SecurityMode) -> StoredProfile {
    let auth = match security {
        SecurityMode::Open => AuthParams::Open,
        SecurityMode::Wep => AuthParams::Wep {
            key: secret.to_string(),
            tx_key_index: 0,
            group_ciphers: vec![Cipher::Wep40],
        },
        SecurityMode::Psk | SecurityMode::Eap => AuthParams::Wpa {
            pre_shared_key: secret.to_string(),
            hidden: true,
            protocols: vec![Protocol::Rsn, Protocol::Wpa],
            group_ciphers: vec![Cipher::Tkip, Cipher::Ccmp],
            pairwise_ciphers: vec![Cipher::Tkip, Cipher::Ccmp],
        },
    };

    StoredProfile {
        id: UNASSIGNED_PROFILE_ID,
        name: name.to_string(),
        priority: 0,
        auth,
        enabled: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_open_profile() {
        let profile = build_profile("Cafe", "ignored", SecurityMode::Open);

        assert_eq!(profile.auth, AuthParams::Open);
        assert!(!profile.is_committed());
    }

    #[test]
    fn test_build_wep_profile_uses_first_key_slot() {
        let profile = build_profile("Legacy", "abcde", SecurityMode::Wep);

        match profile.auth {
            AuthParams::Wep {
                key, tx_key_index, ..
            } => {
                assert_eq!(key, "abcde");
                assert_eq!(tx_key_index, 0);
            }
            other => panic!("Expected WEP params, got {other:?}"),
        }
    }

    #[test]
    fn test_build_secured_profile_is_hidden_psk() {
        for security in [SecurityMode::Psk, SecurityMode::Eap] {
            let profile = build_profile("HomeNet", "hunter22", security);

            match profile.auth {
                AuthParams::Wpa {
                    pre_shared_key,
                    hidden,
                    pairwise_ciphers,
                    ..
                } => {
                    assert_eq!(pre_shared_key, "hunter22");
                    assert!(hidden);
                    assert!(pairwise_ciphers.contains(&Cipher::Ccmp));
                }
                other => panic!("Expected WPA params, got {other:?}"),
            }
        }
    }
}
