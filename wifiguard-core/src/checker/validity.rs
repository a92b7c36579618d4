use crate::wifi::{ConnectionSnapshot, TargetProfile};

/// Whether `snapshot` already satisfies `target`.
///
/// A target without a name accepts anything. Otherwise the radio must be on
/// and the device fully associated with exactly the named network: address
/// assigned and supplicant handshake completed. Partial association fails.
pub fn is_valid(target: &TargetProfile, snapshot: &ConnectionSnapshot) -> bool {
    let Some(name) = target.name() else {
        return true;
    };

    snapshot.radio_enabled
        && snapshot.network_name.as_deref() == Some(name)
        && snapshot.ip_assigned
        && snapshot.auth_completed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_name_constraint_is_always_valid() {
        let target = TargetProfile::any();

        assert!(is_valid(&target, &ConnectionSnapshot::default()));
        assert!(is_valid(&target, &ConnectionSnapshot::associated("Elsewhere")));
    }

    #[test]
    fn test_full_association_is_valid() {
        let target = TargetProfile::new("HomeNet");
        assert!(is_valid(&target, &ConnectionSnapshot::associated("HomeNet")));
    }

    #[test]
    fn test_any_missing_condition_is_invalid() {
        let target = TargetProfile::new("HomeNet");
        let good = ConnectionSnapshot::associated("HomeNet");

        let radio_off = ConnectionSnapshot {
            radio_enabled: false,
            ..good.clone()
        };
        let no_ip = ConnectionSnapshot {
            ip_assigned: false,
            ..good.clone()
        };
        let handshake_pending = ConnectionSnapshot {
            auth_completed: false,
            ..good.clone()
        };
        let unnamed = ConnectionSnapshot {
            network_name: None,
            ..good.clone()
        };

        for snapshot in [radio_off, no_ip, handshake_pending, unnamed] {
            assert!(!is_valid(&target, &snapshot), "{snapshot:?}");
        }
        assert!(!is_valid(&target, &ConnectionSnapshot::default()));
    }

    #[test]
    fn test_name_match_is_exact() {
        let target = TargetProfile::new("HomeNet");

        assert!(!is_valid(&target, &ConnectionSnapshot::associated("homenet")));
        assert!(!is_valid(&target, &ConnectionSnapshot::associated("HomeNet5G")));
        assert!(!is_valid(&target, &ConnectionSnapshot::associated("\"HomeNet\"")));
    }
}
