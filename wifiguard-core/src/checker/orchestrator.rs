use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::checker::events::EventSink;
use crate::checker::poll::RetryPolicy;
use crate::checker::provision::NetworkProvisioner;
use crate::checker::validity::is_valid;
use crate::error::{FailureReason, ProvisionError, RunError};
use crate::wifi::platform::WifiBackend;
use crate::wifi::{Outcome, ProfileId, TargetProfile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckerState {
    Idle,
    CheckingValidity,
    RequestingUserConsent,
    EnablingRadio,
    ResolvingProfile,
    EnablingNetwork(ProfileId),
    AwaitingAssociation,
    Succeeded,
    Failed(FailureReason),
}

impl CheckerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckerState::Succeeded | CheckerState::Failed(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            CheckerState::Succeeded => Some(Outcome::Success),
            CheckerState::Failed(reason) => Some(Outcome::Failure(reason.clone())),
            _ => None,
        }
    }
}

/// Decides whether the device may be moved off its current network.
#[async_trait::async_trait]
pub trait ReconnectionPolicy: Send + Sync {
    /// `from` is the currently associated network, if any.
    async fn allow_reconnection(&self, from: Option<&str>, to: &str) -> bool;
}

#[async_trait::async_trait]
impl<F> ReconnectionPolicy for F
where
    F: Fn(Option<&str>, &str) -> bool + Send + Sync,
{
    async fn allow_reconnection(&self, from: Option<&str>, to: &str) -> bool {
        self(from, to)
    }
}

/// One reconnection run: drives the device from whatever it is doing to an
/// association with the target network, or to a failure reason.
pub struct Orchestrator<P: ?Sized> {
    target: TargetProfile,
    backend: Arc<dyn WifiBackend>,
    policy: Arc<P>,
    retry: RetryPolicy,
    cancel: CancellationToken,
    events: Option<EventSink>,
    state: CheckerState,
    current_network: Option<String>,
}

impl<P: ReconnectionPolicy + ?Sized> Orchestrator<P> {
    pub fn new(
        target: TargetProfile,
        backend: Arc<dyn WifiBackend>,
        policy: Arc<P>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            target,
            backend,
            policy,
            retry: RetryPolicy::default(),
            cancel,
            events: None,
            state: CheckerState::Idle,
            current_network: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &CheckerState {
        &self.state
    }

    /// Drive the state machine to a terminal state.
    ///
    /// Returns `None` when the run was cancelled; no outcome exists then.
    pub async fn run(mut self) -> Option<Outcome> {
        info!("Checking WiFi for {:?}", self.target.name());

        loop {
            if let Some(outcome) = self.state.outcome() {
                return Some(outcome);
            }

            if self.cancel.is_cancelled() {
                info!("WiFi check cancelled in {:?}", self.state);
                return None;
            }

            let next = match self.step().await {
                Ok(next) => next,
                Err(RunError::Cancelled) => {
                    info!("WiFi check cancelled in {:?}", self.state);
                    return None;
                }
                Err(RunError::Device(err)) => {
                    error!("Device fault in {:?}: {}", self.state, err);
                    CheckerState::Failed(err.into())
                }
            };

            self.transition_to(next);
        }
    }

    async fn step(&mut self) -> Result<CheckerState, RunError> {
        let next = match self.state {
            CheckerState::Idle => {
                if self.target.name().is_none() {
                    debug!("No network constraint, nothing to check");
                    CheckerState::Succeeded
                } else {
                    CheckerState::CheckingValidity
                }
            }
            CheckerState::CheckingValidity => {
                let snapshot = self.backend.connection_snapshot().await?;
                debug!("Connection snapshot: {:?}", snapshot);
                if is_valid(&self.target, &snapshot) {
                    CheckerState::Succeeded
                } else {
                    self.current_network = snapshot.network_name;
                    CheckerState::RequestingUserConsent
                }
            }
            CheckerState::RequestingUserConsent => {
                let to = self.target.name().unwrap_or_default();
                let from = self.current_network.as_deref();
                if self.policy.allow_reconnection(from, to).await {
                    CheckerState::EnablingRadio
                } else {
                    CheckerState::Failed(FailureReason::UserDeclined)
                }
            }
            CheckerState::EnablingRadio => self.enable_radio().await?,
            CheckerState::ResolvingProfile => self.resolve_profile().await?,
            CheckerState::EnablingNetwork(id) => {
                let accepted = self.backend.enable_profile(id, true).await?;
                debug!("Enable profile {} returned {}", id, accepted);
                if accepted {
                    CheckerState::AwaitingAssociation
                } else {
                    CheckerState::Failed(FailureReason::ProfileEnableRejected)
                }
            }
            CheckerState::AwaitingAssociation => self.await_association().await?,
            CheckerState::Succeeded | CheckerState::Failed(_) => self.state.clone(),
        };

        Ok(next)
    }

    async fn enable_radio(&self) -> Result<CheckerState, RunError> {
        self.backend.set_radio_enabled(true).await?;

        let backend = self.backend.as_ref();
        let enabled = self
            .retry
            .radio_enable
            .poll("radio_enable", &self.cancel, move || async move {
                backend.is_radio_enabled().await.map(|on| on.then_some(()))
            })
            .await?;

        Ok(match enabled {
            Some(()) => CheckerState::ResolvingProfile,
            None => {
                warn!(
                    "Radio still disabled after {:?}",
                    self.retry.radio_enable.budget()
                );
                CheckerState::Failed(FailureReason::RadioEnableTimeout)
            }
        })
    }

    async fn resolve_profile(&self) -> Result<CheckerState, RunError> {
        let existing = self.backend.list_profiles().await?;
        debug!("{} stored profiles", existing.len());

        let provisioner =
            NetworkProvisioner::new(self.backend.as_ref(), self.retry.scan_results, &self.cancel);

        match provisioner.ensure_profile(&self.target, &existing).await {
            Ok(id) => Ok(CheckerState::EnablingNetwork(id)),
            Err(ProvisionError::NotFound) => {
                Ok(CheckerState::Failed(FailureReason::ProfileNotFound))
            }
            Err(ProvisionError::ScanFailed) => {
                Ok(CheckerState::Failed(FailureReason::ScanTriggerFailed))
            }
            Err(ProvisionError::AddRejected) => {
                Ok(CheckerState::Failed(FailureReason::ProfileAddRejected))
            }
            Err(ProvisionError::Interrupted(err)) => Err(err),
        }
    }

    async fn await_association(&self) -> Result<CheckerState, RunError> {
        self.backend.reconnect().await?;

        let backend = self.backend.as_ref();
        let target = &self.target;
        let associated = self
            .retry
            .association
            .poll("association", &self.cancel, move || async move {
                backend
                    .connection_snapshot()
                    .await
                    .map(|snapshot| is_valid(target, &snapshot).then_some(()))
            })
            .await?;

        Ok(match associated {
            Some(()) => CheckerState::Succeeded,
            None => CheckerState::Failed(FailureReason::AssociationTimeout),
        })
    }

    fn transition_to(&mut self, next: CheckerState) {
        debug!("WiFi state transition: {:?} -> {:?}", self.state, next);
        if let Some(events) = &self.events {
            events.publish(&self.state, &next);
        }
        self.state = next;
    }
}
