use tokio::sync::mpsc;
use tracing::{info, warn};
use wifiguard_core::checker::{CheckerHandler, ReconnectionPolicy};
use wifiguard_core::error::FailureReason;
use wifiguard_core::wifi::Outcome;

/// Answers consent prompts from settings and forwards outcomes to the runner.
pub struct ConsoleHandler {
    allow: bool,
    outcomes: mpsc::UnboundedSender<Outcome>,
}

impl ConsoleHandler {
    pub fn new(allow: bool) -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        (Self { allow, outcomes }, receiver)
    }

    fn deliver(&self, outcome: Outcome) {
        if self.outcomes.send(outcome).is_err() {
            warn!("Runner stopped listening for outcomes");
        }
    }
}

#[async_trait::async_trait]
impl ReconnectionPolicy for ConsoleHandler {
    async fn allow_reconnection(&self, from: Option<&str>, to: &str) -> bool {
        info!(
            "Switch from {} to {}? {}",
            from.unwrap_or("<none>"),
            to,
            if self.allow { "yes" } else { "no" }
        );
        self.allow
    }
}

impl CheckerHandler for ConsoleHandler {
    fn on_success(&self) {
        self.deliver(Outcome::Success);
    }

    fn on_failure(&self, reason: &FailureReason) {
        self.deliver(Outcome::Failure(reason.clone()));
    }
}
