use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use wifiguard_core::checker::{CheckerHandler, ReconnectionPolicy};
use wifiguard_core::error::FailureReason;
use wifiguard_core::wifi::Outcome;

pub enum Consent {
    Allow,
    Deny,
    Panic,
}

/// Forwards every outcome to a channel and remembers consent prompts.
pub struct RecordingHandler {
    consent: Consent,
    prompts: Mutex<Vec<(Option<String>, String)>>,
    outcomes: mpsc::UnboundedSender<Outcome>,
}

impl RecordingHandler {
    pub fn new(consent: Consent) -> (Arc<Self>, mpsc::UnboundedReceiver<Outcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        let handler = Arc::new(Self {
            consent,
            prompts: Mutex::new(Vec::new()),
            outcomes,
        });
        (handler, receiver)
    }

    pub fn prompts(&self) -> Vec<(Option<String>, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReconnectionPolicy for RecordingHandler {
    async fn allow_reconnection(&self, from: Option<&str>, to: &str) -> bool {
        self.prompts
            .lock()
            .unwrap()
            .push((from.map(str::to_string), to.to_string()));

        match self.consent {
            Consent::Allow => true,
            Consent::Deny => false,
            Consent::Panic => panic!("consent dialog crashed"),
        }
    }
}

impl CheckerHandler for RecordingHandler {
    fn on_success(&self) {
        let _ = self.outcomes.send(Outcome::Success);
    }

    fn on_failure(&self, reason: &FailureReason) {
        let _ = self.outcomes.send(Outcome::Failure(reason.clone()));
    }
}
