use std::sync::Arc;

use serde_json::to_string;
use tracing::{debug, warn};
use wifiguard_core::checker::{CheckerSession, StateChange};
use wifiguard_core::error::FailureReason;
use wifiguard_core::wifi::Outcome;

use crate::handler::ConsoleHandler;
use crate::radio::SimulatedRadio;
use crate::settings::Settings;

mod handler;
pub mod radio;
pub mod settings;

/// Run one check against a simulated radio and wait for its outcome.
pub async fn run(settings: &Arc<Settings>) -> Outcome {
    let radio = Arc::new(SimulatedRadio::new(settings.radio.clone()));
    let (handler, mut outcomes) = ConsoleHandler::new(settings.consent.allow);

    let session = CheckerSession::new(Arc::new(handler)).with_retry_policy(settings.checker);
    let mut events = session.subscribe();

    session.begin_checking(settings.target.clone(), radio);

    loop {
        tokio::select! {
            biased;

            Ok(change) = events.recv() => log_event(&change),
            Some(outcome) = outcomes.recv() => return outcome,
            else => {
                warn!("Checker stopped without an outcome");
                return Outcome::Failure(FailureReason::fault("checker stopped"));
            }
        }
    }
}

fn log_event(change: &StateChange) {
    match to_string(change) {
        Ok(json) => debug!("Event: {}", json),
        Err(err) => warn!("Failed to encode state change: {}", err),
    }
}
