use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::checker::orchestrator::CheckerState;

/// Capacity of a session's diagnostic channel. Slow subscribers lag rather
/// than block the checker.
pub const EVENT_CAPACITY: usize = 64;

/// Diagnostic event published on every state transition of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub run_id: u64,
    pub from: CheckerState,
    pub to: CheckerState,
    pub timestamp: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct EventSink {
    run_id: u64,
    sender: broadcast::Sender<StateChange>,
}

impl EventSink {
    pub fn new(run_id: u64, sender: broadcast::Sender<StateChange>) -> Self {
        Self { run_id, sender }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Publish a transition, returning how many subscribers saw it.
    pub fn publish(&self, from: &CheckerState, to: &CheckerState) -> usize {
        self.sender
            .send(StateChange {
                run_id: self.run_id,
                from: from.clone(),
                to: to.clone(),
                timestamp: OffsetDateTime::now_utc(),
            })
            .unwrap_or(0)
    }
}
