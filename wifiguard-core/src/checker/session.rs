use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::checker::events::{EVENT_CAPACITY, EventSink, StateChange};
use crate::checker::orchestrator::{Orchestrator, ReconnectionPolicy};
use crate::checker::poll::RetryPolicy;
use crate::error::FailureReason;
use crate::wifi::platform::WifiBackend;
use crate::wifi::{Outcome, TargetProfile};

/// Receives the result of every check a [`CheckerSession`] runs.
///
/// All callbacks, including the inherited
/// [`ReconnectionPolicy::allow_reconnection`], are invoked on Tokio worker
/// threads and never on the thread that called
/// [`CheckerSession::begin_checking`]. Implementations that touch UI state
/// must hop to their own executor.
pub trait CheckerHandler: ReconnectionPolicy {
    fn on_success(&self);

    fn on_failure(&self, reason: &FailureReason);
}

struct ActiveRun {
    id: u64,
    cancel: CancellationToken,
    /// Set once the run delivered its outcome or was cancelled, whichever
    /// happens first.
    settled: Arc<AtomicBool>,
}

impl ActiveRun {
    fn cancel(&self) {
        self.settled.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }

    fn is_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst)
    }
}

/// Owns at most one in-flight check and restarts it on demand.
pub struct CheckerSession {
    handler: Arc<dyn CheckerHandler>,
    retry: RetryPolicy,
    runtime: Handle,
    events: broadcast::Sender<StateChange>,
    next_run_id: AtomicU64,
    current: Mutex<Option<ActiveRun>>,
}

impl CheckerSession {
    /// Create a session bound to the ambient Tokio runtime.
    ///
    /// Must be called from within a runtime context.
    pub fn new(handler: Arc<dyn CheckerHandler>) -> Self {
        Self::with_runtime(handler, Handle::current())
    }

    pub fn with_runtime(handler: Arc<dyn CheckerHandler>, runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            handler,
            retry: RetryPolicy::default(),
            runtime,
            events,
            next_run_id: AtomicU64::new(1),
            current: Mutex::new(None),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Diagnostic stream of state transitions for every run of this session.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }

    /// Cancel any running check and start a new one for `target`.
    ///
    /// Returns immediately with the id of the new run. The superseded run
    /// never reports an outcome.
    pub fn begin_checking(&self, target: TargetProfile, backend: Arc<dyn WifiBackend>) -> u64 {
        let mut current = self.lock_current();

        if let Some(previous) = current.take() {
            if !previous.is_settled() {
                info!("Superseding WiFi check {}", previous.id);
            }
            previous.cancel();
        }

        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let settled = Arc::new(AtomicBool::new(false));

        let orchestrator = Orchestrator::new(target, backend, self.handler.clone(), cancel.clone())
            .with_retry_policy(self.retry)
            .with_events(EventSink::new(run_id, self.events.clone()));

        self.runtime.spawn(supervise(
            run_id,
            orchestrator,
            self.handler.clone(),
            settled.clone(),
        ));

        *current = Some(ActiveRun {
            id: run_id,
            cancel,
            settled,
        });

        debug!("Started WiFi check {}", run_id);
        run_id
    }

    /// Cancel the running check without waiting for it to unwind.
    pub fn stop_checking(&self) {
        if let Some(run) = self.lock_current().take() {
            if !run.is_settled() {
                info!("Stopping WiFi check {}", run.id);
            }
            run.cancel();
        }
    }

    /// Whether a check is running and has not reported yet.
    pub fn is_checking(&self) -> bool {
        self.lock_current()
            .as_ref()
            .is_some_and(|run| !run.is_settled())
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CheckerSession {
    fn drop(&mut self) {
        self.stop_checking();
    }
}

/// Runs the orchestrator in its own task so that a panic anywhere inside it,
/// the consent callback included, still ends in exactly one failure report.
async fn supervise(
    run_id: u64,
    orchestrator: Orchestrator<dyn CheckerHandler>,
    handler: Arc<dyn CheckerHandler>,
    settled: Arc<AtomicBool>,
) {
    let outcome = match tokio::spawn(orchestrator.run()).await {
        Ok(Some(outcome)) => outcome,
        Ok(None) => {
            debug!("WiFi check {} cancelled", run_id);
            return;
        }
        Err(err) if err.is_panic() => {
            let detail = panic_detail(err.into_panic());
            error!("WiFi check {} panicked: {}", run_id, detail);
            Outcome::Failure(FailureReason::UnexpectedFault(detail))
        }
        Err(err) => {
            debug!("WiFi check {} aborted: {}", run_id, err);
            return;
        }
    };

    if settled.swap(true, Ordering::SeqCst) {
        debug!("Dropping outcome of superseded WiFi check {}", run_id);
        return;
    }

    match outcome {
        Outcome::Success => {
            info!("WiFi check {} succeeded", run_id);
            handler.on_success();
        }
        Outcome::Failure(reason) => {
            warn!("WiFi check {} failed: {}", run_id, reason);
            handler.on_failure(&reason);
        }
    }
}

fn panic_detail(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
