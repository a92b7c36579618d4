pub mod events;
pub mod orchestrator;
pub mod poll;
pub mod provision;
pub mod security;
pub mod session;
pub mod validity;

pub use events::StateChange;
pub use orchestrator::{CheckerState, Orchestrator, ReconnectionPolicy};
pub use poll::{PollPolicy, RetryPolicy};
pub use provision::NetworkProvisioner;
pub use security::classify;
pub use session::{CheckerHandler, CheckerSession};
pub use validity::is_valid;
