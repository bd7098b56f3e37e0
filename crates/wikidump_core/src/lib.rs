//! Wikidump core: page validation, markup cleaning and the pure batching
//! state machine driven by the engine.
mod checkpoint;
pub mod cleaner;
mod effect;
mod msg;
mod page;
mod state;
mod update;

pub use checkpoint::{CheckpointState, RunStatus};
pub use cleaner::clean;
pub use effect::{Effect, StopReason};
pub use msg::Msg;
pub use page::{InvalidPage, PageRecord, ValidationError};
pub use state::{InFlight, RunState, SessionState};
pub use update::update;
