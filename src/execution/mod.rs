//! Pipeline execution engine and training backends

pub mod backend;
pub mod engine;
pub mod local;

pub use backend::{BackendError, JobOutcome, TrainingBackend};
pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use local::{LocalBackendConfig, LocalProcessBackend, OutputHandler};
