pub mod builder;
pub mod coordinator;
pub mod types;

pub use builder::{BuildError, RequestBuilder};
pub use coordinator::{CancelToken, RunCoordinator};
pub use types::{RunConfig, RunResult, RunState, RunTotals, StepOutcome, StepResult};
