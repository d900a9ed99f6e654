//! Pipeline execution engine

pub mod engine;
pub mod executor;
pub mod runner;
pub mod scheduler;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::PipelineExecutor;
pub use runner::{CommandOutput, CommandRunner, RunnerError, ShellRunner, StepRunner};
pub use scheduler::{plan, ExecutionPlan};
