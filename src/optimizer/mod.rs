//! # Optimizer Module
//!
//! Orchestrazione della ricompressione in-place, separata in sottomoduli:
//! - `replacer`: Sostituzione atomica di un singolo file
//! - `scheduler`: Dispatch concorrente dei job e propagazione della cancellazione

pub mod replacer;
pub mod scheduler;

pub use replacer::AtomicReplacer;
pub use scheduler::{Job, JobOutcome, JobScheduler, RunState};
