#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

pub mod config;
pub mod core;
pub mod engine;
pub mod func_unit;
pub mod op;
pub mod scheduler;

pub use self::core::{Completion, Core, WritebackPort};
pub use func_unit::{CapabilityError, FunctionalUnit, Pool, Status};
pub use op::OperationClass;
pub use scheduler::{IssueOutcome, IssueRequest, Reservation, Scheduler, StuckInstruction};

use std::path::Path;

/// Simulated clock cycle.
pub type Cycle = u64;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Reads and validates a machine description from a JSON table file.
pub fn parse_machine(path: impl AsRef<Path>) -> Result<config::Machine, Error> {
    let file = std::fs::File::open(path.as_ref())?;
    let reader = std::io::BufReader::new(file);
    config::Machine::from_json_reader(reader)
}
