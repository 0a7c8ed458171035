//! Supervision of the UxPlay server process

mod arguments;
mod platform;
mod process;

pub use arguments::{parse_arguments, ArgumentStore};
pub use process::{ProcessSupervisor, StartOutcome, StopOutcome, DEFAULT_STOP_TIMEOUT};
