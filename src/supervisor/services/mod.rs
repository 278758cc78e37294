//! Process supervision services.

mod output;
mod process;

pub use process::{ProcessSupervisor, SupervisorError, SupervisorResult};
