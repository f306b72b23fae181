//! Command-line surface: argument parsing, dispatch and host output.

pub mod command_dispatcher;
pub mod output;
pub mod types;

pub use command_dispatcher::{CommandDispatcher, CommandOutcome};
pub use output::{output, output_error, CommandOutput};
pub use types::Cli;
