//! Application services: the logic behind each host command.

pub mod cloudtrail;
pub mod commands;
pub mod compliance;
pub mod incident_poller;
pub mod lql;
pub mod result_formatter;
pub mod search_runner;
pub mod time_window;

pub use commands::{CommandArgs, CommandHandlers, CommandName, HandlerSettings};
pub use incident_poller::{IncidentPoller, PollOutcome};
pub use result_formatter::ResultFormatter;
pub use search_runner::{SearchOutcome, SearchRunner, VendorContext};
pub use time_window::TimeWindow;
