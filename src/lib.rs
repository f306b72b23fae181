//! Lacework integration adapter
//!
//! Translates SOAR host commands into Lacework REST API v2 calls and shapes
//! the answers into host result entries. `fetch-incidents` polls alerts and
//! keeps a persisted cursor so each alert becomes an incident at most once.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): models, errors and the ports the services depend on
//! - **Service Layer** (`services`): command handlers, the incident poller and formatting
//! - **Adapters** (`adapters`): the Lacework HTTP client and cursor stores
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): argument parsing, dispatch and host output
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lacework_adapter::adapters::lacework::{LaceworkClient, LaceworkClientConfig};
//! use lacework_adapter::adapters::state::FileCursorStore;
//! use lacework_adapter::cli::CommandDispatcher;
//!
//! async fn run(config: lacework_adapter::Config) -> anyhow::Result<()> {
//!     let client = LaceworkClient::connect(LaceworkClientConfig::from(&config.api)).await?;
//!     let store = FileCursorStore::new(config.fetch.state_file.clone());
//!     let dispatcher = CommandDispatcher::new(Arc::new(client), Arc::new(store), &config)?;
//!     let outcome = dispatcher.dispatch("fetch-incidents", serde_json::Value::Null).await?;
//!     println!("{}", outcome.payload());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use cli::{CommandDispatcher, CommandOutcome};
pub use domain::errors::{AdapterError, AdapterResult};
pub use domain::models::{Alert, Config, Incident, ResultEntry, Severity};
pub use domain::ports::{ApiError, CursorStore, LaceworkApi, Page};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CommandHandlers, CommandName, IncidentPoller, PollOutcome};
