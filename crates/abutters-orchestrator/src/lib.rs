//! Abutters Orchestrator - Selection and buffer query coordination
//!
//! This crate turns user triggers (map clicks, geocoder results, parcel-ID
//! searches, buffer distances) into feature service queries, applies their
//! results in generation order, and publishes the resulting state.

pub mod export;
pub mod machine;
pub mod models;
pub mod publisher;
pub mod runtime;
pub mod state;

pub use export::{export_mailing_list, write_mailing_list, DEFAULT_EXPORT_FILE};
pub use machine::QueryOrchestrator;
pub use models::{Completion, Phase, QueryRequest, QueryResponse, Trigger};
pub use publisher::{PublishedState, ResultPublisher};
pub use runtime::{OrchestratorHandle, OrchestratorRuntime};
pub use state::SelectionState;
