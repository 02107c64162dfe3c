//! Business tools the generation model can call.
//!
//! This crate provides:
//!
//! - **Scorer**: BANT lead-quality score from budget and timeline signals
//! - **Handlers**: one operation per tool against the document store
//! - **Dispatcher**: closed name-to-handler routing that always returns a
//!   result envelope, never an error
//! - **Schema**: the tool definitions exposed to the model

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod params;
pub mod records;
pub mod redact;
pub mod schema;
pub mod scoring;

pub use catalog::{BrochureType, PriceQuote};
pub use dispatch::{DispatchedTool, ToolDispatcher, ToolName};
pub use error::ToolError;
pub use handlers::SalesTools;
pub use records::{BrochureSendRequest, CallbackRequest, InventoryItem, Lead, LeadStatus};
pub use schema::tool_registry;
pub use scoring::bant_score;
