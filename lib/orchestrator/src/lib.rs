//! Conversation orchestration for the sales agent.
//!
//! The [`TurnController`] runs one conversational turn end to end: it loads
//! history, asks the generation backend what to do, dispatches any tool
//! calls, and persists the user and assistant turns once a reply exists.
//!
//! Generation failures never escape: the controller answers with a fixed
//! apology and leaves the session history untouched.

pub mod call;
pub mod error;
pub mod prompt;
pub mod turn;

pub use error::TurnError;
pub use turn::{TurnConfig, TurnController, TurnOutcome};
