//! Document intents: applying, settling and replaying recorded
//! document-store steps.

pub mod executor;
pub mod replay;

pub use executor::{IntentExecutor, IntentOutcome};
pub use replay::{IntentReplayer, ReplaySummary};
