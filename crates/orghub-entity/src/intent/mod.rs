//! Pending document-store operations recorded in the relational store.

pub mod model;

pub use model::{DocumentIntent, IntentKind, IntentStatus};
