//! Core traits defined in `orghub-core` and implemented by other crates.

pub mod document;

pub use document::{Collection, Document, DocumentSession, DocumentStore};
