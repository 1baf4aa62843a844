//! In-memory relational store.

pub mod store;

pub use store::MemoryRelationalStore;
