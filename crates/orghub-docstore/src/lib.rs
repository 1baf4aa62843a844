//! # orghub-docstore
//!
//! The document store: directory trees, notebooks and permission records.
//!
//! Providers implement [`orghub_core::traits::DocumentStore`]. The
//! PostgreSQL provider keeps each collection as a JSONB table; the memory
//! provider keeps them in concurrent maps. [`DocumentStoreManager`] picks
//! one from configuration and [`TypedSession`] layers typed access over a
//! raw session.

pub mod memory;
pub mod postgres;
pub mod provider;
pub mod typed;

pub use provider::DocumentStoreManager;
pub use typed::TypedSession;
