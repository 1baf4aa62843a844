//! # orghub-database
//!
//! The relational store: identities, the organizational hierarchy,
//! position ranks, the identifier allocation table and document intents.
//!
//! [`RelationalStore`] hands out one [`RelationalTx`] per unit of work.
//! Two providers implement it: PostgreSQL (sqlx) and an in-memory store
//! for single-node deployments and tests. [`RelationalStoreManager`]
//! picks one from configuration.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod provider;
pub mod store;

pub use connection::DatabasePool;
pub use provider::RelationalStoreManager;
pub use store::{RelationalStore, RelationalTx, TxMode};
