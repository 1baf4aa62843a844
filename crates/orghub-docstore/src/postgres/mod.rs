//! PostgreSQL JSONB document store.

pub mod store;

pub use store::PgDocumentStore;
