//! PostgreSQL relational store.

pub mod store;

pub use store::PgRelationalStore;
