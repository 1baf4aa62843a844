//! Per-resource access list entities.

pub mod model;

pub use model::{AccessLevel, Permission, PermissionScope};
