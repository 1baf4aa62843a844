//! # orghub-core
//!
//! Core crate for OrgHub. Contains the unified error system, configuration
//! schemas, the store-call deadline helper, and the document-store traits
//! implemented by `orghub-docstore`.
//!
//! This crate has **no** internal dependencies on other OrgHub crates.

pub mod config;
pub mod deadline;
pub mod error;
pub mod result;
pub mod traits;
pub mod validation;

pub use deadline::with_deadline;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
