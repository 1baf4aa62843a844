//! Identifier allocation.

pub mod identifier;
pub mod source;

pub use identifier::IdentifierAllocator;
pub use source::{IdentifierSource, RandomIdentifierSource};
