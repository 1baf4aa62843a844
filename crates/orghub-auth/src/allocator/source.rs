//! Candidate identifier generators.

use std::fmt;

use uuid::Uuid;

/// Produces candidate identifiers for the allocator.
pub trait IdentifierSource: Send + Sync + fmt::Debug {
    /// Generate the next candidate.
    fn generate(&self) -> Uuid;
}

/// Random 128-bit (v4) identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentifierSource;

impl IdentifierSource for RandomIdentifierSource {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}
