//! # orghub-auth
//!
//! Identifier allocation and authorization for OrgHub.
//!
//! ## Modules
//!
//! - `allocator`: collision-checked identifiers recorded in `used_uuids`
//! - `rank`: the dual-rank policy and the store-backed evaluator

pub mod allocator;
pub mod rank;

pub use allocator::{IdentifierAllocator, IdentifierSource, RandomIdentifierSource};
pub use rank::{Actor, AllowedBy, AuthorizationEvaluator, Decision, Membership, RankPolicy};
