//! Dual-rank authorization: company-wide position rank OR
//! department-local position rank.

pub mod evaluator;
pub mod policy;

pub use evaluator::{Actor, AuthorizationEvaluator, Membership};
pub use policy::{AllowedBy, Decision, RankPolicy};
