//! The rank decision rule, independent of any store.

use serde::{Deserialize, Serialize};

/// Which rank granted a privileged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedBy {
    /// The actor's company-wide position.
    Company,
    /// The actor's position inside the target department.
    Department,
}

/// Outcome of a rank check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The action may proceed.
    Allowed(AllowedBy),
    /// Neither rank is privileged enough.
    Denied,
}

impl Decision {
    /// Check if the decision permits the action.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Rank rule for privileged department mutations.
///
/// Lower ranks are more privileged. A rank at or below `admin_threshold`
/// is owner/admin-equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankPolicy {
    admin_threshold: i32,
}

impl Default for RankPolicy {
    fn default() -> Self {
        Self { admin_threshold: 1 }
    }
}

impl RankPolicy {
    /// Check if `rank` is admin-equivalent.
    pub fn is_admin(&self, rank: i32) -> bool {
        rank <= self.admin_threshold
    }

    /// Decide a department mutation.
    ///
    /// `department_rank` is `None` when the actor is not a member of the
    /// target department, which simply fails the department half.
    pub fn decide(&self, company_rank: i32, department_rank: Option<i32>) -> Decision {
        if self.is_admin(company_rank) {
            return Decision::Allowed(AllowedBy::Company);
        }
        match department_rank {
            Some(rank) if self.is_admin(rank) => Decision::Allowed(AllowedBy::Department),
            _ => Decision::Denied,
        }
    }
}
