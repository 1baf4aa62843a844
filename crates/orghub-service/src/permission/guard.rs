//! Access rule for folders and notebooks.
//!
//! The actor must be an active employee of the resource's company. Then
//! either its employee id is on the resource's access list at the required
//! level, or its rank passes the department rule for the resource's
//! division. Company admins pass regardless of division.

use tracing::debug;
use uuid::Uuid;

use orghub_auth::Actor;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_entity::permission::{AccessLevel, Permission};

use crate::context::RequestContext;
use crate::stores::Stores;

/// Message for an actor that fails the resource access rule.
pub const INSUFFICIENT_ACCESS: &str = "insufficient access";

/// Checks resource access against the relational hierarchy.
#[derive(Debug, Clone)]
pub struct ResourceGuard {
    stores: Stores,
}

impl ResourceGuard {
    /// Creates a guard.
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Require `required` access to a resource owned by `company_id`.
    ///
    /// `permission` is `None` for a company-level target that has no
    /// access list (creating a root folder directly under the company).
    pub async fn require(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        division_id: Option<Uuid>,
        permission: Option<&Permission>,
        required: AccessLevel,
    ) -> AppResult<Actor> {
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.read().await?;
        let mut actor = evaluator
            .verify_membership(tx.as_mut(), ctx.user_id, company_id)
            .await?;

        if permission.is_some_and(|p| p.allows(actor.employee.id, required)) {
            tx.commit().await?;
            return Ok(actor);
        }

        if evaluator.policy().is_admin(actor.company_rank()) {
            tx.commit().await?;
            return Ok(actor);
        }

        if let Some(division_id) = division_id {
            actor.membership = evaluator
                .membership(tx.as_mut(), actor.employee.id, division_id)
                .await?;
            if evaluator
                .policy()
                .decide(actor.company_rank(), actor.department_rank())
                .is_allowed()
            {
                tx.commit().await?;
                return Ok(actor);
            }
        }

        tx.commit().await?;
        debug!(
            user_id = %ctx.user_id,
            company_id = %company_id,
            required = required.as_str(),
            "Resource access denied"
        );
        Err(AppError::authorization(INSUFFICIENT_ACCESS))
    }
}
