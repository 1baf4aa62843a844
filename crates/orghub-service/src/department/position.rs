//! Department-local positions.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use orghub_auth::rank::evaluator::INSUFFICIENT_RANK;
use orghub_auth::{Actor, RankPolicy};
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_database::RelationalTx;
use orghub_entity::position::{DepartmentPosition, OWNER_RANK, PositionSpec};

use crate::context::RequestContext;
use crate::stores::{Stores, validate_payload};

/// Message for a missing or foreign department position.
pub const DEPARTMENT_POSITION_NOT_FOUND: &str = "department position not found";

/// Check that `actor` may hand out or edit a department rank.
///
/// Company admins and the department owner may use any rank. Everyone
/// else only ranks strictly below their own department rank.
pub(crate) fn ensure_can_grant(policy: &RankPolicy, actor: &Actor, rank: i32) -> AppResult<()> {
    if policy.is_admin(actor.company_rank()) {
        return Ok(());
    }
    match actor.department_rank() {
        Some(OWNER_RANK) => Ok(()),
        Some(own) if rank > own => Ok(()),
        _ => Err(AppError::authorization(INSUFFICIENT_RANK)),
    }
}

/// Load a position and check it belongs to `department_id`.
pub(crate) async fn find_in_department(
    tx: &mut dyn RelationalTx,
    department_id: Uuid,
    position_id: Uuid,
) -> AppResult<DepartmentPosition> {
    match tx.find_department_position(position_id).await? {
        Some(position) if position.department_id == department_id => Ok(position),
        _ => Err(AppError::not_found(DEPARTMENT_POSITION_NOT_FOUND)),
    }
}

/// Manages the positions inside one department.
#[derive(Debug, Clone)]
pub struct DepartmentPositionService {
    stores: Stores,
}

impl DepartmentPositionService {
    /// Creates a department position service.
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Add a position to a department.
    #[tracing::instrument(skip(self, ctx, payload), fields(user_id = %ctx.user_id, rank = payload.rank))]
    pub async fn create_position(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
        payload: PositionSpec,
    ) -> AppResult<DepartmentPosition> {
        validate_payload(&payload)?;
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.write().await?;
        let (actor, _) = evaluator
            .authorize_department_mutation(tx.as_mut(), ctx.user_id, company_id, department_id)
            .await?;
        ensure_can_grant(evaluator.policy(), &actor, payload.rank)?;

        let position = DepartmentPosition {
            id: self.stores.allocator.allocate(tx.as_mut()).await?,
            department_id,
            name: payload.name,
            rank: payload.rank,
            created_at: Utc::now(),
        };
        tx.insert_department_position(&position).await?;
        tx.commit().await?;

        info!(department_id = %department_id, position_id = %position.id, "Department position created");
        Ok(position)
    }

    /// Rename or re-rank a position. The owner position keeps rank 0.
    #[tracing::instrument(skip(self, ctx, payload), fields(user_id = %ctx.user_id))]
    pub async fn update_position(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
        position_id: Uuid,
        payload: PositionSpec,
    ) -> AppResult<DepartmentPosition> {
        validate_payload(&payload)?;
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.write().await?;
        let (actor, _) = evaluator
            .authorize_department_mutation(tx.as_mut(), ctx.user_id, company_id, department_id)
            .await?;
        let mut position = find_in_department(tx.as_mut(), department_id, position_id).await?;

        if position.rank == OWNER_RANK && payload.rank != OWNER_RANK {
            return Err(AppError::validation("the owner position rank cannot change"));
        }
        ensure_can_grant(evaluator.policy(), &actor, position.rank)?;
        ensure_can_grant(evaluator.policy(), &actor, payload.rank)?;

        position.name = payload.name;
        position.rank = payload.rank;
        if !tx.update_department_position(&position).await? {
            return Err(AppError::not_found(DEPARTMENT_POSITION_NOT_FOUND));
        }
        tx.commit().await?;

        info!(position_id = %position_id, rank = position.rank, "Department position updated");
        Ok(position)
    }

    /// Delete a position nobody holds. The owner position cannot be deleted.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn delete_position(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
        position_id: Uuid,
    ) -> AppResult<()> {
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.write().await?;
        let (actor, _) = evaluator
            .authorize_department_mutation(tx.as_mut(), ctx.user_id, company_id, department_id)
            .await?;
        let position = find_in_department(tx.as_mut(), department_id, position_id).await?;

        if position.rank == OWNER_RANK {
            return Err(AppError::validation("the owner position cannot be deleted"));
        }
        ensure_can_grant(evaluator.policy(), &actor, position.rank)?;
        if tx.count_department_position_holders(position_id).await? > 0 {
            return Err(AppError::conflict("the position is still held by department members"));
        }

        tx.delete_department_position(position_id).await?;
        tx.commit().await?;

        info!(position_id = %position_id, "Department position deleted");
        Ok(())
    }

    /// List a department's positions, most privileged first.
    pub async fn list_positions(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<Vec<DepartmentPosition>> {
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.read().await?;
        evaluator
            .verify_membership(tx.as_mut(), ctx.user_id, company_id)
            .await?;
        evaluator
            .resolve_department(tx.as_mut(), company_id, department_id)
            .await?;
        let positions = tx.list_department_positions(department_id).await?;
        tx.commit().await?;
        Ok(positions)
    }
}
