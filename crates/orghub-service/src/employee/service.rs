//! Hiring, removing and placing employees.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use orghub_auth::rank::evaluator::INSUFFICIENT_RANK;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::validation::require_id;
use orghub_database::RelationalTx;
use orghub_entity::employee::{DepartmentEmployee, Employee};
use orghub_entity::position::OWNER_RANK;

use crate::context::RequestContext;
use crate::department::position::{ensure_can_grant, find_in_department};
use crate::stores::Stores;

/// Message for a target employee outside the company or already removed.
pub const TARGET_EMPLOYEE_NOT_FOUND: &str = "employee not found";

async fn active_employee(
    tx: &mut dyn RelationalTx,
    company_id: Uuid,
    employee_id: Uuid,
) -> AppResult<Employee> {
    match tx.find_employee(employee_id).await? {
        Some(e) if e.company_id == company_id && e.is_active => Ok(e),
        _ => Err(AppError::not_found(TARGET_EMPLOYEE_NOT_FOUND)),
    }
}

/// Manages company employees and department memberships.
#[derive(Debug, Clone)]
pub struct EmployeeService {
    stores: Stores,
}

impl EmployeeService {
    /// Creates an employee service.
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Hire `user_id` into a company position. Company admins only.
    ///
    /// Admins other than the owner can only hire below their own rank. A
    /// former employee is reactivated under the same employee id.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn add_employee(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        user_id: Uuid,
        position_id: Uuid,
    ) -> AppResult<Employee> {
        require_id(user_id, "user_id")?;
        require_id(position_id, "position_id")?;

        let mut tx = self.stores.write().await?;
        let actor = self
            .stores
            .evaluator
            .authorize_company_admin(tx.as_mut(), ctx.user_id, company_id)
            .await?;

        let position = match tx.find_position(position_id).await? {
            Some(p) if p.company_id == company_id => p,
            _ => return Err(AppError::not_found("position not found")),
        };
        if !actor.is_owner() && position.rank <= actor.company_rank() {
            return Err(AppError::authorization(INSUFFICIENT_RANK));
        }

        let employee = match tx.find_employee_by_user(user_id, company_id).await? {
            Some(existing) if existing.is_active => {
                return Err(AppError::conflict("user is already an employee of this company"));
            }
            Some(mut former) => {
                tx.reactivate_employee(former.id, position_id).await?;
                former.is_active = true;
                former.position_id = position_id;
                former
            }
            None => {
                let employee = Employee {
                    id: self.stores.allocator.allocate(tx.as_mut()).await?,
                    user_id,
                    company_id,
                    position_id,
                    is_active: true,
                    created_at: Utc::now(),
                };
                tx.insert_employee(&employee).await?;
                employee
            }
        };
        tx.commit().await?;

        info!(company_id = %company_id, employee_id = %employee.id, rank = position.rank, "Employee added");
        Ok(employee)
    }

    /// Deactivate an employee and drop every department membership.
    ///
    /// The owner cannot be removed. Admins other than the owner can only
    /// remove employees ranked below them.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn remove_employee(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<()> {
        let mut tx = self.stores.write().await?;
        let actor = self
            .stores
            .evaluator
            .authorize_company_admin(tx.as_mut(), ctx.user_id, company_id)
            .await?;

        let target = active_employee(tx.as_mut(), company_id, employee_id).await?;
        let rank = tx
            .find_position(target.position_id)
            .await?
            .map(|p| p.rank)
            .ok_or_else(|| AppError::not_found("position not found"))?;
        if rank == OWNER_RANK {
            return Err(AppError::authorization("the company owner cannot be removed"));
        }
        if !actor.is_owner() && rank <= actor.company_rank() {
            return Err(AppError::authorization(INSUFFICIENT_RANK));
        }

        tx.set_employee_active(employee_id, false).await?;
        let memberships = tx.delete_employee_memberships(employee_id).await?;
        tx.commit().await?;

        info!(company_id = %company_id, employee_id = %employee_id, memberships, "Employee removed");
        Ok(())
    }

    /// Place an employee into a department at a department position.
    ///
    /// Requires the department rule; the granted rank must be below the
    /// actor's own department rank unless the actor is a company admin or
    /// the department owner.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn assign_to_department(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
        employee_id: Uuid,
        department_position_id: Uuid,
    ) -> AppResult<DepartmentEmployee> {
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.write().await?;
        let (actor, _) = evaluator
            .authorize_department_mutation(tx.as_mut(), ctx.user_id, company_id, department_id)
            .await?;

        active_employee(tx.as_mut(), company_id, employee_id).await?;
        let position = find_in_department(tx.as_mut(), department_id, department_position_id).await?;
        ensure_can_grant(evaluator.policy(), &actor, position.rank)?;

        let member = DepartmentEmployee {
            id: self.stores.allocator.allocate(tx.as_mut()).await?,
            employee_id,
            department_id,
            department_position_id,
            created_at: Utc::now(),
        };
        tx.insert_department_employee(&member).await?;
        tx.commit().await?;

        info!(
            department_id = %department_id,
            employee_id = %employee_id,
            rank = position.rank,
            "Employee assigned to department"
        );
        Ok(member)
    }
}
