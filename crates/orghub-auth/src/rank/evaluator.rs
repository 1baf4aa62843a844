//! Store-backed authorization checks.
//!
//! Every check resolves the acting employee first. The outcomes are the
//! same for every use case:
//!
//! - no active employee row in the company: `NotFound("employee not found in company")`
//! - target department missing or owned by another company: `NotFound("department not found")`
//! - ranks insufficient, including not being a department member:
//!   `Authorization("insufficient rank")`

use tracing::{debug, warn};
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_database::RelationalTx;
use orghub_entity::department::Department;
use orghub_entity::employee::{DepartmentEmployee, Employee};
use orghub_entity::position::{DepartmentPosition, OWNER_RANK, Position};

use super::policy::{Decision, RankPolicy};

/// Message for an actor without an active employee row.
pub const EMPLOYEE_NOT_FOUND: &str = "employee not found in company";
/// Message for a missing or foreign department.
pub const DEPARTMENT_NOT_FOUND: &str = "department not found";
/// Message for a resolved actor whose ranks are too low.
pub const INSUFFICIENT_RANK: &str = "insufficient rank";

/// An actor's membership in one department.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    /// The `employee_department` row.
    pub member: DepartmentEmployee,
    /// The department-local position it holds.
    pub position: DepartmentPosition,
}

/// A resolved acting employee.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// The active employee row.
    pub employee: Employee,
    /// The employee's company-wide position.
    pub position: Position,
    /// Membership in the target department, when one was checked.
    pub membership: Option<Membership>,
}

impl Actor {
    /// Company-wide rank.
    pub fn company_rank(&self) -> i32 {
        self.position.rank
    }

    /// Rank inside the checked department, if a member.
    pub fn department_rank(&self) -> Option<i32> {
        self.membership.as_ref().map(|m| m.position.rank)
    }

    /// Check if the actor owns the company.
    pub fn is_owner(&self) -> bool {
        self.position.rank == OWNER_RANK
    }
}

/// Resolves actors and applies [`RankPolicy`] to them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationEvaluator {
    policy: RankPolicy,
}

impl AuthorizationEvaluator {
    /// Create an evaluator with a custom policy.
    pub fn new(policy: RankPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    pub fn policy(&self) -> &RankPolicy {
        &self.policy
    }

    /// Resolve `user_id` as an active employee of `company_id`.
    pub async fn verify_membership(
        &self,
        tx: &mut dyn RelationalTx,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Actor> {
        let employee = match tx.find_employee_by_user(user_id, company_id).await? {
            Some(employee) if employee.is_active => employee,
            _ => {
                debug!(user_id = %user_id, company_id = %company_id, "Actor is not an active employee");
                return Err(AppError::not_found(EMPLOYEE_NOT_FOUND));
            }
        };

        let position = tx.find_position(employee.position_id).await?.ok_or_else(|| {
            warn!(employee_id = %employee.id, position_id = %employee.position_id, "Employee position missing");
            AppError::not_found("position not found")
        })?;

        Ok(Actor {
            employee,
            position,
            membership: None,
        })
    }

    /// Load `department_id` and check it belongs to `company_id`.
    pub async fn resolve_department(
        &self,
        tx: &mut dyn RelationalTx,
        company_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<Department> {
        match tx.find_department(department_id).await? {
            Some(department) if department.company_id == company_id => Ok(department),
            _ => Err(AppError::not_found(DEPARTMENT_NOT_FOUND)),
        }
    }

    /// Resolve the actor's membership in `department_id`, if any.
    pub async fn membership(
        &self,
        tx: &mut dyn RelationalTx,
        employee_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<Option<Membership>> {
        let Some(member) = tx.find_department_employee(employee_id, department_id).await? else {
            return Ok(None);
        };
        let position = tx
            .find_department_position(member.department_position_id)
            .await?
            .ok_or_else(|| AppError::not_found("department position not found"))?;
        Ok(Some(Membership { member, position }))
    }

    /// Gate a privileged mutation of `department_id`.
    ///
    /// Returns the actor (with its membership, if any) and the department.
    pub async fn authorize_department_mutation(
        &self,
        tx: &mut dyn RelationalTx,
        user_id: Uuid,
        company_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<(Actor, Department)> {
        let mut actor = self.verify_membership(tx, user_id, company_id).await?;
        let department = self.resolve_department(tx, company_id, department_id).await?;
        actor.membership = self.membership(tx, actor.employee.id, department_id).await?;

        match self.policy.decide(actor.company_rank(), actor.department_rank()) {
            Decision::Allowed(by) => {
                debug!(
                    user_id = %user_id,
                    department_id = %department_id,
                    allowed_by = ?by,
                    "Department mutation authorized"
                );
                Ok((actor, department))
            }
            Decision::Denied => {
                debug!(
                    user_id = %user_id,
                    department_id = %department_id,
                    company_rank = actor.company_rank(),
                    department_rank = ?actor.department_rank(),
                    "Department mutation denied"
                );
                Err(AppError::authorization(INSUFFICIENT_RANK))
            }
        }
    }

    /// Gate a company-level mutation: company rank must be admin-equivalent.
    pub async fn authorize_company_admin(
        &self,
        tx: &mut dyn RelationalTx,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Actor> {
        let actor = self.verify_membership(tx, user_id, company_id).await?;
        if !self.policy.is_admin(actor.company_rank()) {
            return Err(AppError::authorization(INSUFFICIENT_RANK));
        }
        Ok(actor)
    }

    /// Gate an owner-only action.
    pub async fn authorize_company_owner(
        &self,
        tx: &mut dyn RelationalTx,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Actor> {
        let actor = self.verify_membership(tx, user_id, company_id).await?;
        if !actor.is_owner() {
            return Err(AppError::authorization(INSUFFICIENT_RANK));
        }
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use orghub_core::error::ErrorKind;
    use orghub_database::memory::MemoryRelationalStore;
    use orghub_database::{RelationalStore, TxMode};
    use orghub_entity::company::Company;

    use super::*;

    struct Fixture {
        store: MemoryRelationalStore,
        company_id: Uuid,
        department_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = MemoryRelationalStore::new();
        let now = Utc::now();
        let company_id = Uuid::new_v4();
        let department_id = Uuid::new_v4();

        let mut tx = store.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_company(&Company {
            id: company_id,
            owner_id: Uuid::new_v4(),
            name: "Acme".to_string(),
            email: None,
            phone: None,
            address: None,
            is_active: true,
            root_directory_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
        tx.insert_department(&Department {
            id: department_id,
            company_id,
            parent_id: company_id,
            name: "Research".to_string(),
            description: None,
            root_directory_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        Fixture {
            store,
            company_id,
            department_id,
        }
    }

    /// Add an employee at `rank`, optionally a member of the fixture
    /// department at `department_rank`. Returns the user id.
    async fn hire(f: &Fixture, rank: i32, department_rank: Option<i32>) -> Uuid {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let position = Position {
            id: Uuid::new_v4(),
            company_id: f.company_id,
            name: format!("rank {rank}"),
            rank,
            created_at: now,
        };
        let employee = Employee {
            id: Uuid::new_v4(),
            user_id,
            company_id: f.company_id,
            position_id: position.id,
            is_active: true,
            created_at: now,
        };

        let mut tx = f.store.begin(TxMode::ReadWrite).await.unwrap();
        if tx.list_positions(f.company_id).await.unwrap().iter().all(|p| p.rank != rank) {
            tx.insert_position(&position).await.unwrap();
        }
        let position_id = tx
            .list_positions(f.company_id)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.rank == rank)
            .unwrap()
            .id;
        tx.insert_employee(&Employee {
            position_id,
            ..employee.clone()
        })
        .await
        .unwrap();

        if let Some(department_rank) = department_rank {
            let dept_position = DepartmentPosition {
                id: Uuid::new_v4(),
                department_id: f.department_id,
                name: format!("dept rank {department_rank}"),
                rank: department_rank,
                created_at: now,
            };
            tx.insert_department_position(&dept_position).await.unwrap();
            tx.insert_department_employee(&DepartmentEmployee {
                id: Uuid::new_v4(),
                employee_id: employee.id,
                department_id: f.department_id,
                department_position_id: dept_position.id,
                created_at: now,
            })
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();
        user_id
    }

    #[tokio::test]
    async fn test_unknown_actor_is_not_found() {
        let f = fixture().await;
        let evaluator = AuthorizationEvaluator::default();
        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();

        let err = evaluator
            .authorize_department_mutation(tx.as_mut(), Uuid::new_v4(), f.company_id, f.department_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, EMPLOYEE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_low_rank_non_member_is_authorization_error() {
        let f = fixture().await;
        let user = hire(&f, 3, None).await;
        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();

        let err = AuthorizationEvaluator::default()
            .authorize_department_mutation(tx.as_mut(), user, f.company_id, f.department_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert_eq!(err.message, INSUFFICIENT_RANK);
    }

    #[tokio::test]
    async fn test_company_admin_bypasses_department_membership() {
        let f = fixture().await;
        let user = hire(&f, 1, None).await;
        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();

        let (actor, department) = AuthorizationEvaluator::default()
            .authorize_department_mutation(tx.as_mut(), user, f.company_id, f.department_id)
            .await
            .unwrap();
        assert!(actor.membership.is_none());
        assert_eq!(department.id, f.department_id);
    }

    #[tokio::test]
    async fn test_department_admin_is_allowed() {
        let f = fixture().await;
        let user = hire(&f, 7, Some(1)).await;
        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();

        let (actor, _) = AuthorizationEvaluator::default()
            .authorize_department_mutation(tx.as_mut(), user, f.company_id, f.department_id)
            .await
            .unwrap();
        assert_eq!(actor.department_rank(), Some(1));
    }

    #[tokio::test]
    async fn test_low_rank_member_is_denied() {
        let f = fixture().await;
        let user = hire(&f, 7, Some(4)).await;
        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();

        let err = AuthorizationEvaluator::default()
            .authorize_department_mutation(tx.as_mut(), user, f.company_id, f.department_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_foreign_department_is_not_found() {
        let f = fixture().await;
        let user = hire(&f, 0, None).await;
        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();

        let err = AuthorizationEvaluator::default()
            .authorize_department_mutation(tx.as_mut(), user, f.company_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, DEPARTMENT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_inactive_employee_is_not_found() {
        let f = fixture().await;
        let user = hire(&f, 0, None).await;

        let mut tx = f.store.begin(TxMode::ReadWrite).await.unwrap();
        tx.deactivate_company_employees(f.company_id).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();
        let err = AuthorizationEvaluator::default()
            .verify_membership(tx.as_mut(), user, f.company_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_owner_gate_rejects_admins() {
        let f = fixture().await;
        let owner = hire(&f, 0, None).await;
        let admin = hire(&f, 1, None).await;
        let evaluator = AuthorizationEvaluator::default();
        let mut tx = f.store.begin(TxMode::ReadOnly).await.unwrap();

        assert!(evaluator
            .authorize_company_owner(tx.as_mut(), owner, f.company_id)
            .await
            .is_ok());
        assert!(evaluator
            .authorize_company_admin(tx.as_mut(), admin, f.company_id)
            .await
            .is_ok());
        let err = evaluator
            .authorize_company_owner(tx.as_mut(), admin, f.company_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
