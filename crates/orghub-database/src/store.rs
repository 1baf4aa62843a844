//! Relational store traits.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_entity::company::Company;
use orghub_entity::department::Department;
use orghub_entity::employee::{DepartmentEmployee, Employee};
use orghub_entity::intent::DocumentIntent;
use orghub_entity::position::{DepartmentPosition, Position};

/// Whether a transaction may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Mutating use cases.
    ReadWrite,
    /// Pure queries.
    ReadOnly,
}

impl fmt::Display for TxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadWrite => write!(f, "read-write"),
            Self::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Reject a write issued inside a read-only transaction.
pub fn ensure_writable(mode: TxMode, operation: &str) -> AppResult<()> {
    match mode {
        TxMode::ReadWrite => Ok(()),
        TxMode::ReadOnly => Err(AppError::internal(format!(
            "{operation} issued inside a read-only transaction"
        ))),
    }
}

/// Messages reported for uniqueness violations, shared by every provider.
pub mod conflict {
    /// `companies.name`
    pub const COMPANY_NAME: &str = "a company with this name already exists";
    /// `positions (company_id, rank)`
    pub const POSITION_RANK: &str = "this rank is already used in the company";
    /// `department_positions (department_id, rank)`
    pub const DEPARTMENT_POSITION_RANK: &str = "this rank is already used in the department";
    /// `employee_company (user_id, company_id)`
    pub const EMPLOYEE: &str = "the user is already an employee of this company";
    /// `employee_department (employee_id, department_id)`
    pub const DEPARTMENT_MEMBER: &str = "the employee is already a member of this department";
    /// Any primary key.
    pub const PRIMARY_KEY: &str = "a row with this identifier already exists";
}

/// A relational store backend.
#[async_trait]
pub trait RelationalStore: Send + Sync + fmt::Debug + 'static {
    /// Open a transaction.
    async fn begin(&self, mode: TxMode) -> AppResult<Box<dyn RelationalTx>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// One relational transaction. Dropping it without committing rolls back.
#[async_trait]
pub trait RelationalTx: Send {
    /// The mode the transaction was opened with.
    fn mode(&self) -> TxMode;

    // ── used_uuids ───────────────────────────────────────────────

    /// Whether `id` is recorded in the allocation table.
    async fn uuid_exists(&mut self, id: Uuid) -> AppResult<bool>;

    /// Record `id` in the allocation table. Returns `false` if it was already there.
    async fn reserve_uuid(&mut self, id: Uuid) -> AppResult<bool>;

    /// Number of identifiers ever issued.
    async fn count_reserved_uuids(&mut self) -> AppResult<u64>;

    // ── companies ────────────────────────────────────────────────

    /// Insert a company row.
    async fn insert_company(&mut self, company: &Company) -> AppResult<()>;

    /// Find a company by id.
    async fn find_company(&mut self, id: Uuid) -> AppResult<Option<Company>>;

    /// Set the active flag. Returns `false` if the company does not exist.
    async fn set_company_active(&mut self, id: Uuid, active: bool) -> AppResult<bool>;

    // ── positions ────────────────────────────────────────────────

    /// Insert a company position.
    async fn insert_position(&mut self, position: &Position) -> AppResult<()>;

    /// Find a company position by id.
    async fn find_position(&mut self, id: Uuid) -> AppResult<Option<Position>>;

    /// List a company's positions ordered by rank.
    async fn list_positions(&mut self, company_id: Uuid) -> AppResult<Vec<Position>>;

    // ── departments ──────────────────────────────────────────────

    /// Insert a department row.
    async fn insert_department(&mut self, department: &Department) -> AppResult<()>;

    /// Find a department by id.
    async fn find_department(&mut self, id: Uuid) -> AppResult<Option<Department>>;

    /// Overwrite a department row. Returns `false` if it does not exist.
    async fn update_department(&mut self, department: &Department) -> AppResult<bool>;

    /// Delete a department row. Returns `false` if it does not exist.
    async fn delete_department(&mut self, id: Uuid) -> AppResult<bool>;

    /// List the direct children of a department (or of a company, for top-level departments).
    async fn list_child_departments(&mut self, parent_id: Uuid) -> AppResult<Vec<Department>>;

    // ── department_positions ─────────────────────────────────────

    /// Insert a department position.
    async fn insert_department_position(&mut self, position: &DepartmentPosition) -> AppResult<()>;

    /// Find a department position by id.
    async fn find_department_position(&mut self, id: Uuid) -> AppResult<Option<DepartmentPosition>>;

    /// Overwrite a department position. Returns `false` if it does not exist.
    async fn update_department_position(&mut self, position: &DepartmentPosition)
    -> AppResult<bool>;

    /// Delete a department position. Returns `false` if it does not exist.
    async fn delete_department_position(&mut self, id: Uuid) -> AppResult<bool>;

    /// List a department's positions ordered by rank.
    async fn list_department_positions(
        &mut self,
        department_id: Uuid,
    ) -> AppResult<Vec<DepartmentPosition>>;

    /// Delete every position of a department. Returns the number removed.
    async fn delete_department_positions(&mut self, department_id: Uuid) -> AppResult<u64>;

    // ── employee_company ─────────────────────────────────────────

    /// Insert an employee row.
    async fn insert_employee(&mut self, employee: &Employee) -> AppResult<()>;

    /// Find an employee by id.
    async fn find_employee(&mut self, id: Uuid) -> AppResult<Option<Employee>>;

    /// Find the employee row linking `user_id` to `company_id`.
    async fn find_employee_by_user(
        &mut self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Option<Employee>>;

    /// Set an employee's active flag. Returns `false` if the row does not exist.
    async fn set_employee_active(&mut self, id: Uuid, active: bool) -> AppResult<bool>;

    /// Reactivate an employee row at `position_id`. Returns `false` if the row does not exist.
    async fn reactivate_employee(&mut self, id: Uuid, position_id: Uuid) -> AppResult<bool>;

    /// Deactivate every employee of a company. Returns the number of rows changed.
    async fn deactivate_company_employees(&mut self, company_id: Uuid) -> AppResult<u64>;

    // ── employee_department ──────────────────────────────────────

    /// Insert a department membership.
    async fn insert_department_employee(&mut self, member: &DepartmentEmployee) -> AppResult<()>;

    /// Find an employee's membership in a department.
    async fn find_department_employee(
        &mut self,
        employee_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<Option<DepartmentEmployee>>;

    /// Number of memberships holding a department position.
    async fn count_department_position_holders(&mut self, position_id: Uuid) -> AppResult<u64>;

    /// Delete every membership of a department. Returns the number removed.
    async fn delete_department_employees(&mut self, department_id: Uuid) -> AppResult<u64>;

    /// Delete every department membership of an employee. Returns the number removed.
    async fn delete_employee_memberships(&mut self, employee_id: Uuid) -> AppResult<u64>;

    // ── document_intents ─────────────────────────────────────────

    /// Record a pending document-store operation.
    async fn insert_intent(&mut self, intent: &DocumentIntent) -> AppResult<()>;

    /// Oldest pending intents first.
    async fn list_pending_intents(&mut self, limit: u32) -> AppResult<Vec<DocumentIntent>>;

    /// Find an intent by id.
    async fn find_intent(&mut self, id: Uuid) -> AppResult<Option<DocumentIntent>>;

    /// Mark an intent confirmed. Returns `false` if it does not exist.
    async fn complete_intent(&mut self, id: Uuid) -> AppResult<bool>;

    /// Count a failed attempt. Returns `false` if the intent does not exist.
    async fn record_intent_failure(&mut self, id: Uuid, error: &str) -> AppResult<bool>;

    // ── lifecycle ────────────────────────────────────────────────

    /// Commit the transaction.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Roll the transaction back.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
