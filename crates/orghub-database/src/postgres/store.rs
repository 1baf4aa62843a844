//! PostgreSQL implementation of [`RelationalStore`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use orghub_core::result::AppResult;
use orghub_core::with_deadline;
use orghub_entity::company::Company;
use orghub_entity::department::Department;
use orghub_entity::employee::{DepartmentEmployee, Employee};
use orghub_entity::intent::DocumentIntent;
use orghub_entity::position::{DepartmentPosition, Position};

use crate::connection::DatabasePool;
use crate::error::map_sqlx_error;
use crate::store::{RelationalStore, RelationalTx, TxMode, ensure_writable};

/// Run one sqlx call under the store-call deadline.
async fn guarded<T, F>(limit: Duration, operation: &str, call: F) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    with_deadline(limit, operation, async {
        call.await.map_err(|e| map_sqlx_error(operation, e))
    })
    .await
}

/// Relational store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgRelationalStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgRelationalStore {
    /// Create a store over `pool`; every statement is bounded by `timeout`.
    pub fn new(pool: &DatabasePool, timeout: Duration) -> Self {
        Self {
            pool: pool.pool().clone(),
            timeout,
        }
    }
}

#[async_trait]
impl RelationalStore for PgRelationalStore {
    async fn begin(&self, mode: TxMode) -> AppResult<Box<dyn RelationalTx>> {
        let mut tx = guarded(self.timeout, "begin", self.pool.begin()).await?;
        if mode == TxMode::ReadOnly {
            guarded(
                self.timeout,
                "begin",
                sqlx::query("SET TRANSACTION READ ONLY").execute(&mut *tx),
            )
            .await?;
        }
        debug!(%mode, "PostgreSQL transaction started");
        Ok(Box::new(PgTx {
            tx,
            mode,
            timeout: self.timeout,
        }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        guarded(
            self.timeout,
            "health_check",
            sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool),
        )
        .await
        .map(|v| v == 1)
    }
}

/// A transaction over [`PgRelationalStore`].
struct PgTx {
    tx: Transaction<'static, Postgres>,
    mode: TxMode,
    timeout: Duration,
}

#[async_trait]
impl RelationalTx for PgTx {
    fn mode(&self) -> TxMode {
        self.mode
    }

    async fn uuid_exists(&mut self, id: Uuid) -> AppResult<bool> {
        guarded(
            self.timeout,
            "uuid_exists",
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM used_uuids WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *self.tx),
        )
        .await
    }

    async fn reserve_uuid(&mut self, id: Uuid) -> AppResult<bool> {
        ensure_writable(self.mode, "reserve_uuid")?;
        let result = guarded(
            self.timeout,
            "reserve_uuid",
            sqlx::query("INSERT INTO used_uuids (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
                .bind(id)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_reserved_uuids(&mut self) -> AppResult<u64> {
        let count = guarded(
            self.timeout,
            "count_reserved_uuids",
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM used_uuids").fetch_one(&mut *self.tx),
        )
        .await?;
        Ok(count as u64)
    }

    async fn insert_company(&mut self, company: &Company) -> AppResult<()> {
        ensure_writable(self.mode, "insert_company")?;
        guarded(
            self.timeout,
            "insert_company",
            sqlx::query(
                "INSERT INTO companies (id, owner_id, name, email, phone, address, is_active, \
                 root_directory_id, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(company.id)
            .bind(company.owner_id)
            .bind(&company.name)
            .bind(&company.email)
            .bind(&company.phone)
            .bind(&company.address)
            .bind(company.is_active)
            .bind(company.root_directory_id)
            .bind(company.created_at)
            .bind(company.updated_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn find_company(&mut self, id: Uuid) -> AppResult<Option<Company>> {
        guarded(
            self.timeout,
            "find_company",
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn set_company_active(&mut self, id: Uuid, active: bool) -> AppResult<bool> {
        ensure_writable(self.mode, "set_company_active")?;
        let result = guarded(
            self.timeout,
            "set_company_active",
            sqlx::query("UPDATE companies SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_position(&mut self, position: &Position) -> AppResult<()> {
        ensure_writable(self.mode, "insert_position")?;
        guarded(
            self.timeout,
            "insert_position",
            sqlx::query(
                "INSERT INTO positions (id, company_id, name, rank, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(position.id)
            .bind(position.company_id)
            .bind(&position.name)
            .bind(position.rank)
            .bind(position.created_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn find_position(&mut self, id: Uuid) -> AppResult<Option<Position>> {
        guarded(
            self.timeout,
            "find_position",
            sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn list_positions(&mut self, company_id: Uuid) -> AppResult<Vec<Position>> {
        guarded(
            self.timeout,
            "list_positions",
            sqlx::query_as::<_, Position>(
                "SELECT * FROM positions WHERE company_id = $1 ORDER BY rank",
            )
            .bind(company_id)
            .fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn insert_department(&mut self, department: &Department) -> AppResult<()> {
        ensure_writable(self.mode, "insert_department")?;
        guarded(
            self.timeout,
            "insert_department",
            sqlx::query(
                "INSERT INTO departments (id, company_id, parent_id, name, description, \
                 root_directory_id, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(department.id)
            .bind(department.company_id)
            .bind(department.parent_id)
            .bind(&department.name)
            .bind(&department.description)
            .bind(department.root_directory_id)
            .bind(department.created_at)
            .bind(department.updated_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn find_department(&mut self, id: Uuid) -> AppResult<Option<Department>> {
        guarded(
            self.timeout,
            "find_department",
            sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn update_department(&mut self, department: &Department) -> AppResult<bool> {
        ensure_writable(self.mode, "update_department")?;
        let result = guarded(
            self.timeout,
            "update_department",
            sqlx::query(
                "UPDATE departments SET parent_id = $2, name = $3, description = $4, \
                 updated_at = $5 WHERE id = $1",
            )
            .bind(department.id)
            .bind(department.parent_id)
            .bind(&department.name)
            .bind(&department.description)
            .bind(department.updated_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_department(&mut self, id: Uuid) -> AppResult<bool> {
        ensure_writable(self.mode, "delete_department")?;
        let result = guarded(
            self.timeout,
            "delete_department",
            sqlx::query("DELETE FROM departments WHERE id = $1")
                .bind(id)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_child_departments(&mut self, parent_id: Uuid) -> AppResult<Vec<Department>> {
        guarded(
            self.timeout,
            "list_child_departments",
            sqlx::query_as::<_, Department>(
                "SELECT * FROM departments WHERE parent_id = $1 ORDER BY name",
            )
            .bind(parent_id)
            .fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn insert_department_position(&mut self, position: &DepartmentPosition) -> AppResult<()> {
        ensure_writable(self.mode, "insert_department_position")?;
        guarded(
            self.timeout,
            "insert_department_position",
            sqlx::query(
                "INSERT INTO department_positions (id, department_id, name, rank, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(position.id)
            .bind(position.department_id)
            .bind(&position.name)
            .bind(position.rank)
            .bind(position.created_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn find_department_position(&mut self, id: Uuid) -> AppResult<Option<DepartmentPosition>> {
        guarded(
            self.timeout,
            "find_department_position",
            sqlx::query_as::<_, DepartmentPosition>(
                "SELECT * FROM department_positions WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn update_department_position(
        &mut self,
        position: &DepartmentPosition,
    ) -> AppResult<bool> {
        ensure_writable(self.mode, "update_department_position")?;
        let result = guarded(
            self.timeout,
            "update_department_position",
            sqlx::query("UPDATE department_positions SET name = $2, rank = $3 WHERE id = $1")
                .bind(position.id)
                .bind(&position.name)
                .bind(position.rank)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_department_position(&mut self, id: Uuid) -> AppResult<bool> {
        ensure_writable(self.mode, "delete_department_position")?;
        let result = guarded(
            self.timeout,
            "delete_department_position",
            sqlx::query("DELETE FROM department_positions WHERE id = $1")
                .bind(id)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_department_positions(
        &mut self,
        department_id: Uuid,
    ) -> AppResult<Vec<DepartmentPosition>> {
        guarded(
            self.timeout,
            "list_department_positions",
            sqlx::query_as::<_, DepartmentPosition>(
                "SELECT * FROM department_positions WHERE department_id = $1 ORDER BY rank",
            )
            .bind(department_id)
            .fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn delete_department_positions(&mut self, department_id: Uuid) -> AppResult<u64> {
        ensure_writable(self.mode, "delete_department_positions")?;
        let result = guarded(
            self.timeout,
            "delete_department_positions",
            sqlx::query("DELETE FROM department_positions WHERE department_id = $1")
                .bind(department_id)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_employee(&mut self, employee: &Employee) -> AppResult<()> {
        ensure_writable(self.mode, "insert_employee")?;
        guarded(
            self.timeout,
            "insert_employee",
            sqlx::query(
                "INSERT INTO employee_company (id, user_id, company_id, position_id, is_active, \
                 created_at) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(employee.id)
            .bind(employee.user_id)
            .bind(employee.company_id)
            .bind(employee.position_id)
            .bind(employee.is_active)
            .bind(employee.created_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn find_employee(&mut self, id: Uuid) -> AppResult<Option<Employee>> {
        guarded(
            self.timeout,
            "find_employee",
            sqlx::query_as::<_, Employee>("SELECT * FROM employee_company WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn find_employee_by_user(
        &mut self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Option<Employee>> {
        guarded(
            self.timeout,
            "find_employee_by_user",
            sqlx::query_as::<_, Employee>(
                "SELECT * FROM employee_company WHERE user_id = $1 AND company_id = $2",
            )
            .bind(user_id)
            .bind(company_id)
            .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn set_employee_active(&mut self, id: Uuid, active: bool) -> AppResult<bool> {
        ensure_writable(self.mode, "set_employee_active")?;
        let result = guarded(
            self.timeout,
            "set_employee_active",
            sqlx::query("UPDATE employee_company SET is_active = $2 WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reactivate_employee(&mut self, id: Uuid, position_id: Uuid) -> AppResult<bool> {
        ensure_writable(self.mode, "reactivate_employee")?;
        let result = guarded(
            self.timeout,
            "reactivate_employee",
            sqlx::query(
                "UPDATE employee_company SET is_active = TRUE, position_id = $2 WHERE id = $1",
            )
            .bind(id)
            .bind(position_id)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_company_employees(&mut self, company_id: Uuid) -> AppResult<u64> {
        ensure_writable(self.mode, "deactivate_company_employees")?;
        let result = guarded(
            self.timeout,
            "deactivate_company_employees",
            sqlx::query(
                "UPDATE employee_company SET is_active = FALSE \
                 WHERE company_id = $1 AND is_active",
            )
            .bind(company_id)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_department_employee(&mut self, member: &DepartmentEmployee) -> AppResult<()> {
        ensure_writable(self.mode, "insert_department_employee")?;
        guarded(
            self.timeout,
            "insert_department_employee",
            sqlx::query(
                "INSERT INTO employee_department (id, employee_id, department_id, \
                 department_position_id, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(member.id)
            .bind(member.employee_id)
            .bind(member.department_id)
            .bind(member.department_position_id)
            .bind(member.created_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn find_department_employee(
        &mut self,
        employee_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<Option<DepartmentEmployee>> {
        guarded(
            self.timeout,
            "find_department_employee",
            sqlx::query_as::<_, DepartmentEmployee>(
                "SELECT * FROM employee_department WHERE employee_id = $1 AND department_id = $2",
            )
            .bind(employee_id)
            .bind(department_id)
            .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn count_department_position_holders(&mut self, position_id: Uuid) -> AppResult<u64> {
        let count = guarded(
            self.timeout,
            "count_department_position_holders",
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM employee_department WHERE department_position_id = $1",
            )
            .bind(position_id)
            .fetch_one(&mut *self.tx),
        )
        .await?;
        Ok(count as u64)
    }

    async fn delete_department_employees(&mut self, department_id: Uuid) -> AppResult<u64> {
        ensure_writable(self.mode, "delete_department_employees")?;
        let result = guarded(
            self.timeout,
            "delete_department_employees",
            sqlx::query("DELETE FROM employee_department WHERE department_id = $1")
                .bind(department_id)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_employee_memberships(&mut self, employee_id: Uuid) -> AppResult<u64> {
        ensure_writable(self.mode, "delete_employee_memberships")?;
        let result = guarded(
            self.timeout,
            "delete_employee_memberships",
            sqlx::query("DELETE FROM employee_department WHERE employee_id = $1")
                .bind(employee_id)
                .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_intent(&mut self, intent: &DocumentIntent) -> AppResult<()> {
        ensure_writable(self.mode, "insert_intent")?;
        guarded(
            self.timeout,
            "insert_intent",
            sqlx::query(
                "INSERT INTO document_intents (id, kind, target_id, parent_id, company_id, \
                 division_id, created_by, title, status, attempts, last_error, created_at, \
                 completed_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            )
            .bind(intent.id)
            .bind(intent.kind)
            .bind(intent.target_id)
            .bind(intent.parent_id)
            .bind(intent.company_id)
            .bind(intent.division_id)
            .bind(intent.created_by)
            .bind(&intent.title)
            .bind(intent.status)
            .bind(intent.attempts)
            .bind(&intent.last_error)
            .bind(intent.created_at)
            .bind(intent.completed_at)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(())
    }

    async fn list_pending_intents(&mut self, limit: u32) -> AppResult<Vec<DocumentIntent>> {
        guarded(
            self.timeout,
            "list_pending_intents",
            sqlx::query_as::<_, DocumentIntent>(
                "SELECT * FROM document_intents WHERE status = 'pending' \
                 ORDER BY created_at LIMIT $1",
            )
            .bind(i64::from(limit))
            .fetch_all(&mut *self.tx),
        )
        .await
    }

    async fn find_intent(&mut self, id: Uuid) -> AppResult<Option<DocumentIntent>> {
        guarded(
            self.timeout,
            "find_intent",
            sqlx::query_as::<_, DocumentIntent>("SELECT * FROM document_intents WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx),
        )
        .await
    }

    async fn complete_intent(&mut self, id: Uuid) -> AppResult<bool> {
        ensure_writable(self.mode, "complete_intent")?;
        let result = guarded(
            self.timeout,
            "complete_intent",
            sqlx::query(
                "UPDATE document_intents SET status = 'completed', completed_at = NOW() \
                 WHERE id = $1",
            )
            .bind(id)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_intent_failure(&mut self, id: Uuid, error: &str) -> AppResult<bool> {
        ensure_writable(self.mode, "record_intent_failure")?;
        let result = guarded(
            self.timeout,
            "record_intent_failure",
            sqlx::query(
                "UPDATE document_intents SET attempts = attempts + 1, last_error = $2 \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(error)
            .execute(&mut *self.tx),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgTx { tx, timeout, .. } = *self;
        guarded(timeout, "commit", tx.commit()).await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let PgTx { tx, timeout, .. } = *self;
        guarded(timeout, "rollback", tx.rollback()).await
    }
}
