//! In-memory relational store for single-node deployments and tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_entity::company::Company;
use orghub_entity::department::Department;
use orghub_entity::employee::{DepartmentEmployee, Employee};
use orghub_entity::intent::{DocumentIntent, IntentStatus};
use orghub_entity::position::{DepartmentPosition, Position};

use crate::store::{RelationalStore, RelationalTx, TxMode, conflict, ensure_writable};

/// Every table of the relational schema.
#[derive(Debug, Default, Clone)]
struct Tables {
    used_uuids: HashSet<Uuid>,
    companies: HashMap<Uuid, Company>,
    positions: HashMap<Uuid, Position>,
    departments: HashMap<Uuid, Department>,
    department_positions: HashMap<Uuid, DepartmentPosition>,
    employees: HashMap<Uuid, Employee>,
    department_employees: HashMap<Uuid, DepartmentEmployee>,
    intents: HashMap<Uuid, DocumentIntent>,
}

/// In-memory relational store.
///
/// A transaction holds the table lock for its whole lifetime, so
/// transactions are serialized. Writes go to a private copy of the tables
/// that replaces the shared state on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelationalStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRelationalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelationalStore for MemoryRelationalStore {
    async fn begin(&self, mode: TxMode) -> AppResult<Box<dyn RelationalTx>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        debug!(%mode, "Memory transaction started");
        Ok(Box::new(MemoryTx { guard, work, mode }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// A transaction over [`MemoryRelationalStore`].
struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    mode: TxMode,
}

impl MemoryTx {
    fn write(&self, operation: &str) -> AppResult<()> {
        ensure_writable(self.mode, operation)
    }
}

fn sorted_by_rank<T>(mut rows: Vec<T>, rank: impl Fn(&T) -> i32) -> Vec<T> {
    rows.sort_by_key(|r| rank(r));
    rows
}

#[async_trait]
impl RelationalTx for MemoryTx {
    fn mode(&self) -> TxMode {
        self.mode
    }

    async fn uuid_exists(&mut self, id: Uuid) -> AppResult<bool> {
        Ok(self.work.used_uuids.contains(&id))
    }

    async fn reserve_uuid(&mut self, id: Uuid) -> AppResult<bool> {
        self.write("reserve_uuid")?;
        Ok(self.work.used_uuids.insert(id))
    }

    async fn count_reserved_uuids(&mut self) -> AppResult<u64> {
        Ok(self.work.used_uuids.len() as u64)
    }

    async fn insert_company(&mut self, company: &Company) -> AppResult<()> {
        self.write("insert_company")?;
        if self.work.companies.contains_key(&company.id) {
            return Err(AppError::conflict(conflict::PRIMARY_KEY));
        }
        if self.work.companies.values().any(|c| c.name == company.name) {
            return Err(AppError::conflict(conflict::COMPANY_NAME));
        }
        self.work.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn find_company(&mut self, id: Uuid) -> AppResult<Option<Company>> {
        Ok(self.work.companies.get(&id).cloned())
    }

    async fn set_company_active(&mut self, id: Uuid, active: bool) -> AppResult<bool> {
        self.write("set_company_active")?;
        Ok(match self.work.companies.get_mut(&id) {
            Some(company) => {
                company.is_active = active;
                company.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn insert_position(&mut self, position: &Position) -> AppResult<()> {
        self.write("insert_position")?;
        if self.work.positions.contains_key(&position.id) {
            return Err(AppError::conflict(conflict::PRIMARY_KEY));
        }
        if self
            .work
            .positions
            .values()
            .any(|p| p.company_id == position.company_id && p.rank == position.rank)
        {
            return Err(AppError::conflict(conflict::POSITION_RANK));
        }
        self.work.positions.insert(position.id, position.clone());
        Ok(())
    }

    async fn find_position(&mut self, id: Uuid) -> AppResult<Option<Position>> {
        Ok(self.work.positions.get(&id).cloned())
    }

    async fn list_positions(&mut self, company_id: Uuid) -> AppResult<Vec<Position>> {
        let rows = self
            .work
            .positions
            .values()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect();
        Ok(sorted_by_rank(rows, |p: &Position| p.rank))
    }

    async fn insert_department(&mut self, department: &Department) -> AppResult<()> {
        self.write("insert_department")?;
        if self.work.departments.contains_key(&department.id) {
            return Err(AppError::conflict(conflict::PRIMARY_KEY));
        }
        self.work
            .departments
            .insert(department.id, department.clone());
        Ok(())
    }

    async fn find_department(&mut self, id: Uuid) -> AppResult<Option<Department>> {
        Ok(self.work.departments.get(&id).cloned())
    }

    async fn update_department(&mut self, department: &Department) -> AppResult<bool> {
        self.write("update_department")?;
        Ok(match self.work.departments.get_mut(&department.id) {
            Some(row) => {
                *row = department.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_department(&mut self, id: Uuid) -> AppResult<bool> {
        self.write("delete_department")?;
        Ok(self.work.departments.remove(&id).is_some())
    }

    async fn list_child_departments(&mut self, parent_id: Uuid) -> AppResult<Vec<Department>> {
        let mut rows: Vec<Department> = self
            .work
            .departments
            .values()
            .filter(|d| d.parent_id == parent_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_department_position(&mut self, position: &DepartmentPosition) -> AppResult<()> {
        self.write("insert_department_position")?;
        if self.work.department_positions.contains_key(&position.id) {
            return Err(AppError::conflict(conflict::PRIMARY_KEY));
        }
        if self
            .work
            .department_positions
            .values()
            .any(|p| p.department_id == position.department_id && p.rank == position.rank)
        {
            return Err(AppError::conflict(conflict::DEPARTMENT_POSITION_RANK));
        }
        self.work
            .department_positions
            .insert(position.id, position.clone());
        Ok(())
    }

    async fn find_department_position(&mut self, id: Uuid) -> AppResult<Option<DepartmentPosition>> {
        Ok(self.work.department_positions.get(&id).cloned())
    }

    async fn update_department_position(
        &mut self,
        position: &DepartmentPosition,
    ) -> AppResult<bool> {
        self.write("update_department_position")?;
        if self.work.department_positions.values().any(|p| {
            p.id != position.id
                && p.department_id == position.department_id
                && p.rank == position.rank
        }) {
            return Err(AppError::conflict(conflict::DEPARTMENT_POSITION_RANK));
        }
        Ok(match self.work.department_positions.get_mut(&position.id) {
            Some(row) => {
                *row = position.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_department_position(&mut self, id: Uuid) -> AppResult<bool> {
        self.write("delete_department_position")?;
        Ok(self.work.department_positions.remove(&id).is_some())
    }

    async fn list_department_positions(
        &mut self,
        department_id: Uuid,
    ) -> AppResult<Vec<DepartmentPosition>> {
        let rows = self
            .work
            .department_positions
            .values()
            .filter(|p| p.department_id == department_id)
            .cloned()
            .collect();
        Ok(sorted_by_rank(rows, |p: &DepartmentPosition| p.rank))
    }

    async fn delete_department_positions(&mut self, department_id: Uuid) -> AppResult<u64> {
        self.write("delete_department_positions")?;
        let before = self.work.department_positions.len();
        self.work
            .department_positions
            .retain(|_, p| p.department_id != department_id);
        Ok((before - self.work.department_positions.len()) as u64)
    }

    async fn insert_employee(&mut self, employee: &Employee) -> AppResult<()> {
        self.write("insert_employee")?;
        if self.work.employees.contains_key(&employee.id) {
            return Err(AppError::conflict(conflict::PRIMARY_KEY));
        }
        if self
            .work
            .employees
            .values()
            .any(|e| e.user_id == employee.user_id && e.company_id == employee.company_id)
        {
            return Err(AppError::conflict(conflict::EMPLOYEE));
        }
        self.work.employees.insert(employee.id, employee.clone());
        Ok(())
    }

    async fn find_employee(&mut self, id: Uuid) -> AppResult<Option<Employee>> {
        Ok(self.work.employees.get(&id).cloned())
    }

    async fn find_employee_by_user(
        &mut self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Option<Employee>> {
        Ok(self
            .work
            .employees
            .values()
            .find(|e| e.user_id == user_id && e.company_id == company_id)
            .cloned())
    }

    async fn set_employee_active(&mut self, id: Uuid, active: bool) -> AppResult<bool> {
        self.write("set_employee_active")?;
        Ok(match self.work.employees.get_mut(&id) {
            Some(row) => {
                row.is_active = active;
                true
            }
            None => false,
        })
    }

    async fn reactivate_employee(&mut self, id: Uuid, position_id: Uuid) -> AppResult<bool> {
        self.write("reactivate_employee")?;
        Ok(match self.work.employees.get_mut(&id) {
            Some(row) => {
                row.is_active = true;
                row.position_id = position_id;
                true
            }
            None => false,
        })
    }

    async fn deactivate_company_employees(&mut self, company_id: Uuid) -> AppResult<u64> {
        self.write("deactivate_company_employees")?;
        let mut changed = 0;
        for employee in self.work.employees.values_mut() {
            if employee.company_id == company_id && employee.is_active {
                employee.is_active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_department_employee(&mut self, member: &DepartmentEmployee) -> AppResult<()> {
        self.write("insert_department_employee")?;
        if self.work.department_employees.contains_key(&member.id) {
            return Err(AppError::conflict(conflict::PRIMARY_KEY));
        }
        if self.work.department_employees.values().any(|m| {
            m.employee_id == member.employee_id && m.department_id == member.department_id
        }) {
            return Err(AppError::conflict(conflict::DEPARTMENT_MEMBER));
        }
        self.work
            .department_employees
            .insert(member.id, member.clone());
        Ok(())
    }

    async fn find_department_employee(
        &mut self,
        employee_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<Option<DepartmentEmployee>> {
        Ok(self
            .work
            .department_employees
            .values()
            .find(|m| m.employee_id == employee_id && m.department_id == department_id)
            .cloned())
    }

    async fn count_department_position_holders(&mut self, position_id: Uuid) -> AppResult<u64> {
        Ok(self
            .work
            .department_employees
            .values()
            .filter(|m| m.department_position_id == position_id)
            .count() as u64)
    }

    async fn delete_department_employees(&mut self, department_id: Uuid) -> AppResult<u64> {
        self.write("delete_department_employees")?;
        let before = self.work.department_employees.len();
        self.work
            .department_employees
            .retain(|_, m| m.department_id != department_id);
        Ok((before - self.work.department_employees.len()) as u64)
    }

    async fn delete_employee_memberships(&mut self, employee_id: Uuid) -> AppResult<u64> {
        self.write("delete_employee_memberships")?;
        let before = self.work.department_employees.len();
        self.work
            .department_employees
            .retain(|_, m| m.employee_id != employee_id);
        Ok((before - self.work.department_employees.len()) as u64)
    }

    async fn insert_intent(&mut self, intent: &DocumentIntent) -> AppResult<()> {
        self.write("insert_intent")?;
        if self.work.intents.contains_key(&intent.id) {
            return Err(AppError::conflict(conflict::PRIMARY_KEY));
        }
        self.work.intents.insert(intent.id, intent.clone());
        Ok(())
    }

    async fn list_pending_intents(&mut self, limit: u32) -> AppResult<Vec<DocumentIntent>> {
        let mut rows: Vec<DocumentIntent> = self
            .work
            .intents
            .values()
            .filter(|i| i.is_pending())
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.created_at);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn find_intent(&mut self, id: Uuid) -> AppResult<Option<DocumentIntent>> {
        Ok(self.work.intents.get(&id).cloned())
    }

    async fn complete_intent(&mut self, id: Uuid) -> AppResult<bool> {
        self.write("complete_intent")?;
        Ok(match self.work.intents.get_mut(&id) {
            Some(intent) => {
                intent.status = IntentStatus::Completed;
                intent.completed_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }

    async fn record_intent_failure(&mut self, id: Uuid, error: &str) -> AppResult<bool> {
        self.write("record_intent_failure")?;
        Ok(match self.work.intents.get_mut(&id) {
            Some(intent) => {
                intent.attempts += 1;
                intent.last_error = Some(error.to_string());
                true
            }
            None => false,
        })
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, work, .. } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orghub_core::ErrorKind;

    fn company(name: &str) -> Company {
        let now = Utc::now();
        Company {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            is_active: true,
            root_directory_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = MemoryRelationalStore::new();
        let acme = company("Acme");

        let mut tx = store.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_company(&acme).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin(TxMode::ReadOnly).await.unwrap();
        assert!(tx.find_company(acme.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_committed_writes_are_visible() {
        let store = MemoryRelationalStore::new();
        let acme = company("Acme");

        let mut tx = store.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_company(&acme).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(TxMode::ReadOnly).await.unwrap();
        assert_eq!(tx.find_company(acme.id).await.unwrap(), Some(acme));
    }

    #[tokio::test]
    async fn test_duplicate_company_name_is_conflict() {
        let store = MemoryRelationalStore::new();
        let mut tx = store.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_company(&company("Acme")).await.unwrap();

        let err = tx.insert_company(&company("Acme")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, conflict::COMPANY_NAME);
    }

    #[tokio::test]
    async fn test_read_only_transaction_rejects_writes() {
        let store = MemoryRelationalStore::new();
        let mut tx = store.begin(TxMode::ReadOnly).await.unwrap();

        let err = tx.reserve_uuid(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_reserve_uuid_reports_duplicates() {
        let store = MemoryRelationalStore::new();
        let id = Uuid::new_v4();
        let mut tx = store.begin(TxMode::ReadWrite).await.unwrap();

        assert!(tx.reserve_uuid(id).await.unwrap());
        assert!(!tx.reserve_uuid(id).await.unwrap());
        assert_eq!(tx.count_reserved_uuids().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_department_position_rank_unique_on_update() {
        let store = MemoryRelationalStore::new();
        let department_id = Uuid::new_v4();
        let now = Utc::now();
        let owner = DepartmentPosition {
            id: Uuid::new_v4(),
            department_id,
            name: "owner".to_string(),
            rank: 0,
            created_at: now,
        };
        let mut member = DepartmentPosition {
            id: Uuid::new_v4(),
            department_id,
            name: "member".to_string(),
            rank: 5,
            created_at: now,
        };

        let mut tx = store.begin(TxMode::ReadWrite).await.unwrap();
        tx.insert_department_position(&owner).await.unwrap();
        tx.insert_department_position(&member).await.unwrap();

        member.rank = 0;
        let err = tx.update_department_position(&member).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        member.rank = 3;
        assert!(tx.update_department_position(&member).await.unwrap());
    }
}
