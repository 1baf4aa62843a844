//! Department tree use cases.
//!
//! Every department owns a root folder in the document store. The folder
//! lives inside the parent department's folder, or inside the company root
//! folder for top-level departments, so deleting a department's folder
//! reaches the folders of all its sub-departments.

use std::collections::VecDeque;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::validation::require_text;
use orghub_database::RelationalTx;
use orghub_entity::department::{CreateDepartment, Department, UpdateDepartment};
use orghub_entity::directory::DirectoryPatch;
use orghub_entity::employee::DepartmentEmployee;
use orghub_entity::intent::DocumentIntent;
use orghub_entity::position::{DepartmentPosition, OWNER_RANK};

use crate::context::RequestContext;
use crate::directory::{CascadeMode, CascadeReport, DirectoryTreeStore};
use crate::intent::{IntentExecutor, IntentOutcome};
use crate::stores::{Stores, validate_payload};

/// Name of the position created for a department's founder.
const OWNER_POSITION: &str = "owner";

/// The folder a department's root folder lives in.
async fn folder_parent(tx: &mut dyn RelationalTx, company_id: Uuid, parent_id: Uuid) -> AppResult<Uuid> {
    if parent_id == company_id {
        let company = tx
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::not_found("company not found"))?;
        return Ok(company.root_directory_id);
    }
    let parent = tx
        .find_department(parent_id)
        .await?
        .ok_or_else(|| AppError::not_found("department not found"))?;
    Ok(parent.root_directory_id)
}

/// Manages the department tree.
#[derive(Debug, Clone)]
pub struct DepartmentService {
    stores: Stores,
    tree: DirectoryTreeStore,
    executor: IntentExecutor,
}

impl DepartmentService {
    /// Creates a department service.
    pub fn new(stores: Stores) -> Self {
        Self {
            tree: DirectoryTreeStore::new(stores.documents.clone()),
            executor: IntentExecutor::new(stores.clone()),
            stores,
        }
    }

    /// Create a department and make the actor its owner.
    ///
    /// Any active employee may create one. The department row, its owner
    /// position, the actor's membership and the root-folder intent commit
    /// together; the folder itself is created after the commit and a
    /// failure there only leaves the intent pending.
    #[tracing::instrument(skip(self, ctx, payload), fields(user_id = %ctx.user_id, name = %payload.name))]
    pub async fn create_department(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        payload: CreateDepartment,
    ) -> AppResult<Department> {
        validate_payload(&payload)?;
        require_text(&payload.name, "name")?;
        let evaluator = &self.stores.evaluator;
        let allocator = &self.stores.allocator;

        let mut tx = self.stores.write().await?;
        let department_id = allocator.allocate(tx.as_mut()).await?;
        let actor = evaluator
            .verify_membership(tx.as_mut(), ctx.user_id, company_id)
            .await?;

        let parent_id = payload.parent_id.unwrap_or(company_id);
        if parent_id != company_id {
            evaluator
                .resolve_department(tx.as_mut(), company_id, parent_id)
                .await?;
        }
        let parent_folder = folder_parent(tx.as_mut(), company_id, parent_id).await?;

        let now = Utc::now();
        let department = Department {
            id: department_id,
            company_id,
            parent_id,
            name: payload.name,
            description: payload.description,
            root_directory_id: allocator.allocate(tx.as_mut()).await?,
            created_at: now,
            updated_at: now,
        };
        tx.insert_department(&department).await?;

        let owner_position = DepartmentPosition {
            id: allocator.allocate(tx.as_mut()).await?,
            department_id,
            name: OWNER_POSITION.to_string(),
            rank: OWNER_RANK,
            created_at: now,
        };
        tx.insert_department_position(&owner_position).await?;

        let owner_member = DepartmentEmployee {
            id: allocator.allocate(tx.as_mut()).await?,
            employee_id: actor.employee.id,
            department_id,
            department_position_id: owner_position.id,
            created_at: now,
        };
        tx.insert_department_employee(&owner_member).await?;

        let intent = DocumentIntent::create_root_directory(
            allocator.allocate(tx.as_mut()).await?,
            department.root_directory_id,
            parent_folder,
            company_id,
            Some(department_id),
            actor.employee.id,
            department.name.clone(),
        );
        tx.insert_intent(&intent).await?;
        tx.commit().await?;

        info!(department_id = %department_id, company_id = %company_id, "Department created");

        if let Err(e) = self.executor.run(&intent, CascadeMode::Strict).await {
            warn!(department_id = %department_id, error = %e, "Department root folder left pending");
        }
        Ok(department)
    }

    /// Fetch a department of the actor's company.
    pub async fn get_department(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<Department> {
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.read().await?;
        evaluator
            .verify_membership(tx.as_mut(), ctx.user_id, company_id)
            .await?;
        let department = evaluator
            .resolve_department(tx.as_mut(), company_id, department_id)
            .await?;
        tx.commit().await?;
        Ok(department)
    }

    /// List the direct children of a department, or the top-level
    /// departments when `parent_id` is the company identifier.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        parent_id: Uuid,
    ) -> AppResult<Vec<Department>> {
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.read().await?;
        evaluator
            .verify_membership(tx.as_mut(), ctx.user_id, company_id)
            .await?;
        if parent_id != company_id {
            evaluator
                .resolve_department(tx.as_mut(), company_id, parent_id)
                .await?;
        }
        let children = tx.list_child_departments(parent_id).await?;
        tx.commit().await?;
        Ok(children)
    }

    /// Rename, describe or move a department.
    ///
    /// Moving requires the department rule on the new parent too, and the
    /// new parent may not be the department itself or one of its
    /// descendants. The root folder follows the department on a best-effort
    /// basis after the commit.
    #[tracing::instrument(skip(self, ctx, payload), fields(user_id = %ctx.user_id))]
    pub async fn update_department(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
        payload: UpdateDepartment,
    ) -> AppResult<Department> {
        validate_payload(&payload)?;
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.write().await?;
        let (_, mut department) = evaluator
            .authorize_department_mutation(tx.as_mut(), ctx.user_id, company_id, department_id)
            .await?;

        let renamed = payload.name.is_some();
        if let Some(name) = payload.name {
            department.name = name;
        }
        if let Some(description) = payload.description {
            department.description = Some(description);
        }

        let mut moved_to = None;
        if let Some(parent_id) = payload.parent_id.filter(|p| *p != department.parent_id) {
            if parent_id == department_id {
                return Err(AppError::validation("a department cannot be its own parent"));
            }
            if parent_id != company_id {
                evaluator
                    .authorize_department_mutation(tx.as_mut(), ctx.user_id, company_id, parent_id)
                    .await?;
                self.ensure_not_descendant(tx.as_mut(), company_id, department_id, parent_id)
                    .await?;
            }
            department.parent_id = parent_id;
            moved_to = Some(folder_parent(tx.as_mut(), company_id, parent_id).await?);
        }

        department.updated_at = Utc::now();
        if !tx.update_department(&department).await? {
            return Err(AppError::not_found("department not found"));
        }
        tx.commit().await?;

        info!(department_id = %department_id, moved = moved_to.is_some(), "Department updated");

        let folder = department.root_directory_id;
        let result = match moved_to {
            Some(parent_folder) => self
                .tree
                .relocate_directory(folder, parent_folder, Some(department.name.clone()))
                .await
                .map(|_| ()),
            None if renamed => self
                .tree
                .update_directory(
                    folder,
                    DirectoryPatch {
                        title: Some(department.name.clone()),
                        ..DirectoryPatch::default()
                    },
                )
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        if let Err(e) = result {
            warn!(department_id = %department_id, error = %e, "Department folder not updated");
        }
        Ok(department)
    }

    /// Fail when `candidate` sits inside the subtree of `department_id`.
    async fn ensure_not_descendant(
        &self,
        tx: &mut dyn RelationalTx,
        company_id: Uuid,
        department_id: Uuid,
        candidate: Uuid,
    ) -> AppResult<()> {
        let mut current = candidate;
        while current != company_id {
            if current == department_id {
                return Err(AppError::validation(
                    "a department cannot move under one of its descendants",
                ));
            }
            current = match tx.find_department(current).await? {
                Some(d) => d.parent_id,
                None => return Err(AppError::not_found("department not found")),
            };
        }
        Ok(())
    }

    /// Delete a department, all of its sub-departments and their folders.
    ///
    /// Rows go bottom-up in one transaction together with the deletion
    /// intent. The folder cascade runs after the commit; an error there is
    /// returned and the intent stays pending for replay.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn delete_department(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        department_id: Uuid,
    ) -> AppResult<CascadeReport> {
        let evaluator = &self.stores.evaluator;
        let mut tx = self.stores.write().await?;
        let (actor, department) = evaluator
            .authorize_department_mutation(tx.as_mut(), ctx.user_id, company_id, department_id)
            .await?;

        let mut subtree = vec![department.clone()];
        let mut queue = VecDeque::from([department.id]);
        while let Some(id) = queue.pop_front() {
            for child in tx.list_child_departments(id).await? {
                queue.push_back(child.id);
                subtree.push(child);
            }
        }

        for doomed in subtree.iter().rev() {
            tx.delete_department_employees(doomed.id).await?;
            tx.delete_department_positions(doomed.id).await?;
            tx.delete_department(doomed.id).await?;
        }

        let parent_folder = folder_parent(tx.as_mut(), company_id, department.parent_id).await?;
        let intent = DocumentIntent::delete_directory(
            self.stores.allocator.allocate(tx.as_mut()).await?,
            department.root_directory_id,
            Some(parent_folder),
            company_id,
            Some(department_id),
            actor.employee.id,
        );
        tx.insert_intent(&intent).await?;
        tx.commit().await?;

        info!(
            department_id = %department_id,
            departments = subtree.len(),
            "Departments deleted"
        );

        let report = match self.executor.run(&intent, CascadeMode::Strict).await? {
            IntentOutcome::Deleted(report) => report,
            _ => CascadeReport::default(),
        };
        Ok(report)
    }
}
