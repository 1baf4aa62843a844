//! Access-list management for folders and notebooks.

use tracing::info;
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::validation::require_id;
use orghub_entity::permission::{AccessLevel, Permission, PermissionScope};

use crate::context::RequestContext;
use crate::directory::DirectoryTreeStore;
use crate::permission::guard::ResourceGuard;
use crate::stores::Stores;

/// Grants, revokes and reads resource access lists.
#[derive(Debug, Clone)]
pub struct AccessService {
    stores: Stores,
    tree: DirectoryTreeStore,
    guard: ResourceGuard,
}

impl AccessService {
    /// Creates an access service.
    pub fn new(stores: Stores) -> Self {
        Self {
            tree: DirectoryTreeStore::new(stores.documents.clone()),
            guard: ResourceGuard::new(stores.clone()),
            stores,
        }
    }

    /// Company and division of the protected resource.
    async fn owner_of(&self, scope: PermissionScope, resource_id: Uuid) -> AppResult<(Uuid, Option<Uuid>)> {
        match scope {
            PermissionScope::Directory => {
                let directory = self.tree.get_directory(resource_id).await?;
                Ok((directory.company_id, directory.division_id))
            }
            PermissionScope::Notebook => {
                let notebook = self.tree.get_notebook(resource_id).await?;
                Ok((notebook.company_id, notebook.division_id))
            }
        }
    }

    /// Read a resource's access list.
    pub async fn get_permission(
        &self,
        ctx: &RequestContext,
        scope: PermissionScope,
        resource_id: Uuid,
    ) -> AppResult<Permission> {
        require_id(resource_id, "resource_id")?;
        let (company_id, division_id) = self.owner_of(scope, resource_id).await?;
        let permission = self.tree.get_permission(resource_id).await?;
        self.guard
            .require(ctx, company_id, division_id, Some(&permission), AccessLevel::ReadOnly)
            .await?;
        Ok(permission)
    }

    /// Grant `level` on a resource to an employee of the same company.
    pub async fn grant_access(
        &self,
        ctx: &RequestContext,
        scope: PermissionScope,
        resource_id: Uuid,
        employee_id: Uuid,
        level: AccessLevel,
    ) -> AppResult<Permission> {
        require_id(resource_id, "resource_id")?;
        require_id(employee_id, "employee_id")?;
        let (company_id, division_id) = self.owner_of(scope, resource_id).await?;
        let mut permission = self.tree.get_permission(resource_id).await?;
        self.guard
            .require(ctx, company_id, division_id, Some(&permission), AccessLevel::FullAccess)
            .await?;

        let mut tx = self.stores.read().await?;
        let grantee = tx.find_employee(employee_id).await?;
        tx.commit().await?;
        match grantee {
            Some(e) if e.company_id == company_id && e.is_active => {}
            _ => return Err(AppError::not_found("employee not found")),
        }

        permission.grant(employee_id, level);
        self.tree.save_permission(&permission).await?;

        info!(
            resource_id = %resource_id,
            scope = %scope,
            employee_id = %employee_id,
            level = %level,
            "Access granted"
        );
        Ok(permission)
    }

    /// Remove an employee from every access list of a resource.
    pub async fn revoke_access(
        &self,
        ctx: &RequestContext,
        scope: PermissionScope,
        resource_id: Uuid,
        employee_id: Uuid,
    ) -> AppResult<Permission> {
        require_id(resource_id, "resource_id")?;
        require_id(employee_id, "employee_id")?;
        let (company_id, division_id) = self.owner_of(scope, resource_id).await?;
        let mut permission = self.tree.get_permission(resource_id).await?;
        self.guard
            .require(ctx, company_id, division_id, Some(&permission), AccessLevel::FullAccess)
            .await?;

        if !permission.revoke(employee_id) {
            return Err(AppError::not_found("no access granted to this employee"));
        }
        self.tree.save_permission(&permission).await?;

        info!(resource_id = %resource_id, scope = %scope, employee_id = %employee_id, "Access revoked");
        Ok(permission)
    }
}
