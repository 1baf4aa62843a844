//! Folder use cases: access checks, identifier allocation and cascade delete.

use tracing::info;
use uuid::Uuid;

use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::validation::{require_id, require_text};
use orghub_entity::directory::{Directory, DirectoryPatch, NewDirectory};
use orghub_entity::intent::DocumentIntent;
use orghub_entity::permission::AccessLevel;

use crate::context::RequestContext;
use crate::directory::cascade::CascadeMode;
use crate::directory::cascade::CascadeReport;
use crate::directory::tree::DirectoryTreeStore;
use crate::intent::{IntentExecutor, IntentOutcome};
use crate::permission::ResourceGuard;
use crate::stores::{Stores, validate_payload};

/// Manages folders.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    stores: Stores,
    tree: DirectoryTreeStore,
    guard: ResourceGuard,
    executor: IntentExecutor,
}

impl DirectoryService {
    /// Creates a directory service.
    pub fn new(stores: Stores) -> Self {
        Self {
            tree: DirectoryTreeStore::new(stores.documents.clone()),
            guard: ResourceGuard::new(stores.clone()),
            executor: IntentExecutor::new(stores.clone()),
            stores,
        }
    }

    /// Create a folder under an existing folder.
    ///
    /// Company root folders are only created when the company is registered,
    /// so `parent` may not be the company identifier. A folder without an
    /// explicit division inherits its parent's.
    #[tracing::instrument(skip(self, ctx, new), fields(user_id = %ctx.user_id, parent = %new.parent))]
    pub async fn create_directory(
        &self,
        ctx: &RequestContext,
        mut new: NewDirectory,
    ) -> AppResult<Directory> {
        validate_payload(&new)?;
        require_text(&new.title, "title")?;
        require_id(new.company_id, "company_id")?;
        require_id(new.parent, "parent")?;
        if new.parent == new.company_id {
            return Err(AppError::validation(
                "folders must be created inside the company root folder",
            ));
        }

        let parent = self.tree.get_directory(new.parent).await?;
        if parent.company_id != new.company_id {
            return Err(AppError::validation(
                "parent directory belongs to another company",
            ));
        }
        let permission = self.tree.get_permission(parent.id).await?;
        let actor = self
            .guard
            .require(
                ctx,
                parent.company_id,
                parent.division_id,
                Some(&permission),
                AccessLevel::FullAccess,
            )
            .await?;
        new.division_id = new.division_id.or(parent.division_id);

        if let Some(division_id) = new.division_id {
            let mut tx = self.stores.read().await?;
            self.stores
                .evaluator
                .resolve_department(tx.as_mut(), new.company_id, division_id)
                .await?;
            tx.commit().await?;
        }

        let id = self.stores.allocate_id().await?;
        let directory = self.tree.create_directory(id, new, actor.employee.id).await?;

        info!(directory_id = %id, company_id = %directory.company_id, "Directory created");
        Ok(directory)
    }

    /// Fetch a folder the actor may read.
    pub async fn get_directory(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Directory> {
        let directory = self.tree.get_directory(id).await?;
        let permission = self.tree.get_permission(id).await?;
        self.guard
            .require(
                ctx,
                directory.company_id,
                directory.division_id,
                Some(&permission),
                AccessLevel::ReadOnly,
            )
            .await?;
        Ok(directory)
    }

    /// Change a folder's title or description.
    #[tracing::instrument(skip(self, ctx, patch), fields(user_id = %ctx.user_id))]
    pub async fn update_directory(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: DirectoryPatch,
    ) -> AppResult<Directory> {
        validate_payload(&patch)?;
        let directory = self.tree.get_directory(id).await?;
        let permission = self.tree.get_permission(id).await?;
        self.guard
            .require(
                ctx,
                directory.company_id,
                directory.division_id,
                Some(&permission),
                AccessLevel::FullAccess,
            )
            .await?;

        let directory = self.tree.update_directory(id, patch).await?;
        info!(directory_id = %id, "Directory updated");
        Ok(directory)
    }

    /// Delete a folder with everything beneath it and detach it from its parent.
    ///
    /// Company and department root folders go away only with their owner.
    /// The deletion is recorded as an intent first; when the cascade fails
    /// the intent stays pending for replay and the error is returned.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn delete_directory(&self, ctx: &RequestContext, id: Uuid) -> AppResult<CascadeReport> {
        let directory = self.tree.get_directory(id).await?;
        let permission = self.tree.get_permission(id).await?;
        let actor = self
            .guard
            .require(
                ctx,
                directory.company_id,
                directory.division_id,
                Some(&permission),
                AccessLevel::FullAccess,
            )
            .await?;

        if directory.is_company_root() {
            return Err(AppError::validation("a company root folder cannot be deleted"));
        }

        let mut tx = self.stores.write().await?;
        if let Some(division_id) = directory.division_id {
            if let Some(department) = tx.find_department(division_id).await? {
                if department.root_directory_id == id {
                    return Err(AppError::validation(
                        "a department root folder is deleted with its department",
                    ));
                }
            }
        }
        let intent_id = self.stores.allocator.allocate(tx.as_mut()).await?;
        let intent = DocumentIntent::delete_directory(
            intent_id,
            id,
            Some(directory.parent),
            directory.company_id,
            directory.division_id,
            actor.employee.id,
        );
        tx.insert_intent(&intent).await?;
        tx.commit().await?;

        let report = match self.executor.run(&intent, CascadeMode::Strict).await? {
            IntentOutcome::Deleted(report) => report,
            _ => CascadeReport::default(),
        };

        info!(
            directory_id = %id,
            directories = report.directories,
            notebooks = report.notebooks,
            "Directory deleted"
        );
        Ok(report)
    }
}
