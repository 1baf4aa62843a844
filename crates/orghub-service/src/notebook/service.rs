//! Notebook CRUD and threaded comments with access checks.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use orghub_auth::Actor;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::validation::{require_id, require_text};
use orghub_entity::notebook::{Comment, NewComment, NewNotebook, Notebook, NotebookPatch};
use orghub_entity::permission::{AccessLevel, Permission};

use crate::context::RequestContext;
use crate::directory::DirectoryTreeStore;
use crate::permission::ResourceGuard;
use crate::stores::{Stores, validate_payload};

/// Manages notebooks.
#[derive(Debug, Clone)]
pub struct NotebookService {
    stores: Stores,
    tree: DirectoryTreeStore,
    guard: ResourceGuard,
}

impl NotebookService {
    /// Creates a notebook service.
    pub fn new(stores: Stores) -> Self {
        Self {
            tree: DirectoryTreeStore::new(stores.documents.clone()),
            guard: ResourceGuard::new(stores.clone()),
            stores,
        }
    }

    async fn require(
        &self,
        ctx: &RequestContext,
        notebook: &Notebook,
        permission: &Permission,
        required: AccessLevel,
    ) -> AppResult<Actor> {
        self.guard
            .require(
                ctx,
                notebook.company_id,
                notebook.division_id,
                Some(permission),
                required,
            )
            .await
    }

    /// Create a notebook inside a folder the actor has full access to.
    #[tracing::instrument(skip(self, ctx, new), fields(user_id = %ctx.user_id, parent = %new.parent))]
    pub async fn create_notebook(&self, ctx: &RequestContext, mut new: NewNotebook) -> AppResult<Notebook> {
        validate_payload(&new)?;
        require_text(&new.title, "title")?;
        require_id(new.parent, "parent")?;

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

        let id = self.stores.allocate_id().await?;
        let notebook = self.tree.create_notebook(id, new, actor.employee.id).await?;

        info!(notebook_id = %id, parent = %notebook.parent, "Notebook created");
        Ok(notebook)
    }

    /// Fetch a notebook the actor may read.
    pub async fn get_notebook(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Notebook> {
        let notebook = self.tree.get_notebook(id).await?;
        let permission = self.tree.get_permission(id).await?;
        self.require(ctx, &notebook, &permission, AccessLevel::ReadOnly)
            .await?;
        Ok(notebook)
    }

    /// Update a notebook's title, description or blocks.
    #[tracing::instrument(skip(self, ctx, patch), fields(user_id = %ctx.user_id))]
    pub async fn update_notebook(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: NotebookPatch,
    ) -> AppResult<Notebook> {
        validate_payload(&patch)?;
        let notebook = self.tree.get_notebook(id).await?;
        let permission = self.tree.get_permission(id).await?;
        self.require(ctx, &notebook, &permission, AccessLevel::FullAccess)
            .await?;

        let notebook = self.tree.update_notebook(id, patch).await?;
        info!(notebook_id = %id, "Notebook updated");
        Ok(notebook)
    }

    /// Comment on a block, or reply to a comment when `reply_to` is set.
    #[tracing::instrument(skip(self, ctx, new), fields(user_id = %ctx.user_id, block_id = %new.block_id))]
    pub async fn add_comment(
        &self,
        ctx: &RequestContext,
        notebook_id: Uuid,
        new: NewComment,
    ) -> AppResult<Comment> {
        validate_payload(&new)?;
        let notebook = self.tree.get_notebook(notebook_id).await?;
        let permission = self.tree.get_permission(notebook_id).await?;
        let actor = self
            .require(ctx, &notebook, &permission, AccessLevel::CommentOnly)
            .await?;

        let comment = Comment {
            id: self.stores.allocate_id().await?,
            author: actor.employee.id,
            body: new.body,
            replies: Vec::new(),
            created_at: Utc::now(),
        };
        let comment = self
            .tree
            .add_comment(notebook_id, new.block_id, new.reply_to, comment)
            .await?;

        info!(notebook_id = %notebook_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    /// Delete a notebook with its permission record and parent stub.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn delete_notebook(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let notebook = self.tree.get_notebook(id).await?;
        let permission = self.tree.get_permission(id).await?;
        self.require(ctx, &notebook, &permission, AccessLevel::FullAccess)
            .await?;

        self.tree.delete_notebook(id).await?;
        info!(notebook_id = %id, "Notebook deleted");
        Ok(())
    }
}
