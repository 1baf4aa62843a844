//! Company registration, deactivation and company-wide positions.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use orghub_auth::rank::evaluator::INSUFFICIENT_RANK;
use orghub_core::error::AppError;
use orghub_core::result::AppResult;
use orghub_core::validation::require_id;
use orghub_entity::company::{Company, RegisterCompany};
use orghub_entity::employee::Employee;
use orghub_entity::intent::DocumentIntent;
use orghub_entity::position::{OWNER_RANK, Position, PositionSpec};

use crate::context::RequestContext;
use crate::directory::CascadeMode;
use crate::intent::IntentExecutor;
use crate::stores::{Stores, validate_payload};

/// Name of the position created for a company's owner.
const OWNER_POSITION: &str = "owner";

/// Manages companies and their positions.
#[derive(Debug, Clone)]
pub struct CompanyService {
    stores: Stores,
    executor: IntentExecutor,
}

impl CompanyService {
    /// Creates a company service.
    pub fn new(stores: Stores) -> Self {
        Self {
            executor: IntentExecutor::new(stores.clone()),
            stores,
        }
    }

    /// Register a company owned by the acting user.
    ///
    /// The company row, the owner position, the owner's employee row and
    /// the root-folder intent commit together. The root folder is created
    /// afterwards; if that fails the company is still returned and the
    /// intent is left for replay.
    #[tracing::instrument(skip(self, ctx, payload), fields(user_id = %ctx.user_id, name = %payload.name))]
    pub async fn register_company(
        &self,
        ctx: &RequestContext,
        payload: RegisterCompany,
    ) -> AppResult<Company> {
        validate_payload(&payload)?;
        require_id(ctx.user_id, "user_id")?;

        let mut tx = self.stores.write().await?;
        let allocator = &self.stores.allocator;
        let company_id = allocator.allocate(tx.as_mut()).await?;
        let root_directory_id = allocator.allocate(tx.as_mut()).await?;
        let position_id = allocator.allocate(tx.as_mut()).await?;
        let employee_id = allocator.allocate(tx.as_mut()).await?;
        let intent_id = allocator.allocate(tx.as_mut()).await?;
        let now = Utc::now();

        let company = Company {
            id: company_id,
            owner_id: ctx.user_id,
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
            is_active: true,
            root_directory_id,
            created_at: now,
            updated_at: now,
        };
        tx.insert_company(&company).await?;

        tx.insert_position(&Position {
            id: position_id,
            company_id,
            name: OWNER_POSITION.to_string(),
            rank: OWNER_RANK,
            created_at: now,
        })
        .await?;

        tx.insert_employee(&Employee {
            id: employee_id,
            user_id: ctx.user_id,
            company_id,
            position_id,
            is_active: true,
            created_at: now,
        })
        .await?;

        let intent = DocumentIntent::create_root_directory(
            intent_id,
            root_directory_id,
            company_id,
            company_id,
            None,
            employee_id,
            company.name.clone(),
        );
        tx.insert_intent(&intent).await?;
        tx.commit().await?;

        info!(company_id = %company_id, owner = %ctx.user_id, "Company registered");

        if let Err(e) = self.executor.run(&intent, CascadeMode::Strict).await {
            warn!(company_id = %company_id, error = %e, "Company root folder left pending");
        }
        Ok(company)
    }

    /// Fetch a company the actor works for.
    pub async fn get_company(&self, ctx: &RequestContext, company_id: Uuid) -> AppResult<Company> {
        let mut tx = self.stores.read().await?;
        self.stores
            .evaluator
            .verify_membership(tx.as_mut(), ctx.user_id, company_id)
            .await?;
        let company = tx
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::not_found("company not found"))?;
        tx.commit().await?;
        Ok(company)
    }

    /// Deactivate a company and every employee membership in it. Owner only.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn deactivate_company(&self, ctx: &RequestContext, company_id: Uuid) -> AppResult<()> {
        let mut tx = self.stores.write().await?;
        self.stores
            .evaluator
            .authorize_company_owner(tx.as_mut(), ctx.user_id, company_id)
            .await?;

        if !tx.set_company_active(company_id, false).await? {
            return Err(AppError::not_found("company not found"));
        }
        let employees = tx.deactivate_company_employees(company_id).await?;
        tx.commit().await?;

        info!(company_id = %company_id, employees, "Company deactivated");
        Ok(())
    }

    /// Add a company-wide position.
    ///
    /// Admins may only create ranks strictly below their own; the owner
    /// may create any rank not yet taken.
    #[tracing::instrument(skip(self, ctx, payload), fields(user_id = %ctx.user_id, rank = payload.rank))]
    pub async fn create_position(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        payload: PositionSpec,
    ) -> AppResult<Position> {
        validate_payload(&payload)?;

        let mut tx = self.stores.write().await?;
        let actor = self
            .stores
            .evaluator
            .authorize_company_admin(tx.as_mut(), ctx.user_id, company_id)
            .await?;
        if !actor.is_owner() && payload.rank <= actor.company_rank() {
            return Err(AppError::authorization(INSUFFICIENT_RANK));
        }

        let position = Position {
            id: self.stores.allocator.allocate(tx.as_mut()).await?,
            company_id,
            name: payload.name,
            rank: payload.rank,
            created_at: Utc::now(),
        };
        tx.insert_position(&position).await?;
        tx.commit().await?;

        info!(company_id = %company_id, position_id = %position.id, rank = position.rank, "Position created");
        Ok(position)
    }

    /// List a company's positions, most privileged first.
    pub async fn list_positions(&self, ctx: &RequestContext, company_id: Uuid) -> AppResult<Vec<Position>> {
        let mut tx = self.stores.read().await?;
        self.stores
            .evaluator
            .verify_membership(tx.as_mut(), ctx.user_id, company_id)
            .await?;
        let positions = tx.list_positions(company_id).await?;
        tx.commit().await?;
        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use orghub_core::config::AllocatorConfig;
    use orghub_core::error::ErrorKind;
    use orghub_core::traits::DocumentStore;
    use orghub_database::RelationalStore;
    use orghub_database::memory::MemoryRelationalStore;
    use orghub_docstore::memory::MemoryDocumentStore;

    use super::*;
    use crate::directory::DirectoryTreeStore;

    fn service() -> (CompanyService, Stores) {
        let relational: Arc<dyn RelationalStore> = Arc::new(MemoryRelationalStore::default());
        let documents: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let stores = Stores::new(relational, documents, &AllocatorConfig::default());
        (CompanyService::new(stores.clone()), stores)
    }

    fn payload(name: &str) -> RegisterCompany {
        RegisterCompany {
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_owner_and_root_folder() {
        let (service, stores) = service();
        let ctx = RequestContext::new(Uuid::new_v4());

        let company = service.register_company(&ctx, payload("Acme")).await.unwrap();

        let positions = service.list_positions(&ctx, company.id).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].rank, OWNER_RANK);

        let tree = DirectoryTreeStore::new(stores.documents.clone());
        let root = tree.get_directory(company.root_directory_id).await.unwrap();
        assert!(root.is_company_root());
        assert_eq!(root.title, "Acme");

        let mut tx = stores.read().await.unwrap();
        assert!(tx.list_pending_intents(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_company_name_is_conflict() {
        let (service, _) = service();
        let ctx = RequestContext::new(Uuid::new_v4());
        service.register_company(&ctx, payload("Acme")).await.unwrap();

        let err = service
            .register_company(&RequestContext::new(Uuid::new_v4()), payload("Acme"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let (service, _) = service();
        let ctx = RequestContext::new(Uuid::new_v4());
        let err = service.register_company(&ctx, payload("")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_deactivation_locks_out_employees() {
        let (service, _) = service();
        let owner = RequestContext::new(Uuid::new_v4());
        let company = service.register_company(&owner, payload("Acme")).await.unwrap();

        service.deactivate_company(&owner, company.id).await.unwrap();

        let err = service.get_company(&owner, company.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_position_rank_rules() {
        let (service, _) = service();
        let owner = RequestContext::new(Uuid::new_v4());
        let company = service.register_company(&owner, payload("Acme")).await.unwrap();

        let position = |rank| PositionSpec {
            name: format!("rank {rank}"),
            rank,
        };
        service.create_position(&owner, company.id, position(1)).await.unwrap();

        let dup = service.create_position(&owner, company.id, position(1)).await.unwrap_err();
        assert_eq!(dup.kind, ErrorKind::Conflict);

        let negative = service.create_position(&owner, company.id, position(-1)).await.unwrap_err();
        assert_eq!(negative.kind, ErrorKind::Validation);

        let stranger = RequestContext::new(Uuid::new_v4());
        let err = service.create_position(&stranger, company.id, position(5)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
