//! Shared helpers for the service scenario tests.
//!
//! Everything runs against the in-memory relational and document stores.

#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use orghub_core::config::AllocatorConfig;
use orghub_core::traits::{Collection, DocumentStore};
use orghub_database::RelationalStore;
use orghub_database::memory::MemoryRelationalStore;
use orghub_docstore::memory::MemoryDocumentStore;
use orghub_entity::company::{Company, RegisterCompany};
use orghub_entity::department::{CreateDepartment, Department};
use orghub_entity::employee::Employee;
use orghub_entity::notebook::{Block, NewNotebook, Notebook};
use orghub_entity::position::PositionSpec;
use orghub_service::{
    AccessService, CompanyService, DepartmentPositionService, DepartmentService, DirectoryService,
    EmployeeService, IntentReplayer, NotebookService, RequestContext, Stores,
};

/// Services wired over fresh in-memory stores.
pub struct TestApp {
    pub stores: Stores,
    pub memory: MemoryDocumentStore,
    pub companies: CompanyService,
    pub departments: DepartmentService,
    pub department_positions: DepartmentPositionService,
    pub employees: EmployeeService,
    pub directories: DirectoryService,
    pub notebooks: NotebookService,
    pub access: AccessService,
    pub replayer: IntentReplayer,
}

impl TestApp {
    /// Create an app over an empty memory document store.
    pub fn new() -> Self {
        let memory = MemoryDocumentStore::new();
        Self::with_documents(memory.clone(), Arc::new(memory))
    }

    /// Create an app whose services use `documents`, which must wrap `memory`.
    pub fn with_documents(memory: MemoryDocumentStore, documents: Arc<dyn DocumentStore>) -> Self {
        let relational: Arc<dyn RelationalStore> = Arc::new(MemoryRelationalStore::default());
        let stores = Stores::new(relational, documents, &AllocatorConfig::default());
        Self {
            companies: CompanyService::new(stores.clone()),
            departments: DepartmentService::new(stores.clone()),
            department_positions: DepartmentPositionService::new(stores.clone()),
            employees: EmployeeService::new(stores.clone()),
            directories: DirectoryService::new(stores.clone()),
            notebooks: NotebookService::new(stores.clone()),
            access: AccessService::new(stores.clone()),
            replayer: IntentReplayer::new(stores.clone()),
            stores,
            memory,
        }
    }

    /// Register a company for a fresh user and return the owner's context.
    pub async fn register(&self, name: &str) -> (RequestContext, Company) {
        let owner = RequestContext::new(Uuid::new_v4());
        let company = self
            .companies
            .register_company(
                &owner,
                RegisterCompany {
                    name: name.to_string(),
                    email: None,
                    phone: None,
                    address: None,
                },
            )
            .await
            .expect("register company");
        (owner, company)
    }

    /// Hire a fresh user at a new company position of `rank`.
    pub async fn hire(
        &self,
        owner: &RequestContext,
        company_id: Uuid,
        rank: i32,
    ) -> (RequestContext, Employee) {
        let position = self
            .companies
            .create_position(
                owner,
                company_id,
                PositionSpec {
                    name: format!("rank {rank}"),
                    rank,
                },
            )
            .await
            .expect("create position");
        let ctx = RequestContext::new(Uuid::new_v4());
        let employee = self
            .employees
            .add_employee(owner, company_id, ctx.user_id, position.id)
            .await
            .expect("add employee");
        (ctx, employee)
    }

    /// Create a department under `parent` (the company when `None`).
    pub async fn department(
        &self,
        ctx: &RequestContext,
        company_id: Uuid,
        name: &str,
        parent: Option<Uuid>,
    ) -> Department {
        self.departments
            .create_department(
                ctx,
                company_id,
                CreateDepartment {
                    name: name.to_string(),
                    description: None,
                    parent_id: parent,
                },
            )
            .await
            .expect("create department")
    }

    /// Create a notebook with one text block inside `folder`.
    pub async fn notebook(&self, ctx: &RequestContext, company_id: Uuid, folder: Uuid) -> Notebook {
        self.notebooks
            .create_notebook(
                ctx,
                NewNotebook {
                    title: "Minutes".to_string(),
                    description: String::new(),
                    parent: folder,
                    company_id,
                    division_id: None,
                    blocks: vec![Block {
                        id: Uuid::new_v4(),
                        kind: "text".to_string(),
                        content: serde_json::json!({ "text": "hello" }),
                        comments: Vec::new(),
                    }],
                },
            )
            .await
            .expect("create notebook")
    }

    /// Committed documents in a collection.
    pub fn count(&self, collection: Collection) -> usize {
        self.memory.count(collection)
    }
}
