//! # orghub-service
//!
//! Use-case orchestration for OrgHub. Services compose the identifier
//! allocator, the authorization evaluator, the relational store and the
//! directory tree store. Relational work for one use case runs in a single
//! transaction; the document-store step that follows it is recorded as a
//! document intent in that same transaction so it can be replayed.
//!
//! Services follow constructor injection: every dependency arrives through
//! [`Stores`].

pub mod company;
pub mod context;
pub mod department;
pub mod directory;
pub mod employee;
pub mod intent;
pub mod notebook;
pub mod permission;
pub mod stores;

pub use company::CompanyService;
pub use context::RequestContext;
pub use department::{DepartmentPositionService, DepartmentService};
pub use directory::{CascadeDeleter, CascadeMode, CascadeReport, DirectoryService, DirectoryTreeStore};
pub use employee::EmployeeService;
pub use intent::{IntentExecutor, IntentReplayer, ReplaySummary};
pub use notebook::NotebookService;
pub use permission::{AccessService, ResourceGuard};
pub use stores::Stores;
