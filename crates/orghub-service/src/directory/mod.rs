//! Directory tree store, cascade deletion and the folder use cases.

pub mod cascade;
pub mod service;
pub mod tree;

pub use cascade::{CascadeDeleter, CascadeMode, CascadeReport};
pub use service::DirectoryService;
pub use tree::DirectoryTreeStore;
