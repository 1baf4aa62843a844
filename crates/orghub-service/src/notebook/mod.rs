//! Notebook use cases.

pub mod service;

pub use service::NotebookService;
