//! Employee use cases.

pub mod service;

pub use service::EmployeeService;
