//! Department tree and department-local positions.

pub mod position;
pub mod service;

pub use position::DepartmentPositionService;
pub use service::DepartmentService;
