//! Company-scoped and department-scoped position entities.

pub mod model;

pub use model::{DepartmentPosition, OWNER_RANK, Position, PositionSpec};
