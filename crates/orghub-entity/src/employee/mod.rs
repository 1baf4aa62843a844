//! Company and department membership entities.

pub mod model;

pub use model::{DepartmentEmployee, Employee};
