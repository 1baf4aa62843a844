//! Resource access checks and access-list management.

pub mod guard;
pub mod service;

pub use guard::ResourceGuard;
pub use service::AccessService;
