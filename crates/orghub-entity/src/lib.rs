//! # orghub-entity
//!
//! Domain entity models for OrgHub. Relational rows (companies,
//! departments, positions, memberships, document intents) derive
//! `sqlx::FromRow`; document-store models (directories, notebooks,
//! permissions) implement [`orghub_core::traits::Document`].

pub mod company;
pub mod department;
pub mod directory;
pub mod employee;
pub mod intent;
pub mod notebook;
pub mod permission;
pub mod position;
