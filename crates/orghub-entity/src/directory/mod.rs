//! Directory (folder) document entities.

pub mod model;

pub use model::{ChildStub, Directory, DirectoryPatch, NewDirectory};
