//! Notebook document entities.

pub mod model;

pub use model::{Block, Comment, NewComment, NewNotebook, Notebook, NotebookPatch};
