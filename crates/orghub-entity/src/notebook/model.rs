//! Notebook document model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use orghub_core::traits::{Collection, Document};

use crate::directory::ChildStub;

/// A leaf document made of content blocks.
///
/// Always listed in exactly one parent folder's file stubs and always paired
/// with a permission record under the same identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Allocator-issued identifier; also the key of its permission record.
    pub id: Uuid,
    /// Notebook title.
    pub title: String,
    /// Notebook description.
    #[serde(default)]
    pub description: String,
    /// Folder that lists this notebook.
    pub parent: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Department the notebook belongs to, if any.
    pub division_id: Option<Uuid>,
    /// Content blocks in order.
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Employee who created the notebook.
    pub created_by: Uuid,
    /// When the notebook was created.
    pub created_at: DateTime<Utc>,
    /// When the notebook was last updated.
    pub updated_at: DateTime<Utc>,
}

/// One content block of a notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block identifier, unique within the notebook.
    pub id: Uuid,
    /// Block type tag (e.g. `"paragraph"`, `"heading"`, `"code"`).
    pub kind: String,
    /// Block payload as produced by the editor.
    pub content: serde_json::Value,
    /// Threaded comments attached to this block.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A threaded comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: Uuid,
    /// Employee who wrote the comment.
    pub author: Uuid,
    /// Comment text.
    pub body: String,
    /// Replies, oldest first.
    #[serde(default)]
    pub replies: Vec<Comment>,
    /// When the comment was written.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Find a comment by id in this thread (depth-first).
    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Comment> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter_mut().find_map(|reply| reply.find_mut(id))
    }
}

impl Notebook {
    /// Build a new notebook from creation parameters.
    pub fn from_new(id: Uuid, new: NewNotebook, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: new.title,
            description: new.description,
            parent: new.parent,
            company_id: new.company_id,
            division_id: new.division_id,
            blocks: new.blocks,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// The stub the parent folder keeps for this notebook.
    pub fn stub(&self) -> ChildStub {
        ChildStub {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }

    /// Attach a comment to a block, or as a reply to an existing comment.
    ///
    /// Returns `false` if the block or the parent comment does not exist.
    pub fn add_comment(&mut self, block_id: Uuid, reply_to: Option<Uuid>, comment: Comment) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) else {
            return false;
        };
        match reply_to {
            None => {
                block.comments.push(comment);
                true
            }
            Some(parent_id) => match block.comments.iter_mut().find_map(|c| c.find_mut(parent_id)) {
                Some(parent) => {
                    parent.replies.push(comment);
                    true
                }
                None => false,
            },
        }
    }

    /// Replace the content, carrying over the comments of every block whose id survives.
    pub fn replace_blocks(&mut self, blocks: Vec<Block>) {
        let mut previous: HashMap<Uuid, Vec<Comment>> = self
            .blocks
            .drain(..)
            .map(|b| (b.id, b.comments))
            .collect();
        self.blocks = blocks
            .into_iter()
            .map(|mut block| {
                if block.comments.is_empty() {
                    block.comments = previous.remove(&block.id).unwrap_or_default();
                }
                block
            })
            .collect();
    }
}

impl Document for Notebook {
    const COLLECTION: Collection = Collection::Notebooks;

    fn key(&self) -> Uuid {
        self.id
    }
}

/// Parameters for creating a notebook.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewNotebook {
    /// Notebook title.
    #[validate(length(min = 1, max = 255, message = "Notebook title must be 1-255 characters"))]
    pub title: String,
    /// Notebook description.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    /// Folder that will list the notebook.
    pub parent: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Department the notebook belongs to.
    pub division_id: Option<Uuid>,
    /// Initial content.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Editable notebook fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NotebookPatch {
    /// New title.
    #[validate(length(min = 1, max = 255, message = "Notebook title must be 1-255 characters"))]
    pub title: Option<String>,
    /// New description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Replacement content. Existing comments are kept for blocks whose id survives.
    pub blocks: Option<Vec<Block>>,
}

/// A new comment on a notebook block.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewComment {
    /// Block being commented on.
    pub block_id: Uuid,
    /// Comment being replied to, if any.
    pub reply_to: Option<Uuid>,
    /// Comment text.
    #[validate(length(min = 1, max = 10000, message = "Comment must be 1-10000 characters"))]
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(body: &str) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            author: Uuid::new_v4(),
            body: body.to_string(),
            replies: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn notebook_with_block(block_id: Uuid) -> Notebook {
        let company = Uuid::new_v4();
        Notebook::from_new(
            Uuid::new_v4(),
            NewNotebook {
                title: "Minutes".to_string(),
                description: String::new(),
                parent: Uuid::new_v4(),
                company_id: company,
                division_id: None,
                blocks: vec![Block {
                    id: block_id,
                    kind: "paragraph".to_string(),
                    content: serde_json::json!({"text": "Agenda"}),
                    comments: Vec::new(),
                }],
            },
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_nested_reply_is_attached_to_its_parent() {
        let block_id = Uuid::new_v4();
        let mut nb = notebook_with_block(block_id);

        let top = comment("looks good");
        let top_id = top.id;
        assert!(nb.add_comment(block_id, None, top));

        let reply = comment("agreed");
        let reply_id = reply.id;
        assert!(nb.add_comment(block_id, Some(top_id), reply));
        assert!(nb.add_comment(block_id, Some(reply_id), comment("+1")));

        let thread = &nb.blocks[0].comments[0];
        assert_eq!(thread.replies.len(), 1);
        assert_eq!(thread.replies[0].replies[0].body, "+1");
    }

    #[test]
    fn test_comment_on_unknown_block_is_rejected() {
        let mut nb = notebook_with_block(Uuid::new_v4());
        assert!(!nb.add_comment(Uuid::new_v4(), None, comment("lost")));
        assert!(!nb.add_comment(nb.blocks[0].id, Some(Uuid::new_v4()), comment("orphan")));
    }

    #[test]
    fn test_replacing_blocks_keeps_comments_of_surviving_blocks() {
        let block_id = Uuid::new_v4();
        let mut nb = notebook_with_block(block_id);
        assert!(nb.add_comment(block_id, None, comment("keep me")));

        nb.replace_blocks(vec![
            Block {
                id: block_id,
                kind: "heading".to_string(),
                content: serde_json::json!({"text": "Agenda v2"}),
                comments: Vec::new(),
            },
            Block {
                id: Uuid::new_v4(),
                kind: "paragraph".to_string(),
                content: serde_json::json!({"text": "New"}),
                comments: Vec::new(),
            },
        ]);

        assert_eq!(nb.blocks.len(), 2);
        assert_eq!(nb.blocks[0].comments[0].body, "keep me");
        assert!(nb.blocks[1].comments.is_empty());
    }
}
