use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::attachment::{AttachmentKind, AttachmentRef};

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub attachment_kind: Option<String>,
    pub attachment_id: Option<i64>,
    pub root_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub state: String,
    pub score: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Comment {
    /// The content reference carried by a root comment; `None` on replies,
    /// which inherit the root's attachment transitively.
    pub fn attachment(&self) -> Option<AttachmentRef> {
        let kind = self
            .attachment_kind
            .as_deref()
            .and_then(AttachmentKind::from_db)?;
        let id = self.attachment_id?;
        Some(AttachmentRef { kind, id })
    }
}

/// DTO for creating a new comment (root or reply).
///
/// Exactly one of the content reference fields or `parent_id` must be set;
/// the handler folds them into a `CommentTarget` before anything is stored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be between 1 and 2000 characters"
    ))]
    pub content: String,

    pub post_id: Option<i64>,
    pub file_id: Option<i64>,
    pub project_id: Option<i64>,
    pub page_id: Option<i64>,
    pub tutorial_id: Option<i64>,

    /// Optional: the ID of the comment being replied to.
    pub parent_id: Option<i64>,
}

/// DTO for editing a comment's content.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be between 1 and 2000 characters"
    ))]
    pub content: String,
}

/// One node of the rendered thread forest returned by the listing route.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
    pub depth: i32,
    pub score: i64,
    pub state: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub children: Vec<CommentNode>,
}
