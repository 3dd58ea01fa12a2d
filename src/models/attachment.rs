use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Content kinds a root comment can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Post,
    File,
    Project,
    Page,
    Tutorial,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Post => "post",
            AttachmentKind::File => "file",
            AttachmentKind::Project => "project",
            AttachmentKind::Page => "page",
            AttachmentKind::Tutorial => "tutorial",
        }
    }

    /// Parses the stored `attachment_kind` column value.
    pub fn from_db(kind: &str) -> Option<Self> {
        match kind {
            "post" => Some(AttachmentKind::Post),
            "file" => Some(AttachmentKind::File),
            "project" => Some(AttachmentKind::Project),
            "page" => Some(AttachmentKind::Page),
            "tutorial" => Some(AttachmentKind::Tutorial),
            _ => None,
        }
    }

    /// Parses the plural path segment used by the listing route
    /// (`/api/posts/{id}/comments` and friends).
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "posts" => Some(AttachmentKind::Post),
            "files" => Some(AttachmentKind::File),
            "projects" => Some(AttachmentKind::Project),
            "pages" => Some(AttachmentKind::Page),
            "tutorials" => Some(AttachmentKind::Tutorial),
            _ => None,
        }
    }
}

/// The piece of content a thread hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttachmentRef {
    pub kind: AttachmentKind,
    pub id: i64,
}

impl AttachmentRef {
    /// Cache key prefix shared by all listings of this attachment.
    /// Write paths evict by this prefix. The trailing separator keeps
    /// id 1 from matching id 11.
    pub fn cache_prefix(&self) -> String {
        format!("thread:{}:{}:", self.kind.as_str(), self.id)
    }
}

/// Exactly one parent for every new comment: a piece of content (root
/// comment) or another comment (reply). Modeled as a tagged union so the
/// exactly-one rule holds by construction once a request is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Attachment(AttachmentRef),
    Reply(i64),
}

impl CommentTarget {
    /// Collapses the wire-level optional id fields into a single target.
    /// Zero or multiple populated fields are rejected.
    pub fn from_parts(
        post_id: Option<i64>,
        file_id: Option<i64>,
        project_id: Option<i64>,
        page_id: Option<i64>,
        tutorial_id: Option<i64>,
        parent_id: Option<i64>,
    ) -> Result<Self, AppError> {
        let mut targets: Vec<CommentTarget> = Vec::new();
        for (kind, id) in [
            (AttachmentKind::Post, post_id),
            (AttachmentKind::File, file_id),
            (AttachmentKind::Project, project_id),
            (AttachmentKind::Page, page_id),
            (AttachmentKind::Tutorial, tutorial_id),
        ] {
            if let Some(id) = id {
                targets.push(CommentTarget::Attachment(AttachmentRef { kind, id }));
            }
        }
        if let Some(id) = parent_id {
            targets.push(CommentTarget::Reply(id));
        }

        match targets.as_slice() {
            [single] => Ok(*single),
            [] => Err(AppError::InvalidAttachment(
                "A comment needs a content reference or a parent comment".to_string(),
            )),
            _ => Err(AppError::InvalidAttachment(
                "A comment may reference exactly one of content or parent comment".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_content_reference_is_accepted() {
        let target =
            CommentTarget::from_parts(Some(7), None, None, None, None, None).unwrap();
        assert_eq!(
            target,
            CommentTarget::Attachment(AttachmentRef {
                kind: AttachmentKind::Post,
                id: 7
            })
        );
    }

    #[test]
    fn reply_target_is_accepted() {
        let target =
            CommentTarget::from_parts(None, None, None, None, None, Some(42)).unwrap();
        assert_eq!(target, CommentTarget::Reply(42));
    }

    #[test]
    fn missing_target_is_rejected() {
        let err = CommentTarget::from_parts(None, None, None, None, None, None).unwrap_err();
        assert_eq!(err.code(), "invalid_attachment");
    }

    #[test]
    fn two_content_references_are_rejected() {
        let err =
            CommentTarget::from_parts(Some(1), Some(2), None, None, None, None).unwrap_err();
        assert_eq!(err.code(), "invalid_attachment");
    }

    #[test]
    fn content_reference_plus_parent_is_rejected() {
        let err =
            CommentTarget::from_parts(Some(1), None, None, None, None, Some(9)).unwrap_err();
        assert_eq!(err.code(), "invalid_attachment");
    }

    #[test]
    fn path_segments_map_to_kinds() {
        assert_eq!(
            AttachmentKind::from_path_segment("tutorials"),
            Some(AttachmentKind::Tutorial)
        );
        assert_eq!(AttachmentKind::from_path_segment("widgets"), None);
    }
}
