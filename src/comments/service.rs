// src/comments/service.rs
//
// Comment service façade. Composes the store, settings resolver, tree
// builder, moderation gate and voting aggregator into the operations the
// handlers expose. Every write evicts the affected attachment's cache
// entries before returning.

use std::time::Duration;

use sqlx::PgPool;

use crate::comments::moderation::{self, CommentState, ModerationAction};
use crate::comments::{settings, store, tree, voting};
use crate::error::AppError;
use crate::models::attachment::AttachmentRef;
use crate::models::comment::Comment;
use crate::models::settings::SettingsDefaults;
use crate::state::AppState;
use crate::utils::html::clean_html;
use crate::utils::jwt::Claims;

/// Bounded retry for the idempotent listing read. Writes are never replayed.
const READ_RETRIES: u32 = 2;

/// Who is asking for a thread. Decides whether hidden and pending comments
/// are included in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(i64),
    Moderator,
}

impl Viewer {
    pub fn from_claims(claims: Option<&Claims>) -> Self {
        match claims {
            None => Viewer::Anonymous,
            Some(c) if c.role == "moderator" || c.role == "admin" => Viewer::Moderator,
            Some(c) => Viewer::User(c.sub.parse::<i64>().unwrap_or(0)),
        }
    }

    /// Cache key suffix. Listings are cached per viewer class because the
    /// visibility projection differs between them.
    fn cache_class(&self) -> String {
        match self {
            Viewer::Anonymous => "anon".to_string(),
            Viewer::User(id) => format!("user:{}", id),
            Viewer::Moderator => "mod".to_string(),
        }
    }
}

/// Creates a root comment against a piece of content.
///
/// The comment and its default thread settings are one logical write: if
/// the settings insert fails the whole transaction rolls back, so no root
/// ever exists without settings.
pub async fn post_comment(
    state: &AppState,
    caller_id: i64,
    content: &str,
    attachment: AttachmentRef,
) -> Result<Comment, AppError> {
    let content = clean_html(content);
    let defaults = SettingsDefaults::default();
    let initial = moderation::initial_state(defaults.pre_moderation);

    let mut tx = state.pool.begin().await?;
    let comment = store::insert_root(&mut *tx, caller_id, &content, attachment, initial).await?;
    settings::create_defaults(&mut tx, comment.id).await?;
    tx.commit().await?;

    state
        .cache
        .invalidate_prefix(&attachment.cache_prefix())
        .await;
    tracing::info!(
        "user {} commented on {}:{} (comment {})",
        caller_id,
        attachment.kind.as_str(),
        attachment.id,
        comment.id
    );

    Ok(comment)
}

/// Creates a reply beneath an existing comment.
///
/// The reply inherits its thread's settings through the root; it is only
/// accepted if the thread allows nesting and the resulting depth stays
/// within the thread's limit.
pub async fn reply_to(
    state: &AppState,
    caller_id: i64,
    content: &str,
    parent_id: i64,
) -> Result<Comment, AppError> {
    let content = clean_html(content);

    let mut tx = state.pool.begin().await?;

    let parent = store::try_fetch_comment(&mut *tx, parent_id)
        .await?
        .filter(|p| p.state != CommentState::Removed.as_str())
        .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;

    let thread = settings::resolve(&mut *tx, &parent).await?;
    if !thread.allow_nesting {
        return Err(AppError::BadRequest(
            "Nesting is disabled for this thread".to_string(),
        ));
    }

    let depth = settings::reply_depth(&mut tx, &parent, thread.max_depth).await?;
    if depth > thread.max_depth {
        return Err(AppError::BadRequest(format!(
            "Reply depth {} exceeds the thread limit of {}",
            depth, thread.max_depth
        )));
    }

    let root_id = settings::root_of(&parent);
    let initial = moderation::initial_state(thread.pre_moderation);
    let comment =
        store::insert_reply(&mut *tx, caller_id, &content, parent.id, root_id, initial).await?;
    tx.commit().await?;

    if let Some(attachment) = thread_attachment(&state.pool, &comment).await? {
        state
            .cache
            .invalidate_prefix(&attachment.cache_prefix())
            .await;
    }
    tracing::info!(
        "user {} replied to comment {} (comment {}, depth {})",
        caller_id,
        parent_id,
        comment.id,
        depth
    );

    Ok(comment)
}

/// Author-only content edit.
pub async fn edit_comment(
    state: &AppState,
    caller_id: i64,
    comment_id: i64,
    content: &str,
) -> Result<Comment, AppError> {
    let comment = store::fetch_comment(&state.pool, comment_id).await?;
    if comment.state == CommentState::Removed.as_str() {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }
    if comment.author_id != caller_id {
        return Err(AppError::Forbidden(
            "Only the author can edit this comment".to_string(),
        ));
    }

    let content = clean_html(content);
    let updated = store::update_content(&state.pool, comment_id, &content).await?;

    if let Some(attachment) = thread_attachment(&state.pool, &updated).await? {
        state
            .cache
            .invalidate_prefix(&attachment.cache_prefix())
            .await;
    }
    tracing::info!("user {} edited comment {}", caller_id, comment_id);

    Ok(updated)
}

/// Author deletion: the any-state-to-removed transition. The row survives
/// as a tree placeholder; its content is never served again.
pub async fn delete_comment(
    state: &AppState,
    caller_id: i64,
    comment_id: i64,
) -> Result<(), AppError> {
    let comment = store::fetch_comment(&state.pool, comment_id).await?;
    let current = parse_state(&comment)?;
    if current == CommentState::Removed {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }
    if comment.author_id != caller_id {
        return Err(AppError::Forbidden(
            "Only the author can delete this comment".to_string(),
        ));
    }

    let next = moderation::apply_action(current, ModerationAction::Remove, false)?;
    store::set_state(&state.pool, comment_id, next).await?;

    if let Some(attachment) = thread_attachment(&state.pool, &comment).await? {
        state
            .cache
            .invalidate_prefix(&attachment.cache_prefix())
            .await;
    }
    tracing::info!("user {} deleted comment {}", caller_id, comment_id);

    Ok(())
}

/// Casts or changes a vote, then reports the recomputed score and the state
/// the gate settled on.
pub async fn react(
    state: &AppState,
    caller_id: i64,
    comment_id: i64,
    value: i16,
) -> Result<(i64, CommentState), AppError> {
    let (comment, score, next) =
        voting::apply_reaction(&state.pool, caller_id, comment_id, value).await?;

    if let Some(attachment) = thread_attachment(&state.pool, &comment).await? {
        state
            .cache
            .invalidate_prefix(&attachment.cache_prefix())
            .await;
    }
    tracing::info!(
        "user {} reacted {:+} on comment {} (score {}, state {})",
        caller_id,
        value,
        comment_id,
        score,
        next.as_str()
    );

    Ok((score, next))
}

/// Explicit moderator transition on a comment.
pub async fn moderate(
    state: &AppState,
    moderator_id: i64,
    comment_id: i64,
    action: ModerationAction,
) -> Result<CommentState, AppError> {
    let mut tx = state.pool.begin().await?;

    let comment = store::fetch_comment_for_update(&mut *tx, comment_id).await?;
    let current = parse_state(&comment)?;
    let thread = settings::resolve(&mut *tx, &comment).await?;

    let next = moderation::apply_action(current, action, thread.post_moderation)?;
    store::set_state(&mut *tx, comment_id, next).await?;
    tx.commit().await?;

    if let Some(attachment) = thread_attachment(&state.pool, &comment).await? {
        state
            .cache
            .invalidate_prefix(&attachment.cache_prefix())
            .await;
    }
    tracing::info!(
        "moderator {} applied {} to comment {} ({} -> {})",
        moderator_id,
        action.as_str(),
        comment_id,
        current.as_str(),
        next.as_str()
    );

    Ok(next)
}

/// Ordered forest of a single attachment's comments, visibility-projected
/// for the viewer. Served from the TTL cache when a fresh entry exists.
pub async fn list_thread(
    state: &AppState,
    attachment: AttachmentRef,
    viewer: Viewer,
) -> Result<serde_json::Value, AppError> {
    let cache_key = format!("{}{}", attachment.cache_prefix(), viewer.cache_class());
    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(cached);
    }

    let rows = list_rows_with_retry(&state.pool, attachment).await?;
    let rows = project_visibility(rows, viewer);
    let forest = tree::prune_removed(tree::build_forest(&rows));

    let value = serde_json::to_value(&forest)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    state.cache.set(&cache_key, value.clone()).await;

    Ok(value)
}

fn parse_state(comment: &Comment) -> Result<CommentState, AppError> {
    CommentState::from_db(&comment.state).ok_or_else(|| {
        AppError::InternalServerError(format!(
            "comment {} has unknown state '{}'",
            comment.id, comment.state
        ))
    })
}

/// Read-time projection of stored states. Removed content is blanked so the
/// node only survives as a placeholder; hidden and pending comments are
/// served only to their author or a moderator, flagged via their `state`
/// field. Stored state is never mutated here.
fn project_visibility(mut rows: Vec<Comment>, viewer: Viewer) -> Vec<Comment> {
    rows.retain(|c| match CommentState::from_db(&c.state) {
        Some(CommentState::Hidden) | Some(CommentState::Pending) => match viewer {
            Viewer::Moderator => true,
            Viewer::User(id) => c.author_id == id,
            Viewer::Anonymous => false,
        },
        Some(_) => true,
        // rows with an unknown state are not served
        None => false,
    });

    for comment in &mut rows {
        if comment.state == CommentState::Removed.as_str() {
            comment.content.clear();
        }
    }

    rows
}

/// Attachment of the thread a comment belongs to, via its root. `None` when
/// the root is gone (orphaned replies still render, but there is no listing
/// cache to evict for them).
async fn thread_attachment(
    pool: &PgPool,
    comment: &Comment,
) -> Result<Option<AttachmentRef>, AppError> {
    if comment.parent_id.is_none() {
        return Ok(comment.attachment());
    }
    let root = store::try_fetch_comment(pool, settings::root_of(comment)).await?;
    Ok(root.and_then(|r| r.attachment()))
}

async fn list_rows_with_retry(
    pool: &PgPool,
    attachment: AttachmentRef,
) -> Result<Vec<Comment>, AppError> {
    let mut attempt: u32 = 0;
    loop {
        match store::list_by_attachment(pool, attachment).await {
            Ok(rows) => return Ok(rows),
            Err(err @ AppError::InternalServerError(_)) => {
                if attempt >= READ_RETRIES {
                    return Err(err);
                }
                attempt += 1;
                tracing::warn!(
                    "listing {}:{} failed (attempt {}/{}), retrying: {}",
                    attachment.kind.as_str(),
                    attachment.id,
                    attempt,
                    READ_RETRIES,
                    err
                );
                tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(id: i64, author_id: i64, state: &str) -> Comment {
        Comment {
            id,
            author_id,
            content: format!("comment {}", id),
            attachment_kind: Some("post".to_string()),
            attachment_id: Some(1),
            root_id: None,
            parent_id: None,
            state: state.to_string(),
            score: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn anonymous_viewers_never_see_hidden_or_pending() {
        let rows = vec![
            comment(1, 1, "visible"),
            comment(2, 1, "hidden"),
            comment(3, 1, "pending"),
        ];
        let projected = project_visibility(rows, Viewer::Anonymous);
        let ids: Vec<i64> = projected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn authors_see_their_own_hidden_comments_flagged() {
        let rows = vec![comment(1, 7, "hidden"), comment(2, 8, "hidden")];
        let projected = project_visibility(rows, Viewer::User(7));
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].id, 1);
        assert_eq!(projected[0].state, "hidden");
    }

    #[test]
    fn moderators_see_everything() {
        let rows = vec![
            comment(1, 1, "visible"),
            comment(2, 2, "hidden"),
            comment(3, 3, "pending"),
        ];
        assert_eq!(project_visibility(rows, Viewer::Moderator).len(), 3);
    }

    #[test]
    fn removed_content_is_blanked_but_state_survives() {
        let rows = vec![comment(1, 1, "removed")];
        let projected = project_visibility(rows, Viewer::Anonymous);
        assert_eq!(projected[0].content, "");
        assert_eq!(projected[0].state, "removed");
    }

    #[test]
    fn viewer_classes_from_claims() {
        let user = Claims {
            sub: "12".to_string(),
            role: "user".to_string(),
            exp: 0,
        };
        let moderator = Claims {
            sub: "3".to_string(),
            role: "moderator".to_string(),
            exp: 0,
        };
        assert_eq!(Viewer::from_claims(None), Viewer::Anonymous);
        assert_eq!(Viewer::from_claims(Some(&user)), Viewer::User(12));
        assert_eq!(Viewer::from_claims(Some(&moderator)), Viewer::Moderator);
    }
}
