// src/comments/store.rs
//
// Raw row access for comments and reactions. No policy lives here; the
// service layer decides who may do what and in which state.

use sqlx::PgExecutor;

use crate::comments::moderation::CommentState;
use crate::error::AppError;
use crate::models::attachment::AttachmentRef;
use crate::models::comment::Comment;
use crate::models::reaction::Reaction;

const COMMENT_COLUMNS: &str = "id, author_id, content, attachment_kind, attachment_id, \
     root_id, parent_id, state, score, created_at, updated_at";

/// Fetches a comment by id, `NotFound` if absent.
pub async fn fetch_comment<'e, E>(executor: E, id: i64) -> Result<Comment, AppError>
where
    E: PgExecutor<'e>,
{
    try_fetch_comment(executor, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

pub async fn try_fetch_comment<'e, E>(executor: E, id: i64) -> Result<Option<Comment>, AppError>
where
    E: PgExecutor<'e>,
{
    let comment = sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE id = $1",
        COMMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(comment)
}

/// Fetches a comment and locks its row for the rest of the transaction.
/// Serializes concurrent mutations (reactions, moderation) per comment id.
pub async fn fetch_comment_for_update<'e, E>(executor: E, id: i64) -> Result<Comment, AppError>
where
    E: PgExecutor<'e>,
{
    let comment = sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE id = $1 FOR UPDATE",
        COMMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    comment.ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

/// Inserts a root comment carrying the attachment reference.
pub async fn insert_root<'e, E>(
    executor: E,
    author_id: i64,
    content: &str,
    attachment: AttachmentRef,
    state: CommentState,
) -> Result<Comment, AppError>
where
    E: PgExecutor<'e>,
{
    let comment = sqlx::query_as::<_, Comment>(&format!(
        "INSERT INTO comments (author_id, content, attachment_kind, attachment_id, state) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {}",
        COMMENT_COLUMNS
    ))
    .bind(author_id)
    .bind(content)
    .bind(attachment.kind.as_str())
    .bind(attachment.id)
    .bind(state.as_str())
    .fetch_one(executor)
    .await?;

    Ok(comment)
}

/// Inserts a reply. Replies carry no attachment of their own; they point at
/// their parent and at the thread root.
pub async fn insert_reply<'e, E>(
    executor: E,
    author_id: i64,
    content: &str,
    parent_id: i64,
    root_id: i64,
    state: CommentState,
) -> Result<Comment, AppError>
where
    E: PgExecutor<'e>,
{
    let comment = sqlx::query_as::<_, Comment>(&format!(
        "INSERT INTO comments (author_id, content, parent_id, root_id, state) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {}",
        COMMENT_COLUMNS
    ))
    .bind(author_id)
    .bind(content)
    .bind(parent_id)
    .bind(root_id)
    .bind(state.as_str())
    .fetch_one(executor)
    .await?;

    Ok(comment)
}

/// Replaces a comment's content.
pub async fn update_content<'e, E>(
    executor: E,
    id: i64,
    content: &str,
) -> Result<Comment, AppError>
where
    E: PgExecutor<'e>,
{
    let comment = sqlx::query_as::<_, Comment>(&format!(
        "UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
        COMMENT_COLUMNS
    ))
    .bind(id)
    .bind(content)
    .fetch_one(executor)
    .await?;

    Ok(comment)
}

/// Persists a gate decision.
pub async fn set_state<'e, E>(executor: E, id: i64, state: CommentState) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE comments SET state = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(state.as_str())
        .execute(executor)
        .await?;

    Ok(())
}

/// Persists a recomputed score together with the gate decision it fed.
pub async fn set_score_and_state<'e, E>(
    executor: E,
    id: i64,
    score: i64,
    state: CommentState,
) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE comments SET score = $2, state = $3, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(score)
        .bind(state.as_str())
        .execute(executor)
        .await?;

    Ok(())
}

/// All comments of one attachment: its root comments plus every reply in
/// their threads, in creation order (ties broken by id) so the tree builder
/// sees parents before children.
pub async fn list_by_attachment<'e, E>(
    executor: E,
    attachment: AttachmentRef,
) -> Result<Vec<Comment>, AppError>
where
    E: PgExecutor<'e>,
{
    let comments = sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments \
         WHERE (attachment_kind = $1 AND attachment_id = $2) \
            OR root_id IN (SELECT id FROM comments WHERE attachment_kind = $1 AND attachment_id = $2) \
         ORDER BY created_at ASC, id ASC",
        COMMENT_COLUMNS
    ))
    .bind(attachment.kind.as_str())
    .bind(attachment.id)
    .fetch_all(executor)
    .await?;

    Ok(comments)
}

/// Upserts one user's reaction on a comment; re-voting replaces the prior
/// value instead of adding a row.
pub async fn upsert_reaction<'e, E>(
    executor: E,
    comment_id: i64,
    user_id: i64,
    value: i16,
) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO comment_reactions (comment_id, user_id, value) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (comment_id, user_id) \
         DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
    )
    .bind(comment_id)
    .bind(user_id)
    .bind(value)
    .execute(executor)
    .await?;

    Ok(())
}

/// Current reactions for a comment. Read inside the caller's transaction so
/// the tally never sees a partially applied reaction set.
pub async fn reactions_for<'e, E>(executor: E, comment_id: i64) -> Result<Vec<Reaction>, AppError>
where
    E: PgExecutor<'e>,
{
    let reactions = sqlx::query_as::<_, Reaction>(
        "SELECT comment_id, user_id, value, created_at, updated_at \
         FROM comment_reactions WHERE comment_id = $1",
    )
    .bind(comment_id)
    .fetch_all(executor)
    .await?;

    Ok(reactions)
}
