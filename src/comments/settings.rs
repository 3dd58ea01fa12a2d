// src/comments/settings.rs
//
// Settings resolver. Every thread root owns exactly one settings row,
// materialized in the same transaction that creates the root comment.
// Replies never get their own row; they resolve through the denormalized
// root id stamped on every reply at insert time, which turns resolution
// into a single keyed lookup and makes resolution cycles impossible.

use sqlx::{PgExecutor, Postgres, Transaction};

use crate::error::AppError;
use crate::models::comment::Comment;
use crate::models::settings::{SettingsDefaults, ThreadSettings};

const SETTINGS_COLUMNS: &str = "root_comment_id, pre_moderation, post_moderation, \
     allow_nesting, max_depth, allow_voting, hide_threshold, post_settings, created_at";

/// Writes the default settings bundle for a new thread root.
///
/// Must run inside the transaction that inserts the root comment: the two
/// writes commit or roll back as one unit, so a root without settings can
/// never be observed.
pub async fn create_defaults(
    tx: &mut Transaction<'_, Postgres>,
    root_comment_id: i64,
) -> Result<ThreadSettings, AppError> {
    let defaults = SettingsDefaults::default();

    let settings = sqlx::query_as::<_, ThreadSettings>(&format!(
        "INSERT INTO thread_settings \
            (root_comment_id, pre_moderation, post_moderation, allow_nesting, \
             max_depth, allow_voting, hide_threshold, post_settings) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {}",
        SETTINGS_COLUMNS
    ))
    .bind(root_comment_id)
    .bind(defaults.pre_moderation)
    .bind(defaults.post_moderation)
    .bind(defaults.allow_nesting)
    .bind(defaults.max_depth)
    .bind(defaults.allow_voting)
    .bind(defaults.hide_threshold)
    .bind(defaults.post_settings)
    .fetch_one(&mut **tx)
    .await?;

    Ok(settings)
}

/// Id of the thread root a comment belongs to (the comment itself for roots).
pub fn root_of(comment: &Comment) -> i64 {
    comment.root_id.unwrap_or(comment.id)
}

/// Effective settings for any comment in a thread.
///
/// A root that has no settings row is a data-integrity violation, not a
/// thread with defaults: root and settings are written atomically, so a
/// missing row means the parent chain or the root id is broken.
pub async fn resolve<'e, E>(executor: E, comment: &Comment) -> Result<ThreadSettings, AppError>
where
    E: PgExecutor<'e>,
{
    let root_id = root_of(comment);

    sqlx::query_as::<_, ThreadSettings>(&format!(
        "SELECT {} FROM thread_settings WHERE root_comment_id = $1",
        SETTINGS_COLUMNS
    ))
    .bind(root_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| {
        AppError::ThreadCorrupted(format!("thread root {} has no settings row", root_id))
    })
}

/// Depth a reply to `parent` would land at, via a bounded upward walk over
/// `parent_id` links.
///
/// The walk gives up after `max_depth + 1` hops: a comment legitimately
/// deeper than the thread limit cannot exist, so a longer chain (or a link
/// to a missing row) means the parent pointers are corrupted and the walk
/// must not be trusted to terminate.
pub async fn reply_depth(
    tx: &mut Transaction<'_, Postgres>,
    parent: &Comment,
    max_depth: i32,
) -> Result<i32, AppError> {
    let max_hops = max_depth + 1;
    let mut depth: i32 = 1;
    let mut cursor = parent.parent_id;
    let mut hops: i32 = 0;

    while let Some(ancestor_id) = cursor {
        hops += 1;
        if hops > max_hops {
            return Err(AppError::ThreadCorrupted(format!(
                "parent chain above comment {} exceeds {} links",
                parent.id, max_hops
            )));
        }

        let next = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT parent_id FROM comments WHERE id = $1",
        )
        .bind(ancestor_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::ThreadCorrupted(format!(
                "comment {} links to missing ancestor {}",
                parent.id, ancestor_id
            ))
        })?;

        cursor = next;
        depth += 1;
    }

    Ok(depth)
}
