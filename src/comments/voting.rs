// src/comments/voting.rs

use sqlx::PgPool;

use crate::comments::moderation::{self, CommentState};
use crate::comments::{settings, store};
use crate::error::AppError;
use crate::models::comment::Comment;
use crate::models::reaction::Reaction;

/// Sums the latest reaction value per user.
///
/// The storage key (comment_id, user_id) guarantees one row per user, so a
/// plain sum over the rows is the latest-value tally.
pub fn tally(reactions: &[Reaction]) -> i64 {
    reactions.iter().map(|r| i64::from(r.value)).sum()
}

/// Applies one user's reaction and reconciles visibility, all inside a
/// single transaction.
///
/// The comment row is locked first, so concurrent reactions on the same
/// comment serialize and the recomputed score always reflects a consistent
/// reaction set; reactions on different comments proceed in parallel. The
/// gate runs before the transaction commits, so visibility reflects the new
/// score by the time the call returns.
pub async fn apply_reaction(
    pool: &PgPool,
    caller_id: i64,
    comment_id: i64,
    value: i16,
) -> Result<(Comment, i64, CommentState), AppError> {
    let mut tx = pool.begin().await?;

    let comment = store::fetch_comment_for_update(&mut *tx, comment_id).await?;
    let current = CommentState::from_db(&comment.state).ok_or_else(|| {
        AppError::InternalServerError(format!(
            "comment {} has unknown state '{}'",
            comment.id, comment.state
        ))
    })?;
    if current == CommentState::Removed {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let thread = settings::resolve(&mut *tx, &comment).await?;
    if !thread.allow_voting {
        return Err(AppError::VotingDisabled);
    }

    store::upsert_reaction(&mut *tx, comment_id, caller_id, value).await?;

    let reactions = store::reactions_for(&mut *tx, comment_id).await?;
    let score = tally(&reactions);
    let next = moderation::reconcile_score(current, score, thread.hide_threshold);

    store::set_score_and_state(&mut *tx, comment_id, score, next).await?;
    tx.commit().await?;

    Ok((comment, score, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reaction(user_id: i64, value: i16) -> Reaction {
        Reaction {
            comment_id: 1,
            user_id,
            value,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn tally_sums_one_value_per_user() {
        let reactions = vec![reaction(1, 1), reaction(2, -1), reaction(3, -1)];
        assert_eq!(tally(&reactions), -1);
    }

    #[test]
    fn tally_of_no_reactions_is_zero() {
        assert_eq!(tally(&[]), 0);
    }
}
