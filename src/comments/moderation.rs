// src/comments/moderation.rs

use crate::error::AppError;

/// Visibility states a comment moves through.
///
/// All visibility decisions live here; callers persist the result eagerly
/// (on create, on every reaction, on explicit moderation actions) so
/// concurrent readers always see the same stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentState {
    Pending,
    Visible,
    Hidden,
    Removed,
}

impl CommentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentState::Pending => "pending",
            CommentState::Visible => "visible",
            CommentState::Hidden => "hidden",
            CommentState::Removed => "removed",
        }
    }

    /// Parses the stored `state` column value.
    pub fn from_db(state: &str) -> Option<Self> {
        match state {
            "pending" => Some(CommentState::Pending),
            "visible" => Some(CommentState::Visible),
            "hidden" => Some(CommentState::Hidden),
            "removed" => Some(CommentState::Removed),
            _ => None,
        }
    }
}

/// Moderator-initiated transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Approve,
    Reject,
    Reinstate,
    Remove,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Reinstate => "reinstate",
            ModerationAction::Remove => "remove",
        }
    }
}

/// State a freshly created comment starts in.
pub fn initial_state(pre_moderation: bool) -> CommentState {
    if pre_moderation {
        CommentState::Pending
    } else {
        CommentState::Visible
    }
}

/// Reconciles score-driven visibility after a reaction change.
///
/// Only flips between `Visible` and `Hidden`: a comment at exactly the
/// threshold stays visible, one below it hides, and a hidden comment whose
/// score recovers to the threshold comes back. `Pending` and `Removed` are
/// untouched by votes.
pub fn reconcile_score(current: CommentState, score: i64, hide_threshold: i32) -> CommentState {
    let below = score < i64::from(hide_threshold);
    match current {
        CommentState::Visible if below => CommentState::Hidden,
        CommentState::Hidden if !below => CommentState::Visible,
        other => other,
    }
}

/// Applies an explicit moderation action.
///
/// `Removed` is terminal. Rejection is the post-moderation action and is
/// only available on threads with `post_moderation` enabled.
pub fn apply_action(
    current: CommentState,
    action: ModerationAction,
    post_moderation: bool,
) -> Result<CommentState, AppError> {
    match (action, current) {
        (ModerationAction::Approve, CommentState::Pending) => Ok(CommentState::Visible),
        (ModerationAction::Reject, CommentState::Visible) => {
            if post_moderation {
                Ok(CommentState::Hidden)
            } else {
                Err(AppError::Conflict(
                    "Post-moderation is disabled for this thread".to_string(),
                ))
            }
        }
        (ModerationAction::Reinstate, CommentState::Hidden) => Ok(CommentState::Visible),
        (ModerationAction::Remove, CommentState::Removed) => Err(AppError::Conflict(
            "Comment is already removed".to_string(),
        )),
        (ModerationAction::Remove, _) => Ok(CommentState::Removed),
        (action, current) => Err(AppError::Conflict(format!(
            "Cannot {} a {} comment",
            action.as_str(),
            current.as_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_comments_are_visible_without_pre_moderation() {
        assert_eq!(initial_state(false), CommentState::Visible);
    }

    #[test]
    fn pre_moderated_threads_start_comments_pending() {
        assert_eq!(initial_state(true), CommentState::Pending);
    }

    #[test]
    fn score_at_threshold_stays_visible() {
        assert_eq!(
            reconcile_score(CommentState::Visible, -5, -5),
            CommentState::Visible
        );
    }

    #[test]
    fn score_below_threshold_hides() {
        assert_eq!(
            reconcile_score(CommentState::Visible, -6, -5),
            CommentState::Hidden
        );
    }

    #[test]
    fn recovered_score_unhides() {
        assert_eq!(
            reconcile_score(CommentState::Hidden, -5, -5),
            CommentState::Visible
        );
    }

    #[test]
    fn votes_never_touch_pending_or_removed() {
        assert_eq!(
            reconcile_score(CommentState::Pending, -100, -5),
            CommentState::Pending
        );
        assert_eq!(
            reconcile_score(CommentState::Removed, 100, -5),
            CommentState::Removed
        );
    }

    #[test]
    fn approve_moves_pending_to_visible() {
        assert_eq!(
            apply_action(CommentState::Pending, ModerationAction::Approve, false).unwrap(),
            CommentState::Visible
        );
    }

    #[test]
    fn approve_rejects_non_pending() {
        let err =
            apply_action(CommentState::Visible, ModerationAction::Approve, false).unwrap_err();
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn reject_requires_post_moderation() {
        let err =
            apply_action(CommentState::Visible, ModerationAction::Reject, false).unwrap_err();
        assert_eq!(err.code(), "conflict");

        assert_eq!(
            apply_action(CommentState::Visible, ModerationAction::Reject, true).unwrap(),
            CommentState::Hidden
        );
    }

    #[test]
    fn reinstate_unhides() {
        assert_eq!(
            apply_action(CommentState::Hidden, ModerationAction::Reinstate, false).unwrap(),
            CommentState::Visible
        );
    }

    #[test]
    fn remove_is_allowed_from_any_live_state_and_is_terminal() {
        for state in [
            CommentState::Pending,
            CommentState::Visible,
            CommentState::Hidden,
        ] {
            assert_eq!(
                apply_action(state, ModerationAction::Remove, false).unwrap(),
                CommentState::Removed
            );
        }
        let err =
            apply_action(CommentState::Removed, ModerationAction::Remove, false).unwrap_err();
        assert_eq!(err.code(), "conflict");
    }
}
