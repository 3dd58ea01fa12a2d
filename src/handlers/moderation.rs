use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    comments::moderation::ModerationAction, comments::service, error::AppError, state::AppState,
    utils::jwt::Claims,
};

/// Approve a pending comment.
pub async fn approve_comment(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    apply(state, claims, path, ModerationAction::Approve).await
}

/// Hide a visible comment on a post-moderated thread.
pub async fn reject_comment(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    apply(state, claims, path, ModerationAction::Reject).await
}

/// Bring a hidden comment back.
pub async fn reinstate_comment(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    apply(state, claims, path, ModerationAction::Reinstate).await
}

/// Remove a comment for good. Terminal.
pub async fn remove_comment(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    apply(state, claims, path, ModerationAction::Remove).await
}

async fn apply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    action: ModerationAction,
) -> Result<impl IntoResponse, AppError> {
    let moderator_id = claims.sub.parse::<i64>().unwrap_or(0);

    let next = service::moderate(&state, moderator_id, id, action).await?;

    Ok(Json(serde_json::json!({
        "id": id,
        "state": next.as_str(),
    })))
}
