use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    comments::service::{self, Viewer},
    error::AppError,
    models::attachment::{AttachmentKind, AttachmentRef, CommentTarget},
    models::comment::{CreateCommentRequest, UpdateCommentRequest},
    models::reaction::ReactRequest,
    state::AppState,
    utils::jwt::{Claims, MaybeClaims},
};

/// Create a new comment: a root comment against a piece of content, or a
/// reply to an existing comment. Exactly one of the two must be referenced.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let caller_id = claims.sub.parse::<i64>().unwrap_or(0);

    let target = CommentTarget::from_parts(
        payload.post_id,
        payload.file_id,
        payload.project_id,
        payload.page_id,
        payload.tutorial_id,
        payload.parent_id,
    )?;

    let comment = match target {
        CommentTarget::Attachment(attachment) => {
            service::post_comment(&state, caller_id, &payload.content, attachment).await?
        }
        CommentTarget::Reply(parent_id) => {
            service::reply_to(&state, caller_id, &payload.content, parent_id).await?
        }
    };

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit a comment's content. Author only.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let caller_id = claims.sub.parse::<i64>().unwrap_or(0);

    let comment = service::edit_comment(&state, caller_id, id, &payload.content).await?;

    Ok(Json(comment))
}

/// Delete a comment. Author only; the node survives as a placeholder so
/// surviving replies keep their position.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let caller_id = claims.sub.parse::<i64>().unwrap_or(0);

    service::delete_comment(&state, caller_id, id).await?;

    Ok(Json(serde_json::json!({
        "message": "Comment deleted successfully"
    })))
}

/// Cast or change a vote on a comment.
pub async fn react(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ReactRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.value != 1 && payload.value != -1 {
        return Err(AppError::BadRequest(
            "Reaction value must be +1 or -1".to_string(),
        ));
    }
    let caller_id = claims.sub.parse::<i64>().unwrap_or(0);

    let (score, comment_state) = service::react(&state, caller_id, id, payload.value).await?;

    Ok(Json(serde_json::json!({
        "score": score,
        "state": comment_state.as_str(),
    })))
}

/// List one attachment's comment forest, visibility-projected for the
/// caller. Anonymous callers are served too.
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(MaybeClaims(claims)): Extension<MaybeClaims>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = AttachmentKind::from_path_segment(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Unknown content type '{}'", kind)))?;
    let attachment = AttachmentRef { kind, id };
    let viewer = Viewer::from_claims(claims.as_ref());

    let forest = service::list_thread(&state, attachment, viewer).await?;

    Ok(Json(forest))
}
