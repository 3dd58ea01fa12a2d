use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'comment_reactions' table.
/// One row per (comment, user); re-voting replaces the value in place.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reaction {
    pub comment_id: i64,
    pub user_id: i64,
    pub value: i16,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for casting or changing a vote.
#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub value: i16,
}
