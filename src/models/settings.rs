use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'thread_settings' table: exactly one row per thread root,
/// created in the same transaction as the root comment. Replies resolve to
/// their root's row; settings are never duplicated per reply.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ThreadSettings {
    pub root_comment_id: i64,
    pub pre_moderation: bool,
    pub post_moderation: bool,
    pub allow_nesting: bool,
    pub max_depth: i32,
    pub allow_voting: bool,
    pub hide_threshold: i32,
    /// Extension point, empty by default.
    pub post_settings: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Default configuration bound to every new thread root.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDefaults {
    pub pre_moderation: bool,
    pub post_moderation: bool,
    pub allow_nesting: bool,
    pub max_depth: i32,
    pub allow_voting: bool,
    pub hide_threshold: i32,
    pub post_settings: serde_json::Value,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            pre_moderation: false,
            post_moderation: false,
            allow_nesting: true,
            max_depth: 5,
            allow_voting: true,
            hide_threshold: -5,
            post_settings: serde_json::json!({}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_bundle() {
        let d = SettingsDefaults::default();
        assert!(!d.pre_moderation);
        assert!(!d.post_moderation);
        assert!(d.allow_nesting);
        assert_eq!(d.max_depth, 5);
        assert!(d.allow_voting);
        assert_eq!(d.hide_threshold, -5);
        assert_eq!(d.post_settings, serde_json::json!({}));
    }
}
