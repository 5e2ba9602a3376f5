use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub String);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CommentId {
    fn from(s: String) -> Self {
        CommentId(s)
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        CommentId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentDraft {
    pub text: String,
}

impl Comment {
    /// Format the time since creation for display
    pub fn time_since_created(&self) -> String {
        let now = Utc::now();
        let duration = now.signed_duration_since(self.created_at);

        if duration.num_days() > 0 {
            format!("{} days ago", duration.num_days())
        } else if duration.num_hours() > 0 {
            format!("{} hours ago", duration.num_hours())
        } else if duration.num_minutes() > 0 {
            format!("{} minutes ago", duration.num_minutes())
        } else {
            "Just now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_since_created() {
        let mut comment = Comment {
            id: "1".into(),
            text: "looks good".to_string(),
            user_id: None,
            user_name: None,
            created_at: Utc::now(),
        };
        assert_eq!(comment.time_since_created(), "Just now");

        comment.created_at = Utc::now() - chrono::Duration::hours(3);
        assert_eq!(comment.time_since_created(), "3 hours ago");
    }

    #[test]
    fn test_anonymous_comment_omits_identity() {
        let comment = Comment {
            id: "1".into(),
            text: "hi".to_string(),
            user_id: None,
            user_name: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert!(json.get("userId").is_none());
        assert!(json.get("createdAt").is_some());
    }
}
