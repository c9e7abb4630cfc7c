//! Database row types. These map directly to SQLite rows.
//! Distinct from gallery-types models to keep the DB layer independent.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use gallery_types::models::{Comment, Reaction};

pub struct ReactionRow {
    pub id: String,
    pub image_id: String,
    pub user_id: String,
    pub user_name: String,
    pub emoji: String,
    pub image_url: String,
    pub created_at: i64,
}

pub struct CommentRow {
    pub id: String,
    pub image_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub image_url: String,
    pub created_at: i64,
}

impl From<&Reaction> for ReactionRow {
    fn from(r: &Reaction) -> Self {
        Self {
            id: r.id.to_string(),
            image_id: r.image_id.clone(),
            user_id: r.user_id.to_string(),
            user_name: r.user_name.clone(),
            emoji: r.emoji.clone(),
            image_url: r.image_url.clone(),
            created_at: r.created_at.timestamp_millis(),
        }
    }
}

impl From<&Comment> for CommentRow {
    fn from(c: &Comment) -> Self {
        Self {
            id: c.id.to_string(),
            image_id: c.image_id.clone(),
            user_id: c.user_id.to_string(),
            user_name: c.user_name.clone(),
            text: c.text.clone(),
            image_url: c.image_url.clone(),
            created_at: c.created_at.timestamp_millis(),
        }
    }
}

impl ReactionRow {
    pub fn into_reaction(self) -> Reaction {
        Reaction {
            id: parse_uuid(&self.id, "id", &self.id),
            user_id: parse_uuid(&self.user_id, "user_id", &self.id),
            created_at: parse_millis(self.created_at, &self.id),
            image_id: self.image_id,
            user_name: self.user_name,
            emoji: self.emoji,
            image_url: self.image_url,
        }
    }
}

impl CommentRow {
    pub fn into_comment(self) -> Comment {
        Comment {
            id: parse_uuid(&self.id, "id", &self.id),
            user_id: parse_uuid(&self.user_id, "user_id", &self.id),
            created_at: parse_millis(self.created_at, &self.id),
            image_id: self.image_id,
            user_name: self.user_name,
            text: self.text,
            image_url: self.image_url,
        }
    }
}

fn parse_uuid(raw: &str, column: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", column, raw, row_id, e);
        Uuid::default()
    })
}

fn parse_millis(ms: i64, row_id: &str) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(|| {
        warn!("Corrupt created_at '{}' on row '{}'", ms, row_id);
        DateTime::default()
    })
}
