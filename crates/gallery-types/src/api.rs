use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, FeedItem, Image, Reaction};

// -- Session --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub user_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub user_name: String,
    pub logged_in: bool,
}

// -- Catalog --

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagePageResponse {
    /// Page number just fetched; `None` when no fetch was issued.
    pub page: Option<u32>,
    pub images: Vec<Image>,
    pub has_next_page: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GalleryResponse {
    pub images: Vec<Image>,
    pub pages_loaded: usize,
    pub has_next_page: bool,
}

// -- Reactions --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AddReactionRequest {
    pub emoji: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionOp {
    Created,
    Removed,
    Replaced,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionOutcome {
    pub op: ReactionOp,
    /// The live reaction after the operation; absent when it was removed.
    pub reaction: Option<Reaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: usize,
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub total: usize,
    /// Ordered by count descending, then emoji.
    pub groups: Vec<ReactionGroup>,
}

impl ReactionSummary {
    /// The `n` most used emojis with their counts.
    pub fn top(&self, n: usize) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .take(n)
            .map(|g| (g.emoji.as_str(), g.count))
            .collect()
    }

    pub fn count_for(&self, emoji: &str) -> usize {
        self.groups
            .iter()
            .find(|g| g.emoji == emoji)
            .map_or(0, |g| g.count)
    }
}

// -- Comments --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentRequest {
    pub text: String,
    pub image_url: String,
}

// -- Views --

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageInteractionsResponse {
    pub image_id: String,
    pub reactions: Vec<Reaction>,
    /// Newest first.
    pub comments: Vec<Comment>,
    pub summary: ReactionSummary,
    pub my_reaction: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
}
