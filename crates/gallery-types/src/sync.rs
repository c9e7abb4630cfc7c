//! Query and transaction shapes understood by the sync service.
//!
//! A [`Query`] is declarative: which entity kinds, filtered by image,
//! limited and ordered by creation time. A [`Mutation`] is one atomic
//! create/update/delete keyed by a client-generated id; mutations are
//! submitted in batches that either all apply or none do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::SyncEvent;
use crate::models::{Comment, Reaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityQuery {
    pub image_id: Option<String>,
    pub limit: Option<u32>,
    pub order: Order,
}

impl EntityQuery {
    fn matches_image(&self, image_id: Option<&str>) -> bool {
        match (&self.image_id, image_id) {
            (None, _) => true,
            (Some(wanted), Some(got)) => wanted == got,
            (Some(_), None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub reactions: Option<EntityQuery>,
    pub comments: Option<EntityQuery>,
}

impl Query {
    /// Every reaction and comment on one image.
    pub fn for_image(image_id: &str) -> Self {
        let scoped = EntityQuery {
            image_id: Some(image_id.to_string()),
            limit: None,
            order: Order::Asc,
        };
        Self {
            reactions: Some(scoped.clone()),
            comments: Some(scoped),
        }
    }

    /// The newest `limit` reactions and the newest `limit` comments system-wide.
    pub fn recent(limit: u32) -> Self {
        let newest = EntityQuery {
            image_id: None,
            limit: Some(limit),
            order: Order::Desc,
        };
        Self {
            reactions: Some(newest.clone()),
            comments: Some(newest),
        }
    }

    /// Whether `event` can change the result of this query.
    pub fn matches(&self, event: &SyncEvent) -> bool {
        let image_id = event.image_id();
        let reactions = event.touches_reactions()
            && self.reactions.as_ref().is_some_and(|q| q.matches_image(image_id));
        let comments = event.touches_comments()
            && self.comments.as_ref().is_some_and(|q| q.matches_image(image_id));
        reactions || comments
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub reactions: Vec<Reaction>,
    pub comments: Vec<Comment>,
}

impl QueryResult {
    /// Apply a mutation to this snapshot locally, ahead of the service
    /// re-delivering authoritative state.
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::CreateReaction(reaction) => {
                if !self.reactions.iter().any(|r| r.id == reaction.id) {
                    self.reactions.push(reaction.clone());
                }
            }
            Mutation::UpdateReaction { id, emoji, created_at } => {
                if let Some(r) = self.reactions.iter_mut().find(|r| r.id == *id) {
                    r.emoji = emoji.clone();
                    r.created_at = *created_at;
                }
            }
            Mutation::DeleteReaction { id } => self.reactions.retain(|r| r.id != *id),
            Mutation::CreateComment(comment) => {
                if !self.comments.iter().any(|c| c.id == comment.id) {
                    self.comments.push(comment.clone());
                }
            }
            Mutation::DeleteComment { id } => self.comments.retain(|c| c.id != *id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Mutation {
    CreateReaction(Reaction),
    UpdateReaction {
        id: Uuid,
        emoji: String,
        created_at: DateTime<Utc>,
    },
    DeleteReaction { id: Uuid },
    CreateComment(Comment),
    DeleteComment { id: Uuid },
}
