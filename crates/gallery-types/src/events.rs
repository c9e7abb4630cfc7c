use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, Reaction};

/// Change events pushed by the sync service and relayed over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SyncEvent {
    /// Sent once to a freshly connected gateway client
    Ready { user_id: Uuid, user_name: String },

    /// A reaction was stored
    ReactionCreate { reaction: Reaction },

    /// A reaction changed emoji (and timestamp)
    ReactionUpdate { reaction: Reaction },

    /// A reaction was toggled off
    ReactionDelete { id: Uuid, image_id: String },

    /// A comment was posted
    CommentCreate { comment: Comment },

    /// A comment was removed by its author
    CommentDelete { id: Uuid, image_id: String },
    /// The gateway dropped `missed` changes for this client; reload whatever is on screen
    Resync { missed: u64 },
}

impl SyncEvent {
    /// Returns the image this event is scoped to.
    /// `Ready` and `Resync` are connection-scoped and return `None`.
    pub fn image_id(&self) -> Option<&str> {
        match self {
            Self::Ready { .. } | Self::Resync { .. } => None,
            Self::ReactionCreate { reaction } | Self::ReactionUpdate { reaction } => {
                Some(&reaction.image_id)
            }
            Self::CommentCreate { comment } => Some(&comment.image_id),
            Self::ReactionDelete { image_id, .. } | Self::CommentDelete { image_id, .. } => {
                Some(image_id)
            }
        }
    }

    pub fn touches_reactions(&self) -> bool {
        matches!(
            self,
            Self::ReactionCreate { .. } | Self::ReactionUpdate { .. } | Self::ReactionDelete { .. }
        )
    }

    pub fn touches_comments(&self) -> bool {
        matches!(self, Self::CommentCreate { .. } | Self::CommentDelete { .. })
    }
}

/// Commands sent FROM client TO server over the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientCommand {
    /// Receive events for these images
    Subscribe { image_ids: Vec<String> },

    /// Stop receiving events for these images
    Unsubscribe { image_ids: Vec<String> },

    /// Receive every event (the activity feed view)
    FeedSubscribe { enabled: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_tagged_json() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"Subscribe","data":{"image_ids":["a","b"]}}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Subscribe { image_ids: vec!["a".into(), "b".into()] }
        );
    }

    #[test]
    fn delete_events_are_image_scoped() {
        let event = SyncEvent::CommentDelete { id: Uuid::nil(), image_id: "img".into() };
        assert_eq!(event.image_id(), Some("img"));
        assert!(event.touches_comments());
        assert!(!event.touches_reactions());
    }
}
