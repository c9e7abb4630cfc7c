use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current time at the precision the store keeps (milliseconds).
/// Records minted with it compare equal to what is read back.
pub fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

pub fn truncate_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(t)
}

/// The local user. `user_name` stays empty until the first login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub user_name: String,
}

impl UserIdentity {
    pub fn is_logged_in(&self) -> bool {
        !self.user_name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Uuid,
    pub image_id: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub emoji: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub image_id: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub text: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// A reaction or comment re-tagged for the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedItem {
    Reaction(Reaction),
    Comment(Comment),
}

impl FeedItem {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Reaction(r) => r.id,
            Self::Comment(c) => c.id,
        }
    }

    pub fn image_id(&self) -> &str {
        match self {
            Self::Reaction(r) => &r.image_id,
            Self::Comment(c) => &c.image_id,
        }
    }

    pub fn user_name(&self) -> &str {
        match self {
            Self::Reaction(r) => &r.user_name,
            Self::Comment(c) => &c.user_name,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Reaction(r) => r.created_at,
            Self::Comment(c) => c.created_at,
        }
    }
}

// -- Catalog --

/// Image metadata as served by the image API. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub urls: ImageUrls,
    pub user: Photographer,
    #[serde(default)]
    pub alt_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub likes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrls {
    pub regular: String,
    pub small: String,
    pub thumb: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photographer {
    pub name: String,
    #[serde(default)]
    pub profile_image: Option<ProfileImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileImage {
    pub medium: String,
}
