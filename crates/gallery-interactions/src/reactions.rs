//! One reaction per user per image.
//!
//! The store does not enforce this; it holds because every reaction write
//! goes through [`plan_reaction`], which looks at the reactions already
//! loaded for the image and decides whether the click creates, removes or
//! replaces the user's reaction. Two devices planning against the same
//! stale snapshot can both choose `Create`; nothing here prevents that.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use gallery_types::api::{ReactionGroup, ReactionOp, ReactionSummary};
use gallery_types::models::{Reaction, truncate_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionPlan {
    /// No reaction yet: store a new one.
    Create,
    /// Same emoji clicked again: toggle it off.
    Remove { id: Uuid },
    /// Different emoji: overwrite emoji and timestamp in place.
    Replace { id: Uuid, since: DateTime<Utc> },
}

impl ReactionPlan {
    pub fn op(&self) -> ReactionOp {
        match self {
            Self::Create => ReactionOp::Created,
            Self::Remove { .. } => ReactionOp::Removed,
            Self::Replace { .. } => ReactionOp::Replaced,
        }
    }
}

/// Decide what an emoji click by `actor` does, given the reactions loaded
/// for one image.
///
/// If the snapshot already holds several reactions by the actor (the
/// two-device race), the oldest one is the one acted on.
pub fn plan_reaction(existing: &[Reaction], actor: Uuid, emoji: &str) -> ReactionPlan {
    let mine = existing
        .iter()
        .filter(|r| r.user_id == actor)
        .min_by_key(|r| (r.created_at, r.id));

    match mine {
        None => ReactionPlan::Create,
        Some(r) if r.emoji == emoji => ReactionPlan::Remove { id: r.id },
        Some(r) => ReactionPlan::Replace { id: r.id, since: r.created_at },
    }
}

/// Timestamp for a replaced reaction: now, but never earlier than the
/// reaction it replaces. Millisecond precision, like everything stored.
pub fn replacement_time(since: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    truncate_millis(now.max(since))
}

/// Count reactions per emoji, most used first.
pub fn summarize(reactions: &[Reaction]) -> ReactionSummary {
    let mut by_emoji: BTreeMap<&str, Vec<Uuid>> = BTreeMap::new();
    for r in reactions {
        by_emoji.entry(r.emoji.as_str()).or_default().push(r.user_id);
    }

    let mut groups: Vec<ReactionGroup> = by_emoji
        .into_iter()
        .map(|(emoji, user_ids)| ReactionGroup {
            emoji: emoji.to_string(),
            count: user_ids.len(),
            user_ids,
        })
        .collect();
    // Stable sort keeps emoji order among equal counts
    groups.sort_by(|a, b| b.count.cmp(&a.count));

    ReactionSummary {
        total: reactions.len(),
        groups,
    }
}
