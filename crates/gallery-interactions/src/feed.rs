//! Recent activity across all images.

use std::sync::Arc;

use gallery_sync::{LiveQuery, QueryState, SyncService};
use gallery_types::models::{Comment, FeedItem, Reaction};
use gallery_types::sync::Query;

use crate::error::InteractionError;

/// How many of each kind of record the feed pulls.
pub const FEED_LIMIT: u32 = 30;

/// Interleave reactions and comments, newest first. Equal timestamps fall
/// back to id order so the result does not depend on input order.
pub fn merge_feed(reactions: Vec<Reaction>, comments: Vec<Comment>) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = reactions
        .into_iter()
        .map(FeedItem::Reaction)
        .chain(comments.into_iter().map(FeedItem::Comment))
        .collect();

    items.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
    items
}

pub struct Feed {
    live: LiveQuery,
}

impl Feed {
    pub fn open(sync: Arc<dyn SyncService>) -> Self {
        Self::open_with_limit(sync, FEED_LIMIT)
    }

    pub fn open_with_limit(sync: Arc<dyn SyncService>, limit: u32) -> Self {
        Self {
            live: LiveQuery::spawn(sync, Query::recent(limit)),
        }
    }

    pub fn state(&self) -> QueryState {
        self.live.state()
    }

    /// The merged feed from the latest snapshot. Empty while loading.
    pub fn items(&self) -> Vec<FeedItem> {
        match self.live.state().data {
            Some(data) => merge_feed(data.reactions, data.comments),
            None => Vec::new(),
        }
    }

    pub async fn ready(&mut self) -> Result<Vec<FeedItem>, InteractionError> {
        let state = self.live.ready().await?;
        match (state.data, state.error) {
            (Some(data), _) => Ok(merge_feed(data.reactions, data.comments)),
            (None, Some(error)) => Err(InteractionError::Unavailable(error)),
            (None, None) => Err(InteractionError::Unavailable("no data".into())),
        }
    }

    pub async fn changed(&mut self) -> Result<Vec<FeedItem>, InteractionError> {
        let state = self.live.changed().await?;
        Ok(state
            .data
            .map(|d| merge_feed(d.reactions, d.comments))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use gallery_db::Database;
    use gallery_sync::{Dispatcher, LocalSync};
    use gallery_types::sync::Mutation;
    use uuid::Uuid;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn reaction(image_id: &str, ms: i64) -> Reaction {
        Reaction {
            id: Uuid::new_v4(),
            image_id: image_id.into(),
            user_id: Uuid::new_v4(),
            user_name: "ada".into(),
            emoji: "👏".into(),
            image_url: String::new(),
            created_at: at(ms),
        }
    }

    fn comment(image_id: &str, ms: i64) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            image_id: image_id.into(),
            user_id: Uuid::new_v4(),
            user_name: "grace".into(),
            text: "nice".into(),
            image_url: String::new(),
            created_at: at(ms),
        }
    }

    #[test]
    fn merge_interleaves_newest_first() {
        let reactions = vec![reaction("a", 1_000), reaction("b", 3_000)];
        let comments = vec![comment("a", 2_000), comment("c", 4_000), comment("a", 500)];

        let items = merge_feed(reactions, comments);
        let times: Vec<i64> = items.iter().map(|i| i.created_at().timestamp_millis()).collect();

        assert_eq!(items.len(), 5);
        assert_eq!(times, vec![4_000, 3_000, 2_000, 1_000, 500]);
        assert!(matches!(items[0], FeedItem::Comment(_)));
        assert!(matches!(items[1], FeedItem::Reaction(_)));
    }

    #[test]
    fn equal_timestamps_order_by_id() {
        let reactions = vec![reaction("a", 1_000), reaction("b", 1_000)];
        let comments = vec![comment("c", 1_000)];

        let forward = merge_feed(reactions.clone(), comments.clone());
        let mut rev_reactions = reactions;
        rev_reactions.reverse();
        let backward = merge_feed(rev_reactions, comments);

        let ids = |items: &[FeedItem]| items.iter().map(|i| i.id()).collect::<Vec<_>>();
        assert_eq!(ids(&forward), ids(&backward));
        assert!(ids(&forward).windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn feed_is_capped_per_kind_and_updates() {
        let sync = Arc::new(LocalSync::new(
            Arc::new(Database::open_in_memory().unwrap()),
            Dispatcher::new(),
        ));
        let mut seed = Vec::new();
        for i in 0..5 {
            seed.push(Mutation::CreateReaction(reaction("a", i * 10)));
            seed.push(Mutation::CreateComment(comment("b", i * 10 + 1)));
        }
        sync.transact(seed).await.unwrap();

        let mut feed = Feed::open_with_limit(sync.clone(), 3);
        let items = feed.ready().await.unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].created_at(), at(41));

        let newest = comment("z", 99_000);
        sync.transact(vec![Mutation::CreateComment(newest.clone())])
            .await
            .unwrap();

        let items = feed.changed().await.unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].id(), newest.id);
    }
}
