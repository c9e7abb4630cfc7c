use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, error};

use gallery_db::Database;
use gallery_types::events::SyncEvent;
use gallery_types::sync::{Mutation, Query, QueryResult};

use crate::dispatcher::Dispatcher;

/// The realtime document store behind the interaction layer.
///
/// Reads are declarative queries; writes are atomic batches of mutations.
/// Every committed change is pushed to `subscribe()` receivers, which is
/// what lets live queries re-deliver state after writes from any session.
#[async_trait]
pub trait SyncService: Send + Sync {
    async fn query(&self, query: &Query) -> Result<QueryResult>;

    /// Apply `mutations` atomically. Mutations that match no row are skipped.
    async fn transact(&self, mutations: Vec<Mutation>) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<SyncEvent>;
}

/// SQLite-backed sync service with an in-process change feed.
pub struct LocalSync {
    db: Arc<Database>,
    dispatcher: Dispatcher,
}

impl LocalSync {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher) -> Self {
        Self { db, dispatcher }
    }
}

#[async_trait]
impl SyncService for LocalSync {
    async fn query(&self, query: &Query) -> Result<QueryResult> {
        // Run blocking DB query off the async runtime
        let db = self.db.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || db.run_query(&query))
            .await
            .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
    }

    async fn transact(&self, mutations: Vec<Mutation>) -> Result<()> {
        let db = self.db.clone();
        let count = mutations.len();
        let events = tokio::task::spawn_blocking(move || db.apply_mutations(&mutations))
            .await
            .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
            .map_err(|e| {
                error!("Transaction of {} mutations failed: {}", count, e);
                e
            })?;

        debug!("Transaction committed: {} mutations, {} changes", count, events.len());
        for event in events {
            self.dispatcher.broadcast(event);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.dispatcher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_types::models::now_millis;
    use gallery_types::models::Comment;
    use uuid::Uuid;

    fn local() -> LocalSync {
        LocalSync::new(Arc::new(Database::open_in_memory().unwrap()), Dispatcher::new())
    }

    fn comment(image_id: &str) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            image_id: image_id.into(),
            user_id: Uuid::new_v4(),
            user_name: "ada".into(),
            text: "hello".into(),
            image_url: String::new(),
            created_at: now_millis(),
        }
    }

    #[tokio::test]
    async fn transact_broadcasts_committed_changes() {
        let sync = local();
        let mut changes = sync.subscribe();
        let c = comment("a");

        sync.transact(vec![Mutation::CreateComment(c.clone())]).await.unwrap();

        assert_eq!(changes.recv().await.unwrap(), SyncEvent::CommentCreate { comment: c.clone() });
        let result = sync.query(&Query::for_image("a")).await.unwrap();
        assert_eq!(result.comments, vec![c]);
    }

    #[tokio::test]
    async fn no_op_mutations_broadcast_nothing() {
        let sync = local();
        let mut changes = sync.subscribe();

        sync.transact(vec![Mutation::DeleteReaction { id: Uuid::new_v4() }]).await.unwrap();

        assert!(matches!(
            changes.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
