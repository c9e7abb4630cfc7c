//! Live queries: a query that keeps itself current.
//!
//! Each live query owns a task holding a change-feed subscription. The task
//! runs the query once, then re-runs it whenever a change that can affect
//! the result is broadcast, publishing every result as a [`QueryState`]
//! snapshot on a watch channel. The task ends when the [`LiveQuery`] (and
//! every receiver cloned from it) is dropped.
//!
//! Local writes are folded into the snapshot right away. A query that was
//! already in flight when such a write landed is run again before anything
//! is published, so a snapshot never rolls back a local write.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use gallery_types::events::SyncEvent;
use gallery_types::sync::{Mutation, Query, QueryResult};

use crate::service::SyncService;

/// Loading/error/data triple delivered to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub data: Option<QueryResult>,
}

impl QueryState {
    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }
}

pub struct LiveQuery {
    state: watch::Receiver<QueryState>,
    publisher: Arc<watch::Sender<QueryState>>,
    /// Bumped on every optimistic write
    local_writes: Arc<AtomicU64>,
}

impl LiveQuery {
    pub fn spawn(service: Arc<dyn SyncService>, query: Query) -> Self {
        let (tx, rx) = watch::channel(QueryState::loading());
        let publisher = Arc::new(tx);
        let local_writes = Arc::new(AtomicU64::new(0));

        // Subscribe before the first read so no change slips between the two
        let changes = service.subscribe();
        let refresher = Refresher {
            service,
            query,
            publisher: publisher.clone(),
            local_writes: local_writes.clone(),
        };
        tokio::spawn(refresher.run(changes));

        Self {
            state: rx,
            publisher,
            local_writes,
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    /// Wait for the first result (or error) to arrive.
    pub async fn ready(&mut self) -> Result<QueryState> {
        let state = self
            .state
            .wait_for(|s| !s.is_loading)
            .await
            .map_err(|_| anyhow!("live query stopped"))?;
        Ok(state.clone())
    }

    /// Wait until a newer snapshot has been published.
    pub async fn changed(&mut self) -> Result<QueryState> {
        self.state
            .changed()
            .await
            .map_err(|_| anyhow!("live query stopped"))?;
        Ok(self.state.borrow_and_update().clone())
    }

    /// Fold a mutation into the local snapshot without waiting for the
    /// service to re-deliver. The next delivery replaces it.
    pub fn apply_optimistic(&self, mutation: &Mutation) {
        self.local_writes.fetch_add(1, Ordering::AcqRel);
        self.publisher.send_modify(|s| {
            if let Some(data) = s.data.as_mut() {
                data.apply(mutation);
            }
        });
    }
}

struct Refresher {
    service: Arc<dyn SyncService>,
    query: Query,
    publisher: Arc<watch::Sender<QueryState>>,
    local_writes: Arc<AtomicU64>,
}

impl Refresher {
    async fn run(self, mut changes: broadcast::Receiver<SyncEvent>) {
        self.refresh().await;

        loop {
            tokio::select! {
                _ = self.publisher.closed() => break,
                result = changes.recv() => match result {
                    Ok(event) => {
                        if self.query.matches(&event) {
                            self.refresh().await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Live query lagged by {} changes, re-querying", n);
                        self.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        debug!("Live query stopped");
    }

    async fn refresh(&self) {
        let result = loop {
            let writes_before = self.local_writes.load(Ordering::Acquire);
            let result = self.service.query(&self.query).await;
            if result.is_err() || self.local_writes.load(Ordering::Acquire) == writes_before {
                break result;
            }
            debug!("Snapshot predates a local write, re-querying");
        };

        self.publisher.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(data) => {
                    s.data = Some(data);
                    s.error = None;
                }
                Err(e) => {
                    warn!("Live query failed: {}", e);
                    s.error = Some(e.to_string());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::service::LocalSync;
    use async_trait::async_trait;
    use gallery_types::models::now_millis;
    use gallery_db::Database;
    use gallery_types::models::Reaction;
    use uuid::Uuid;

    fn reaction(image_id: &str) -> Reaction {
        Reaction {
            id: Uuid::new_v4(),
            image_id: image_id.into(),
            user_id: Uuid::new_v4(),
            user_name: "ada".into(),
            emoji: "🔥".into(),
            image_url: String::new(),
            created_at: now_millis(),
        }
    }

    fn local() -> Arc<LocalSync> {
        Arc::new(LocalSync::new(
            Arc::new(Database::open_in_memory().unwrap()),
            Dispatcher::new(),
        ))
    }

    #[tokio::test]
    async fn first_snapshot_clears_loading() {
        let mut live = LiveQuery::spawn(local(), Query::for_image("a"));
        let state = live.ready().await.unwrap();

        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.data, Some(QueryResult::default()));
    }

    #[tokio::test]
    async fn redelivers_after_matching_write() {
        let sync = local();
        let mut live = LiveQuery::spawn(sync.clone(), Query::for_image("a"));
        live.ready().await.unwrap();

        let r = reaction("a");
        sync.transact(vec![Mutation::CreateReaction(r.clone())]).await.unwrap();

        let state = live.changed().await.unwrap();
        assert_eq!(state.data.unwrap().reactions, vec![r]);
    }

    #[tokio::test]
    async fn optimistic_apply_is_visible_immediately() {
        let sync = local();
        let mut live = LiveQuery::spawn(sync, Query::for_image("a"));
        live.ready().await.unwrap();

        let r = reaction("a");
        live.apply_optimistic(&Mutation::CreateReaction(r.clone()));

        assert_eq!(live.state().data.unwrap().reactions, vec![r]);
    }

    struct FailingSync {
        dispatcher: Dispatcher,
    }

    #[async_trait]
    impl SyncService for FailingSync {
        async fn query(&self, _query: &Query) -> Result<QueryResult> {
            Err(anyhow!("service unavailable"))
        }

        async fn transact(&self, _mutations: Vec<Mutation>) -> Result<()> {
            Err(anyhow!("service unavailable"))
        }

        fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
            self.dispatcher.subscribe()
        }
    }

    #[tokio::test]
    async fn query_errors_surface_in_state() {
        let sync = Arc::new(FailingSync { dispatcher: Dispatcher::new() });
        let mut live = LiveQuery::spawn(sync, Query::recent(30));
        let state = live.ready().await.unwrap();

        assert_eq!(state.error.as_deref(), Some("service unavailable"));
        assert!(state.data.is_none());
    }
}
