use std::sync::Arc;

use tokio::sync::Mutex;

use gallery_catalog::Paginator;
use gallery_interactions::IdentityStore;
use gallery_sync::SyncService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub sync: Arc<dyn SyncService>,
    pub identity: Arc<IdentityStore>,
    /// Held across the catalog request so pages are fetched one at a time
    pub pager: Mutex<Paginator>,
}

impl AppStateInner {
    pub fn new(
        sync: Arc<dyn SyncService>,
        identity: Arc<IdentityStore>,
        pager: Paginator,
    ) -> AppState {
        Arc::new(Self {
            sync,
            identity,
            pager: Mutex::new(pager),
        })
    }
}
