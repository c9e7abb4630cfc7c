mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gallery_api::AppStateInner;
use gallery_catalog::{MockCatalog, Paginator, catalog_from_key};
use gallery_db::Database;
use gallery_interactions::IdentityStore;
use gallery_sync::connection;
use gallery_sync::{Dispatcher, LocalSync};

use crate::config::Config;

#[derive(Clone)]
struct GatewayState {
    dispatcher: Dispatcher,
    identity: Arc<IdentityStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery=debug,gallery_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Local user state and the shared interaction store are separate databases
    let state_db = Arc::new(Database::open(&config.state_path)?);
    let identity = Arc::new(IdentityStore::open(state_db)?);

    let sync_db = match config.sync_db_path() {
        Some(path) => {
            info!("Interaction store at {}", path.display());
            Database::open(&path)?
        }
        None => {
            warn!("Interaction store running in memory");
            Database::open_in_memory()?
        }
    };

    let dispatcher = Dispatcher::new();
    let sync = Arc::new(LocalSync::new(Arc::new(sync_db), dispatcher.clone()));

    let mock = MockCatalog::new(rand::random()).with_latency(config.mock_latency);
    let catalog = catalog_from_key(
        config.unsplash_access_key.as_deref(),
        &config.unsplash_api_url,
        mock,
    );
    let pager = Paginator::new(catalog, config.page_size);

    let app_state = AppStateInner::new(sync, identity.clone(), pager);

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(GatewayState {
            dispatcher,
            identity,
        });

    let app = gallery_api::router(app_state)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Gallery server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let identity = state.identity.current();
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher, identity)
    })
}
