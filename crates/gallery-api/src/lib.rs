pub mod feed;
pub mod images;
pub mod interactions;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
