pub mod connection;
pub mod dispatcher;
pub mod live;
pub mod service;

pub use dispatcher::Dispatcher;
pub use live::{LiveQuery, QueryState};
pub use service::{LocalSync, SyncService};
