pub mod error;
pub mod mock;
pub mod paginator;
pub mod source;
pub mod unsplash;

pub use error::CatalogError;
pub use mock::MockCatalog;
pub use paginator::{DEFAULT_PAGE_SIZE, Paginator};
pub use source::{CatalogSource, FallbackCatalog, catalog_from_key};
pub use unsplash::UnsplashCatalog;
