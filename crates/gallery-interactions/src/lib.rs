pub mod error;
pub mod feed;
pub mod identity;
pub mod image;
pub mod reactions;

pub use error::{IdentityError, InteractionError};
pub use feed::Feed;
pub use identity::IdentityStore;
pub use image::ImageInteractions;
