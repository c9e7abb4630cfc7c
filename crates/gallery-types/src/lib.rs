pub mod api;
pub mod events;
pub mod models;
pub mod sync;

/// Reaction choices offered next to every image.
pub const EMOJI_PALETTE: [&str; 6] = ["❤️", "🔥", "👏", "😂", "😮", "😢"];
