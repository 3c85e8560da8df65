pub mod config;
pub mod types;

pub use config::Config;
pub use types::{MediaKind, MediaObject, PeekFilter, PostType};
