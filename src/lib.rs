pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod utils;

pub use config::Config;
pub use self::core::{
    ExtractError, Extraction, ManifestDescriptor, MediaRecord, PlaylistRecord, Session,
};
pub use extractors::{resolve_fresh_manifest, StreamingCommunityExtractor};
