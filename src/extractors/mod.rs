pub mod embed;
pub mod manifest;
pub mod refresh;
pub mod streamingcommunity;

pub use embed::{extract_embed_token, follow_embed, EmbedManifest, PlayerData, StreamCandidate};
pub use manifest::synthesize;
pub use refresh::{resolve_fresh_manifest, resolve_fresh_manifest_with};
pub use streamingcommunity::StreamingCommunityExtractor;
