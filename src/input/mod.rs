mod keys;
mod youtube;

pub use keys::{derive_dedup_key, derive_lookup_key, slugify};
pub use youtube::{extract_video_id, is_youtube_url, mentions_youtube};
