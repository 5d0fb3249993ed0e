mod feedback;
mod search;
mod song;

pub use feedback::FeedbackEntry;
pub use search::{ExternalSearchHit, SearchLogEntry};
pub use song::{CacheRecord, SongResult, UNKNOWN_ARTIST, UNKNOWN_SONG};
