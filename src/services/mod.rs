mod converter;
mod export;
mod library;
mod rest_store;

pub use converter::{Converter, ConverterSettings};
pub use export::{save_chordpro, share_url};
pub use library::{HOME_RECENT_LIMIT, LIBRARY_RECENT_LIMIT};
pub use rest_store::RestStore;
