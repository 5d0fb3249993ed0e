mod repository;
mod schema;
mod store;

pub use repository::SqliteStore;
pub use store::SongStore;
