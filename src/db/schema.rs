pub const SCHEMA: &str = r#"
-- song_cache table
CREATE TABLE IF NOT EXISTS song_cache (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    input_key TEXT NOT NULL,
    meta_key TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    release_date TEXT,
    musical_key TEXT,
    chord_pro_content TEXT NOT NULL,
    source_urls TEXT NOT NULL DEFAULT '[]',
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_song_cache_input_key ON song_cache(input_key, updated_at DESC);
CREATE INDEX IF NOT EXISTS idx_song_cache_updated_at ON song_cache(updated_at DESC);

-- search_logs table (write only)
CREATE TABLE IF NOT EXISTS search_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL,
    ip_address TEXT,
    user_agent TEXT,
    is_cached INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- feedbacks table (append only)
CREATE TABLE IF NOT EXISTS feedbacks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    song_title TEXT,
    song_artist TEXT,
    input_query TEXT,
    rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
    comment TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feedbacks_created_at ON feedbacks(created_at DESC);
"#;
