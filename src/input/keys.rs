use super::youtube::extract_video_id;

/// Key used for exact-match cache reads.
///
/// Video URLs collapse to `yt:<id>` so every URL form of the same video hits
/// the same row; anything else becomes `query:<lowercased trimmed text>`.
pub fn derive_lookup_key(input: &str) -> String {
    match extract_video_id(input) {
        Some(id) => format!("yt:{}", id),
        None => format!("query:{}", input.trim().to_lowercase()),
    }
}

/// Key used as the upsert conflict target, built from the resolved identity.
pub fn derive_dedup_key(title: &str, artist: &str, release_date: Option<&str>) -> String {
    format!(
        "{}:{}:{}",
        slugify(artist),
        slugify(title),
        slugify(release_date.unwrap_or("unknown"))
    )
}

/// Lowercases and drops everything outside `[a-z0-9]`.
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
