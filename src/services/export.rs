use std::path::{Path, PathBuf};

use anyhow::Context;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::SongResult;

/// Link that reopens the converter on `query`, replacing any existing `q`.
pub fn share_url(base_url: &str, query: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::Config(format!("invalid share_base_url {}: {}", base_url, e)))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "q")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("q", query.trim());

    Ok(url.to_string())
}

/// Writes the ChordPro body into `dir` and returns the file path.
pub fn save_chordpro(song: &SongResult, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))?;
    let path = dir.join(song.file_name());
    std::fs::write(&path, &song.annotated_content)
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(path)
}
