mod common;

use std::sync::Arc;

use serde_json::json;

use chordpro_scribe::db::SongStore;
use chordpro_scribe::error::{AppError, ConvertError};
use chordpro_scribe::models::FeedbackEntry;

use common::{cached_record, converter, CountingStore, MockAi};

async fn seeded_store() -> Arc<CountingStore> {
    let store = Arc::new(CountingStore::new().await);
    for (key, title, artist) in [
        ("query:let it be", "Let It Be", "The Beatles"),
        ("query:wonderwall", "Wonderwall", "Oasis"),
        ("query:yesterday", "Yesterday", "The Beatles"),
    ] {
        store
            .inner
            .upsert_song(cached_record(key, title, artist, "[C]la"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    store
}

#[tokio::test]
async fn test_search_cache_matches_title_or_artist() {
    let store = seeded_store().await;
    let converter = converter(Some(store), None);

    let beatles = converter.search_cache("beatles", 10).await;
    let titles: Vec<_> = beatles.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Yesterday", "Let It Be"]);
    assert!(beatles.iter().all(|s| s.is_from_cache));

    let wonder = converter.search_cache("WONDER", 10).await;
    assert_eq!(wonder.len(), 1);

    assert_eq!(converter.search_cache("beatles", 1).await.len(), 1);
}

#[tokio::test]
async fn test_search_cache_empty_query_skips_store() {
    let store = seeded_store().await;
    let converter = converter(Some(store.clone()), None);

    assert!(converter.search_cache("", 10).await.is_empty());
    assert!(converter.search_cache("   ", 10).await.is_empty());
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_list_recent_is_newest_first() {
    let store = seeded_store().await;
    let converter = converter(Some(store), None);

    let recent = converter.list_recent(2).await;
    let titles: Vec<_> = recent.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Yesterday", "Wonderwall"]);
}

#[tokio::test]
async fn test_library_degrades_without_or_with_broken_store() {
    let converter_without = converter(None, None);
    assert!(converter_without.list_recent(6).await.is_empty());
    assert!(converter_without.search_cache("beatles", 6).await.is_empty());
    assert!(converter_without.fetch_feedbacks().await.is_empty());

    let store = seeded_store().await;
    store.set_failing(true);
    let broken = converter(Some(store), None);
    assert!(broken.list_recent(6).await.is_empty());
    assert!(broken.search_cache("beatles", 6).await.is_empty());
}

#[tokio::test]
async fn test_feedback_round_trip() {
    let store = Arc::new(CountingStore::new().await);
    let converter = converter(Some(store), None);

    converter
        .submit_feedback(
            FeedbackEntry::new("fan@example.com", "Chords in the bridge are off")
                .with_rating(4)
                .with_song("Let It Be", "The Beatles")
                .with_query("let it be"),
        )
        .await
        .unwrap();
    converter
        .submit_feedback(FeedbackEntry::new("other@example.com", "Love it"))
        .await
        .unwrap();

    let feedbacks = converter.fetch_feedbacks().await;
    assert_eq!(feedbacks.len(), 2);
    assert_eq!(feedbacks[0].comment, "Love it");
    assert_eq!(feedbacks[1].rating, Some(4));
    assert_eq!(feedbacks[1].song_title.as_deref(), Some("Let It Be"));
}

#[tokio::test]
async fn test_feedback_validation() {
    let store = Arc::new(CountingStore::new().await);
    let converter = converter(Some(store.clone()), None);

    let err = converter
        .submit_feedback(FeedbackEntry::new("  ", "no email"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::Validation(_)));

    let err = converter
        .submit_feedback(FeedbackEntry::new("a@b.c", "too many stars").with_rating(6))
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::Validation(_)));

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_feedback_store_failure_is_swallowed() {
    let store = Arc::new(CountingStore::new().await);
    store.set_failing(true);
    let converter = converter(Some(store.clone()), None);

    assert!(converter
        .submit_feedback(FeedbackEntry::new("a@b.c", "hello"))
        .await
        .is_ok());
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_search_external_parses_hits() {
    let text = format!(
        "Here is what I found:\n```json\n{}\n```",
        json!({"results": [
            {"id": "dQw4w9WgXcQ", "title": "Never Gonna Give You Up", "artist": "Rick Astley", "duration": "3:33", "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"},
            {"id": "", "title": "Broken", "url": ""},
            {"title": "Missing id"},
            {"id": "abcdefghijk", "title": "Second", "url": "https://youtu.be/abcdefghijk"},
            {"id": "bcdefghijkl", "title": "Third", "url": "https://youtu.be/bcdefghijkl"}
        ]})
    );
    let ai = Arc::new(MockAi::new().respond_text(text));
    let converter = converter(None, Some(ai.clone()));

    let hits = converter.search_external("rick astley", 2).await;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "dQw4w9WgXcQ");
    assert_eq!(hits[0].duration.as_deref(), Some("3:33"));
    assert_eq!(hits[1].artist, "");

    let request = ai.last_request().unwrap();
    assert!(request.grounding);
}

#[tokio::test]
async fn test_search_external_never_fails() {
    let ai = Arc::new(
        MockAi::new()
            .respond(Err(AppError::GeminiApi("HTTP 503".to_string())))
            .respond_text("no idea")
            .respond_text(r#"{"results": "nope"}"#),
    );
    let converter = converter(None, Some(ai.clone()));

    assert!(converter.search_external("a", 5).await.is_empty());
    assert!(converter.search_external("b", 5).await.is_empty());
    assert!(converter.search_external("c", 5).await.is_empty());
    assert!(converter.search_external("", 5).await.is_empty());
    assert_eq!(ai.calls(), 3);

    assert!(common::converter(None, None).search_external("d", 5).await.is_empty());
}

#[tokio::test]
async fn test_search_cache_folds_accented_case() {
    let store = Arc::new(CountingStore::new().await);
    store
        .inner
        .upsert_song(cached_record("query:l'été indien", "ÉTÉ INDIEN", "Joe Dassin", "[Am]Tu sais"))
        .await
        .unwrap();
    let converter = converter(Some(store), None);

    let hits = converter.search_cache("été", 10).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "ÉTÉ INDIEN");
}
