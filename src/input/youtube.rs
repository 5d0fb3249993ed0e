use std::sync::LazyLock;

use regex::Regex;

// watch?v=, /shorts/, /embed/, /e/, /v/, /<channel>/<x>/<id> and youtu.be/<id>
static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?|shorts)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("YouTube URL pattern is valid")
});

/// Returns true when the input contains a recognizable YouTube video URL.
pub fn is_youtube_url(input: &str) -> bool {
    extract_video_id(input).is_some()
}

/// Extracts the 11 character video id from a YouTube URL.
pub fn extract_video_id(input: &str) -> Option<String> {
    YOUTUBE_RE
        .captures(input.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns true when the input references a YouTube domain at all, whether
/// or not it carries a usable video id.
pub fn mentions_youtube(input: &str) -> bool {
    let lower = input.to_lowercase();
    lower.contains("youtube") || lower.contains("youtu.be")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_id_from_supported_forms() {
        let forms = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ?t=42",
            "  HTTPS://YOUTU.BE/dQw4w9WgXcQ  ",
        ];
        for form in forms {
            assert_eq!(
                extract_video_id(form).as_deref(),
                Some("dQw4w9WgXcQ"),
                "failed on {form}"
            );
        }
    }

    #[test]
    fn test_rejects_short_ids_and_plain_text() {
        assert!(!is_youtube_url("https://youtube.com/watch?v=bad"));
        assert!(!is_youtube_url("https://youtu.be/abc"));
        assert!(!is_youtube_url("Let It Be The Beatles"));
        assert!(!is_youtube_url(""));
    }

    #[test]
    fn test_mentions_youtube() {
        assert!(mentions_youtube("https://youtube.com/watch?v=bad"));
        assert!(mentions_youtube("YouTu.be/x"));
        assert!(!mentions_youtube("Wonderwall"));
    }
}
