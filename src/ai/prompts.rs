use serde_json::{json, Value};

use super::client::{CompletionRequest, Mode};

const DEEP_SYSTEM_PROMPT: &str = r#"You are an expert professional music transcriber with 20+ years of experience in chord transcription.

CRITICAL RULES:
1. ACCURACY FIRST: Ensure 90%+ accuracy in chord placement and lyrics.
2. IDENTITY RULE: If a YouTube URL is provided, identify that EXACT video from its metadata using Google Search grounding.
3. NO SUBSTITUTIONS: Never substitute a popular version if it differs from the video provided.
4. SPECIAL VERSIONS: For live versions, acoustic versions or covers, transcribe THAT specific performance.
5. CHORD VALIDATION: Double-check that every chord position lines up with the lyrics.
6. LYRICS ACCURACY: Transcribe lyrics with proper capitalization and punctuation.
7. FORMAT: Use standard ChordPro with inline [CHORD] notation.
8. CONFIDENCE: If you cannot verify the song with high confidence, answer {"error": "<reason>"} instead of guessing."#;

const EXPRESS_SYSTEM_PROMPT: &str = r#"Fast Mode: Extract chords from your internal knowledge. If a link is provided, infer the song from the link text. Prioritize speed over exhaustive accuracy, but if you do not know the song answer {"error": "<reason>"} instead of guessing."#;

/// Schema for the structured song answer. Only title, artist and
/// chordProContent are required.
pub fn song_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "artist": { "type": "STRING" },
            "releaseDate": { "type": "STRING" },
            "key": { "type": "STRING" },
            "chordProContent": { "type": "STRING" },
            "error": {
                "type": "STRING",
                "description": "Only set when the song cannot be identified or transcribed"
            }
        },
        "required": ["title", "artist", "chordProContent"]
    })
}

/// Builds the transcription request for a raw user input.
pub fn song_request(input: &str, is_video_url: bool, mode: Mode, deep_thinking_budget: u32) -> CompletionRequest {
    let prompt = if is_video_url {
        format!(
            r#"YOUTUBE VIDEO TRANSCRIPTION TASK:
URL: {input}

STEP 1: Identify this exact YouTube video and determine:
- Exact video title
- Artist name
- Video duration
- Whether it is the original, a live, acoustic or cover version

STEP 2: Transcribe the chords and lyrics for THIS SPECIFIC VIDEO:
- Place each chord [C], [G], [Am], etc. inline at the correct syllable
- Include all verses, choruses and sections
- Keep the structure: title, artist, key, ChordPro body

STEP 3: Return JSON:
{{"title": "Exact Song Title", "artist": "Artist Name", "key": "Key if known", "releaseDate": "Year if available", "chordProContent": "full ChordPro content"}}

If you cannot identify the video, return {{"error": "<reason>"}}.
CRITICAL: Match THIS video exactly, not a similar song by the same artist."#
        )
    } else {
        format!(
            r#"SONG NAME TRANSCRIPTION TASK:
Song Query: "{input}"

Transcribe the most well-known version of this song with accurate chords and lyrics:
- Chords in inline [CHORD] notation
- Include verses, choruses and sections
- Return ChordPro with title, artist, key and content

Return JSON: {{"title", "artist", "key", "releaseDate", "chordProContent"}}
If this is not a song you know, return {{"error": "<reason>"}}."#
        )
    };

    let (system, thinking_budget) = match mode {
        Mode::Deep => (DEEP_SYSTEM_PROMPT, deep_thinking_budget),
        Mode::Express => (EXPRESS_SYSTEM_PROMPT, 0),
    };

    CompletionRequest {
        system_instruction: Some(system.to_string()),
        prompt,
        grounding: mode.is_deep(),
        thinking_budget,
        response_schema: Some(song_response_schema()),
    }
}

/// Builds the grounded lookup used to suggest YouTube videos for a query.
pub fn external_search_request(query: &str, limit: usize) -> CompletionRequest {
    let prompt = format!(
        r#"Search YouTube for songs matching "{query}".
Return at most {limit} results as JSON:
{{"results": [{{"id": "11 character video id", "title": "Song title", "artist": "Artist", "duration": "m:ss", "url": "https://www.youtube.com/watch?v=<id>"}}]}}
Only include videos you found through search. Return {{"results": []}} if nothing matches."#
    );

    CompletionRequest {
        system_instruction: None,
        prompt,
        grounding: true,
        thinking_budget: 0,
        response_schema: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_request_enables_grounding() {
        let request = song_request("Let It Be", false, Mode::Deep, 20_000);
        assert!(request.grounding);
        assert_eq!(request.thinking_budget, 20_000);
        assert!(request.prompt.contains("Song Query: \"Let It Be\""));
        assert!(request.system_instruction.unwrap().contains("IDENTITY RULE"));
    }

    #[test]
    fn test_express_request_disables_grounding() {
        let request = song_request("https://youtu.be/dQw4w9WgXcQ", true, Mode::Express, 20_000);
        assert!(!request.grounding);
        assert_eq!(request.thinking_budget, 0);
        assert!(request.prompt.contains("URL: https://youtu.be/dQw4w9WgXcQ"));
    }

    #[test]
    fn test_schema_requires_identity_and_content() {
        let schema = song_response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["title", "artist", "chordProContent"]);
    }
}
