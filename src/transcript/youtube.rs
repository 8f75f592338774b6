//! YouTube transcript fetcher
//!
//! Pulls the watch page, locates the caption track list in the embedded
//! player response, downloads the timedtext XML for the preferred language
//! and decodes it into transcript segments. Any failure along the way is a
//! `TranscriptUnavailable` error; there is nothing to recover per-segment.

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{Transcript, TranscriptSegment, VideoMetadata};
use crate::error::{AnalyzerError, Result};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// HTTP client for YouTube's public transcript endpoints
#[derive(Clone)]
pub struct YouTubeTranscriptClient {
    client: Client,
    language: String,
}

/// One entry of the watch page's caption track list
#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    /// `"asr"` marks auto-generated tracks
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    #[serde(rename = "videoId")]
    video_id: String,
    title: String,
    author: String,
    #[serde(rename = "lengthSeconds")]
    length_seconds: String,
}

impl YouTubeTranscriptClient {
    /// Create a new transcript client
    pub fn new(timeout_seconds: u64, language: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            language: language.to_string(),
        }
    }

    /// Fetch the transcript and video metadata for a YouTube URL
    pub async fn fetch_transcript(&self, url: &str) -> Result<Transcript> {
        let video_id = extract_video_id(url)?;
        info!("📺 Fetching transcript for video: {}", video_id);

        let page = self
            .client
            .get(format!("{}{}", WATCH_URL, video_id))
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| unavailable(&video_id, &format!("watch page request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| unavailable(&video_id, &format!("watch page returned {}", e)))?
            .text()
            .await
            .map_err(|e| unavailable(&video_id, &format!("watch page body unreadable: {}", e)))?;

        let player_response = extract_player_response(&page)
            .ok_or_else(|| unavailable(&video_id, "no player response on watch page"))?;

        let details: VideoDetails = serde_json::from_value(
            player_response
                .get("videoDetails")
                .cloned()
                .ok_or_else(|| unavailable(&video_id, "watch page has no video details"))?,
        )
        .map_err(|e| unavailable(&video_id, &format!("malformed video details: {}", e)))?;

        let tracks: Vec<CaptionTrack> = player_response
            .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(unavailable(&video_id, "video has no caption tracks"));
        }

        let track = select_track(&tracks, &self.language);
        debug!(
            "Selected caption track: language={}, kind={:?}",
            track.language_code, track.kind
        );

        let timedtext = self
            .client
            .get(&track.base_url)
            .send()
            .await
            .map_err(|e| unavailable(&video_id, &format!("timedtext request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| unavailable(&video_id, &format!("timedtext returned {}", e)))?
            .text()
            .await
            .map_err(|e| unavailable(&video_id, &format!("timedtext body unreadable: {}", e)))?;

        let segments = parse_timedtext(&timedtext);
        if segments.is_empty() {
            return Err(unavailable(&video_id, "caption track is empty"));
        }

        let metadata = VideoMetadata {
            video_id: details.video_id,
            title: details.title,
            author: details.author,
            length_seconds: details.length_seconds.parse().unwrap_or(0),
        };

        info!(
            "✅ Transcript fetched: \"{}\" by {} ({} segments, {}s)",
            metadata.title,
            metadata.author,
            segments.len(),
            metadata.length_seconds
        );

        Ok(Transcript { metadata, segments })
    }
}

fn unavailable(video_id: &str, reason: &str) -> AnalyzerError {
    AnalyzerError::TranscriptUnavailable(format!("video {}: {}", video_id, reason))
}

/// Extract the 11-character video id from the common YouTube URL shapes
/// (watch, youtu.be, shorts, embed).
pub fn extract_video_id(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|_| AnalyzerError::TranscriptUnavailable(format!("invalid URL: {}", raw)))?;

    let host = parsed.host_str().unwrap_or_default().trim_start_matches("www.");
    let candidate = match host {
        "youtube.com" | "m.youtube.com" | "music.youtube.com" => {
            if parsed.path() == "/watch" {
                parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
            } else {
                // /shorts/<id>, /embed/<id>, /live/<id>
                let mut parts = parsed.path_segments().into_iter().flatten();
                match parts.next() {
                    Some("shorts") | Some("embed") | Some("live") => {
                        parts.next().map(|s| s.to_string())
                    }
                    _ => None,
                }
            }
        }
        "youtu.be" => parsed
            .path_segments()
            .into_iter()
            .flatten()
            .next()
            .map(|s| s.to_string()),
        _ => None,
    };

    match candidate {
        Some(id) if is_valid_video_id(&id) => Ok(id),
        _ => Err(AnalyzerError::TranscriptUnavailable(format!(
            "not a recognized YouTube video URL: {}",
            raw
        ))),
    }
}

fn is_valid_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Locate the `ytInitialPlayerResponse` JSON object embedded in the watch
/// page and parse it. The object is found by balanced-brace scan rather than
/// regex because minified JSON can contain any byte sequence inside strings.
fn extract_player_response(page: &str) -> Option<serde_json::Value> {
    let marker = page.find("ytInitialPlayerResponse")?;
    let start = marker + page[marker..].find('{')?;
    let body = balanced_json_object(&page[start..])?;
    serde_json::from_str(body).ok()
}

/// Return the prefix of `s` spanning one balanced `{...}` object,
/// tracking string literals and escapes.
fn balanced_json_object(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pick the best caption track for the preferred language: a manually
/// authored track in that language beats an auto-generated one, any track in
/// that language beats other languages, and the first track is the fallback.
fn select_track<'a>(tracks: &'a [CaptionTrack], language: &str) -> &'a CaptionTrack {
    let in_language = |t: &&CaptionTrack| {
        t.language_code == language || t.language_code.starts_with(&format!("{}-", language))
    };

    tracks
        .iter()
        .filter(in_language)
        .find(|t| t.kind.as_deref() != Some("asr"))
        .or_else(|| tracks.iter().find(in_language))
        .unwrap_or(&tracks[0])
}

/// Parse timedtext XML (`<text start=".." dur="..">cue</text>`) into segments
fn parse_timedtext(xml: &str) -> Vec<TranscriptSegment> {
    // The timedtext format has been stable for years; a regex is enough.
    let cue = Regex::new(r#"(?s)<text start="([\d.]+)"(?: dur="([\d.]+)")?[^>]*>(.*?)</text>"#)
        .expect("static regex");

    cue.captures_iter(xml)
        .filter_map(|caps| {
            let start: f64 = caps.get(1)?.as_str().parse().ok()?;
            let duration: f64 = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0.0);
            let text = decode_entities(caps.get(3)?.as_str());
            if text.trim().is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                text,
                start,
                duration,
            })
        })
        .collect()
}

/// Decode the XML entities YouTube emits in timedtext cues
fn decode_entities(text: &str) -> String {
    let mut out = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");

    // Numeric references (&#233; etc.) show up in non-English cues
    let numeric = Regex::new(r"&#(\d+);").expect("static regex");
    if numeric.is_match(&out) {
        out = numeric
            .replace_all(&out, |caps: &regex::Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_from_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_video_id_from_short_link() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=30").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_video_id_from_shorts_and_embed() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/shorts/abc123def45").unwrap(),
            "abc123def45"
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/abc123def45").unwrap(),
            "abc123def45"
        );
    }

    #[test]
    fn test_video_id_rejects_other_sites() {
        assert!(extract_video_id("https://vimeo.com/123456789").is_err());
        assert!(extract_video_id("not a url at all").is_err());
        assert!(extract_video_id("https://www.youtube.com/playlist?list=PLx").is_err());
    }

    #[test]
    fn test_balanced_object_extraction() {
        let page = r#"<script>var ytInitialPlayerResponse = {"a":{"b":"closing } inside string"},"n":1};</script>"#;
        let value = extract_player_response(page).unwrap();
        assert_eq!(value["n"], 1);
        assert_eq!(value["a"]["b"], "closing } inside string");
    }

    #[test]
    fn test_timedtext_parsing() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?><transcript>
<text start="0.08" dur="3.2">first cue</text>
<text start="3.28" dur="2.5">it&amp;#39;s &quot;quoted&quot;</text>
<text start="5.9" dur="1.0">   </text>
</transcript>"#;
        let segments = parse_timedtext(xml);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "first cue");
        assert!((segments[0].start - 0.08).abs() < 1e-9);
        assert!((segments[1].duration - 2.5).abs() < 1e-9);
        assert_eq!(segments[1].text, "it's \"quoted\"");
    }

    #[test]
    fn test_entity_decoding() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#233;cole"), "école");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
    }

    #[test]
    fn test_track_selection_prefers_manual_over_asr() {
        let tracks = vec![
            CaptionTrack {
                base_url: "asr".into(),
                language_code: "en".into(),
                kind: Some("asr".into()),
            },
            CaptionTrack {
                base_url: "manual".into(),
                language_code: "en".into(),
                kind: None,
            },
            CaptionTrack {
                base_url: "fr".into(),
                language_code: "fr".into(),
                kind: None,
            },
        ];
        assert_eq!(select_track(&tracks, "en").base_url, "manual");
        assert_eq!(select_track(&tracks, "fr").base_url, "fr");
        // No matching language falls back to the first track
        assert_eq!(select_track(&tracks, "de").base_url, "asr");
    }
}
