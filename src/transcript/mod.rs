pub mod youtube;

pub use youtube::YouTubeTranscriptClient;

use serde::{Deserialize, Serialize};

/// One caption cue from a video transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Cue text
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// Cue duration in seconds
    pub duration: f64,
}

/// Video metadata attached to a fetched transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// YouTube video id
    pub video_id: String,
    /// Video title
    pub title: String,
    /// Channel / uploader name
    pub author: String,
    /// Total video length in seconds
    pub length_seconds: u64,
}

/// Complete fetched transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub metadata: VideoMetadata,
    /// Caption cues in playback order
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Total character count across all segments
    pub fn text_len(&self) -> usize {
        self.segments.iter().map(|s| s.text.chars().count()).sum()
    }
}
