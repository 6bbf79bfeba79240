use crate::store::CallRecording;
use serde::{Deserialize, Serialize};

/// Which audio source the next recording session should use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// Ambient voice recording from the microphone
    #[default]
    Voice,
    /// Phone-call recording (call audio routing where available)
    Call,
}

/// One live speaking-rate sample: (seconds since session start, words per minute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WpmSample {
    pub elapsed_seconds: u64,
    pub wpm: u32,
}

/// Immutable snapshot of the orchestrator's session state
///
/// The orchestrator is the only writer; everyone else observes snapshots
/// published on a watch channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    /// Default mode used by the next start
    pub mode: RecordingMode,

    /// Whether a session is currently active
    pub is_recording: bool,

    /// Telephony state, independent of `is_recording`
    pub is_in_call: bool,

    /// Accumulated transcript, append-only within a session
    pub recognized_text: String,

    /// Word count derived from `recognized_text`
    pub word_count: usize,

    /// Seconds since session start, non-decreasing within a session
    pub elapsed_seconds: u64,

    /// Live speaking rate
    pub current_wpm: u32,

    /// Ordered samples, strictly increasing in `elapsed_seconds`
    pub wpm_samples: Vec<WpmSample>,

    /// Last user-visible error, cleared on successful start
    pub last_error: Option<String>,

    /// Cached copy of the store catalog
    pub saved_recordings: Vec<CallRecording>,
}

/// Count maximal non-blank runs when splitting on whitespace
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words-per-minute, rounded half away from zero; 0 when no time has elapsed
pub fn words_per_minute(word_count: usize, elapsed_seconds: u64) -> u32 {
    if elapsed_seconds == 0 {
        return 0;
    }
    ((word_count as f64 / elapsed_seconds as f64) * 60.0).round() as u32
}

/// Append a recognized utterance with a single separating space
///
/// Internal whitespace of `new_text` is preserved as delivered by the engine.
pub fn append_utterance(current: &str, new_text: &str) -> String {
    if current.is_empty() {
        new_text.to_string()
    } else {
        format!("{} {}", current, new_text)
    }
}
