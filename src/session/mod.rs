//! Recording session management
//!
//! This module provides the session orchestrator and its producers:
//! - `Orchestrator`: the single-writer state machine owning session state
//! - `TranscriptionSupervisor`: restart loop keeping the speech engine alive
//! - `MetricSampler`: periodic speaking-rate sampling
//! - snapshot types and the word-count/WPM arithmetic

mod config;
mod orchestrator;
mod sampler;
mod state;
mod supervisor;

pub use config::SessionConfig;
pub use orchestrator::{Orchestrator, SessionHandle};
pub use state::{
    append_utterance, count_words, words_per_minute, RecordingMode, SessionSnapshot, WpmSample,
};
pub use supervisor::{FeedbackGate, SilentFeedbackGate};
