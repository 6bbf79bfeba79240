pub mod audio;
pub mod call;
pub mod config;
pub mod http;
pub mod session;
pub mod store;
pub mod stt;

pub use audio::{AudioCapture, AudioSource, CaptureFactory, WavCapture, WavCaptureFactory};
pub use call::{CallBridge, CallState};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{
    FeedbackGate, Orchestrator, RecordingMode, SessionConfig, SessionHandle, SessionSnapshot,
    SilentFeedbackGate, WpmSample,
};
pub use store::{CallRecording, FsRecordingStore, RecordingStore};
pub use stt::{EngineEvent, EngineFactory, NullEngine, NullEngineFactory, SpeechEngine};
