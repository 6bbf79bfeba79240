pub mod wav;

pub use wav::{WavCapture, WavCaptureFactory};

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Audio routing requested at capture acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioSource {
    /// Generic microphone input
    Microphone,
    /// In-call audio routing (both legs of an active call), where available
    CallAudio,
}

/// Active capture handle
///
/// One handle is owned by exactly one active session: acquired at session
/// start, stopped (and its file finalized) at session stop.
#[async_trait::async_trait]
pub trait AudioCapture: Send {
    /// Stop capturing and finalize the output file
    async fn stop(&mut self) -> Result<()>;

    /// The source this handle was acquired with
    fn source(&self) -> AudioSource;

    /// The output file this handle writes to
    fn path(&self) -> &Path;
}

/// Capture acquisition boundary
///
/// Acquisition may fail (device busy, routing unsupported); the orchestrator
/// decides fallback policy.
pub trait CaptureFactory: Send + Sync {
    fn acquire(&self, source: AudioSource, output: PathBuf) -> Result<Box<dyn AudioCapture>>;
}
