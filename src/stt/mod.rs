//! Speech-to-text engine boundary
//!
//! The platform engine is an external collaborator. It is modeled as a
//! message-passing boundary: one `listen()` call arms a single listening
//! session and returns a channel of events for it. Engines here report one
//! final result per utterance; continuous recognition is built on top by the
//! transcription supervisor's restart loop.

use anyhow::{bail, Result};
use tokio::sync::mpsc;

/// Events emitted by one listening session, in delivery order
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Engine is armed and listening
    Ready,
    /// Final recognized text for the current utterance
    Result(String),
    /// Natural end of the utterance, no further results will arrive
    EndOfUtterance,
    /// Engine-side failure for this listening session
    Error(String),
}

/// Speech recognition engine
#[async_trait::async_trait]
pub trait SpeechEngine: Send {
    /// Whether recognition is available at all on this platform
    fn is_available(&self) -> bool;

    /// Arm a new listening session
    ///
    /// The returned channel closes when the listening session ends. At most
    /// one listening session is armed at a time; callers must stop the
    /// previous one first.
    async fn listen(&mut self) -> Result<mpsc::Receiver<EngineEvent>>;

    /// Tear down the current listening session, if any
    async fn stop_listening(&mut self) -> Result<()>;
}

/// Creates one engine instance per recording session
///
/// The engine handle lives exactly as long as the session that acquired it.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Box<dyn SpeechEngine>;
}

/// Factory for [`NullEngine`]
pub struct NullEngineFactory;

impl EngineFactory for NullEngineFactory {
    fn create(&self) -> Box<dyn SpeechEngine> {
        Box::new(NullEngine)
    }
}

/// Placeholder engine for platforms without speech recognition
///
/// Reports unavailability, which the session treats as non-fatal: audio
/// capture proceeds without transcription.
pub struct NullEngine;

#[async_trait::async_trait]
impl SpeechEngine for NullEngine {
    fn is_available(&self) -> bool {
        false
    }

    async fn listen(&mut self) -> Result<mpsc::Receiver<EngineEvent>> {
        bail!("Speech recognition not available")
    }

    async fn stop_listening(&mut self) -> Result<()> {
        Ok(())
    }
}
