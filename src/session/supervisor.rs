use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use super::orchestrator::{EventSender, SessionEvent};
use crate::stt::{EngineEvent, SpeechEngine};

/// Suppression of competing audio feedback while the engine listens
///
/// Purely a UX side effect: recognition cues and notification sounds would
/// otherwise leak into the capture. Not part of the correctness contract.
pub trait FeedbackGate: Send + Sync {
    fn mute(&self);
    fn unmute(&self);
}

/// No-op gate for platforms without adjustable feedback channels
pub struct SilentFeedbackGate;

impl FeedbackGate for SilentFeedbackGate {
    fn mute(&self) {}
    fn unmute(&self) {}
}

/// Keeps a transcription listening session continuously alive
///
/// Engines report one final result per utterance, so continuous transcription
/// means re-arming the engine after every utterance, end-of-speech, or engine
/// error. The restart is an explicit loop with a single-owner pending flag:
/// at most one restart is in flight, and no error path can leave the flag
/// stuck. Transient engine errors are recovered here and never surfaced.
pub(crate) struct TranscriptionSupervisor {
    pub(crate) engine: Box<dyn SpeechEngine>,
    pub(crate) events: EventSender,
    pub(crate) shutdown: watch::Receiver<bool>,
    pub(crate) restart_delay: Duration,
    pub(crate) ready_grace: Duration,
    pub(crate) max_arm_failures: u32,
    pub(crate) gate: Arc<dyn FeedbackGate>,
}

impl TranscriptionSupervisor {
    pub(crate) async fn run(mut self) {
        if !self.engine.is_available() {
            // Non-fatal for the session: capture continues without transcription
            let _ = self
                .events
                .send(SessionEvent::EngineUnavailable(
                    "Speech recognition not available".to_string(),
                ))
                .await;
            return;
        }

        let mut restart_pending = false;
        let mut arm_failures = 0u32;

        loop {
            if self.stopped() {
                break;
            }

            if restart_pending {
                // Settle delay before re-arming; bail out early on stop
                tokio::select! {
                    _ = tokio::time::sleep(self.restart_delay) => {}
                    _ = self.shutdown.changed() => {}
                }
                restart_pending = false;
                if self.stopped() {
                    break;
                }
            }

            self.gate.mute();

            let mut engine_rx = match self.engine.listen().await {
                Ok(rx) => {
                    arm_failures = 0;
                    rx
                }
                Err(e) => {
                    self.gate.unmute();
                    arm_failures += 1;
                    if arm_failures >= self.max_arm_failures {
                        warn!("Giving up on transcription after {} failed restarts", arm_failures);
                        let _ = self
                            .events
                            .send(SessionEvent::EngineUnavailable(format!(
                                "Speech recognition failed: {:#}",
                                e
                            )))
                            .await;
                        break;
                    }
                    warn!("Failed to arm listening session ({:#}), retrying", e);
                    restart_pending = true;
                    continue;
                }
            };

            // Consume one listening session. The first restart trigger wins;
            // later events for this session are simply not consumed.
            let mut orchestrator_gone = false;
            loop {
                tokio::select! {
                    event = engine_rx.recv() => match event {
                        Some(EngineEvent::Ready) => {
                            let gate = Arc::clone(&self.gate);
                            let grace = self.ready_grace;
                            tokio::spawn(async move {
                                tokio::time::sleep(grace).await;
                                gate.unmute();
                            });
                        }
                        Some(EngineEvent::Result(text)) => {
                            if !self.events.send(SessionEvent::Transcript(text)).await {
                                orchestrator_gone = true;
                            }
                            restart_pending = true;
                            break;
                        }
                        Some(EngineEvent::EndOfUtterance) => {
                            restart_pending = true;
                            break;
                        }
                        Some(EngineEvent::Error(msg)) => {
                            // Transient: recovered by restarting, never surfaced
                            info!("Recognition error ({}), restarting", msg);
                            restart_pending = true;
                            break;
                        }
                        None => {
                            restart_pending = true;
                            break;
                        }
                    },
                    changed = self.shutdown.changed() => {
                        if changed.is_err() {
                            // Owning session is gone entirely
                            orchestrator_gone = true;
                            break;
                        }
                        if self.stopped() {
                            break;
                        }
                    }
                }
            }

            // The engine handle is torn down before any re-arm, on every path
            if let Err(e) = self.engine.stop_listening().await {
                warn!("Failed to stop listening session: {:#}", e);
            }

            if orchestrator_gone || self.stopped() {
                break;
            }
        }

        if let Err(e) = self.engine.stop_listening().await {
            warn!("Failed to release recognition engine: {:#}", e);
        }
        self.gate.unmute();
        info!("Transcription supervisor stopped");
    }

    fn stopped(&self) -> bool {
        *self.shutdown.borrow()
    }
}
