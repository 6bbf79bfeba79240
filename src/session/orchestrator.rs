use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::sampler::MetricSampler;
use super::state::{append_utterance, count_words, words_per_minute};
use super::supervisor::{FeedbackGate, TranscriptionSupervisor};
use super::{RecordingMode, SessionSnapshot, WpmSample};
use crate::audio::{AudioCapture, AudioSource, CaptureFactory};
use crate::store::{CallRecording, RecordingStore};
use crate::stt::EngineFactory;

/// User-facing commands, each answered through its reply channel
#[derive(Debug)]
enum Command {
    Start {
        mode: RecordingMode,
        phone_number: Option<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        persist: bool,
        reply: oneshot::Sender<Result<()>>,
    },
    SwitchMode {
        mode: RecordingMode,
    },
    CallStarted {
        phone_number: Option<String>,
    },
    CallEnded,
    DeleteRecording {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    RefreshRecordings {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Events produced by the sampler and the transcription supervisor
#[derive(Debug)]
pub(crate) enum SessionEvent {
    /// Periodic speaking-rate sample request
    Tick,
    /// Final recognized text for one utterance
    Transcript(String),
    /// Recognition is unavailable for the rest of this session
    EngineUnavailable(String),
}

/// Everything entering the orchestrator's single serialized mailbox
#[derive(Debug)]
enum Msg {
    Command(Command),
    Event { generation: u64, event: SessionEvent },
}

/// Producer-side sender, tagged with the generation of the session that
/// spawned it so events from a torn-down session are dropped on arrival
///
/// Holds only a weak sender: producers never keep the actor alive, so the
/// actor observes closure once every external handle is gone.
#[derive(Clone)]
pub(crate) struct EventSender {
    tx: mpsc::WeakSender<Msg>,
    generation: u64,
}

impl EventSender {
    /// Returns false when the orchestrator is gone
    pub(crate) async fn send(&self, event: SessionEvent) -> bool {
        let Some(tx) = self.tx.upgrade() else {
            return false;
        };
        tx.send(Msg::Event {
            generation: self.generation,
            event,
        })
        .await
        .is_ok()
    }
}

/// Resources owned by the one active session
struct ActiveSession {
    generation: u64,
    mode: RecordingMode,
    phone_number: Option<String>,
    started_at: Instant,
    started_at_epoch_ms: i64,
    capture: Box<dyn AudioCapture>,
    shutdown: watch::Sender<bool>,
    sampler: JoinHandle<()>,
    supervisor: JoinHandle<()>,
}

/// Cloneable handle to the session orchestrator
///
/// All mutations go through the actor mailbox; reads come from watch-channel
/// snapshots. Dropping every handle ends the actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Msg>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Start a recording session; tears down and restarts if one is active
    pub async fn start(&self, mode: RecordingMode, phone_number: Option<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start {
            mode,
            phone_number,
            reply,
        })
        .await?;
        rx.await.map_err(|_| anyhow!("Session task ended"))?
    }

    /// Stop the active session; a no-op when idle
    pub async fn stop(&self, persist: bool) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { persist, reply }).await?;
        rx.await.map_err(|_| anyhow!("Session task ended"))?
    }

    /// Change the default mode used by the next start
    pub async fn switch_mode(&self, mode: RecordingMode) -> Result<()> {
        self.send(Command::SwitchMode { mode }).await
    }

    /// Telephony notification: a call became active
    pub async fn call_started(&self, phone_number: Option<String>) -> Result<()> {
        self.send(Command::CallStarted { phone_number }).await
    }

    /// Telephony notification: the call ended
    pub async fn call_ended(&self) -> Result<()> {
        self.send(Command::CallEnded).await
    }

    /// Delete a persisted recording; returns whether it was removed
    pub async fn delete_recording(&self, id: &str) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::DeleteRecording {
            id: id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| anyhow!("Session task ended"))
    }

    /// Reload the cached recording list from the store
    pub async fn refresh_recordings(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RefreshRecordings { reply }).await?;
        rx.await.map_err(|_| anyhow!("Session task ended"))?
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Observable stream of state snapshots
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Msg::Command(command))
            .await
            .map_err(|_| anyhow!("Session task ended"))
    }
}

/// The session state machine: `Idle` or `Active(mode)`
///
/// Owns the only mutable `SessionSnapshot` and processes one mailbox message
/// to completion before the next, so sampler ticks, transcription results,
/// user commands, and call events can never interleave a state mutation.
pub struct Orchestrator {
    state: SessionSnapshot,
    active: Option<ActiveSession>,
    generation: u64,

    config: SessionConfig,
    store: Arc<dyn RecordingStore>,
    capture_factory: Arc<dyn CaptureFactory>,
    engine_factory: Arc<dyn EngineFactory>,
    gate: Arc<dyn FeedbackGate>,

    msg_tx: mpsc::WeakSender<Msg>,
    msg_rx: mpsc::Receiver<Msg>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Orchestrator {
    /// Spawn the orchestrator actor and return its handle
    pub fn spawn(
        config: SessionConfig,
        store: Arc<dyn RecordingStore>,
        capture_factory: Arc<dyn CaptureFactory>,
        engine_factory: Arc<dyn EngineFactory>,
        gate: Arc<dyn FeedbackGate>,
    ) -> SessionHandle {
        let (msg_tx, msg_rx) = mpsc::channel(64);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let orchestrator = Orchestrator {
            state: SessionSnapshot::default(),
            active: None,
            generation: 0,
            config,
            store,
            capture_factory,
            engine_factory,
            gate,
            msg_tx: msg_tx.downgrade(),
            msg_rx,
            snapshot_tx,
        };

        tokio::spawn(orchestrator.run());

        SessionHandle {
            tx: msg_tx,
            snapshot_rx,
        }
    }

    async fn run(mut self) {
        info!("Session orchestrator started");

        while let Some(msg) = self.msg_rx.recv().await {
            match msg {
                Msg::Command(command) => self.handle_command(command).await,
                Msg::Event { generation, event } => {
                    // Drop events that outlived the session that produced them
                    if self.active.as_ref().map(|a| a.generation) == Some(generation) {
                        self.handle_event(event);
                    }
                }
            }
        }

        // All handles dropped: release anything still held
        if self.active.is_some() {
            if let Err(e) = self.stop_session(false).await {
                error!("Failed to release session resources: {:#}", e);
            }
        }
        info!("Session orchestrator stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start {
                mode,
                phone_number,
                reply,
            } => {
                let result = self.start_session(mode, phone_number).await;
                let _ = reply.send(result);
            }
            Command::Stop { persist, reply } => {
                let result = self.stop_session(persist).await;
                let _ = reply.send(result);
            }
            Command::SwitchMode { mode } => {
                // Default-mode update only; a live session keeps its mode
                if self.active.is_none() {
                    self.state.mode = mode;
                    self.publish();
                }
            }
            Command::CallStarted { phone_number } => {
                self.state.is_in_call = true;
                self.state.mode = RecordingMode::Call;
                self.publish();
                // Call priority: overrides any manual recording in progress
                if let Err(e) = self.start_session(RecordingMode::Call, phone_number).await {
                    error!("Failed to start call recording: {:#}", e);
                }
            }
            Command::CallEnded => {
                self.state.is_in_call = false;
                self.publish();
                let active_call = self
                    .active
                    .as_ref()
                    .is_some_and(|a| a.mode == RecordingMode::Call);
                if active_call {
                    if let Err(e) = self.stop_session(true).await {
                        error!("Failed to stop call recording: {:#}", e);
                    }
                }
            }
            Command::DeleteRecording { id, reply } => {
                let _ = reply.send(self.delete_recording(&id));
            }
            Command::RefreshRecordings { reply } => {
                let _ = reply.send(self.refresh_recordings());
            }
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Tick => self.sample_wpm(),
            SessionEvent::Transcript(text) => {
                let updated = append_utterance(&self.state.recognized_text, &text);
                self.state.word_count = count_words(&updated);
                self.state.recognized_text = updated;
                self.publish();
            }
            SessionEvent::EngineUnavailable(message) => {
                warn!("Transcription disabled for this session: {}", message);
                self.state.last_error = Some(message);
                self.publish();
            }
        }
    }

    async fn start_session(
        &mut self,
        mode: RecordingMode,
        phone_number: Option<String>,
    ) -> Result<()> {
        if self.active.is_some() {
            // Start-over: tear down the live session without persisting. The
            // old session is terminated either way, so a cleanup failure must
            // not abort the new start.
            warn!("Start requested while recording; restarting without persisting");
            if let Err(e) = self.stop_session(false).await {
                warn!("Previous session cleanup failed: {:#}", e);
            }
        }

        let started_at_epoch_ms = Utc::now().timestamp_millis();
        let output = match mode {
            RecordingMode::Call => self
                .store
                .create_file(started_at_epoch_ms, phone_number.as_deref()),
            RecordingMode::Voice => {
                std::env::temp_dir().join(format!("voice_recording_{}.wav", started_at_epoch_ms))
            }
        };

        let capture = match self.acquire_capture(mode, output) {
            Ok(capture) => capture,
            Err(e) => {
                self.state.last_error = Some(format!("Recording failed: {:#}", e));
                self.state.is_recording = false;
                self.publish();
                return Err(e);
            }
        };

        self.generation += 1;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let events = EventSender {
            tx: self.msg_tx.clone(),
            generation: self.generation,
        };

        let sampler = MetricSampler::spawn(
            self.config.sample_interval,
            shutdown_rx.clone(),
            events.clone(),
        );
        let supervisor = tokio::spawn(
            TranscriptionSupervisor {
                engine: self.engine_factory.create(),
                events,
                shutdown: shutdown_rx,
                restart_delay: self.config.restart_delay,
                ready_grace: self.config.ready_grace,
                max_arm_failures: self.config.max_arm_failures,
                gate: Arc::clone(&self.gate),
            }
            .run(),
        );

        self.active = Some(ActiveSession {
            generation: self.generation,
            mode,
            phone_number,
            started_at: Instant::now(),
            started_at_epoch_ms,
            capture,
            shutdown: shutdown_tx,
            sampler,
            supervisor,
        });

        self.state.mode = mode;
        self.state.is_recording = true;
        self.state.recognized_text.clear();
        self.state.word_count = 0;
        self.state.elapsed_seconds = 0;
        self.state.current_wpm = 0;
        self.state.wpm_samples.clear();
        self.state.last_error = None;
        self.publish();

        info!("Recording session started ({:?})", mode);
        Ok(())
    }

    /// Call mode asks for call-audio routing first and falls back to the
    /// microphone; only the fallback failing fails the start.
    fn acquire_capture(
        &self,
        mode: RecordingMode,
        output: std::path::PathBuf,
    ) -> Result<Box<dyn AudioCapture>> {
        match mode {
            RecordingMode::Voice => self
                .capture_factory
                .acquire(AudioSource::Microphone, output),
            RecordingMode::Call => match self
                .capture_factory
                .acquire(AudioSource::CallAudio, output.clone())
            {
                Ok(capture) => Ok(capture),
                Err(e) => {
                    warn!(
                        "Call audio routing unavailable ({:#}), falling back to microphone",
                        e
                    );
                    self.capture_factory.acquire(AudioSource::Microphone, output)
                }
            },
        }
    }

    async fn stop_session(&mut self, persist: bool) -> Result<()> {
        // Idempotent: stopping while idle is not an error
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        info!("Stopping recording session ({:?})", active.mode);

        // Signal producers and join them so no tick or transcript event for
        // this session can be produced after this point
        let _ = active.shutdown.send(true);
        if let Err(e) = active.sampler.await {
            error!("Metric sampler panicked: {}", e);
        }
        if let Err(e) = active.supervisor.await {
            error!("Transcription supervisor panicked: {}", e);
        }

        let elapsed_seconds = active.started_at.elapsed().as_secs();
        let average_wpm = words_per_minute(self.state.word_count, elapsed_seconds);

        // The capture handle is released on every path; a failing stop still
        // terminates the session
        let stop_result = active.capture.stop().await;

        let mut persist_result = Ok(());
        if persist && active.mode == RecordingMode::Call {
            let recording = CallRecording {
                id: Uuid::new_v4().to_string(),
                started_at_epoch_ms: active.started_at_epoch_ms,
                duration_seconds: elapsed_seconds,
                file_path: active.capture.path().to_path_buf(),
                phone_number: active.phone_number.clone(),
                transcript: self.state.recognized_text.clone(),
                word_count: self.state.word_count,
                average_wpm,
                wpm_samples: self.state.wpm_samples.clone(),
            };

            persist_result = self
                .store
                .save(&recording)
                .context("Failed to persist call recording");
            match &persist_result {
                Ok(()) => {
                    // Cache refreshes only after a successful save
                    if let Err(e) = self.refresh_recordings() {
                        warn!("Failed to refresh recording list: {:#}", e);
                    }
                }
                Err(e) => error!("{:#}", e),
            }
        }

        self.state.is_recording = false;
        self.state.elapsed_seconds = elapsed_seconds;
        self.state.current_wpm = average_wpm;
        if let Err(e) = &stop_result {
            self.state.last_error = Some(format!("Stop recording failed: {:#}", e));
        }
        self.publish();

        stop_result.and(persist_result)
    }

    fn sample_wpm(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };

        let elapsed_seconds = active.started_at.elapsed().as_secs();
        let wpm = words_per_minute(self.state.word_count, elapsed_seconds);

        // Samples are strictly increasing in elapsed seconds; a tick landing
        // in the same second as the previous one is dropped
        let strictly_later = self
            .state
            .wpm_samples
            .last()
            .map_or(true, |s| elapsed_seconds > s.elapsed_seconds);
        if strictly_later && elapsed_seconds > 0 {
            self.state.wpm_samples.push(WpmSample {
                elapsed_seconds,
                wpm,
            });
        }

        self.state.elapsed_seconds = elapsed_seconds;
        self.state.current_wpm = wpm;
        self.publish();
    }

    fn delete_recording(&mut self, id: &str) -> bool {
        match self.store.delete(id) {
            Ok(()) => {
                self.state.saved_recordings.retain(|r| r.id != id);
                self.publish();
                true
            }
            Err(e) => {
                // Cache untouched on failure
                warn!("Failed to delete recording {}: {:#}", id, e);
                false
            }
        }
    }

    fn refresh_recordings(&mut self) -> Result<()> {
        let recordings = self
            .store
            .load_all()
            .context("Failed to load recording catalog")?;
        self.state.saved_recordings = recordings;
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send(self.state.clone());
    }
}
