// Shared test doubles for session integration tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use callscribe::{
    AudioCapture, AudioSource, CallRecording, CaptureFactory, EngineEvent, EngineFactory,
    FsRecordingStore, Orchestrator, RecordingStore, SessionConfig, SessionHandle,
    SilentFeedbackGate, SpeechEngine, WavCaptureFactory,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Engine that recognizes a fixed script, one utterance per listening session
///
/// Once the script is exhausted, listening sessions stay armed without
/// delivering results, like a real engine waiting through silence.
pub struct ScriptedEngine {
    utterances: Arc<Mutex<VecDeque<String>>>,
    idle_session: Option<mpsc::Sender<EngineEvent>>,
}

#[async_trait::async_trait]
impl SpeechEngine for ScriptedEngine {
    fn is_available(&self) -> bool {
        true
    }

    async fn listen(&mut self) -> Result<mpsc::Receiver<EngineEvent>> {
        let (tx, rx) = mpsc::channel(4);
        let next = self.utterances.lock().unwrap().pop_front();
        match next {
            Some(text) => {
                let _ = tx.send(EngineEvent::Ready).await;
                let _ = tx.send(EngineEvent::Result(text)).await;
                let _ = tx.send(EngineEvent::EndOfUtterance).await;
            }
            None => {
                let _ = tx.send(EngineEvent::Ready).await;
                // Keep the sender alive so the session stays pending
                self.idle_session = Some(tx);
            }
        }
        Ok(rx)
    }

    async fn stop_listening(&mut self) -> Result<()> {
        self.idle_session = None;
        Ok(())
    }
}

/// Factory sharing one script across the engines it creates
pub struct ScriptedEngineFactory {
    utterances: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedEngineFactory {
    pub fn new(utterances: &[&str]) -> Self {
        Self {
            utterances: Arc::new(Mutex::new(
                utterances.iter().map(|s| s.to_string()).collect(),
            )),
        }
    }
}

impl EngineFactory for ScriptedEngineFactory {
    fn create(&self) -> Box<dyn SpeechEngine> {
        Box::new(ScriptedEngine {
            utterances: Arc::clone(&self.utterances),
            idle_session: None,
        })
    }
}

/// Capture factory whose every acquisition fails
pub struct FailingCaptureFactory;

impl CaptureFactory for FailingCaptureFactory {
    fn acquire(&self, _source: AudioSource, _output: PathBuf) -> Result<Box<dyn AudioCapture>> {
        bail!("Audio device busy")
    }
}

/// Fast timings so tests spend milliseconds, not seconds
pub fn fast_session_config() -> SessionConfig {
    SessionConfig {
        sample_interval: Duration::from_millis(50),
        restart_delay: Duration::from_millis(10),
        ready_grace: Duration::from_millis(10),
        ..SessionConfig::default()
    }
}

/// Capture handle that acquires fine but fails to finalize on stop
pub struct BrokenStopCapture {
    source: AudioSource,
    path: PathBuf,
}

#[async_trait::async_trait]
impl AudioCapture for BrokenStopCapture {
    async fn stop(&mut self) -> Result<()> {
        bail!("Encoder refused to finalize")
    }

    fn source(&self) -> AudioSource {
        self.source
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Factory producing captures whose stop always fails
pub struct BrokenStopCaptureFactory;

impl CaptureFactory for BrokenStopCaptureFactory {
    fn acquire(&self, source: AudioSource, output: PathBuf) -> Result<Box<dyn AudioCapture>> {
        // Backing file exists from acquisition, like the real backend
        std::fs::write(&output, b"partial audio")?;
        Ok(Box::new(BrokenStopCapture {
            source,
            path: output,
        }))
    }
}

/// Filesystem store whose saves can be made to fail on demand
pub struct ToggleFailStore {
    inner: FsRecordingStore,
    fail_saves: AtomicBool,
}

impl ToggleFailStore {
    pub fn new(base_dir: &Path) -> Result<Self> {
        Ok(Self {
            inner: FsRecordingStore::new(base_dir)?,
            fail_saves: AtomicBool::new(false),
        })
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl RecordingStore for ToggleFailStore {
    fn create_file(&self, timestamp_ms: i64, phone_number: Option<&str>) -> PathBuf {
        self.inner.create_file(timestamp_ms, phone_number)
    }

    fn save(&self, recording: &CallRecording) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            bail!("Catalog write refused");
        }
        self.inner.save(recording)
    }

    fn load_all(&self) -> Result<Vec<CallRecording>> {
        self.inner.load_all()
    }

    fn get(&self, id: &str) -> Result<Option<CallRecording>> {
        self.inner.get(id)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id)
    }
}

/// Poll the session snapshot until `pred` holds or `timeout` expires
pub async fn wait_until(
    handle: &SessionHandle,
    timeout: Duration,
    pred: impl Fn(&callscribe::SessionSnapshot) -> bool,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if pred(&handle.snapshot()) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Orchestrator over a tempdir-backed store and a scripted engine
pub fn spawn_session(
    data_dir: &TempDir,
    engine_factory: Arc<dyn EngineFactory>,
) -> (SessionHandle, Arc<callscribe::FsRecordingStore>) {
    let store = Arc::new(callscribe::FsRecordingStore::new(data_dir.path()).unwrap());
    let handle = Orchestrator::spawn(
        fast_session_config(),
        store.clone(),
        Arc::new(WavCaptureFactory::new(16000, 1)),
        engine_factory,
        Arc::new(SilentFeedbackGate),
    );
    (handle, store)
}
