//! Durable recording catalog
//!
//! Finished call sessions are persisted as a `CallRecording`: a backing audio
//! file under a dedicated recordings directory plus an entry in a JSON catalog
//! document. The catalog is the single durable list; the orchestrator only
//! holds a cached copy of it.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::session::WpmSample;

/// A persisted call recording, immutable once constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecording {
    /// Unique identifier, assigned at construction
    pub id: String,

    /// Session start time, milliseconds since the Unix epoch
    pub started_at_epoch_ms: i64,

    /// Final session duration in seconds
    pub duration_seconds: u64,

    /// Backing audio file
    pub file_path: PathBuf,

    /// Caller/callee number, if known
    pub phone_number: Option<String>,

    /// Accumulated transcript
    pub transcript: String,

    /// Word count of the transcript
    pub word_count: usize,

    /// Average speaking rate over the whole session
    pub average_wpm: u32,

    /// Ordered speaking-rate samples taken during the session
    pub wpm_samples: Vec<WpmSample>,
}

/// Store boundary used by the orchestrator
pub trait RecordingStore: Send + Sync {
    /// Deterministic path for a new recording's audio file
    fn create_file(&self, timestamp_ms: i64, phone_number: Option<&str>) -> PathBuf;

    /// Append a recording to the catalog
    fn save(&self, recording: &CallRecording) -> Result<()>;

    /// All catalog entries whose backing file still exists
    fn load_all(&self) -> Result<Vec<CallRecording>>;

    /// Look up a single entry by id
    fn get(&self, id: &str) -> Result<Option<CallRecording>>;

    /// Remove the backing file and the catalog entry
    ///
    /// Fails without touching either when no entry with `id` exists.
    fn delete(&self, id: &str) -> Result<()>;
}

/// On-disk catalog document
#[derive(Debug, Default, Serialize, Deserialize)]
struct Catalog {
    recordings: Vec<CallRecording>,
}

/// Filesystem-backed store: one recordings directory, one JSON catalog file
pub struct FsRecordingStore {
    recordings_dir: PathBuf,
    catalog_path: PathBuf,
}

impl FsRecordingStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let recordings_dir = base_dir.join("call_recordings");
        fs::create_dir_all(&recordings_dir)
            .context("Failed to create recordings directory")?;

        Ok(Self {
            recordings_dir,
            catalog_path: base_dir.join("call_recordings_catalog.json"),
        })
    }

    /// Keep only digits and `+`; absent or fully stripped numbers become "unknown"
    fn sanitize_number(phone_number: Option<&str>) -> String {
        let sanitized: String = phone_number
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if sanitized.is_empty() {
            "unknown".to_string()
        } else {
            sanitized
        }
    }

    fn read_catalog(&self) -> Result<Catalog> {
        if !self.catalog_path.exists() {
            return Ok(Catalog::default());
        }
        let json = fs::read_to_string(&self.catalog_path)
            .context("Failed to read recording catalog")?;
        serde_json::from_str(&json).context("Failed to parse recording catalog")
    }

    fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        let json = serde_json::to_string_pretty(catalog)
            .context("Failed to serialize recording catalog")?;
        fs::write(&self.catalog_path, json).context("Failed to write recording catalog")
    }
}

impl RecordingStore for FsRecordingStore {
    fn create_file(&self, timestamp_ms: i64, phone_number: Option<&str>) -> PathBuf {
        let sanitized = Self::sanitize_number(phone_number);
        self.recordings_dir
            .join(format!("call_recording_{}_{}.wav", timestamp_ms, sanitized))
    }

    fn save(&self, recording: &CallRecording) -> Result<()> {
        let mut catalog = self.read_catalog()?;
        catalog.recordings.push(recording.clone());
        self.write_catalog(&catalog)?;

        info!(
            "Saved recording {} ({}s, {} words)",
            recording.id, recording.duration_seconds, recording.word_count
        );
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<CallRecording>> {
        let catalog = self.read_catalog()?;
        let total = catalog.recordings.len();

        // Self-healing read: drop entries whose audio file was removed externally
        let recordings: Vec<CallRecording> = catalog
            .recordings
            .into_iter()
            .filter(|r| r.file_path.exists())
            .collect();

        if recordings.len() < total {
            warn!(
                "Dropped {} catalog entries with missing audio files",
                total - recordings.len()
            );
        }

        Ok(recordings)
    }

    fn get(&self, id: &str) -> Result<Option<CallRecording>> {
        Ok(self.load_all()?.into_iter().find(|r| r.id == id))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let recordings = self.load_all()?;
        let Some(target) = recordings.iter().find(|r| r.id == id) else {
            bail!("No recording with id {}", id);
        };

        fs::remove_file(&target.file_path)
            .with_context(|| format!("Failed to delete {}", target.file_path.display()))?;

        let remaining: Vec<CallRecording> =
            recordings.into_iter().filter(|r| r.id != id).collect();
        self.write_catalog(&Catalog {
            recordings: remaining,
        })?;

        info!("Deleted recording {}", id);
        Ok(())
    }
}
