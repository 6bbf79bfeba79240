use anyhow::{bail, Context, Result};
use hound::{WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{AudioCapture, AudioSource, CaptureFactory};

/// WAV-file capture backend
///
/// Opens the output file at acquisition so the backing file exists for the
/// catalog's existence checks, and finalizes the WAV header on stop. Platform
/// backends feed samples through `write_samples`; a session with no delivered
/// audio still produces a valid (empty) WAV file.
pub struct WavCapture {
    source: AudioSource,
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavCapture {
    pub fn open(source: AudioSource, path: PathBuf, spec: WavSpec) -> Result<Self> {
        let writer = WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        info!("Capture started: {:?} -> {}", source, path.display());

        Ok(Self {
            source,
            path,
            writer: Some(writer),
        })
    }

    /// Append interleaved i16 PCM samples
    pub fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            bail!("Capture already stopped");
        };
        for &sample in samples {
            writer
                .write_sample(sample)
                .context("Failed to write audio sample")?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AudioCapture for WavCapture {
    async fn stop(&mut self) -> Result<()> {
        // Idempotent: a second stop is a no-op
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
            info!("Capture stopped: {}", self.path.display());
        }
        Ok(())
    }

    fn source(&self) -> AudioSource {
        self.source
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Default capture factory
///
/// Call-audio routing is platform dependent; when unavailable this factory
/// refuses `CallAudio` and the orchestrator falls back to the microphone.
pub struct WavCaptureFactory {
    spec: WavSpec,
    call_audio_supported: bool,
}

impl WavCaptureFactory {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            spec: WavSpec {
                channels,
                sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            },
            call_audio_supported: false,
        }
    }

    pub fn with_call_audio(mut self, supported: bool) -> Self {
        self.call_audio_supported = supported;
        self
    }
}

impl CaptureFactory for WavCaptureFactory {
    fn acquire(&self, source: AudioSource, output: PathBuf) -> Result<Box<dyn AudioCapture>> {
        if source == AudioSource::CallAudio && !self.call_audio_supported {
            bail!("Call audio routing not available on this platform");
        }
        Ok(Box::new(WavCapture::open(source, output, self.spec)?))
    }
}
