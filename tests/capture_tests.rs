// Integration tests for the WAV capture backend
//
// These tests verify that samples fed to a capture handle survive the
// finalize on stop, and that a stopped handle is safely inert.

use anyhow::Result;
use callscribe::{AudioCapture, AudioSource, WavCapture};
use hound::{SampleFormat, WavSpec};
use tempfile::TempDir;

fn mono_16khz() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

#[tokio::test]
async fn test_written_samples_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("capture.wav");

    let mut capture = WavCapture::open(AudioSource::Microphone, path.clone(), mono_16khz())?;
    assert_eq!(capture.source(), AudioSource::Microphone);
    assert_eq!(capture.path(), path.as_path());

    let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 42];
    capture.write_samples(&samples)?;
    capture.stop().await?;

    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.spec().channels, 1);
    let read: Vec<i16> = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(read, samples);

    Ok(())
}

#[tokio::test]
async fn test_empty_capture_is_still_a_valid_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("silence.wav");

    let mut capture = WavCapture::open(AudioSource::CallAudio, path.clone(), mono_16khz())?;
    capture.stop().await?;

    // A session with no delivered audio produces a readable, empty WAV
    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_stopped_capture_rejects_writes() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("capture.wav");

    let mut capture = WavCapture::open(AudioSource::Microphone, path.clone(), mono_16khz())?;
    capture.stop().await?;
    // Second stop is a no-op
    capture.stop().await?;

    assert!(capture.write_samples(&[1]).is_err());
    assert!(path.exists());

    Ok(())
}
