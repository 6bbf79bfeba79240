// Integration tests for the filesystem recording store
//
// These tests verify the catalog round-trips recordings, the file naming
// convention, and the self-healing load behavior.

use anyhow::Result;
use callscribe::{CallRecording, FsRecordingStore, RecordingStore, WpmSample};
use std::fs;
use tempfile::TempDir;

fn sample_recording(store: &FsRecordingStore, phone_number: Option<&str>) -> CallRecording {
    let timestamp_ms = 1_700_000_000_000;
    let file_path = store.create_file(timestamp_ms, phone_number);
    fs::write(&file_path, b"fake audio").unwrap();

    CallRecording {
        id: uuid::Uuid::new_v4().to_string(),
        started_at_epoch_ms: timestamp_ms,
        duration_seconds: 42,
        file_path,
        phone_number: phone_number.map(str::to_string),
        transcript: "hello world".to_string(),
        word_count: 2,
        average_wpm: 3,
        wpm_samples: vec![
            WpmSample {
                elapsed_seconds: 3,
                wpm: 20,
            },
            WpmSample {
                elapsed_seconds: 6,
                wpm: 18,
            },
        ],
    }
}

#[test]
fn test_create_file_naming_convention() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FsRecordingStore::new(dir.path())?;

    let path = store.create_file(1234, Some("+1 (555) 010-9999"));
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "call_recording_1234_+15550109999.wav"
    );

    Ok(())
}

#[test]
fn test_create_file_unknown_number() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FsRecordingStore::new(dir.path())?;

    let absent = store.create_file(1234, None);
    assert_eq!(
        absent.file_name().unwrap().to_str().unwrap(),
        "call_recording_1234_unknown.wav"
    );

    // A number that sanitizes to nothing is also unknown
    let blank = store.create_file(1234, Some("ext. #--"));
    assert_eq!(
        blank.file_name().unwrap().to_str().unwrap(),
        "call_recording_1234_unknown.wav"
    );

    Ok(())
}

#[test]
fn test_save_and_load_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FsRecordingStore::new(dir.path())?;

    let recording = sample_recording(&store, Some("+1555"));
    store.save(&recording)?;

    let loaded = store.load_all()?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], recording);

    // Every field survives, including the ordered samples
    assert_eq!(loaded[0].wpm_samples.len(), 2);
    assert_eq!(loaded[0].wpm_samples[0].elapsed_seconds, 3);
    assert_eq!(loaded[0].transcript, "hello world");

    Ok(())
}

#[test]
fn test_load_all_drops_entries_with_missing_files() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FsRecordingStore::new(dir.path())?;

    let keep = sample_recording(&store, Some("111"));
    let orphan = sample_recording(&store, Some("222"));
    store.save(&keep)?;
    store.save(&orphan)?;

    // Simulate an external deletion of one backing file
    fs::remove_file(&orphan.file_path)?;

    let loaded = store.load_all()?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, keep.id);

    Ok(())
}

#[test]
fn test_get_by_id() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FsRecordingStore::new(dir.path())?;

    let recording = sample_recording(&store, Some("333"));
    store.save(&recording)?;

    assert_eq!(store.get(&recording.id)?, Some(recording));
    assert_eq!(store.get("no-such-id")?, None);

    Ok(())
}

#[test]
fn test_delete_removes_file_and_entry() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FsRecordingStore::new(dir.path())?;

    let first = sample_recording(&store, Some("111"));
    let second = sample_recording(&store, Some("222"));
    store.save(&first)?;
    store.save(&second)?;

    store.delete(&first.id)?;

    assert!(!first.file_path.exists());
    assert!(second.file_path.exists());

    // Exactly the deleted entry is gone
    let remaining = store.load_all()?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);

    Ok(())
}

#[test]
fn test_delete_missing_id_fails_without_changes() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FsRecordingStore::new(dir.path())?;

    let recording = sample_recording(&store, Some("444"));
    store.save(&recording)?;

    assert!(store.delete("no-such-id").is_err());

    // Catalog and file are untouched
    assert!(recording.file_path.exists());
    assert_eq!(store.load_all()?.len(), 1);

    Ok(())
}
