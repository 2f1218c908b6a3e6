use std::path::PathBuf;
use tempfile::tempdir;

use crate::storage::error::{StorageResult, StorageSystemError};
use crate::storage::records::{Device, JsonRecordStore, NewRepository, RecordStore};

fn new_repository(name: &str) -> NewRepository {
    NewRepository {
        url: format!("https://github.com/vectorcloud/{}.git", name),
        name: name.to_string(),
        local_path: PathBuf::from("/srv/repositories").join(name),
        auto_update: false,
    }
}

fn device(serial: &str) -> Device {
    Device {
        serial: serial.to_string(),
        cert_file: format!("/certs/{}.cert", serial),
        ip: "192.168.1.10".to_string(),
        name: format!("Vector-{}", serial),
        guid: "guid==".to_string(),
    }
}

#[test]
fn test_empty_store_has_no_records() -> StorageResult<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let store = JsonRecordStore::open(&temp_dir.path().join("records.json"))?;

    assert!(store.repositories()?.is_empty());
    assert!(store.devices()?.is_empty());
    assert!(store.first_repository()?.is_none());
    Ok(())
}

#[test]
fn test_repository_insert_assigns_increasing_ids_and_persists() -> StorageResult<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("records.json");

    {
        let store = JsonRecordStore::open(&path)?;
        let first = store.insert_repository(new_repository("official"))?;
        let second = store.insert_repository(new_repository("community"))?;
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    // A fresh store over the same file sees the same records
    let store = JsonRecordStore::open(&path)?;
    let names: Vec<String> = store.repositories()?.into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["official", "community"]);
    assert_eq!(store.first_repository()?.map(|r| r.id), Some(1));

    // Ids are not reused after deletion
    store.delete_repository(2)?;
    let third = store.insert_repository(new_repository("again"))?;
    assert_eq!(third.id, 3);
    Ok(())
}

#[test]
fn test_delete_unknown_repository_fails() -> StorageResult<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let store = JsonRecordStore::open(&temp_dir.path().join("records.json"))?;

    let err = store.delete_repository(42).unwrap_err();
    assert!(matches!(err, StorageSystemError::RecordNotFound { kind: "repository", .. }));
    Ok(())
}

#[test]
fn test_set_auto_update() -> StorageResult<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let store = JsonRecordStore::open(&temp_dir.path().join("records.json"))?;
    let repo = store.insert_repository(new_repository("official"))?;

    let updated = store.set_auto_update(repo.id, true)?;
    assert!(updated.auto_update);
    assert_eq!(store.repository(repo.id)?, Some(updated));
    Ok(())
}

#[test]
fn test_replace_devices_drops_previous_set() -> StorageResult<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let store = JsonRecordStore::open(&temp_dir.path().join("records.json"))?;

    store.replace_devices(vec![device("00e20100"), device("00e20101")])?;
    assert_eq!(store.devices()?.len(), 2);

    store.replace_devices(vec![device("00e20102")])?;
    assert_eq!(store.devices()?, vec![device("00e20102")]);

    store.replace_devices(Vec::new())?;
    assert!(store.devices()?.is_empty());
    Ok(())
}
