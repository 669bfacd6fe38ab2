//! Integration tests for the per-locale lock and prebuilt index restoration.

mod common;

use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use helpindex_core::{FileLock, IndexError, IndexOptions, SearchIndex};

use common::{MemoryParticipant, add_all, hrefs, open_index, open_index_with, search};

fn zip_directory(dir: &Path, archive: &Path) {
    let mut writer = ZipWriter::new(std::fs::File::create(archive).unwrap());
    for entry in std::fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        if !entry.file_type().unwrap().is_file() {
            continue;
        }
        writer
            .start_file(entry.file_name().to_string_lossy(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&std::fs::read(entry.path()).unwrap()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn lock_is_exclusive_and_fails_fast() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());

    assert!(index.try_lock().unwrap());
    let err = index.try_lock().unwrap_err();
    assert!(matches!(err, IndexError::LockAlreadyHeld { .. }));

    let other_session = FileLock::new(temp.path().join("en.lock"));
    assert!(!other_session.try_acquire().unwrap());
    assert!(!index.delete_lock_file());

    index.release_lock();
    index.release_lock();
    assert!(other_session.try_acquire().unwrap());
    other_session.release();
    assert!(index.delete_lock_file());
    assert!(!temp.path().join("en.lock").exists());
}

#[test]
fn prebuilt_archive_is_restored_once() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("build").join("en");
    {
        let index = open_index(&source, MemoryParticipant::default());
        add_all(&index, &["/org.docs/a.html", "/org.docs/b.html"]);
    }
    let archive = temp.path().join("doc_index.zip");
    zip_directory(&source, &archive);

    let options = IndexOptions::builder().prebuilt_index(&archive).build();
    let target = temp.path().join("install").join("en");
    let index = open_index_with(&target, MemoryParticipant::default(), options);

    assert!(index.exists());
    assert!(index.is_usable());
    assert!(!index.needs_updating());
    assert_eq!(
        hrefs(&search(&index, "content")),
        vec!["/org.docs/a.html".to_string(), "/org.docs/b.html".to_string()]
    );
    assert!(index.delete_lock_file());
}

#[test]
fn corrupt_archive_leaves_index_flagged() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("doc_index.zip");
    std::fs::write(&archive, b"definitely not a zip archive").unwrap();

    let options = IndexOptions::builder().prebuilt_index(&archive).build();
    let index = open_index_with(&temp.path().join("en"), MemoryParticipant::default(), options);

    assert!(index.has_inconsistency_marker());
    assert!(!index.exists());
    assert!(index.needs_updating());
}

#[test]
fn locked_install_skips_restoration() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("build").join("en");
    {
        let index = open_index(&source, MemoryParticipant::default());
        add_all(&index, &["/org.docs/a.html"]);
    }
    let archive = temp.path().join("doc_index.zip");
    zip_directory(&source, &archive);

    let holder = FileLock::new(temp.path().join("install").join("en.lock"));
    assert!(holder.try_acquire().unwrap());

    let options = IndexOptions::builder().prebuilt_index(&archive).build();
    let index = open_index_with(
        &temp.path().join("install").join("en"),
        MemoryParticipant::default(),
        options,
    );
    assert!(!index.exists());
    assert!(!index.has_inconsistency_marker());
}

#[test]
fn default_directory_is_locale_scoped() {
    if let Some(dir) = SearchIndex::default_directory("de") {
        assert!(dir.ends_with("helpindex/index/de"));
    }
}
