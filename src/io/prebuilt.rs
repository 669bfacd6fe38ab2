//! Extraction of a vendor-provided prebuilt index archive.

use std::io;
use std::path::Path;

use zip::ZipArchive;

use crate::error::Result;

/// Extracts every entry of `archive` below `dest`, preserving the relative layout.
///
/// Directory entries become (possibly empty) directories. Entries whose names
/// would escape `dest` are skipped. Extraction stops at the first I/O failure
/// and leaves whatever was already written in place.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<usize> {
    let file = fs_err::File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    let mut files = 0usize;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(
                entry = entry.name(),
                "skipping archive entry outside the index directory"
            );
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            fs_err::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs_err::create_dir_all(parent)?;
        }
        let mut out = fs_err::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        files += 1;
    }

    tracing::debug!(
        archive = %archive.display(),
        dest = %dest.display(),
        files,
        "prebuilt index extracted"
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_archive(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        zip.add_directory("empty/", options).unwrap();
        zip.start_file("meta.json", options).unwrap();
        zip.write_all(b"{}").unwrap();
        zip.start_file("nested/deeper/segment.bin", options).unwrap();
        zip.write_all(b"payload").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("doc_index.zip");
        write_archive(&archive);
        let dest = tmp.path().join("index").join("en");

        let files = unpack_archive(&archive, &dest).unwrap();

        assert_eq!(files, 2);
        assert!(dest.join("empty").is_dir());
        assert_eq!(std::fs::read(dest.join("meta.json")).unwrap(), b"{}");
        assert_eq!(
            std::fs::read(dest.join("nested/deeper/segment.bin")).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn unreadable_archive_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("doc_index.zip");
        std::fs::write(&archive, b"not a zip").unwrap();
        assert!(unpack_archive(&archive, &tmp.path().join("out")).is_err());
    }
}
