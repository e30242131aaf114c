//! Archive loading.
//!
//! Reads every file entry of a zip into memory keyed by entry name. The
//! verifier only works on the loaded map, so the zip library's enumeration
//! order never reaches the report.

use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::Path;

use thiserror::Error;

/// Upper bound on a single decompressed entry.
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Errors that make an archive unreadable.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a readable zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("duplicate archive entry {0:?}")]
    DuplicateEntry(String),

    #[error("archive entry {name:?} exceeds {limit} bytes")]
    EntryTooLarge { name: String, limit: u64 },
}

/// The file entries of an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveContents {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ArchiveContents {
    /// Load from a path.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, ArchiveError> {
        let mut zip = zip::ZipArchive::new(reader)?;
        let mut entries = BTreeMap::new();
        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut content = Vec::new();
            entry.take(MAX_ENTRY_BYTES + 1).read_to_end(&mut content)?;
            if content.len() as u64 > MAX_ENTRY_BYTES {
                return Err(ArchiveError::EntryTooLarge {
                    name,
                    limit: MAX_ENTRY_BYTES,
                });
            }
            tracing::debug!(entry = %name, bytes = content.len(), "loaded archive entry");
            if entries.insert(name.clone(), content).is_some() {
                return Err(ArchiveError::DuplicateEntry(name));
            }
        }
        Ok(Self { entries })
    }

    /// Build directly from entries.
    pub fn from_entries(entries: BTreeMap<String, Vec<u8>>) -> Self {
        Self { entries }
    }

    /// One entry's bytes.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Whether an entry exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    /// All entries as a map.
    pub fn as_map(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            w.start_file(*name, SimpleFileOptions::default()).unwrap();
            w.write_all(body).unwrap();
        }
        w.add_directory("nested/", SimpleFileOptions::default()).unwrap();
        w.finish().unwrap().into_inner()
    }

    #[test]
    fn loads_file_entries_and_skips_directories() {
        let bytes = zip_of(&[("b.json", b"{}"), ("a.md", b"# a")]);
        let archive = ArchiveContents::from_reader(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a.md", "b.json"]);
        assert_eq!(archive.get("a.md"), Some(&b"# a"[..]));
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let err = ArchiveContents::from_reader(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, ArchiveError::Zip(_)));
    }

    #[test]
    fn missing_path_is_io_error() {
        let err = ArchiveContents::open(Path::new("/nonexistent/bundle.zip")).unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
