//! Append-Only Log Store (C3, spec §4.3).
//!
//! One logical log per `(tenant, node, kind)`, stored as newline-delimited
//! canonical JSON. Append is atomic: write to a temp sibling, then rename
//! over the target. Files are never truncated.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CmResult, CredMeshError, ErrorKind};

/// A single append-only log file, single-writer/many-reader per
/// `(tenant, node, kind)` (spec §4.3, §4.15 shared resources).
pub struct LogStore {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl LogStore {
    pub fn open(path: impl Into<PathBuf>) -> CmResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CredMeshError::new(ErrorKind::Filesystem, e.to_string())
            })?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CredMeshError::new(ErrorKind::Filesystem, e.to_string()))?;
        Ok(Self {
            path,
            append_lock: Mutex::new(()),
        })
    }

    /// Appends one record: serialize to canonical JSON, write to a temp
    /// sibling with the existing content plus the new line, then rename
    /// over the original. This keeps the visible file always either the
    /// old or the fully-updated content, never a partial write.
    pub fn append<T: Serialize>(&self, record: &T) -> CmResult<()> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| CredMeshError::new(ErrorKind::Filesystem, "log lock poisoned"))?;

        let line = credmesh_types::canonical::to_canonical_string(record).map_err(|e| {
            CredMeshError::new(ErrorKind::InputInvalid, e.to_string())
        })?;

        let tmp_path = self.path.with_extension("tmp");
        {
            let existing = fs::read(&self.path).unwrap_or_default();
            let mut tmp = File::create(&tmp_path).map_err(|e| {
                CredMeshError::new(ErrorKind::Filesystem, e.to_string())
            })?;
            tmp.write_all(&existing).map_err(|e| {
                CredMeshError::new(ErrorKind::Filesystem, e.to_string())
            })?;
            tmp.write_all(line.as_bytes()).map_err(|e| {
                CredMeshError::new(ErrorKind::Filesystem, e.to_string())
            })?;
            tmp.write_all(b"\n").map_err(|e| {
                CredMeshError::new(ErrorKind::Filesystem, e.to_string())
            })?;
            tmp.sync_all().map_err(|e| {
                CredMeshError::new(ErrorKind::Filesystem, e.to_string())
            })?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            CredMeshError::new(ErrorKind::Filesystem, e.to_string())
        })?;
        Ok(())
    }

    /// Constant-memory streaming iterator, parsing one line at a time.
    pub fn iter<T: DeserializeOwned>(&self) -> CmResult<LogIter<T>> {
        let file = File::open(&self.path).map_err(|e| {
            CredMeshError::new(ErrorKind::Filesystem, e.to_string())
        })?;
        Ok(LogIter {
            reader: BufReader::new(file),
            _marker: std::marker::PhantomData,
        })
    }

    /// Count-only scan: parses every line but discards the value.
    pub fn count<T: DeserializeOwned>(&self) -> CmResult<usize> {
        let mut n = 0;
        for item in self.iter::<T>()? {
            item?;
            n += 1;
        }
        Ok(n)
    }

    /// Loads every record into memory. Callers MUST only use this when the
    /// whole list needs mutating at once (assembly, commit) — anything
    /// else should use [`LogStore::iter`] (spec §4.3).
    pub fn load_all<T: DeserializeOwned>(&self) -> CmResult<Vec<T>> {
        self.iter::<T>()?.collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct LogIter<T> {
    reader: BufReader<File>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: DeserializeOwned> Iterator for LogIter<T> {
    type Item = CmResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                let trimmed = line.trim_end();
                if trimmed.is_empty() {
                    return self.next();
                }
                Some(serde_json::from_str(trimmed).map_err(|e| {
                    CredMeshError::new(ErrorKind::LedgerTamper, e.to_string())
                }))
            }
            Err(e) => Some(Err(CredMeshError::new(
                ErrorKind::Filesystem,
                e.to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rec {
        n: u32,
    }

    #[test]
    fn append_and_iterate_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(dir.path().join("log.ndjson")).unwrap();
        store.append(&Rec { n: 1 }).unwrap();
        store.append(&Rec { n: 2 }).unwrap();
        let all: Vec<Rec> = store.load_all().unwrap();
        assert_eq!(all, vec![Rec { n: 1 }, Rec { n: 2 }]);
    }

    #[test]
    fn count_matches_load_all_len() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(dir.path().join("log.ndjson")).unwrap();
        for i in 0..5 {
            store.append(&Rec { n: i }).unwrap();
        }
        assert_eq!(store.count::<Rec>().unwrap(), 5);
    }

    #[test]
    fn corrupt_line_surfaces_as_error_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.ndjson");
        let store = LogStore::open(&path).unwrap();
        store.append(&Rec { n: 1 }).unwrap();
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"not json\n").unwrap();
        let res = store.load_all::<Rec>();
        assert!(res.is_err());
    }
}
