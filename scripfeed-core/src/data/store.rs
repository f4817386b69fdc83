//! Append-only announcement store.
//!
//! Layout: `{output_dir}/{ISIN}.json`, holding pretty-printed JSON values one
//! after another (not a JSON array), so appending never rewrites the file.
//! Records are never deduplicated: fetching an overlapping range again
//! appends the same records again.

use super::provider::FetchError;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

pub const COLLECTION_EXTENSION: &str = "json";

/// Directory of per-ISIN document collections.
#[derive(Debug, Clone)]
pub struct AnnouncementStore {
    output_dir: PathBuf,
}

/// On-disk facts about one collection, as reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub isin: String,
    /// Record count, or why the file could not be read back.
    pub records: Result<usize, String>,
    pub size_bytes: u64,
}

impl CollectionSummary {
    pub fn is_corrupt(&self) -> bool {
        self.records.is_err()
    }
}

impl AnnouncementStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, isin: &str) -> PathBuf {
        self.output_dir.join(format!("{isin}.{COLLECTION_EXTENSION}"))
    }

    /// Open (creating if absent) the collection for `isin` in append mode.
    pub fn open(&self, isin: &str) -> Result<AnnouncementWriter, FetchError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| FetchError::Storage {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.path_for(isin);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| FetchError::Storage {
                path: path.clone(),
                source,
            })?;

        Ok(AnnouncementWriter {
            file,
            path,
            written: 0,
        })
    }

    /// Read back every record stored for `isin`.
    pub fn load(&self, isin: &str) -> io::Result<Vec<Value>> {
        read_records(&self.path_for(isin))
    }

    /// Summaries of every collection in the directory, sorted by ISIN.
    ///
    /// A missing directory yields an empty list. A collection that cannot be
    /// read back is listed with its error instead of failing the whole scan.
    pub fn summaries(&self) -> io::Result<Vec<CollectionSummary>> {
        let entries = match fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(COLLECTION_EXTENSION)
            {
                continue;
            }
            let Some(isin) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            let size_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            let records = read_records(&path)
                .map(|records| records.len())
                .map_err(|e| e.to_string());
            summaries.push(CollectionSummary {
                isin,
                records,
                size_bytes,
            });
        }

        summaries.sort_by(|a, b| a.isin.cmp(&b.isin));
        Ok(summaries)
    }
}

/// Exclusive append handle on one collection.
///
/// Dropping the writer closes the file; every page is flushed as soon as it
/// is appended, so nothing is pending at that point.
#[derive(Debug)]
pub struct AnnouncementWriter {
    file: File,
    path: PathBuf,
    written: usize,
}

impl AnnouncementWriter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this writer so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Append a page of records in order and flush.
    ///
    /// The whole page is rendered before anything is written, and goes out in
    /// a single write.
    pub fn append_page(&mut self, records: &[Value]) -> Result<(), FetchError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = String::new();
        for record in records {
            let rendered = serde_json::to_string_pretty(record).map_err(|e| FetchError::Storage {
                path: self.path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })?;
            buf.push_str(&rendered);
            buf.push('\n');
        }

        self.file
            .write_all(buf.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| FetchError::Storage {
                path: self.path.clone(),
                source,
            })?;

        self.written += records.len();
        Ok(())
    }

    /// Sync to disk and close, returning the number of records written.
    pub fn finish(self) -> Result<usize, FetchError> {
        self.file.sync_all().map_err(|source| FetchError::Storage {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.written)
    }
}

/// Stream the concatenated JSON values in `path`. A missing file is empty.
pub fn read_records(path: &Path) -> io::Result<Vec<Value>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    serde_json::Deserializer::from_reader(BufReader::new(file))
        .into_iter::<Value>()
        .map(|r| r.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)))
        .collect()
}
