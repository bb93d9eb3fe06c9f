//! Source files
//!
//! A source file is a local path with a declared record type and its size.
//! Files are streamed line by line; `.gz` files are decompressed on the fly.

use flate2::read::GzDecoder;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::Utf8Error;
use tracing::debug;
use uls_common::{RecordType, UlsError};
use walkdir::WalkDir;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// File name suffixes picked up when a directory is given.
pub const SOURCE_SUFFIXES: [&str; 4] = [".dat", ".dat.gz", ".txt", ".txt.gz"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub record_type: RecordType,
    pub size_bytes: u64,
}

impl SourceFile {
    /// Declare `path` as holding `record_type` lines.
    ///
    /// The size is read best-effort; a missing file is reported when it is
    /// opened, not here.
    pub fn new(path: impl Into<PathBuf>, record_type: RecordType) -> Self {
        let path = path.into();
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self {
            path,
            record_type,
            size_bytes,
        }
    }

    /// Declare `path` with the record type named by its first two characters.
    pub fn classify(path: impl Into<PathBuf>) -> Result<Self, UlsError> {
        let path = path.into();
        let record_type = RecordType::classify_file_name(&path)?;
        Ok(Self::new(path, record_type))
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn is_gzip(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
    }

    /// Open for buffered reading, decompressing `.gz` files.
    pub fn open(&self) -> io::Result<Box<dyn BufRead>> {
        let file = File::open(&self.path)?;
        if self.is_gzip() {
            Ok(Box::new(BufReader::with_capacity(READ_BUFFER_BYTES, GzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::with_capacity(READ_BUFFER_BYTES, file)))
        }
    }
}

fn has_source_suffix(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    SOURCE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Expand files and directories into source declarations.
///
/// Directories contribute their immediate children with a source suffix
/// whose names classify; others are ignored. Explicit files must classify
/// unless `forced` is given. The result is ordered by record type (HD, EN,
/// FR, LO, AN, AP), then by path.
pub fn discover(paths: &[PathBuf], forced: Option<RecordType>) -> Result<Vec<SourceFile>, UlsError> {
    let mut sources = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).min_depth(1).max_depth(1) {
                let entry = entry.map_err(|e| UlsError::Io(io::Error::other(e.to_string())))?;
                if !entry.file_type().is_file() || !has_source_suffix(entry.path()) {
                    continue;
                }

                let source = match forced {
                    Some(rt) => Some(SourceFile::new(entry.path(), rt)),
                    None => SourceFile::classify(entry.path()).ok(),
                };
                match source {
                    Some(source) => sources.push(source),
                    None => debug!(path = %entry.path().display(), "Ignoring unclassified file"),
                }
            }
        } else {
            let source = match forced {
                Some(rt) => SourceFile::new(path, rt),
                None => SourceFile::classify(path)?,
            };
            sources.push(source);
        }
    }

    sources.sort_by(|a, b| {
        a.record_type
            .cmp(&b.record_type)
            .then_with(|| a.path.cmp(&b.path))
    });
    sources.dedup_by(|a, b| a.path == b.path);

    Ok(sources)
}

/// Raw line reader over a byte stream.
///
/// Lines are split on `\n`; a trailing `\r` is removed. Each line is handed
/// out as `Ok(&str)` or, when it is not valid UTF-8, as the decode error.
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(1024),
            line_number: 0,
        }
    }

    /// 1-based number of the line last returned.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Next line, or `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<Result<&str, Utf8Error>>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        Ok(Some(std::str::from_utf8(&self.buf)))
    }
}
