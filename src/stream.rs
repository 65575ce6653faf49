//! Chunked file I/O with bounded peak memory.
//!
//! ## Why chunked?
//!
//! Converters and the output stage may see files of hundreds of megabytes.
//! Reading through a fixed-size buffer keeps the working set at roughly
//! [`CHUNK_SIZE`] per worker regardless of file size, which matters when
//! `parallelism` workers each hold a file at once.
//!
//! All helpers are blocking; call them from `spawn_blocking` workers.

use crate::error::TextCleanerError;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Default chunk size: 1 MiB.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Iterator over fixed-size byte chunks of a file.
///
/// The last chunk may be shorter; an empty file yields nothing.
pub struct ChunkReader {
    inner: File,
    chunk_size: usize,
    path: PathBuf,
}

impl Iterator for ChunkReader {
    type Item = Result<Vec<u8>, TextCleanerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < self.chunk_size {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(TextCleanerError::io(&self.path, e))),
            }
        }
        if filled == 0 {
            return None;
        }
        buf.truncate(filled);
        Some(Ok(buf))
    }
}

/// Open `path` for chunked reading.
pub fn stream_file(path: &Path, chunk_size: usize) -> Result<ChunkReader, TextCleanerError> {
    let inner = File::open(path).map_err(|e| TextCleanerError::io(path, e))?;
    debug!(
        "Streaming {} in {} byte chunks",
        path.display(),
        chunk_size.max(1)
    );
    Ok(ChunkReader {
        inner,
        chunk_size: chunk_size.max(1),
        path: path.to_path_buf(),
    })
}

/// Read a whole file through [`ChunkReader`].
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, TextCleanerError> {
    let capacity = fs::metadata(path).map(|m| m.len() as usize).unwrap_or(0);
    let mut out = Vec::with_capacity(capacity);
    for chunk in stream_file(path, CHUNK_SIZE)? {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

/// Read a file as text through [`ChunkReader`].
///
/// Invalid UTF-8 is replaced with U+FFFD. A multi-byte sequence split across
/// a chunk boundary is carried into the next chunk rather than replaced.
pub fn read_text_streaming(path: &Path) -> Result<String, TextCleanerError> {
    let mut out = String::new();
    let mut pending: Vec<u8> = Vec::new();
    for chunk in stream_file(path, CHUNK_SIZE)? {
        pending.extend_from_slice(&chunk?);
        let mut start = 0;
        while start < pending.len() {
            match std::str::from_utf8(&pending[start..]) {
                Ok(s) => {
                    out.push_str(s);
                    start = pending.len();
                }
                Err(e) => {
                    let good = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&pending[start..good]));
                    match e.error_len() {
                        Some(n) => {
                            out.push('\u{fffd}');
                            start = good + n;
                        }
                        None => {
                            start = good;
                            break;
                        }
                    }
                }
            }
        }
        pending.drain(..start);
    }
    if !pending.is_empty() {
        out.push_str(&String::from_utf8_lossy(&pending));
    }
    Ok(out)
}

/// Write `text` to `path` in [`CHUNK_SIZE`] slices.
pub fn stream_to_file(text: &str, path: &Path) -> Result<(), TextCleanerError> {
    let file = File::create(path).map_err(|e| write_err(path, e))?;
    write_chunks(text, file, path)
}

/// Write `text` to `path` atomically: a uniquely named temp file in the same
/// directory is written in chunks, then renamed over the target. Readers
/// never see a partial file.
///
/// The temp file is created with `O_EXCL` under a random name, so nothing
/// planted next to the target (a symlink included) is ever opened.
pub fn write_atomic(text: &str, path: &Path) -> Result<(), TextCleanerError> {
    let tmp = temp_sibling(path)?;
    let file = tmp.reopen().map_err(|e| write_err(path, e))?;
    write_chunks(text, file, path)?;
    persist(tmp, path)
}

/// Apply `f` to `src` in line-aligned batches of about [`CHUNK_SIZE`] bytes
/// and write the results atomically to `dst`.
///
/// Each batch ends on a line boundary, so `f` never sees a split line. Rules
/// that need whole-document context (duplicate detection) do not belong here.
pub fn transform_file<F>(src: &Path, dst: &Path, mut f: F) -> Result<(), TextCleanerError>
where
    F: FnMut(&str) -> String,
{
    let reader = BufReader::with_capacity(
        CHUNK_SIZE,
        File::open(src).map_err(|e| TextCleanerError::io(src, e))?,
    );
    let tmp = temp_sibling(dst)?;
    {
        let mut writer = BufWriter::with_capacity(
            CHUNK_SIZE,
            tmp.reopen().map_err(|e| write_err(dst, e))?,
        );
        let mut batch = String::with_capacity(CHUNK_SIZE);
        for line in reader.lines() {
            let line = line.map_err(|e| TextCleanerError::io(src, e))?;
            batch.push_str(&line);
            batch.push('\n');
            if batch.len() >= CHUNK_SIZE {
                writer
                    .write_all(f(&batch).as_bytes())
                    .map_err(|e| write_err(dst, e))?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            writer
                .write_all(f(&batch).as_bytes())
                .map_err(|e| write_err(dst, e))?;
        }
        writer.flush().map_err(|e| write_err(dst, e))?;
    }
    persist(tmp, dst)
}

/// Call `f` for every line of `path` without holding the file in memory.
///
/// Returns the number of lines visited.
pub fn process_lines<F>(path: &Path, mut f: F) -> Result<usize, TextCleanerError>
where
    F: FnMut(&str),
{
    let reader = BufReader::with_capacity(
        CHUNK_SIZE,
        File::open(path).map_err(|e| TextCleanerError::io(path, e))?,
    );
    let mut count = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| TextCleanerError::io(path, e))?;
        f(&line);
        count += 1;
    }
    Ok(count)
}

fn write_chunks(text: &str, file: File, path: &Path) -> Result<(), TextCleanerError> {
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    for chunk in text.as_bytes().chunks(CHUNK_SIZE) {
        writer.write_all(chunk).map_err(|e| write_err(path, e))?;
    }
    writer.flush().map_err(|e| write_err(path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| write_err(path, e))
}

// A dropped `NamedTempFile` removes itself, so every early return cleans up.
fn temp_sibling(path: &Path) -> Result<NamedTempFile, TextCleanerError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(&format!(".{stem}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| write_err(path, e))
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<(), TextCleanerError> {
    tmp.persist(path)
        .map(|_| ())
        .map_err(|e| write_err(path, e.error))
}

fn write_err(path: &Path, source: std::io::Error) -> TextCleanerError {
    TextCleanerError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    }
}
