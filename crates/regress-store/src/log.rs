//! The results log: one JSON object per line, later lines win.
//!
//! `regress next` appends a pending line for every index it hands out.
//! Recorders rewrite the whole log through a sibling temp file, which also
//! compacts superseded lines away. Lines starting with `#` are comments.

use crate::record::ResultRecord;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("line {line}: cannot parse result: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: corrupted results log: {reason}")]
    Corrupt { line: usize, reason: &'static str },

    #[error("cannot serialize result for index {index}: {message}")]
    Serialize { index: u64, message: String },
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> LogError + '_ {
    move |e| LogError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Parse log content in file order, duplicates included.
pub fn parse_log(bytes: &[u8]) -> Result<Vec<ResultRecord>, LogError> {
    let mut records = Vec::new();
    for (line_no, raw) in bytes.split(|&b| b == b'\n').enumerate() {
        let line = line_no + 1;
        if raw.contains(&0) {
            return Err(LogError::Corrupt {
                line,
                reason: "NUL byte",
            });
        }
        let text = std::str::from_utf8(raw).map_err(|_| LogError::Corrupt {
            line,
            reason: "non-UTF-8 byte sequence",
        })?;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(text).map_err(|e| LogError::Parse {
            line,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Every line of the log at `path`. A missing log has no lines.
pub fn read_log(path: &Path) -> Result<Vec<ResultRecord>, LogError> {
    match fs::read(path) {
        Ok(bytes) => parse_log(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(io_error(path)(e)),
    }
}

fn encode(record: &ResultRecord) -> Result<String, LogError> {
    serde_json::to_string(record).map_err(|e| LogError::Serialize {
        index: record.index,
        message: e.to_string(),
    })
}

/// Append one record, creating the log if needed.
///
/// A hand-edited log missing its final newline gets one first.
pub fn append_to_log(path: &Path, record: &ResultRecord) -> Result<(), LogError> {
    let line = encode(record)?;
    ensure_parent(path)?;
    let err = io_error(path);
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(&err)?;

    let mut prefix = "";
    if file.metadata().map_err(&err)?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(&err)?;
        file.read_exact(&mut last).map_err(&err)?;
        if last[0] != b'\n' {
            prefix = "\n";
        }
    }
    writeln!(file, "{prefix}{line}").map_err(&err)?;
    file.sync_all().map_err(&err)
}

/// Replace the log with `records`, one line each.
///
/// The temp file is synced before the rename and the directory after it,
/// so a crash leaves either the old log or the new one.
pub fn rewrite_log<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a ResultRecord>,
) -> Result<(), LogError> {
    ensure_parent(path)?;
    let tmp_path = temp_sibling(path);
    let tmp_err = io_error(&tmp_path);

    let written = (|| -> Result<(), LogError> {
        let mut writer = BufWriter::new(File::create(&tmp_path).map_err(&tmp_err)?);
        for record in records {
            writeln!(writer, "{}", encode(record)?).map_err(&tmp_err)?;
        }
        let file = writer.into_inner().map_err(|e| tmp_err(e.into_error()))?;
        file.sync_all().map_err(&tmp_err)
    })();
    if let Err(error) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error(path)(e));
    }
    if let Some(parent) = parent_dir(path) {
        File::open(parent)
            .and_then(|dir| dir.sync_all())
            .map_err(io_error(parent))?;
    }
    Ok(())
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

fn ensure_parent(path: &Path) -> Result<(), LogError> {
    match parent_dir(path) {
        Some(parent) => fs::create_dir_all(parent).map_err(io_error(parent)),
        None => Ok(()),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(format!(".tmp.{}.{nanos}", std::process::id()));
    PathBuf::from(name)
}
