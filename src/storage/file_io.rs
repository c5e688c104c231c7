//! File helpers for the two on-disk formats
//!
//! Documents (settings, schema, properties) are pretty JSON replaced
//! atomically. The audit log is JSON Lines, appended and never rewritten.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AuditError;

fn storage_error(action: &str, path: &Path, e: impl std::fmt::Display) -> AuditError {
    AuditError::Storage(format!("Failed to {} {}: {}", action, path.display(), e))
}

/// Read a JSON document; a missing file yields `T::default()`
pub fn read_json<T, P>(path: P) -> Result<T, AuditError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| storage_error("open", path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_error("parse", path, e))
}

/// Replace a JSON document through a sibling `<name>.tmp` file and a rename
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_error("create directory", parent, e))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let file = File::create(&temp_path).map_err(|e| storage_error("create", &temp_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| storage_error("serialize", path, e))?;
    writer
        .flush()
        .and_then(|_| writer.get_ref().sync_all())
        .map_err(|e| storage_error("write", &temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        storage_error("replace", path, e)
    })
}

/// Read every non-blank line of a JSON Lines file, oldest first
///
/// Parse failures name the 1-based line number.
pub fn read_json_lines<T, P>(path: P) -> Result<Vec<T>, AuditError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    let mut items = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line
            .map_err(|e| AuditError::Io(format!("Failed to read line {}: {}", index + 1, e)))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| {
            AuditError::Json(format!(
                "Failed to parse line {} of {}: {}",
                index + 1,
                path.display(),
                e
            ))
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Append items as JSON Lines with a single write and flush
///
/// Everything is serialized before the file is touched, so a serialization
/// error leaves the file unchanged.
pub fn append_json_lines<T, P>(path: P, items: &[T]) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut buffer = String::new();
    for item in items {
        let json = serde_json::to_string(item)
            .map_err(|e| AuditError::Json(format!("Failed to serialize line: {}", e)))?;
        buffer.push_str(&json);
        buffer.push('\n');
    }

    let persistence = |e: std::io::Error| {
        AuditError::Persistence(format!("Failed to append to {}: {}", path.display(), e))
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(persistence)?;
    file.write_all(buffer.as_bytes()).map_err(persistence)?;
    file.flush().map_err(persistence)
}
