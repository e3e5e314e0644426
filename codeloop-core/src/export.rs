//! Tabular export sinks.
//!
//! Reporting only: nothing in the agent loops depends on these files, and
//! callers log export failures instead of propagating them.

use crate::{Error, Result};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

/// Quote a field when it holds a delimiter, quote or line break
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::export_failed(path.display().to_string(), "failed to create export directory")
                .set_source(e)
        })?;
    }
    Ok(())
}

/// Replace `path` with a header row plus `rows`
pub fn write_csv<S: AsRef<str>>(path: &Path, headers: &[&str], rows: &[Vec<S>]) -> Result<()> {
    ensure_parent(path)?;
    let mut out = encode_row(headers);
    for row in rows {
        out.push_str(&encode_row(row));
    }
    std::fs::write(path, out).map_err(|e| {
        Error::export_failed(path.display().to_string(), "failed to write table")
            .with_operation("export::write_csv")
            .set_source(e)
    })
}

/// Append `rows` to `path`, writing the header only when the file is new or empty
pub fn append_csv<S: AsRef<str>>(path: &Path, headers: &[&str], rows: &[Vec<S>]) -> Result<()> {
    ensure_parent(path)?;
    let fresh = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            Error::export_failed(path.display().to_string(), "failed to open table")
                .with_operation("export::append_csv")
                .set_source(e)
        })?;

    let mut out = String::new();
    if fresh {
        out.push_str(&encode_row(headers));
    }
    for row in rows {
        out.push_str(&encode_row(row));
    }
    file.write_all(out.as_bytes()).map_err(|e| {
        Error::export_failed(path.display().to_string(), "failed to append table")
            .with_operation("export::append_csv")
            .set_source(e)
    })
}
