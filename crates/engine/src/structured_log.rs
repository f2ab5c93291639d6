// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines structured log writer (spec.md §6), a second, independent
//! sink driven directly by the execution manager for machine-readable
//! diagnostics — not a `tracing` layer.
//!
//! Grounded in the teacher's `JobLogger` (`job_logger.rs`): open-append-
//! close per line, warn-but-don't-propagate on I/O failure. The wire
//! format itself (JSON lines with `@timestamp`/`@severity`/`@message`) is
//! new — the teacher's logger writes fenced plain text, this one writes
//! one JSON object per line.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Severity tag written as `@severity`. Lowercased per spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

/// Anything that can record a structured diagnostic line. A trait so tests
/// can substitute an in-memory writer without touching the filesystem.
pub trait StructuredLogWriter: Send + Sync {
    fn write(&self, severity: Severity, message: &str, extra: &[(&str, Value)]);
}

/// Renders exactly `{"@timestamp": ..., "@severity": ..., "@message": ...} ∪
/// extras` to one line, flushed immediately, never closing the underlying
/// stream (spec.md §6's exact contract). Timestamps use microsecond
/// precision UTC (`YYYY-MM-DDTHH:MM:SS.ffffffZ`).
pub struct JsonLinesWriter<W: Write + Send> {
    sink: Mutex<W>,
}

impl JsonLinesWriter<File> {
    /// Opens `path` for appending, creating it (and its parent directory)
    /// if necessary.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { sink: Mutex::new(file) })
    }
}

impl<W: Write + Send> JsonLinesWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink: Mutex::new(sink) }
    }

    fn render(severity: Severity, message: &str, extra: &[(&str, Value)]) -> String {
        let mut object = Map::new();
        object.insert("@timestamp".to_string(), Value::String(now_iso8601_micros()));
        object.insert("@severity".to_string(), Value::String(severity.as_str().to_string()));
        object.insert("@message".to_string(), Value::String(message.to_string()));
        for (key, value) in extra {
            object.insert((*key).to_string(), value.clone());
        }
        Value::Object(object).to_string()
    }
}

impl<W: Write + Send> StructuredLogWriter for JsonLinesWriter<W> {
    fn write(&self, severity: Severity, message: &str, extra: &[(&str, Value)]) {
        let line = Self::render(severity, message, extra);
        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(sink, "{line}") {
            tracing::warn!(error = %e, "failed to write structured log line");
            return;
        }
        if let Err(e) = sink.flush() {
            tracing::warn!(error = %e, "failed to flush structured log writer");
        }
    }
}

fn now_iso8601_micros() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
#[path = "structured_log_tests.rs"]
mod tests;
