use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::store::AssetPath;

/// Default maximum number of log lines to keep in memory
pub const DEFAULT_MAX_LOG_LINES: usize = 10000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: String,
    pub level: String,
    pub message: String,
    pub asset_path: Option<String>,
}

/// Bounded record of what an operation did, kept alongside the `log` output so
/// front ends can show it after the fact.
pub struct LogManager {
    entries: Mutex<VecDeque<LogEntry>>,
    max_lines: usize,
    next_id: AtomicU64,
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_LINES)
    }
}

impl LogManager {
    pub fn new(max_lines: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(max_lines.min(1024))),
            max_lines,
            next_id: AtomicU64::new(0),
        }
    }

    // Entries are plain values, a panic elsewhere cannot leave them half-written.
    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records an entry and forwards it to the `log` facade.
    pub fn log(&self, level: log::Level, message: &str, asset_path: Option<&AssetPath>) {
        match asset_path {
            Some(path) => log::log!(level, "[{path}] {message}"),
            None => log::log!(level, "{message}"),
        }

        let now = chrono::Utc::now().to_rfc3339();
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = LogEntry {
            id: format!("{now}-{seq}"),
            timestamp: now,
            level: level.as_str().to_lowercase(),
            message: message.to_string(),
            asset_path: asset_path.map(|p| p.to_string()),
        };
        self.push(entry);
    }

    fn push(&self, entry: LogEntry) {
        let mut logs = self.lock();
        logs.push_back(entry);

        // Remove from front if full
        while logs.len() > self.max_lines {
            logs.pop_front();
        }
    }

    pub fn info(&self, message: &str, asset_path: Option<&AssetPath>) {
        self.log(log::Level::Info, message, asset_path);
    }

    pub fn warn(&self, message: &str, asset_path: Option<&AssetPath>) {
        self.log(log::Level::Warn, message, asset_path);
    }

    pub fn error(&self, message: &str, asset_path: Option<&AssetPath>) {
        self.log(log::Level::Error, message, asset_path);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Entries about `asset_path`, or every entry for `None`.
    pub fn get_logs(&self, asset_path: Option<&str>) -> Vec<LogEntry> {
        let logs = self.lock();
        match asset_path {
            Some(path) => logs
                .iter()
                .filter(|l| l.asset_path.as_deref() == Some(path))
                .cloned()
                .collect(),
            None => logs.iter().cloned().collect(),
        }
    }

    /// Get logs with pagination for better performance with large log sets
    pub fn get_logs_paginated(&self, asset_path: Option<&str>, offset: usize, limit: usize) -> Vec<LogEntry> {
        let logs = self.lock();
        let filtered: Vec<_> = match asset_path {
            Some(path) => logs
                .iter()
                .filter(|l| l.asset_path.as_deref() == Some(path))
                .collect(),
            None => logs.iter().collect(),
        };

        let start = offset.min(filtered.len());
        let end = offset.saturating_add(limit).min(filtered.len());

        filtered[start..end].iter().map(|&entry| entry.clone()).collect()
    }
}
