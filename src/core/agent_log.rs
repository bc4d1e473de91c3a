use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Bounded in-memory journal of pipeline activity shown in the back-office.
///
/// Oldest entries are dropped once `capacity` is reached.
pub struct AgentLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl AgentLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            at: Utc::now(),
            level,
            message: message.into(),
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    /// Entries, newest first
    pub fn entries(&self) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keeps_newest() {
        let log = AgentLog::new(3);
        for i in 0..5 {
            log.info(format!("step {}", i));
        }
        log.error("boom");

        let messages: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["boom", "step 4", "step 3"]);
        assert_eq!(log.entries()[0].level, LogLevel::Error);
    }
}
