//! User-facing notices emitted while configuring the environment

use std::sync::{Mutex, PoisonError};

/// Receives human-readable notices. Warnings are never fatal.
pub trait Reporter {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards notices to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Level of a recorded notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
}

/// Keeps every notice in emission order
#[derive(Debug, Default)]
pub struct MemoryReporter {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.of_level(NoticeLevel::Warn)
    }

    pub fn infos(&self) -> Vec<String> {
        self.of_level(NoticeLevel::Info)
    }

    fn of_level(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.push(NoticeLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(NoticeLevel::Warn, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_keeps_order() {
        let reporter = MemoryReporter::new();
        reporter.warn("first");
        reporter.info("second");
        reporter.warn("third");

        assert_eq!(reporter.warnings(), vec!["first", "third"]);
        assert_eq!(reporter.infos(), vec!["second"]);
        assert_eq!(reporter.notices()[1], (NoticeLevel::Info, "second".to_string()));
    }

    #[test]
    fn test_memory_reporter_survives_poisoned_lock() {
        let reporter = MemoryReporter::new();
        reporter.warn("before");

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = reporter.notices.lock().unwrap();
            panic!("poison the lock");
        }));
        assert!(reporter.notices.is_poisoned());

        reporter.warn("after");
        assert_eq!(reporter.warnings(), vec!["before", "after"]);
    }
}
