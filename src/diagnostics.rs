//! Diagnostics sink injected into the pipeline.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::model::{Issue, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl From<Severity> for Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Level::Warning,
            Severity::Error => Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub path: Option<PathBuf>,
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: Level, path: Option<&Path>, message: impl Into<String>) -> Self {
        Diagnostic {
            level,
            path: path.map(Path::to_path_buf),
            line: None,
            message: message.into(),
        }
    }

    pub fn from_issue(path: &Path, issue: &Issue) -> Self {
        Diagnostic {
            level: issue.severity.into(),
            path: Some(path.to_path_buf()),
            line: issue.line,
            message: issue.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, "{}:{}: {}", path.display(), line, self.message),
            (Some(path), None) => write!(f, "{}: {}", path.display(), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

pub trait Diagnostics {
    fn emit(&self, diagnostic: Diagnostic);

    fn info(&self, path: &Path, message: &str) {
        self.emit(Diagnostic::new(Level::Info, Some(path), message));
    }

    fn error(&self, path: &Path, message: &str) {
        self.emit(Diagnostic::new(Level::Error, Some(path), message));
    }
}

/// Forwards every diagnostic to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Info => tracing::info!("{}", diagnostic),
            Level::Warning => tracing::warn!("{}", diagnostic),
            Level::Error => tracing::error!("{}", diagnostic),
        }
    }
}

/// Keeps diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    records: RefCell<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|d| d.level == level)
            .count()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        self.records.borrow_mut().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueKind;

    #[test]
    fn collects_in_order() {
        let sink = CollectingDiagnostics::new();
        sink.info(Path::new("a.h"), "first");
        sink.error(Path::new("a.h"), "second");
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(sink.count(Level::Error), 1);
    }

    #[test]
    fn issue_keeps_line_and_level() {
        let issue = Issue::warning(IssueKind::UnboundAnnotation, Some(7), "dangling");
        let diagnostic = Diagnostic::from_issue(Path::new("src/a.h"), &issue);
        assert_eq!(diagnostic.level, Level::Warning);
        assert_eq!(diagnostic.to_string(), "src/a.h:7: dangling");
    }
}
