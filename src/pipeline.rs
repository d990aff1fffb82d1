//! Per-file staged pipeline.
//!
//! Each file walks `Scanning → Binding → Validating → Resolving → Generating →
//! Marking → Done`. The first failing stage ends that file; the batch goes on.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::discover::HeaderIndex;
use crate::error::{Error, Result};
use crate::model::{Binding, Issue, RouteRecord, SourceFile, ValidationResult};
use crate::render::{check_duplicates, Renderer};
use crate::resolve::resolve;
use crate::rewrite::{rewrite_markers, write_atomic};
use crate::scanner::bind::bind;
use crate::scanner::locate::has_active_component;
use crate::scanner::{scan, Scan};
use crate::validate::{validate, ValidationOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Idle,
    Scanning,
    Binding,
    Validating,
    Resolving,
    Generating,
    Marking,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed at {}: {}", self.stage, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    /// No active Component: nothing to do.
    Skipped,
    Completed,
    Failed(StageFailure),
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    pub stages_completed: Vec<Stage>,
    pub validation: Option<ValidationResult>,
    pub routes: Vec<RouteRecord>,
    pub fragment: Option<String>,
    pub markers_rewritten: usize,
    pub issues: Vec<Issue>,
}

impl FileOutcome {
    fn new(path: &Path) -> Self {
        FileOutcome {
            path: path.to_path_buf(),
            status: FileStatus::Skipped,
            stages_completed: vec![Stage::Idle],
            validation: None,
            routes: Vec::new(),
            fragment: None,
            markers_rewritten: 0,
            issues: Vec::new(),
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed(_))
    }

    /// `Failed` for a failed file, `Done` otherwise.
    pub fn final_stage(&self) -> Stage {
        match self.status {
            FileStatus::Failed(_) => Stage::Failed,
            _ => Stage::Done,
        }
    }

    fn fail(mut self, stage: Stage, reason: impl Into<String>) -> Self {
        self.status = FileStatus::Failed(StageFailure {
            stage,
            reason: reason.into(),
        });
        self
    }
}

/// Scan, bind and validate one file without touching it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scan: Scan,
    pub bindings: Vec<Binding>,
    pub validation: ValidationResult,
}

pub fn analyze(file: &SourceFile, options: ValidationOptions) -> Analysis {
    let scan = scan(file);
    let bindings = bind(file, &scan);
    let validation = validate(&scan, &bindings, options);
    Analysis {
        scan,
        bindings,
        validation,
    }
}

/// Read a file from disk into lines.
pub fn read_source(path: &Path) -> Result<SourceFile> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceFile::from_text(path, &text))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Run every stage except Marking.
    pub dry_run: bool,
    pub validation: ValidationOptions,
}

pub struct Pipeline<'a> {
    pub options: PipelineOptions,
    pub diagnostics: &'a dyn Diagnostics,
    pub headers: Option<&'a HeaderIndex>,
    pub renderer: &'a dyn Renderer,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        options: PipelineOptions,
        diagnostics: &'a dyn Diagnostics,
        renderer: &'a dyn Renderer,
    ) -> Self {
        Pipeline {
            options,
            diagnostics,
            headers: None,
            renderer,
        }
    }

    pub fn with_headers(mut self, headers: &'a HeaderIndex) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Run every file in order. One file failing never stops the others.
    pub fn run(&self, paths: &[PathBuf]) -> Vec<FileOutcome> {
        paths.iter().map(|path| self.run_file(path)).collect()
    }

    pub fn run_file(&self, path: &Path) -> FileOutcome {
        match read_source(path) {
            Ok(file) => self.process(&file),
            Err(err) => self.unreadable(path, err),
        }
    }

    /// Run the stages over an in-memory file. Marking writes back to `file.path`.
    pub fn process(&self, file: &SourceFile) -> FileOutcome {
        let mut outcome = self.generate_source(file);
        if !self.options.dry_run {
            self.mark_source(file, &mut outcome);
        }
        outcome
    }

    /// Every stage except Marking, for each file.
    ///
    /// Pair with [`Pipeline::mark`] once the generated entries are written out,
    /// so a file is never marked for output that was lost.
    pub fn generate(&self, paths: &[PathBuf]) -> Vec<FileOutcome> {
        paths
            .iter()
            .map(|path| match read_source(path) {
                Ok(file) => self.generate_source(&file),
                Err(err) => self.unreadable(path, err),
            })
            .collect()
    }

    /// Marking for a completed outcome from [`Pipeline::generate`]. Re-reads the file.
    pub fn mark(&self, outcome: &mut FileOutcome) {
        if outcome.status != FileStatus::Completed {
            return;
        }
        match read_source(&outcome.path) {
            Ok(file) => self.mark_source(&file, outcome),
            Err(err) => self.fail_marking(outcome, err),
        }
    }

    fn unreadable(&self, path: &Path, err: Error) -> FileOutcome {
        self.diagnostics.error(path, &err.to_string());
        FileOutcome::new(path).fail(Stage::Scanning, err.to_string())
    }

    fn generate_source(&self, file: &SourceFile) -> FileOutcome {
        let outcome = self.stages(file);
        match &outcome.status {
            FileStatus::Failed(failure) => self.diagnostics.error(file.path(), &failure.to_string()),
            FileStatus::Completed => self.diagnostics.info(
                file.path(),
                &format!("{} route(s) generated", outcome.routes.len()),
            ),
            FileStatus::Skipped => {}
        }
        outcome
    }

    fn mark_source(&self, file: &SourceFile, outcome: &mut FileOutcome) {
        if outcome.status != FileStatus::Completed
            || outcome.stages_completed.contains(&Stage::Marking)
        {
            return;
        }
        let path = file.path();
        tracing::debug!("{}: {}", path.display(), Stage::Marking);
        let (rewritten, count) = rewrite_markers(file);
        if count > 0 {
            if let Err(err) = write_atomic(path, &rewritten.to_text()) {
                self.fail_marking(outcome, err);
                return;
            }
        }
        outcome.markers_rewritten = count;
        outcome.stages_completed.retain(|stage| *stage != Stage::Done);
        outcome.stages_completed.push(Stage::Marking);
        outcome.stages_completed.push(Stage::Done);
        self.diagnostics
            .info(path, &format!("{count} marker(s) rewritten"));
    }

    fn fail_marking(&self, outcome: &mut FileOutcome, err: Error) {
        let failure = StageFailure {
            stage: Stage::Marking,
            reason: err.to_string(),
        };
        self.diagnostics.error(&outcome.path, &failure.to_string());
        outcome.stages_completed.retain(|stage| *stage != Stage::Done);
        outcome.status = FileStatus::Failed(failure);
    }

    fn stages(&self, file: &SourceFile) -> FileOutcome {
        let path = file.path();
        let mut outcome = FileOutcome::new(path);

        // Scanning
        tracing::debug!("{}: {}", path.display(), Stage::Scanning);
        if !has_active_component(file) {
            outcome.stages_completed.push(Stage::Scanning);
            outcome.stages_completed.push(Stage::Done);
            tracing::debug!("{}: no active Component, skipping", path.display());
            return outcome;
        }
        let scanned = scan(file);
        outcome.stages_completed.push(Stage::Scanning);

        // Binding
        tracing::debug!("{}: {}", path.display(), Stage::Binding);
        let bindings = bind(file, &scanned);
        outcome.stages_completed.push(Stage::Binding);

        // Validating
        tracing::debug!("{}: {}", path.display(), Stage::Validating);
        let validation = validate(&scanned, &bindings, self.options.validation);
        self.report_issues(path, &validation.issues);
        outcome.issues.extend(validation.issues.iter().cloned());
        let significant = validation.all_requirements_met();
        outcome.validation = Some(validation);
        if !significant {
            return outcome.fail(Stage::Validating, "Component requirements not met");
        }
        outcome.stages_completed.push(Stage::Validating);

        // Resolving
        tracing::debug!("{}: {}", path.display(), Stage::Resolving);
        let resolution = resolve(&scanned, &bindings, self.headers);
        self.report_issues(path, &resolution.issues);
        outcome.issues.extend(resolution.issues);
        outcome.routes = resolution.routes;
        outcome.stages_completed.push(Stage::Resolving);

        // Generating
        tracing::debug!("{}: {}", path.display(), Stage::Generating);
        if let Err(err) = check_duplicates(&outcome.routes) {
            return outcome.fail(Stage::Generating, err.to_string());
        }
        if !outcome.routes.is_empty() {
            match self.renderer.render(&outcome.routes) {
                Ok(fragment) => outcome.fragment = Some(fragment),
                Err(err) => return outcome.fail(Stage::Generating, err.to_string()),
            }
        }
        outcome.stages_completed.push(Stage::Generating);

        outcome.stages_completed.push(Stage::Done);
        outcome.status = FileStatus::Completed;
        outcome
    }

    fn report_issues(&self, path: &Path, issues: &[Issue]) {
        for issue in issues {
            self.diagnostics.emit(Diagnostic::from_issue(path, issue));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingDiagnostics, Level};
    use crate::render::cpp::CppRenderer;

    const ORDERS: &str = r#"#include "IOrderController.h"

//@Component
SCOPE(SINGLETON)
///@RestController
///@RequestMapping("/orders")
class OrderController : public IOrderController {
public:
    ///@GetMapping("/list")
    OrderList list();
};
"#;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn pipeline<'a>(sink: &'a CollectingDiagnostics, dry_run: bool) -> Pipeline<'a> {
        let options = PipelineOptions {
            dry_run,
            ..PipelineOptions::default()
        };
        Pipeline::new(options, sink, &CppRenderer)
    }

    #[test]
    fn processes_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "OrderController.h", ORDERS);
        let sink = CollectingDiagnostics::new();

        let outcome = pipeline(&sink, false).run_file(&path);
        assert_eq!(outcome.status, FileStatus::Completed);
        assert_eq!(outcome.routes.len(), 1);
        assert_eq!(outcome.routes[0].url, "/orders/list");
        assert_eq!(outcome.markers_rewritten, 4);
        assert_eq!(outcome.stages_completed.last(), Some(&Stage::Done));
        assert!(outcome.fragment.unwrap().contains("getMappings[\"/orders/list\"]"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("/*@Component*/"));
        assert!(text.contains("SCOPE(SINGLETON)"));
        assert!(text.contains("/*@GetMapping(\"/list\")*/"));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "OrderController.h", ORDERS);
        let sink = CollectingDiagnostics::new();
        let p = pipeline(&sink, false);

        p.run_file(&path);
        let after_first = fs::read_to_string(&path).unwrap();
        let second = p.run_file(&path);
        assert_eq!(second.status, FileStatus::Skipped);
        assert_eq!(second.stages_completed, vec![Stage::Idle, Stage::Scanning, Stage::Done]);
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "OrderController.h", ORDERS);
        let sink = CollectingDiagnostics::new();

        let outcome = pipeline(&sink, true).run_file(&path);
        assert_eq!(outcome.status, FileStatus::Completed);
        assert!(outcome.fragment.is_some());
        assert!(!outcome.stages_completed.contains(&Stage::Marking));
        assert_eq!(fs::read_to_string(&path).unwrap(), ORDERS);
    }

    #[test]
    fn insignificant_component_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let text = "//@Component\nclass Plain {\n};\n";
        let path = write(dir.path(), "Plain.h", text);
        let sink = CollectingDiagnostics::new();

        let outcome = pipeline(&sink, false).run_file(&path);
        match &outcome.status {
            FileStatus::Failed(failure) => assert_eq!(failure.stage, Stage::Validating),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(outcome.final_stage(), Stage::Failed);
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
        assert!(sink.count(Level::Error) >= 1);
    }

    #[test]
    fn duplicate_routes_fail_generation() {
        let dir = tempfile::tempdir().unwrap();
        let text = "//@Component\nclass A : public IA {\n    ///@GetMapping(\"/x\")\n    int one();\n    ///@GetMapping(\"x\")\n    int two();\n};\n";
        let path = write(dir.path(), "A.h", text);
        let sink = CollectingDiagnostics::new();

        let outcome = pipeline(&sink, false).run_file(&path);
        match &outcome.status {
            FileStatus::Failed(failure) => {
                assert_eq!(failure.stage, Stage::Generating);
                assert!(failure.reason.contains("duplicate route GET /x"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn missing_file_fails_at_scanning_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "OrderController.h", ORDERS);
        let missing = dir.path().join("Missing.h");
        let sink = CollectingDiagnostics::new();

        let outcomes = pipeline(&sink, true).run(&[missing, good]);
        assert!(matches!(
            &outcomes[0].status,
            FileStatus::Failed(StageFailure { stage: Stage::Scanning, .. })
        ));
        assert_eq!(outcomes[1].status, FileStatus::Completed);
    }

    #[test]
    fn generate_leaves_files_until_marked() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "OrderController.h", ORDERS);
        let sink = CollectingDiagnostics::new();
        let p = pipeline(&sink, false);

        let mut outcomes = p.generate(&[path.clone()]);
        assert_eq!(outcomes[0].status, FileStatus::Completed);
        assert!(!outcomes[0].stages_completed.contains(&Stage::Marking));
        assert_eq!(fs::read_to_string(&path).unwrap(), ORDERS);

        p.mark(&mut outcomes[0]);
        assert_eq!(outcomes[0].markers_rewritten, 4);
        assert_eq!(
            &outcomes[0].stages_completed[outcomes[0].stages_completed.len() - 3..],
            &[Stage::Generating, Stage::Marking, Stage::Done]
        );
        assert!(fs::read_to_string(&path).unwrap().contains("/*@Component*/"));

        // Marking twice is a no-op
        p.mark(&mut outcomes[0]);
        assert_eq!(outcomes[0].markers_rewritten, 4);
    }

    #[test]
    fn marking_failure_is_reported_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = SourceFile::from_text(dir.path().join("gone/OrderController.h"), ORDERS);
        let sink = CollectingDiagnostics::new();

        let outcome = pipeline(&sink, false).process(&file);
        assert!(matches!(
            &outcome.status,
            FileStatus::Failed(StageFailure { stage: Stage::Marking, .. })
        ));
        assert_eq!(outcome.final_stage(), Stage::Failed);
        assert!(!outcome.stages_completed.contains(&Stage::Done));
        assert_eq!(outcome.markers_rewritten, 0);
        assert!(sink.count(Level::Error) >= 1);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_directory_fails_marking_and_batch_continues() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked_dir = dir.path().join("locked");
        fs::create_dir(&locked_dir).unwrap();
        let locked = write(&locked_dir, "OrderController.h", ORDERS);
        let open = write(dir.path(), "OrderController.h", ORDERS);
        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users write through directory permissions
        let writable = fs::File::create(locked_dir.join("writable")).is_ok();
        let sink = CollectingDiagnostics::new();
        let outcomes = if writable {
            Vec::new()
        } else {
            pipeline(&sink, false).run(&[locked.clone(), open.clone()])
        };
        fs::set_permissions(&locked_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            return;
        }

        assert!(matches!(
            &outcomes[0].status,
            FileStatus::Failed(StageFailure { stage: Stage::Marking, .. })
        ));
        assert_eq!(fs::read_to_string(&locked).unwrap(), ORDERS);
        assert_eq!(outcomes[1].status, FileStatus::Completed);
        assert!(fs::read_to_string(&open).unwrap().contains("/*@Component*/"));
    }

    #[test]
    fn crlf_source_keeps_its_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let crlf = ORDERS.replace('\n', "\r\n");
        let path = write(dir.path(), "OrderController.h", &crlf);
        let sink = CollectingDiagnostics::new();

        let outcome = pipeline(&sink, false).run_file(&path);
        assert_eq!(outcome.status, FileStatus::Completed);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("/*@Component*/\r\nSCOPE(SINGLETON)\r\n"));
        assert_eq!(text.matches("\r\n").count(), crlf.matches("\r\n").count());
        assert_eq!(text.matches('\n').count(), text.matches("\r\n").count());
    }

    #[test]
    fn analyze_does_not_require_component() {
        let file = SourceFile::from_text("a.h", "class A : public IA {\n};\n");
        let analysis = analyze(&file, ValidationOptions::default());
        assert!(!analysis.validation.has_macro);
        assert!(analysis.bindings.is_empty());
        assert_eq!(analysis.scan.classes.len(), 1);
    }
}
