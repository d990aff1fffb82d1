//! Text reports for `check`/`validate`, the JSON results file and aggregate totals.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::model::{AnnotationKind, Issue, RouteRecord, Severity, ValidationResult};
use crate::pipeline::{Analysis, FileOutcome, FileStatus, StageFailure};
use crate::rewrite::write_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Analysed,
    Skipped,
    Completed,
    Failed,
}

/// One file's entry in the results file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
    pub has_component: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    pub routes: Vec<RouteRecord>,
    pub markers_rewritten: usize,
    pub issues: Vec<Issue>,
}

impl FileReport {
    pub fn from_outcome(outcome: &FileOutcome) -> Self {
        let (status, failure) = match &outcome.status {
            FileStatus::Skipped => (ReportStatus::Skipped, None),
            FileStatus::Completed => (ReportStatus::Completed, None),
            FileStatus::Failed(failure) => (ReportStatus::Failed, Some(failure.clone())),
        };
        FileReport {
            path: outcome.path.clone(),
            status,
            failure,
            has_component: outcome.validation.as_ref().is_some_and(|v| v.has_macro),
            validation: outcome.validation.clone(),
            routes: outcome.routes.clone(),
            markers_rewritten: outcome.markers_rewritten,
            issues: outcome.issues.clone(),
        }
    }

    pub fn from_analysis(path: &Path, analysis: &Analysis) -> Self {
        FileReport {
            path: path.to_path_buf(),
            status: ReportStatus::Analysed,
            failure: None,
            has_component: analysis.validation.has_macro,
            validation: Some(analysis.validation.clone()),
            routes: Vec::new(),
            markers_rewritten: 0,
            issues: analysis.validation.issues.clone(),
        }
    }

    /// A file that could not be read in check/validate mode: an empty result.
    pub fn empty(path: &Path) -> Self {
        FileReport {
            path: path.to_path_buf(),
            status: ReportStatus::Analysed,
            failure: None,
            has_component: false,
            validation: None,
            routes: Vec::new(),
            markers_rewritten: 0,
            issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub files_analysed: usize,
    pub with_component: usize,
    pub valid: usize,
    pub processed: usize,
    pub failed: usize,
    pub routes: usize,
}

impl Totals {
    pub fn tally(reports: &[FileReport]) -> Self {
        let mut totals = Totals::default();
        for report in reports {
            totals.files_analysed += 1;
            if report.has_component {
                totals.with_component += 1;
            }
            if report
                .validation
                .as_ref()
                .is_some_and(|v| v.has_macro && v.all_requirements_met())
            {
                totals.valid += 1;
            }
            match report.status {
                ReportStatus::Completed => totals.processed += 1,
                ReportStatus::Failed => totals.failed += 1,
                _ => {}
            }
            totals.routes += report.routes.len();
        }
        totals
    }
}

#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub mode: &'a str,
    pub totals: Totals,
    pub files: &'a [FileReport],
}

/// Write the JSON results file.
pub fn write_summary(path: &Path, mode: &str, reports: &[FileReport]) -> Result<()> {
    let summary = Summary {
        mode,
        totals: Totals::tally(reports),
        files: reports,
    };
    let mut text = serde_json::to_string_pretty(&summary)?;
    text.push('\n');
    write_atomic(path, &text)
}

/// `--mode check` line for one file.
pub fn render_check(path: &Path, found: bool) -> String {
    if found {
        format!("{}: //@Component found", path.display())
    } else {
        format!("{}: No //@Component", path.display())
    }
}

/// Detailed `--mode validate` block for one file.
pub fn render_validation(path: &Path, analysis: &Analysis) -> String {
    let v = &analysis.validation;
    let mut out = String::new();
    let _ = writeln!(out, "{}", path.display());

    let counts: Vec<String> = AnnotationKind::ALL
        .iter()
        .filter_map(|kind| {
            let n = analysis.scan.active().filter(|a| a.kind == *kind).count();
            (n > 0).then(|| format!("{kind} {n}"))
        })
        .collect();
    let processed = analysis.scan.annotations.len() - analysis.scan.active().count();
    let _ = writeln!(
        out,
        "  markers: {} (processed: {})",
        if counts.is_empty() { "none".to_string() } else { counts.join(", ") },
        processed
    );
    let _ = writeln!(out, "  classes: {}", list_or_none(&v.class_names));
    let _ = writeln!(out, "  interfaces: {}", list_or_none(&v.interface_names));
    let _ = writeln!(out, "  implementing: {}", list_or_none(&v.classes_with_inheritance));
    let _ = writeln!(
        out,
        "  placements: {} valid, {} invalid",
        v.valid_placements, v.invalid_placements
    );
    if v.has_macro {
        let verdict = if v.all_requirements_met() { "yes" } else { "no" };
        let _ = writeln!(out, "  requirements met: {verdict}");
    }
    for issue in &v.issues {
        let label = match issue.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        let _ = writeln!(out, "  {label}: {issue}");
    }
    out
}

pub fn render_totals(totals: &Totals) -> String {
    format!(
        "files analysed: {}\nwith //@Component: {}\nvalid: {}\nprocessed: {}\nfailed: {}\nroutes: {}\n",
        totals.files_analysed,
        totals.with_component,
        totals.valid,
        totals.processed,
        totals.failed,
        totals.routes
    )
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
