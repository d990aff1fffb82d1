//! Data model for scanned annotations, declarations and routes.
//!
//! Everything here is derived per run from the current file text. The only
//! durable state is the `processed` flag, which is serialized back into the
//! source as the rewritten marker form.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A source file read from disk: path plus its lines (1-indexed via [`SourceFile::line`]).
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub lines: Vec<String>,
    /// Whether the text read from disk ended with a newline (preserved on rewrite).
    pub trailing_newline: bool,
    /// Terminator taken from the first line break: `"\r\n"` or `"\n"`.
    pub line_ending: &'static str,
}

impl SourceFile {
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        let crlf = text
            .find('\n')
            .is_some_and(|pos| text[..pos].ends_with('\r'));
        SourceFile {
            path: path.into(),
            lines: text.lines().map(str::to_string).collect(),
            trailing_newline: text.ends_with('\n'),
            line_ending: if crlf { "\r\n" } else { "\n" },
        }
    }

    /// Line by 1-based number.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Join the lines back into file text.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join(self.line_ending);
        if self.trailing_newline && !self.lines.is_empty() {
            text.push_str(self.line_ending);
        }
        text
    }
}

/// The closed set of recognized marker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AnnotationKind {
    Component,
    Scope,
    RestController,
    RequestMapping,
    GetMapping,
    PostMapping,
    PutMapping,
    DeleteMapping,
    PatchMapping,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 9] = [
        AnnotationKind::Component,
        AnnotationKind::Scope,
        AnnotationKind::RestController,
        AnnotationKind::RequestMapping,
        AnnotationKind::GetMapping,
        AnnotationKind::PostMapping,
        AnnotationKind::PutMapping,
        AnnotationKind::DeleteMapping,
        AnnotationKind::PatchMapping,
    ];

    pub const METHOD_MAPPINGS: [AnnotationKind; 5] = [
        AnnotationKind::GetMapping,
        AnnotationKind::PostMapping,
        AnnotationKind::PutMapping,
        AnnotationKind::DeleteMapping,
        AnnotationKind::PatchMapping,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnnotationKind::Component => "Component",
            AnnotationKind::Scope => "Scope",
            AnnotationKind::RestController => "RestController",
            AnnotationKind::RequestMapping => "RequestMapping",
            AnnotationKind::GetMapping => "GetMapping",
            AnnotationKind::PostMapping => "PostMapping",
            AnnotationKind::PutMapping => "PutMapping",
            AnnotationKind::DeleteMapping => "DeleteMapping",
            AnnotationKind::PatchMapping => "PatchMapping",
        }
    }

    /// Parse a mapping kind from its marker name (`GetMapping` → `GetMapping`).
    pub fn from_mapping_name(name: &str) -> Option<Self> {
        match name {
            "RequestMapping" => Some(AnnotationKind::RequestMapping),
            "GetMapping" => Some(AnnotationKind::GetMapping),
            "PostMapping" => Some(AnnotationKind::PostMapping),
            "PutMapping" => Some(AnnotationKind::PutMapping),
            "DeleteMapping" => Some(AnnotationKind::DeleteMapping),
            "PatchMapping" => Some(AnnotationKind::PatchMapping),
            _ => None,
        }
    }

    pub fn is_method_mapping(self) -> bool {
        Self::METHOD_MAPPINGS.contains(&self)
    }

    /// Markers that bind forward to a class declaration.
    pub fn targets_class(self) -> bool {
        matches!(
            self,
            AnnotationKind::Component | AnnotationKind::Scope | AnnotationKind::RestController
        )
    }

    /// Kinds that carry a quoted or parenthesized payload.
    pub fn has_payload(self) -> bool {
        !matches!(self, AnnotationKind::Component | AnnotationKind::RestController)
    }

    /// `GetMapping` → `GET`. `None` for non-method kinds.
    pub fn http_method(self) -> Option<String> {
        if !self.is_method_mapping() {
            return None;
        }
        Some(
            self.name()
                .strip_suffix("Mapping")
                .unwrap_or(self.name())
                .to_uppercase(),
        )
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One marker occurrence in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub raw_text: String,
    pub line: usize,
    pub payload: Option<String>,
    /// Found in the rewritten form: already generated, inert.
    pub processed: bool,
}

impl Annotation {
    pub fn is_active(&self) -> bool {
        !self.processed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDeclaration {
    pub name: String,
    pub base_interface: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

impl ClassDeclaration {
    pub fn contains(&self, line: usize) -> bool {
        line > self.start_line && line <= self.end_line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSignature {
    pub return_type: String,
    pub name: String,
    /// Empty when the parameter list is empty or `void`.
    pub first_param_type: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Declaration {
    Class(ClassDeclaration),
    Function(FunctionSignature),
}

impl Declaration {
    pub fn line(&self) -> usize {
        match self {
            Declaration::Class(class) => class.start_line,
            Declaration::Function(func) => func.line,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDeclaration> {
        match self {
            Declaration::Class(class) => Some(class),
            Declaration::Function(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSignature> {
        match self {
            Declaration::Function(func) => Some(func),
            Declaration::Class(_) => None,
        }
    }
}

/// An annotation paired with the declaration it modifies, if any was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub annotation: Annotation,
    pub target: Option<Declaration>,
}

impl Binding {
    pub fn found(&self) -> bool {
        self.target.is_some()
    }

    pub fn class(&self) -> Option<&ClassDeclaration> {
        self.target.as_ref().and_then(Declaration::as_class)
    }

    pub fn function(&self) -> Option<&FunctionSignature> {
        self.target.as_ref().and_then(Declaration::as_function)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    UnboundAnnotation,
    InvalidValue,
    AmbiguousResolution,
    MissingRequirement,
}

/// A validation or resolution finding tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub line: Option<usize>,
    pub message: String,
}

impl Issue {
    pub fn warning(kind: IssueKind, line: Option<usize>, message: impl Into<String>) -> Self {
        Issue {
            kind,
            severity: Severity::Warning,
            line,
            message: message.into(),
        }
    }

    pub fn error(kind: IssueKind, line: Option<usize>, message: impl Into<String>) -> Self {
        Issue {
            kind,
            severity: Severity::Error,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Verdict of the constraint validator for one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub has_macro: bool,
    pub has_class: bool,
    pub has_interface: bool,
    pub class_names: Vec<String>,
    pub interface_names: Vec<String>,
    pub classes_with_inheritance: Vec<String>,
    pub valid_placements: usize,
    pub invalid_placements: usize,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// The Component marker is significant: macro, class, interface and an implementing class.
    pub fn all_requirements_met(&self) -> bool {
        self.has_macro
            && self.has_class
            && self.has_interface
            && !self.classes_with_inheritance.is_empty()
    }
}

/// One resolved HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRecord {
    pub http_method: String,
    pub url: String,
    pub handler_class: String,
    pub handler_interface: String,
    pub handler_method: String,
    pub return_type: String,
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_header: Option<PathBuf>,
}
