//! Per-line classification against the marker grammars.
//!
//! Markers must be the first non-whitespace token on their line. Anything
//! embedded mid-statement is plain code.

use crate::model::AnnotationKind;
use regex::{Captures, Regex};
use std::sync::LazyLock;

// -- Marker grammars ----------------------------------------------------------

static RE_COMPONENT_ACTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//@Component\s*$").unwrap());

static RE_COMPONENT_PROCESSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\*@Component\*/\s*$").unwrap());

static RE_SCOPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SCOPE\s*\(\s*([^)]*?)\s*\)").unwrap());

static RE_REST_ACTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^///\s*@RestController\b").unwrap());

static RE_REST_PROCESSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\*\s*@RestController\s*\*/").unwrap());

static RE_MAPPING_ACTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^///\s*@(RequestMapping|GetMapping|PostMapping|PutMapping|DeleteMapping|PatchMapping)",
        r#"\s*\(\s*(?:"([^"]*)"|'([^']*)')\s*\)"#
    ))
    .unwrap()
});

// Unprefixed macro form kept for older sources
static RE_MAPPING_LEGACY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(RequestMapping|GetMapping|PostMapping|PutMapping|DeleteMapping|PatchMapping)",
        r#"\s*\(\s*(?:"([^"]*)"|'([^']*)')\s*\)"#
    ))
    .unwrap()
});

static RE_MAPPING_PROCESSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^/\*\s*@?(RequestMapping|GetMapping|PostMapping|PutMapping|DeleteMapping|PatchMapping)",
        r#"\s*\(\s*(?:"([^"]*)"|'([^']*)')\s*\)\s*\*/"#
    ))
    .unwrap()
});

/// A recognized marker on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: AnnotationKind,
    pub payload: Option<String>,
    /// Byte span of the marker text within the trimmed line.
    pub span: (usize, usize),
}

/// Category of a single source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    Code,
    LineComment,
    BlockComment,
    Processed(Marker),
    Active(Marker),
}

impl LineClass {
    pub fn active_marker(&self) -> Option<&Marker> {
        match self {
            LineClass::Active(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, LineClass::Code)
    }

    /// Lines that may sit between a marker and its target without breaking the binding.
    pub fn allows_intervening(&self) -> bool {
        matches!(
            self,
            LineClass::Blank | LineClass::Active(_) | LineClass::Processed(_)
        )
    }
}

/// Classify one line of source text.
pub fn classify(line: &str) -> LineClass {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineClass::Blank;
    }

    if let Some(marker) = match_processed(trimmed) {
        return LineClass::Processed(marker);
    }

    if trimmed.starts_with("/*") || is_block_continuation(trimmed) {
        return LineClass::BlockComment;
    }

    if trimmed.starts_with("//") {
        return match match_comment_marker(trimmed) {
            Some(marker) => LineClass::Active(marker),
            None => LineClass::LineComment,
        };
    }

    if let Some(caps) = RE_SCOPE.captures(trimmed) {
        return LineClass::Active(Marker {
            kind: AnnotationKind::Scope,
            payload: Some(caps[1].to_string()),
            span: span_of(&caps),
        });
    }

    if let Some(caps) = RE_MAPPING_LEGACY.captures(trimmed) {
        if let Some(marker) = mapping_marker(&caps) {
            return LineClass::Active(marker);
        }
    }

    LineClass::Code
}

fn match_processed(trimmed: &str) -> Option<Marker> {
    if let Some(caps) = RE_COMPONENT_PROCESSED.captures(trimmed) {
        return Some(Marker {
            kind: AnnotationKind::Component,
            payload: None,
            span: span_of(&caps),
        });
    }
    if let Some(caps) = RE_REST_PROCESSED.captures(trimmed) {
        return Some(Marker {
            kind: AnnotationKind::RestController,
            payload: None,
            span: span_of(&caps),
        });
    }
    RE_MAPPING_PROCESSED
        .captures(trimmed)
        .and_then(|caps| mapping_marker(&caps))
}

fn match_comment_marker(trimmed: &str) -> Option<Marker> {
    if let Some(caps) = RE_COMPONENT_ACTIVE.captures(trimmed) {
        return Some(Marker {
            kind: AnnotationKind::Component,
            payload: None,
            span: span_of(&caps),
        });
    }
    if let Some(caps) = RE_REST_ACTIVE.captures(trimmed) {
        return Some(Marker {
            kind: AnnotationKind::RestController,
            payload: None,
            span: span_of(&caps),
        });
    }
    RE_MAPPING_ACTIVE
        .captures(trimmed)
        .and_then(|caps| mapping_marker(&caps))
}

fn mapping_marker(caps: &Captures<'_>) -> Option<Marker> {
    let kind = AnnotationKind::from_mapping_name(&caps[1])?;
    let payload = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    Some(Marker {
        kind,
        payload: Some(payload),
        span: span_of(caps),
    })
}

fn span_of(caps: &Captures<'_>) -> (usize, usize) {
    caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0))
}

/// ` * text` and ` */` lines inside a multi-line block comment.
fn is_block_continuation(trimmed: &str) -> bool {
    trimmed == "*" || trimmed.starts_with("* ") || trimmed.starts_with("*/")
}
