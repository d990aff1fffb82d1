//! Class declaration recognition, brace balancing and interface detection.

use super::classify::classify;
use crate::model::{ClassDeclaration, SourceFile};
use regex::Regex;
use std::sync::LazyLock;

// `class Name [final] :` or `class Name [final] {`, optionally after a template prefix
static RE_CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:template\s*<[^>]*>\s*)?class\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:final\s*)?([:{])")
        .unwrap()
});

static RE_BASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:public|protected|private|virtual)\s+)*([A-Za-z_][A-Za-z0-9_:]*)").unwrap()
});

static RE_PURE_VIRTUAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\s*0\s*;").unwrap());

/// Parse a class header line into `(name, first base)`.
pub fn parse_class_header(line: &str) -> Option<(String, Option<String>)> {
    let trimmed = line.trim();
    let caps = RE_CLASS_DECL.captures(trimmed)?;
    let name = caps[1].to_string();
    let base = if &caps[2] == ":" {
        let rest = &trimmed[caps.get(2).map(|m| m.end()).unwrap_or(trimmed.len())..];
        RE_BASE.captures(rest).map(|b| b[1].to_string())
    } else {
        None
    };
    Some((name, base))
}

/// All class declarations in the file, with their brace-balanced end lines.
pub fn find_classes(file: &SourceFile) -> Vec<ClassDeclaration> {
    let mut classes = Vec::new();
    for (index, line) in file.lines.iter().enumerate() {
        if !classify(line).is_code() {
            continue;
        }
        if let Some((name, base_interface)) = parse_class_header(line) {
            let start_line = index + 1;
            classes.push(ClassDeclaration {
                name,
                base_interface,
                start_line,
                end_line: find_class_end(file, start_line),
            });
        }
    }
    classes
}

/// Line on which the braces opened at or after `start_line` balance out.
///
/// Falls back to the last line of the file when the body never closes.
pub fn find_class_end(file: &SourceFile, start_line: usize) -> usize {
    let mut depth: i64 = 0;
    let mut opened = false;
    for number in start_line..=file.len() {
        let Some(line) = file.line(number) else { break };
        for ch in code_part(line).chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return number;
        }
    }
    file.len()
}

/// Strip a trailing `//` comment so braces inside it are not counted.
///
/// A `//` inside a double-quoted literal is not a comment.
fn code_part(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            return &line[..i];
        }
    }
    line
}

/// Interface names visible in the file: inherited bases and pure-virtual classes.
pub fn interface_names(file: &SourceFile, classes: &[ClassDeclaration]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut add = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };
    for class in classes {
        if let Some(base) = &class.base_interface {
            add(base);
        }
        if declares_pure_virtual(file, class) {
            add(&class.name);
        }
    }
    names
}

fn declares_pure_virtual(file: &SourceFile, class: &ClassDeclaration) -> bool {
    (class.start_line..=class.end_line)
        .filter_map(|n| file.line(n))
        .any(|line| RE_PURE_VIRTUAL.is_match(code_part(line)))
}
