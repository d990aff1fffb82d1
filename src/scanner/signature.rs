//! Single-line function signature recognition.
//!
//! Types are kept verbatim: templates, qualified names, pointers and
//! references come through as one token.

use crate::model::FunctionSignature;
use regex::Regex;
use std::sync::LazyLock;

// Return type must end on whitespace, `*`, `&` or `>` so it cannot swallow the name
static RE_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_<>*&:,\s]*?[\s*&>])\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)")
        .unwrap()
});

// Parameter split into type and trailing variable name
static RE_PARAM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?[\s*&>])\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:\[[^\]]*\])?$").unwrap()
});

/// Leading specifiers that are not part of the return type.
const SPECIFIERS: &[&str] = &[
    "virtual", "static", "inline", "explicit", "constexpr", "friend", "Public", "Private",
    "Protected", "Virtual", "Static", "Inline",
];

/// Statements that look like `word name(...)` but are not declarations.
const KEYWORDS: &[&str] = &[
    "return", "else", "new", "delete", "throw", "case", "goto", "co_return", "co_yield", "if",
    "while", "for", "switch", "using", "typedef", "class", "struct",
];

/// Words that never stand alone as a parameter type.
const TYPE_QUALIFIERS: &[&str] = &[
    "const", "volatile", "unsigned", "signed", "struct", "class", "enum", "typename", "long",
    "short",
];

/// Parse `ReturnType name(Params...)` on one line.
pub fn parse_signature(line: &str, line_number: usize) -> Option<FunctionSignature> {
    let caps = RE_SIGNATURE.captures(line.trim())?;
    let name = caps[2].to_string();
    if KEYWORDS.contains(&name.as_str()) {
        return None;
    }

    let raw_return = caps[1].trim();
    if raw_return
        .split_whitespace()
        .next()
        .is_some_and(|first| KEYWORDS.contains(&first))
    {
        return None;
    }
    let return_type = strip_specifiers(raw_return);
    if return_type.is_empty() {
        return None;
    }

    Some(FunctionSignature {
        return_type,
        name,
        first_param_type: first_param_type(&caps[3]),
        line: line_number,
    })
}

fn strip_specifiers(raw: &str) -> String {
    let mut rest = raw.trim();
    loop {
        let Some((head, tail)) = rest.split_once(char::is_whitespace) else {
            break;
        };
        if !SPECIFIERS.contains(&head) {
            break;
        }
        rest = tail.trim_start();
    }
    if SPECIFIERS.contains(&rest) {
        return String::new();
    }
    rest.to_string()
}

/// Type of the first parameter, or an empty string for `()` / `(void)`.
pub fn first_param_type(params: &str) -> String {
    let Some(first) = split_top_level(params).into_iter().next() else {
        return String::new();
    };
    let first = match first.split_once('=') {
        Some((decl, _default)) => decl.trim(),
        None => first.trim(),
    };
    if first.is_empty() || first == "void" {
        return String::new();
    }
    match RE_PARAM_NAME.captures(first) {
        Some(caps) => {
            let ty = caps[1].trim();
            if ty.is_empty() || TYPE_QUALIFIERS.contains(&ty) {
                first.to_string()
            } else {
                ty.to_string()
            }
        }
        None => first.to_string(),
    }
}

/// Split on commas that are not nested inside `<>` or `()`.
fn split_top_level(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in params.char_indices() {
        match ch {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(params[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = params[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}
