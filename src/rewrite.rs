//! Marker rewriter: active comment markers become their processed form.
//!
//! `SCOPE(...)` is a compiled macro and is left alone. Writes go through a
//! temp file in the target's directory and are persisted over it in one step.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::model::{AnnotationKind, SourceFile};
use crate::scanner::classify::{classify, LineClass};

/// Processed form of `line`, or `None` when it holds no rewritable marker.
pub fn processed_form(line: &str) -> Option<String> {
    let LineClass::Active(marker) = classify(line) else {
        return None;
    };
    if marker.kind == AnnotationKind::Scope {
        return None;
    }

    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let (start, end) = marker.span;
    let text = body.get(start..end)?;
    let rest = body.get(end..).unwrap_or_default().trim();

    let inner = match marker.kind {
        AnnotationKind::Component => "@Component".to_string(),
        _ => {
            let stripped = text.trim_start_matches('/').trim();
            if stripped.starts_with('@') {
                stripped.to_string()
            } else {
                format!("@{stripped}")
            }
        }
    };

    let mut out = format!("{indent}/*{inner}*/");
    if !rest.is_empty() {
        if rest.starts_with("//") {
            out.push(' ');
        } else {
            out.push_str(" // ");
        }
        out.push_str(rest);
    }
    Some(out)
}

/// Rewrite every active marker in `file`. Returns the new text and how many lines changed.
pub fn rewrite_markers(file: &SourceFile) -> (SourceFile, usize) {
    let mut rewritten = file.clone();
    let mut count = 0;
    for line in rewritten.lines.iter_mut() {
        if let Some(processed) = processed_form(line) {
            *line = processed;
            count += 1;
        }
    }
    (rewritten, count)
}

/// Replace `path` with `text` atomically. An existing file keeps its permissions.
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let write_err = |source: io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_keeps_indent() {
        assert_eq!(processed_form("//@Component").as_deref(), Some("/*@Component*/"));
        assert_eq!(processed_form("  //@Component").as_deref(), Some("  /*@Component*/"));
    }

    #[test]
    fn rest_controller_and_mappings() {
        assert_eq!(
            processed_form("/// @RestController").as_deref(),
            Some("/*@RestController*/")
        );
        assert_eq!(
            processed_form(r#"    ///@GetMapping("/list")"#).as_deref(),
            Some(r#"    /*@GetMapping("/list")*/"#)
        );
        assert_eq!(
            processed_form("///@PostMapping('/x')").as_deref(),
            Some("/*@PostMapping('/x')*/")
        );
        assert_eq!(
            processed_form(r#"GetMapping("/old")"#).as_deref(),
            Some(r#"/*@GetMapping("/old")*/"#)
        );
    }

    #[test]
    fn trailing_text_stays_commented() {
        let out = processed_form(r#"///@GetMapping("/a") list all"#).unwrap();
        assert_eq!(out, r#"/*@GetMapping("/a")*/ // list all"#);
        assert!(matches!(classify(&out), LineClass::Processed(_)));
    }

    #[test]
    fn scope_and_processed_lines_untouched() {
        assert_eq!(processed_form("SCOPE(SINGLETON)"), None);
        assert_eq!(processed_form("/*@Component*/"), None);
        assert_eq!(processed_form("// plain"), None);
        assert_eq!(processed_form("int x;"), None);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let text = "//@Component\nSCOPE(SINGLETON)\n///@RestController\nclass A : public IA {\n    ///@GetMapping(\"/a\")\n    int a();\n};\n";
        let file = SourceFile::from_text("a.h", text);
        let (once, count) = rewrite_markers(&file);
        assert_eq!(count, 3);
        assert!(once.to_text().contains("SCOPE(SINGLETON)"));
        let (twice, again) = rewrite_markers(&once);
        assert_eq!(again, 0);
        assert_eq!(twice.to_text(), once.to_text());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.h");
        fs::write(&path, "old\n").unwrap();
        write_atomic(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.h");
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, "new\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn rewrite_keeps_crlf() {
        let text = "//@Component\r\nclass A : public IA {\r\n};\r\n";
        let (rewritten, count) = rewrite_markers(&SourceFile::from_text("a.h", text));
        assert_eq!(count, 1);
        assert_eq!(rewritten.to_text(), "/*@Component*/\r\nclass A : public IA {\r\n};\r\n");
    }
}
