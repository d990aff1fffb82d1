//! Declaration binder: finite-lookahead search from each marker to its target.
//!
//! Forward markers look below themselves, RequestMapping looks above each
//! class. Only blank lines and other markers may sit in between; anything else
//! ends the search unbound.

use super::class::parse_class_header;
use super::classify::{classify, LineClass};
use super::signature::parse_signature;
use super::Scan;
use crate::model::{
    Annotation, AnnotationKind, Binding, ClassDeclaration, Declaration, SourceFile,
};

/// Lines examined after a class-directed marker.
pub const CLASS_WINDOW: usize = 10;

/// Lines examined after a method-directed marker.
pub const METHOD_WINDOW: usize = 5;

/// Bind every active annotation in `scan` to its declaration.
pub fn bind(file: &SourceFile, scan: &Scan) -> Vec<Binding> {
    let base_paths = bind_request_mappings(file, &scan.classes);

    scan.annotations
        .iter()
        .filter(|a| a.is_active())
        .map(|annotation| {
            let target = match annotation.kind {
                AnnotationKind::RequestMapping => base_paths
                    .iter()
                    .find(|(line, _)| *line == annotation.line)
                    .map(|(_, class)| Declaration::Class(class.clone())),
                kind if kind.targets_class() => {
                    search_forward(file, annotation.line, CLASS_WINDOW, |number, line| {
                        class_at(scan, number, line)
                    })
                }
                _ => search_forward(file, annotation.line, METHOD_WINDOW, |number, line| {
                    parse_signature(line, number).map(Declaration::Function)
                }),
            };
            Binding {
                annotation: annotation.clone(),
                target,
            }
        })
        .collect()
}

/// Scan `window` lines after `marker_line` for the first code line `matcher` accepts.
pub fn search_forward<F>(
    file: &SourceFile,
    marker_line: usize,
    window: usize,
    matcher: F,
) -> Option<Declaration>
where
    F: Fn(usize, &str) -> Option<Declaration>,
{
    for number in (marker_line + 1)..=(marker_line + window) {
        let line = file.line(number)?;
        let class = classify(line);
        if class.is_code() {
            return matcher(number, line);
        }
        if !class.allows_intervening() {
            return None;
        }
    }
    None
}

fn class_at(scan: &Scan, number: usize, line: &str) -> Option<Declaration> {
    parse_class_header(line)?;
    scan.classes
        .iter()
        .find(|c| c.start_line == number)
        .cloned()
        .map(Declaration::Class)
}

/// For each class, look upward for an active RequestMapping.
///
/// Returns `(marker line, class)` pairs.
pub fn bind_request_mappings(
    file: &SourceFile,
    classes: &[ClassDeclaration],
) -> Vec<(usize, ClassDeclaration)> {
    let mut found = Vec::new();
    for class in classes {
        let lowest = class.start_line.saturating_sub(CLASS_WINDOW).max(1);
        for number in (lowest..class.start_line).rev() {
            let Some(line) = file.line(number) else { break };
            let line_class = classify(line);
            if let LineClass::Active(marker) = &line_class {
                if marker.kind == AnnotationKind::RequestMapping {
                    found.push((number, class.clone()));
                    break;
                }
            }
            if !line_class.allows_intervening() {
                break;
            }
        }
    }
    found
}

/// Base path for a class: its bound RequestMapping payload, else `/`.
pub fn base_path_for(bindings: &[Binding], class: &ClassDeclaration) -> String {
    bindings
        .iter()
        .filter(|b| b.annotation.kind == AnnotationKind::RequestMapping)
        .find(|b| b.class().is_some_and(|c| c.start_line == class.start_line))
        .and_then(|b| b.annotation.payload.clone())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "/".to_string())
}

/// Bindings of one kind, for callers that only care about a single marker.
pub fn bindings_of(bindings: &[Binding], kind: AnnotationKind) -> Vec<&Binding> {
    bindings.iter().filter(|b| b.annotation.kind == kind).collect()
}

/// The annotation that produced a binding, for reporting.
pub fn describe(annotation: &Annotation) -> String {
    format!("{} at line {}", annotation.kind, annotation.line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn bound(text: &str) -> Vec<Binding> {
        let file = SourceFile::from_text("t.h", text);
        let scanned = scan(&file);
        bind(&file, &scanned)
    }

    #[test]
    fn component_binds_across_markers() {
        let bindings = bound("//@Component\nSCOPE(SINGLETON)\n\n///@RestController\nclass A : public IA {\n};\n");
        assert_eq!(bindings.len(), 3);
        for b in &bindings {
            assert_eq!(b.class().map(|c| c.name.as_str()), Some("A"), "{:?}", b.annotation);
        }
    }

    #[test]
    fn unrelated_line_breaks_binding() {
        let bindings = bound("//@Component\nint x;\nclass A : public IA {\n};\n");
        assert!(!bindings[0].found());

        let bindings = bound("//@Component\n// a note\nclass A : public IA {\n};\n");
        assert!(!bindings[0].found());
    }

    #[test]
    fn window_boundary() {
        // Nine intervening blank lines: class at offset 10 is inside the window
        let nine = format!("//@Component\n{}class A : public IA {{\n}};\n", "\n".repeat(9));
        assert!(bound(&nine)[0].found());

        // Ten intervening lines: class at offset 11 is out of reach
        let ten = format!("//@Component\n{}class A : public IA {{\n}};\n", "\n".repeat(10));
        assert!(!bound(&ten)[0].found());
    }

    #[test]
    fn method_mapping_binds_signature() {
        let text = "class C : public IC {\n    ///@GetMapping(\"/list\")\n\n    OrderList list();\n};\n";
        let bindings = bound(text);
        let func = bindings[0].function().unwrap();
        assert_eq!(func.name, "list");
        assert_eq!(func.line, 4);
    }

    #[test]
    fn method_window_is_five() {
        let reach = format!(
            "class C {{\n///@GetMapping(\"/a\")\n{}int a();\n}};\n",
            "\n".repeat(4)
        );
        assert!(bound(&reach)[0].found());
        let beyond = format!(
            "class C {{\n///@GetMapping(\"/a\")\n{}int a();\n}};\n",
            "\n".repeat(5)
        );
        assert!(!bound(&beyond)[0].found());
    }

    #[test]
    fn request_mapping_binds_backward() {
        let text = "///@RequestMapping(\"/orders\")\n///@RestController\nclass OrderController : public IOrderController {\n};\n";
        let bindings = bound(text);
        let mapping = &bindings[0];
        assert_eq!(mapping.annotation.kind, AnnotationKind::RequestMapping);
        assert_eq!(mapping.class().map(|c| c.name.as_str()), Some("OrderController"));
        let class = mapping.class().unwrap().clone();
        assert_eq!(base_path_for(&bindings, &class), "/orders");
    }

    #[test]
    fn request_mapping_blocked_by_code() {
        let text = "///@RequestMapping(\"/orders\")\nint stray;\nclass C : public IC {\n};\n";
        let bindings = bound(text);
        assert!(!bindings[0].found());
    }

    #[test]
    fn base_path_defaults_to_root() {
        let text = "class C : public IC {\n};\n";
        let file = SourceFile::from_text("t.h", text);
        let scanned = scan(&file);
        assert_eq!(base_path_for(&[], &scanned.classes[0]), "/");
    }

    #[test]
    fn processed_markers_are_not_bound() {
        let bindings = bound("/*@Component*/\nclass A : public IA {\n};\n");
        assert!(bindings.is_empty());
    }
}
