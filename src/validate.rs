//! Constraint validator: per-marker placement and value rules.
//!
//! Pure function over the scan and its bindings. Findings are recorded as
//! issues; only an insignificant Component makes the file fail validation.

use crate::model::{AnnotationKind, Binding, Issue, IssueKind, ValidationResult};
use crate::scanner::bind::{bindings_of, describe};
use crate::scanner::Scan;

/// Accepted `SCOPE(...)` payloads, case-sensitive.
pub const SCOPE_VALUES: [&str; 2] = ["PROTOTYPE", "SINGLETON"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Require the Component's class to name a base instead of presuming one.
    pub strict_inheritance: bool,
}

pub fn validate(scan: &Scan, bindings: &[Binding], options: ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult {
        has_macro: scan
            .active()
            .any(|a| a.kind == AnnotationKind::Component),
        has_class: !scan.classes.is_empty(),
        has_interface: !scan.interface_names.is_empty(),
        class_names: scan.class_names(),
        interface_names: scan.interface_names.clone(),
        ..Default::default()
    };

    result.classes_with_inheritance = scan
        .classes
        .iter()
        .filter(|c| !scan.is_interface(c))
        .filter(|c| {
            if options.strict_inheritance {
                c.base_interface.is_some()
            } else {
                result.has_interface
            }
        })
        .map(|c| c.name.clone())
        .collect();

    check_components(&mut result, bindings, options);
    check_scopes(&mut result, bindings);
    check_class_bound(&mut result, bindings, AnnotationKind::RestController);
    check_request_mappings(&mut result, bindings);
    check_method_mappings(&mut result, bindings);

    result
}

fn check_components(result: &mut ValidationResult, bindings: &[Binding], options: ValidationOptions) {
    for binding in bindings_of(bindings, AnnotationKind::Component) {
        let line = Some(binding.annotation.line);
        let Some(class) = binding.class() else {
            result.invalid_placements += 1;
            result.issues.push(Issue::error(
                IssueKind::UnboundAnnotation,
                line,
                format!("{} not followed by a class declaration", describe(&binding.annotation)),
            ));
            continue;
        };
        result.valid_placements += 1;

        if !result.has_interface {
            result.issues.push(Issue::error(
                IssueKind::MissingRequirement,
                line,
                format!("Component on {} has no significance: no interface in file", class.name),
            ));
        }
        if options.strict_inheritance && class.base_interface.is_none() {
            result.classes_with_inheritance.retain(|name| *name != class.name);
            result.issues.push(Issue::error(
                IssueKind::MissingRequirement,
                line,
                format!("Component class {} does not inherit from an interface", class.name),
            ));
        }
    }
}

fn check_scopes(result: &mut ValidationResult, bindings: &[Binding]) {
    for binding in bindings_of(bindings, AnnotationKind::Scope) {
        let line = Some(binding.annotation.line);
        let value = binding.annotation.payload.as_deref().unwrap_or_default();
        let value_ok = SCOPE_VALUES.contains(&value);

        if !binding.found() {
            result.issues.push(Issue::error(
                IssueKind::UnboundAnnotation,
                line,
                format!("{} not followed by a class declaration", describe(&binding.annotation)),
            ));
        }
        if !value_ok {
            result.issues.push(Issue::error(
                IssueKind::InvalidValue,
                line,
                format!(
                    "SCOPE has invalid value: {:?} (expected one of {})",
                    value,
                    SCOPE_VALUES.join(", ")
                ),
            ));
        }

        if binding.found() && value_ok {
            result.valid_placements += 1;
        } else {
            result.invalid_placements += 1;
        }
    }
}

fn check_class_bound(result: &mut ValidationResult, bindings: &[Binding], kind: AnnotationKind) {
    for binding in bindings_of(bindings, kind) {
        if binding.found() {
            result.valid_placements += 1;
        } else {
            result.invalid_placements += 1;
            result.issues.push(Issue::error(
                IssueKind::UnboundAnnotation,
                Some(binding.annotation.line),
                format!("{} not followed by a class declaration", describe(&binding.annotation)),
            ));
        }
    }
}

fn check_request_mappings(result: &mut ValidationResult, bindings: &[Binding]) {
    for binding in bindings_of(bindings, AnnotationKind::RequestMapping) {
        if binding.found() {
            result.valid_placements += 1;
        } else {
            result.invalid_placements += 1;
            result.issues.push(Issue::warning(
                IssueKind::UnboundAnnotation,
                Some(binding.annotation.line),
                format!(
                    "{} does not precede a class; base path defaults to \"/\"",
                    describe(&binding.annotation)
                ),
            ));
        }
    }
}

fn check_method_mappings(result: &mut ValidationResult, bindings: &[Binding]) {
    for binding in bindings.iter().filter(|b| b.annotation.kind.is_method_mapping()) {
        if binding.found() {
            result.valid_placements += 1;
        } else {
            result.invalid_placements += 1;
            result.issues.push(Issue::warning(
                IssueKind::UnboundAnnotation,
                Some(binding.annotation.line),
                format!(
                    "{} not followed by a function signature; route dropped",
                    describe(&binding.annotation)
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, SourceFile};
    use crate::scanner::{bind::bind, scan};

    fn run(text: &str, options: ValidationOptions) -> ValidationResult {
        let file = SourceFile::from_text("t.h", text);
        let scanned = scan(&file);
        let bindings = bind(&file, &scanned);
        validate(&scanned, &bindings, options)
    }

    fn check(text: &str) -> ValidationResult {
        run(text, ValidationOptions::default())
    }

    #[test]
    fn component_with_interface_is_significant() {
        let result = check("//@Component\nclass Repo : public IRepo {\n};\n");
        assert!(result.has_macro);
        assert!(result.has_class);
        assert!(result.has_interface);
        assert_eq!(result.classes_with_inheritance, vec!["Repo".to_string()]);
        assert!(result.all_requirements_met());
        assert_eq!(result.valid_placements, 1);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn component_without_interface_is_not_significant() {
        let result = check("//@Component\nclass Plain {\n};\n");
        assert!(result.has_macro);
        assert!(result.has_class);
        assert!(!result.has_interface);
        assert!(!result.all_requirements_met());
        assert!(result
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::MissingRequirement));
    }

    #[test]
    fn scope_values() {
        for ok in ["SINGLETON", "PROTOTYPE"] {
            let text = format!("//@Component\nSCOPE({ok})\nclass A : public IA {{\n}};\n");
            let result = check(&text);
            assert!(
                !result.issues.iter().any(|i| i.kind == IssueKind::InvalidValue),
                "{ok} should validate"
            );
        }
        for bad in ["Prototype", "FOO", ""] {
            let text = format!("//@Component\nSCOPE({bad})\nclass A : public IA {{\n}};\n");
            let result = check(&text);
            assert!(
                result.issues.iter().any(|i| i.kind == IssueKind::InvalidValue),
                "{bad:?} should be invalid"
            );
            assert_eq!(result.invalid_placements, 1);
            // The Component itself is still fine
            assert!(result.all_requirements_met());
        }
    }

    #[test]
    fn unbound_rest_controller_is_invalid() {
        let result = check("///@RestController\nint x;\nclass A : public IA {\n};\n");
        assert_eq!(result.invalid_placements, 1);
        assert_eq!(result.issues[0].severity, Severity::Error);
        assert_eq!(result.issues[0].kind, IssueKind::UnboundAnnotation);
    }

    #[test]
    fn unbound_method_mapping_is_a_warning() {
        let result = check("class A : public IA {\n    ///@GetMapping(\"/x\")\n    int y = 0;\n};\n");
        assert_eq!(result.invalid_placements, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn strict_inheritance_checks_the_bound_class() {
        let text = "class IRepo {\n  virtual void save() = 0;\n};\n//@Component\nclass Repo {\n};\n";
        assert!(check(text).all_requirements_met());
        let strict = run(text, ValidationOptions { strict_inheritance: true });
        assert!(!strict.all_requirements_met());
    }

    #[test]
    fn interface_only_file_is_not_significant() {
        let result = check("//@Component\nclass IRepo {\n  virtual void save() = 0;\n};\n");
        assert!(result.has_interface);
        assert!(result.classes_with_inheritance.is_empty());
        assert!(!result.all_requirements_met());
    }
}
