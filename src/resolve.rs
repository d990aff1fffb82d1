//! Endpoint resolver: class base path + method path → route records.

use crate::discover::{HeaderIndex, HeaderLookup};
use crate::model::{
    Binding, ClassDeclaration, FunctionSignature, Issue, IssueKind, RouteRecord,
};
use crate::scanner::bind::base_path_for;
use crate::scanner::Scan;

/// Routes for one file plus the findings that kept other mappings out.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub routes: Vec<RouteRecord>,
    pub issues: Vec<Issue>,
}

/// Join a base path and a method path with exactly one `/` at the seam.
///
/// An empty method path yields the base alone, without a trailing slash.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let base = if base.is_empty() || base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };

    let path = path.trim();
    if path.is_empty() {
        return if base.is_empty() { "/".to_string() } else { base };
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Build route records for every bound method mapping.
///
/// Unbound mappings are already reported by the validator and are skipped here.
pub fn resolve(scan: &Scan, bindings: &[Binding], headers: Option<&HeaderIndex>) -> Resolution {
    let mut resolution = Resolution::default();

    for binding in bindings.iter().filter(|b| b.annotation.kind.is_method_mapping()) {
        let Some(function) = binding.function() else {
            continue;
        };
        let line = Some(binding.annotation.line);

        let Some(class) = enclosing_class(scan, function) else {
            resolution.issues.push(Issue::warning(
                IssueKind::UnboundAnnotation,
                line,
                format!(
                    "{} on {}() is outside every class; route skipped",
                    binding.annotation.kind, function.name
                ),
            ));
            continue;
        };

        let Some(interface) = class.base_interface.clone() else {
            resolution.issues.push(Issue::warning(
                IssueKind::MissingRequirement,
                line,
                format!(
                    "class {} has no base interface to autowire; route {}() skipped",
                    class.name, function.name
                ),
            ));
            continue;
        };

        let Some(http_method) = binding.annotation.kind.http_method() else {
            continue;
        };
        let base = base_path_for(bindings, class);
        let method_path = binding.annotation.payload.as_deref().unwrap_or_default();

        let interface_header = headers.and_then(|index| match index.find_class_header(&interface) {
            HeaderLookup::Found(path) => Some(path),
            HeaderLookup::Missing => {
                resolution.issues.push(Issue::warning(
                    IssueKind::AmbiguousResolution,
                    line,
                    format!("no header declares interface {interface}"),
                ));
                None
            }
            HeaderLookup::Ambiguous(candidates) => {
                resolution.issues.push(Issue::warning(
                    IssueKind::AmbiguousResolution,
                    line,
                    format!(
                        "{} headers match interface {}; none chosen",
                        candidates.len(),
                        interface
                    ),
                ));
                None
            }
        });

        resolution.routes.push(RouteRecord {
            http_method,
            url: join_url(&base, method_path),
            handler_class: class.name.clone(),
            handler_interface: interface,
            handler_method: function.name.clone(),
            return_type: function.return_type.clone(),
            param_type: function.first_param_type.clone(),
            interface_header,
        });
    }

    resolution
}

/// Innermost class whose body holds the signature line.
fn enclosing_class<'a>(scan: &'a Scan, function: &FunctionSignature) -> Option<&'a ClassDeclaration> {
    scan.classes
        .iter()
        .filter(|c| c.contains(function.line))
        .max_by_key(|c| c.start_line)
}
