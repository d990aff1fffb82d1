//! Annotation locator: one pass over the file emitting every marker found.

use super::classify::{classify, LineClass};
use crate::model::{Annotation, AnnotationKind, SourceFile};

/// Find all markers (active and processed) in file order.
pub fn locate(file: &SourceFile) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    for (index, line) in file.lines.iter().enumerate() {
        let (marker, processed) = match classify(line) {
            LineClass::Active(marker) => (marker, false),
            LineClass::Processed(marker) => (marker, true),
            _ => continue,
        };
        annotations.push(Annotation {
            kind: marker.kind,
            raw_text: line.trim().to_string(),
            line: index + 1,
            payload: marker.payload,
            processed,
        });
    }
    annotations
}

/// Quick existence check used by `--mode check` and the pipeline short-circuit.
pub fn has_active_component(file: &SourceFile) -> bool {
    file.lines.iter().any(|line| {
        classify(line)
            .active_marker()
            .is_some_and(|m| m.kind == AnnotationKind::Component)
    })
}
