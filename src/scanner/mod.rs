//! Scanner: line classification, marker location and declaration binding.

pub mod bind;
pub mod class;
pub mod classify;
pub mod locate;
pub mod signature;

use crate::model::{Annotation, ClassDeclaration, SourceFile};

/// Everything the scanner extracts from one file before binding.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub annotations: Vec<Annotation>,
    pub classes: Vec<ClassDeclaration>,
    pub interface_names: Vec<String>,
}

impl Scan {
    pub fn active(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|a| a.is_active())
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_interface(&self, class: &ClassDeclaration) -> bool {
        self.interface_names.iter().any(|n| *n == class.name)
    }
}

/// Locate markers and collect class/interface declarations.
pub fn scan(file: &SourceFile) -> Scan {
    let annotations = locate::locate(file);
    let classes = class::find_classes(file);
    let interface_names = class::interface_names(file, &classes);
    Scan {
        annotations,
        classes,
        interface_names,
    }
}
