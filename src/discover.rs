//! Input discovery and the class-header locator.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::SourceFile;
use crate::scanner::class::find_classes;

/// File extensions recognized as C++ sources.
pub const DEFAULT_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx", "cpp", "cc", "cxx"];

/// Directories never descended into.
pub const DEFAULT_EXCLUDE: &[&str] = &[".pio", ".git", ".vscode", ".idea"];

#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub extensions: Vec<String>,
    /// When non-empty, only paths under one of these directories are kept.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        DiscoverOptions {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            include: Vec::new(),
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiscoverOptions {
    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.components()
            .any(|c| self.exclude.iter().any(|e| c.as_os_str() == e.as_str()))
    }

    fn is_included(&self, path: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        self.include.iter().any(|inc| {
            let inc = Path::new(inc.trim_end_matches('/'));
            path.starts_with(inc) || path.components().any(|c| c.as_os_str() == inc.as_os_str())
        })
    }

    fn accepts(&self, path: &Path) -> bool {
        !self.is_excluded(path) && self.is_included(path)
    }
}

/// Expand files, directories and glob patterns into a sorted list of C++ sources.
pub fn expand_inputs(patterns: &[String], options: &DiscoverOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            push_file(&mut files, path, options);
            continue;
        }
        if path.is_dir() {
            walk_dir(&mut files, path, options);
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .map_err(|source| Error::Pattern {
                pattern: pattern.clone(),
                source,
            })?
            .filter_map(|r| r.ok())
            .collect();
        if matches.is_empty() {
            tracing::warn!("no files matched: {}", pattern);
        }
        for found in matches {
            if found.is_dir() {
                walk_dir(&mut files, &found, options);
            } else if found.is_file() {
                push_file(&mut files, &found, options);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn push_file(files: &mut Vec<PathBuf>, path: &Path, options: &DiscoverOptions) {
    if !options.has_extension(path) {
        tracing::warn!("skipping {}: not a C++ source", path.display());
        return;
    }
    if options.accepts(path) {
        files.push(path.to_path_buf());
    } else {
        tracing::debug!("filtered out {}", path.display());
    }
}

fn walk_dir(files: &mut Vec<PathBuf>, dir: &Path, options: &DiscoverOptions) {
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !options
                    .exclude
                    .iter()
                    .any(|e| entry.file_name() == e.as_str())
        });
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file() && options.has_extension(path) && options.is_included(path) {
            files.push(path.to_path_buf());
        }
    }
}

/// Result of looking up the header that declares a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLookup {
    Found(PathBuf),
    Missing,
    Ambiguous(Vec<PathBuf>),
}

/// Header files paired with the first class each declares.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    entries: Vec<(PathBuf, Option<String>)>,
}

impl HeaderIndex {
    /// Read every `.h`/`.hpp` file in `files`. Unreadable headers are left out.
    pub fn build(files: &[PathBuf]) -> Self {
        let entries = files
            .iter()
            .filter(|p| is_header(p))
            .filter_map(|path| match fs::read_to_string(path) {
                Ok(text) => {
                    let file = SourceFile::from_text(path.clone(), &text);
                    let first = find_classes(&file).into_iter().next().map(|c| c.name);
                    Some((path.clone(), first))
                }
                Err(err) => {
                    tracing::debug!("header index skips {}: {}", path.display(), err);
                    None
                }
            })
            .collect();
        HeaderIndex { entries }
    }

    pub fn from_entries(entries: Vec<(PathBuf, Option<String>)>) -> Self {
        HeaderIndex { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exactly one header whose file name ends in `<name>.h`/`.hpp` and whose
    /// first class is `name` (both case-insensitive). Anything else fails closed.
    pub fn find_class_header(&self, name: &str) -> HeaderLookup {
        let wanted = name.to_lowercase();
        let suffixes = [format!("{wanted}.h"), format!("{wanted}.hpp")];

        let mut matches: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(path, _)| {
                path.file_name()
                    .map(|f| f.to_string_lossy().to_lowercase())
                    .is_some_and(|f| suffixes.iter().any(|s| f.ends_with(s.as_str())))
            })
            .filter(|(_, first)| first.as_ref().is_some_and(|c| c.to_lowercase() == wanted))
            .map(|(path, _)| path.clone())
            .collect();

        match matches.len() {
            0 => HeaderLookup::Missing,
            1 => HeaderLookup::Found(matches.remove(0)),
            _ => HeaderLookup::Ambiguous(matches),
        }
    }
}

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("h") || ext.eq_ignore_ascii_case("hpp"))
}
