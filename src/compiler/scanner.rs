//! Template scanning and pattern extraction.
//!
//! # Responsibilities
//! - Walk configured template directories recursively
//! - Filter files with include/exclude globs (case-insensitive)
//! - Extract `hx/<pattern>` values from `hx-*` verb attributes
//! - Merge duplicate (pattern, verb) pairs, accumulating locations
//!
//! # Design Decisions
//! - Symlink loops guarded by a visited set of canonicalized directories
//! - Per-file read/parse failures are collected, never abort the scan
//! - File contents are cached for the run so every verb extractor works
//!   off one read
//! - Glob matching runs on paths relative to the scanned root,
//!   normalized to forward slashes

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pattern::{PatternParser, RoutePattern, Verb};

/// A pattern discovered in one or more template files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRoute {
    pub pattern: RoutePattern,
    pub verb: Verb,
    /// Every template file the (pattern, verb) pair appeared in.
    pub source_locations: BTreeSet<PathBuf>,
}

/// A non-fatal problem encountered while scanning one file.
#[derive(Debug, Clone)]
pub struct ScanError {
    pub path: PathBuf,
    pub message: String,
}

/// Aggregate result of one scan run.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub routes: Vec<DiscoveredRoute>,
    pub scanned_files: usize,
    pub errors: Vec<ScanError>,
}

/// Translate a glob into an anchored, case-insensitive regex.
///
/// `**/` matches zero or more directories, `*` anything within one
/// segment, `?` a single non-separator character.
pub fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut translated = String::with_capacity(glob.len() * 2);
    translated.push_str("(?i)^");

    let bytes = glob.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                if bytes.get(i + 2) == Some(&b'/') {
                    translated.push_str("(?:[^/]*/)*");
                    i += 3;
                } else {
                    translated.push_str(".*");
                    i += 2;
                }
            }
            b'*' => {
                translated.push_str("[^/]*");
                i += 1;
            }
            b'?' => {
                translated.push_str("[^/]");
                i += 1;
            }
            _ => {
                let ch = glob[i..].chars().next().unwrap_or('\0');
                translated.push_str(&regex::escape(&ch.to_string()));
                i += ch.len_utf8();
            }
        }
    }

    translated.push('$');
    Regex::new(&translated)
}

/// Walks template trees and extracts candidate dispatch patterns.
pub struct TemplateScanner {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
    extractors: Vec<(Verb, Regex)>,
    parser: PatternParser,
}

impl TemplateScanner {
    /// Build a scanner from glob lists.
    ///
    /// Returns the first invalid glob as an error; the attribute
    /// extraction regexes are fixed and always compile.
    pub fn new(
        include_globs: &[String],
        exclude_globs: &[String],
        parser: PatternParser,
    ) -> Result<Self, regex::Error> {
        let includes = include_globs
            .iter()
            .map(|g| glob_to_regex(g))
            .collect::<Result<Vec<_>, _>>()?;
        let excludes = exclude_globs
            .iter()
            .map(|g| glob_to_regex(g))
            .collect::<Result<Vec<_>, _>>()?;

        let extractors = Verb::ALL
            .iter()
            .map(|verb| {
                let attribute = regex::escape(verb.hx_attribute());
                let pattern =
                    format!(r#"(?i){attribute}\s*=\s*["']hx/([A-Za-z0-9_.@-]+)["']"#);
                Regex::new(&pattern).map(|re| (*verb, re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            includes,
            excludes,
            extractors,
            parser,
        })
    }

    /// Scan every directory, returning merged routes plus collected
    /// per-file errors.
    pub fn scan(&self, directories: &[PathBuf]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let mut merged: BTreeMap<(RoutePattern, Verb), BTreeSet<PathBuf>> = BTreeMap::new();
        // One entry per scan run; repeated extractor passes reuse it.
        let mut contents: BTreeMap<PathBuf, String> = BTreeMap::new();

        for directory in directories {
            let mut visited = HashSet::new();
            self.walk(directory, directory, &mut visited, &mut outcome, &mut merged, &mut contents);
        }

        outcome.routes = merged
            .into_iter()
            .map(|((pattern, verb), source_locations)| DiscoveredRoute {
                pattern,
                verb,
                source_locations,
            })
            .collect();
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        root: &Path,
        dir: &Path,
        visited: &mut HashSet<PathBuf>,
        outcome: &mut ScanOutcome,
        merged: &mut BTreeMap<(RoutePattern, Verb), BTreeSet<PathBuf>>,
        contents: &mut BTreeMap<PathBuf, String>,
    ) {
        // Symlink-loop guard: canonicalize and refuse to revisit.
        match fs::canonicalize(dir) {
            Ok(canonical) => {
                if !visited.insert(canonical) {
                    tracing::debug!(dir = %dir.display(), "skipping already-visited directory");
                    return;
                }
            }
            Err(e) => {
                outcome.errors.push(ScanError {
                    path: dir.to_path_buf(),
                    message: format!("cannot canonicalize directory: {e}"),
                });
                return;
            }
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                outcome.errors.push(ScanError {
                    path: dir.to_path_buf(),
                    message: format!("cannot read directory: {e}"),
                });
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    outcome.errors.push(ScanError {
                        path: dir.to_path_buf(),
                        message: format!("cannot read directory entry: {e}"),
                    });
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() {
                self.walk(root, &path, visited, outcome, merged, contents);
            } else if self.path_selected(root, &path) {
                outcome.scanned_files += 1;
                self.scan_file(&path, outcome, merged, contents);
            }
        }
    }

    fn path_selected(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let normalized = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        self.includes.iter().any(|re| re.is_match(&normalized))
            && !self.excludes.iter().any(|re| re.is_match(&normalized))
    }

    fn scan_file(
        &self,
        path: &Path,
        outcome: &mut ScanOutcome,
        merged: &mut BTreeMap<(RoutePattern, Verb), BTreeSet<PathBuf>>,
        contents: &mut BTreeMap<PathBuf, String>,
    ) {
        if !contents.contains_key(path) {
            match fs::read_to_string(path) {
                Ok(text) => {
                    contents.insert(path.to_path_buf(), text);
                }
                Err(e) => {
                    outcome.errors.push(ScanError {
                        path: path.to_path_buf(),
                        message: format!("cannot read file: {e}"),
                    });
                    return;
                }
            }
        }
        let text = &contents[path];

        for (verb, extractor) in &self.extractors {
            for capture in extractor.captures_iter(text) {
                let raw = &capture[1];
                match self.parser.parse(raw) {
                    Ok(pattern) => {
                        merged
                            .entry((pattern, *verb))
                            .or_default()
                            .insert(path.to_path_buf());
                    }
                    Err(e) => {
                        outcome.errors.push(ScanError {
                            path: path.to_path_buf(),
                            message: format!(
                                "invalid pattern {raw:?} in {} attribute: {} ({})",
                                verb.hx_attribute(),
                                e,
                                e.code(),
                            ),
                        });
                    }
                }
            }
        }
    }
}
