//! # Relaxed File Resolver
//!
//! Maps a path declared in the catalog to a file that actually exists on disk.
//! Catalog entries are edited by hand and drift from the filesystem: casing
//! changes, Arabic and English names get swapped, separators vary and
//! extensions go missing. The resolver tries a fixed sequence of increasingly
//! loose strategies and commits to the first candidate found.
//!
//! ## Strategies (first success wins)
//!
//! 1. Exact path relative to the base directory
//! 2. Case-insensitive file name in the same directory
//! 3. Normalized stem equality in the parent directory, then the section root
//! 4. Normalized stem containment (either direction) over the same directories
//! 5. Steps 3 and 4 again using the entry title
//! 6. Recursive normalized-stem search under the section root
//!
//! Ties go to the first candidate in directory iteration order.
//! Filesystem errors never escape: an unreadable directory contributes no
//! candidates.

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Reduce a name to lower-cased Unicode letters and digits.
///
/// Spaces, dashes, underscores, punctuation and combining marks are dropped,
/// so `"Excel - Step_by Step"` and `"excelstepbystep"` compare equal, and
/// Arabic letters survive intact.
///
/// # Examples
///
/// ```rust
/// use courses_bot::resolver::normalize_stem;
///
/// assert_eq!(normalize_stem("Excel_Step-by Step"), "excelstepbystep");
/// assert_eq!(normalize_stem("شرح الإكسل"), "شرحالإكسل");
/// ```
pub fn normalize_stem(name: &str) -> String {
    NOT_LETTER_OR_DIGIT.replace_all(name, "").to_lowercase()
}

// Letters and numbers by general category; `char::is_alphanumeric` keeps
// Arabic harakat, which are nonspacing marks
lazy_static! {
    static ref NOT_LETTER_OR_DIGIT: Regex =
        Regex::new(r"[^\p{L}\p{N}]+").expect("Normalization pattern should be valid");
}

/// Which strategy produced a match, mostly useful for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    CaseInsensitive,
    NormalizedStem,
    Substring,
    TitleNormalized,
    TitleSubstring,
    Recursive,
}

/// A file located by the resolver together with the strategy that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub strategy: MatchStrategy,
}

/// Resolver rooted at the directory catalog paths are relative to
#[derive(Debug, Clone)]
pub struct RelaxedResolver {
    base_dir: PathBuf,
}

impl RelaxedResolver {
    /// Create a resolver for paths relative to `base_dir`.
    ///
    /// The base is made absolute so every returned path is absolute too.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let base_dir = fs::canonicalize(&base_dir).unwrap_or_else(|_| {
            if base_dir.is_absolute() {
                base_dir.clone()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(&base_dir))
                    .unwrap_or(base_dir.clone())
            }
        });
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a declared path to an existing file, or `None`.
    ///
    /// # Arguments
    ///
    /// * `declared_path` - Path as written in the catalog, `/` or `\` separated
    /// * `title` - Display title, tried when the path stem finds nothing
    /// * `section_root` - Fallback directory for this entry's section
    pub fn resolve(
        &self,
        declared_path: &str,
        title: Option<&str>,
        section_root: Option<&Path>,
    ) -> Option<PathBuf> {
        self.resolve_detailed(declared_path, title, section_root)
            .map(|found| found.path)
    }

    /// Same as [`resolve`](Self::resolve) but reports the winning strategy
    pub fn resolve_detailed(
        &self,
        declared_path: &str,
        title: Option<&str>,
        section_root: Option<&Path>,
    ) -> Option<ResolvedFile> {
        let relative = sanitize_declared_path(declared_path)?;
        let target = self.base_dir.join(&relative);

        // 1. exact
        if target.is_file() {
            return Some(found(target, MatchStrategy::Exact));
        }

        let file_name = relative.file_name()?.to_string_lossy().into_owned();
        let parent = target.parent().map(Path::to_path_buf);

        // 2. case-insensitive name in the same directory
        if let Some(parent) = parent.as_deref() {
            let wanted = file_name.to_lowercase();
            let hit = list_files(parent).into_iter().find(|candidate| {
                candidate
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().to_lowercase() == wanted)
            });
            if let Some(hit) = hit {
                return Some(found(hit, MatchStrategy::CaseInsensitive));
            }
        }

        let section_root = section_root.map(|root| self.absolutize(root));
        let search_dirs = fallback_dirs(parent.as_deref(), section_root.as_deref());
        let stem_key = normalize_stem(&stem_of(&file_name));

        // 3 + 4. normalized stem from the declared path
        if let Some(hit) = match_normalized(&search_dirs, &stem_key) {
            return Some(found(hit, MatchStrategy::NormalizedStem));
        }
        if let Some(hit) = match_substring(&search_dirs, &stem_key) {
            return Some(found(hit, MatchStrategy::Substring));
        }

        // 5. same again with the title
        let title_key = title.map(normalize_stem).unwrap_or_default();
        if let Some(hit) = match_normalized(&search_dirs, &title_key) {
            return Some(found(hit, MatchStrategy::TitleNormalized));
        }
        if let Some(hit) = match_substring(&search_dirs, &title_key) {
            return Some(found(hit, MatchStrategy::TitleSubstring));
        }

        // 6. anywhere below the section root
        if let Some(root) = section_root.as_deref() {
            let mut all_files = Vec::new();
            walk_files(root, &mut all_files);
            for key in [&stem_key, &title_key] {
                if key.is_empty() {
                    continue;
                }
                if let Some(hit) = all_files.iter().find(|f| candidate_key(f) == *key) {
                    return Some(found(hit.clone(), MatchStrategy::Recursive));
                }
            }
        }

        debug!("No file matched declared path '{declared_path}'");
        None
    }

    fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

fn found(path: PathBuf, strategy: MatchStrategy) -> ResolvedFile {
    trace!("Resolved {} via {strategy:?}", path.display());
    ResolvedFile { path, strategy }
}

/// Turn a catalog path into a clean relative path.
///
/// Returns `None` for empty paths and paths that climb out with `..`.
fn sanitize_declared_path(declared_path: &str) -> Option<PathBuf> {
    let unified = declared_path.trim().replace('\\', "/");
    let mut relative = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

fn stem_of(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

fn candidate_key(path: &Path) -> String {
    path.file_stem()
        .map(|stem| normalize_stem(&stem.to_string_lossy()))
        .unwrap_or_default()
}

/// Parent first, section root second (skipped when it is the same directory)
fn fallback_dirs(parent: Option<&Path>, section_root: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = parent.into_iter().map(Path::to_path_buf).collect();
    if let Some(root) = section_root {
        if !dirs.iter().any(|dir| dir == root) {
            dirs.push(root.to_path_buf());
        }
    }
    dirs
}

fn match_normalized(dirs: &[PathBuf], key: &str) -> Option<PathBuf> {
    if key.is_empty() {
        return None;
    }
    dirs.iter()
        .find_map(|dir| list_files(dir).into_iter().find(|f| candidate_key(f) == key))
}

fn match_substring(dirs: &[PathBuf], key: &str) -> Option<PathBuf> {
    if key.is_empty() {
        return None;
    }
    dirs.iter().find_map(|dir| {
        list_files(dir).into_iter().find(|f| {
            let candidate = candidate_key(f);
            !candidate.is_empty() && (candidate.contains(key) || key.contains(&candidate))
        })
    })
}

/// Regular files directly inside `dir`, in iteration order.
fn list_files(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            trace!("Skipping unreadable directory {}: {e}", dir.display());
            Vec::new()
        }
    }
}

/// Every regular file below `dir`, depth first, in iteration order.
pub(crate) fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            trace!("Skipping unreadable directory {}: {e}", dir.display());
            return;
        }
    };
    for entry in entries.filter_map(|entry| entry.ok()) {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            walk_files(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}
