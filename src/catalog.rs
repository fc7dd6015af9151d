//! # Catalog Module
//!
//! The catalog is the index of documents the bot offers: sections, each holding
//! entries (one file) and groups (one level of entries). It is read from a JSON
//! document, or built by scanning the assets directory when that document is
//! missing or broken, then curated and put in a fixed section order.
//!
//! A loaded [`Catalog`] is immutable. Reloads build a new one and swap it into
//! the [`CatalogStore`], so readers always see a complete snapshot.

use log::{debug, error, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::catalog_errors::CatalogError;
use crate::resolver::{normalize_stem, walk_files, RelaxedResolver};

/// Sections listed first, in this order; any others follow in document order
pub const SECTION_ORDER: [&str; 7] = [
    "prog",
    "design",
    "security",
    "languages",
    "marketing",
    "maintenance",
    "office",
];

/// File extensions picked up when scanning the assets directory
pub const DOCUMENT_EXTENSIONS: [&str; 2] = ["pdf", "zip"];

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One downloadable document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Path as written in the catalog, relative to the base directory
    #[serde(default, rename = "path", deserialize_with = "null_as_empty")]
    pub declared_path: String,
}

impl CatalogEntry {
    pub fn new(title: impl Into<String>, declared_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            declared_path: declared_path.into(),
        }
    }
}

/// A titled series of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogGroup {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    pub children: Vec<CatalogEntry>,
}

/// Anything with `children` is a group, everything else an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CatalogItem {
    Group(CatalogGroup),
    Entry(CatalogEntry),
}

// A `children` key commits the item to being a group, so a broken series is
// rejected instead of degrading into a pathless entry
impl<'de> Deserialize<'de> for CatalogItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let item = if value.get("children").is_some() {
            serde_json::from_value(value).map(CatalogItem::Group)
        } else {
            serde_json::from_value(value).map(CatalogItem::Entry)
        };
        item.map_err(serde::de::Error::custom)
    }
}

impl CatalogItem {
    pub fn title(&self) -> &str {
        match self {
            CatalogItem::Group(group) => &group.title,
            CatalogItem::Entry(entry) => &entry.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSection {
    pub key: String,
    pub items: Vec<CatalogItem>,
}

/// Immutable snapshot of all sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    sections: Vec<CatalogSection>,
}

impl Catalog {
    /// Build a catalog, placing sections in canonical order
    pub fn new(sections: Vec<CatalogSection>) -> Self {
        Self {
            sections: canonical_order(sections),
        }
    }

    /// Parse a catalog document.
    ///
    /// The top level must be a JSON object. A section whose value is not an
    /// array becomes empty, and items that do not deserialize are skipped.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = value else {
            return Err(CatalogError::Parse(
                "top level must be an object of sections".to_string(),
            ));
        };

        let mut sections = Vec::with_capacity(map.len());
        for (key, value) in map {
            let items = match value {
                serde_json::Value::Array(values) => values
                    .into_iter()
                    .enumerate()
                    .filter_map(|(idx, item)| match serde_json::from_value::<CatalogItem>(item) {
                        Ok(item) => Some(item),
                        Err(e) => {
                            warn!("Skipping malformed item {idx} in section '{key}': {e}");
                            None
                        }
                    })
                    .collect(),
                _ => {
                    warn!("Section '{key}' is not a list, treating it as empty");
                    Vec::new()
                }
            };
            sections.push(CatalogSection { key, items });
        }

        Ok(Self::new(sections))
    }

    pub fn sections(&self) -> &[CatalogSection] {
        &self.sections
    }

    pub fn section(&self, key: &str) -> Option<&CatalogSection> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn item(&self, section: &str, index: usize) -> Option<&CatalogItem> {
        self.section(section)?.items.get(index)
    }

    pub fn group(&self, section: &str, index: usize) -> Option<&CatalogGroup> {
        match self.item(section, index)? {
            CatalogItem::Group(group) => Some(group),
            CatalogItem::Entry(_) => None,
        }
    }

    pub fn entry(&self, section: &str, index: usize) -> Option<&CatalogEntry> {
        match self.item(section, index)? {
            CatalogItem::Entry(entry) => Some(entry),
            CatalogItem::Group(_) => None,
        }
    }

    pub fn child(&self, section: &str, group: usize, child: usize) -> Option<&CatalogEntry> {
        self.group(section, group)?.children.get(child)
    }

    /// Number of top-level items per section, in menu order
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.sections
            .iter()
            .map(|section| (section.key.as_str(), section.items.len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn into_sections(self) -> Vec<CatalogSection> {
        self.sections
    }
}

fn canonical_order(mut sections: Vec<CatalogSection>) -> Vec<CatalogSection> {
    let mut ordered = Vec::with_capacity(sections.len());
    for key in SECTION_ORDER {
        if let Some(pos) = sections.iter().position(|section| section.key == key) {
            ordered.push(sections.remove(pos));
        }
    }
    ordered.extend(sections);
    ordered
}

/// An item that must be present in a section when its file exists on disk
#[derive(Debug, Clone)]
pub struct PinnedItem {
    pub section: String,
    pub title: String,
    /// Other titles that count as the item already being listed
    pub aliases: Vec<String>,
    /// Paths tried in order; the first that resolves is added
    pub candidates: Vec<String>,
}

/// Entries to drop from a section
#[derive(Debug, Clone)]
pub struct Exclusion {
    pub section: String,
    pub paths: Vec<String>,
    /// Drop entries whose title contains any of these
    pub title_markers: Vec<String>,
    /// Drop entries whose trimmed title equals any of these
    pub exact_titles: Vec<String>,
}

/// Adjustments applied to every loaded catalog
#[derive(Debug, Clone)]
pub struct CurationRules {
    pub pinned: Vec<PinnedItem>,
    pub exclusions: Vec<Exclusion>,
}

impl Default for CurationRules {
    fn default() -> Self {
        Self {
            pinned: vec![PinnedItem {
                section: "office".to_string(),
                title: "شرح الإكسل خطوة بخطوة".to_string(),
                aliases: vec!["excel step by step".to_string()],
                candidates: vec![
                    "assets/office/excel_step_by_step.pdf".to_string(),
                    "assets/office/شرح_الإكسل_خطوة_بخطوة.pdf".to_string(),
                    "assets/office/شرح الإكسل خطوة بخطوة.pdf".to_string(),
                    "assets/office/الشرح الكامل خطوة بخطوة.pdf".to_string(),
                ],
            }],
            exclusions: vec![Exclusion {
                section: "security".to_string(),
                paths: vec!["assets/security/security_language_programming_c.pdf".to_string()],
                title_markers: vec!["لغة C".to_string()],
                exact_titles: vec!["C".to_string()],
            }],
        }
    }
}

impl CurationRules {
    /// No pinned items and no exclusions
    pub fn none() -> Self {
        Self {
            pinned: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    fn apply(&self, sections: &mut Vec<CatalogSection>, resolver: &RelaxedResolver) {
        for pinned in &self.pinned {
            ensure_pinned(sections, pinned, resolver);
        }
        for exclusion in &self.exclusions {
            if let Some(section) = sections.iter_mut().find(|s| s.key == exclusion.section) {
                let before = section.items.len();
                section.items.retain(|item| !exclusion.matches(item));
                let dropped = before - section.items.len();
                if dropped > 0 {
                    info!("Excluded {dropped} item(s) from section '{}'", section.key);
                }
            }
        }
    }
}

impl Exclusion {
    fn matches(&self, item: &CatalogItem) -> bool {
        let CatalogItem::Entry(entry) = item else {
            return false;
        };
        let path = entry.declared_path.trim().replace('\\', "/");
        let title = entry.title.trim();
        self.paths.iter().any(|p| *p == path)
            || self.title_markers.iter().any(|m| title.contains(m.as_str()))
            || self.exact_titles.iter().any(|t| t == title)
    }
}

fn ensure_pinned(sections: &mut Vec<CatalogSection>, pinned: &PinnedItem, resolver: &RelaxedResolver) {
    let title_keys: Vec<String> = std::iter::once(&pinned.title)
        .chain(&pinned.aliases)
        .map(|t| normalize_stem(t))
        .collect();
    let path_keys: Vec<String> = pinned.candidates.iter().map(|c| normalize_stem(c)).collect();

    let already_listed = sections
        .iter()
        .filter(|section| section.key == pinned.section)
        .flat_map(|section| &section.items)
        .any(|item| {
            title_keys.contains(&normalize_stem(item.title()))
                || matches!(item, CatalogItem::Entry(entry)
                    if path_keys.contains(&normalize_stem(&entry.declared_path)))
        });
    if already_listed {
        return;
    }

    let Some(found) = pinned
        .candidates
        .iter()
        .find_map(|candidate| resolver.resolve(candidate, None, None))
    else {
        debug!("Pinned item '{}' has no file on disk", pinned.title);
        return;
    };

    let entry = CatalogEntry::new(pinned.title.clone(), relative_to(&found, resolver.base_dir()));
    info!("Adding pinned item '{}' to section '{}'", pinned.title, pinned.section);
    match sections.iter_mut().find(|section| section.key == pinned.section) {
        Some(section) => section.items.push(CatalogItem::Entry(entry)),
        None => sections.push(CatalogSection {
            key: pinned.section.clone(),
            items: vec![CatalogItem::Entry(entry)],
        }),
    }
}

/// `path` relative to `base` with `/` separators, or the full path if it lies elsewhere
fn relative_to(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Reads, scans and curates catalogs for one assets tree
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    resolver: RelaxedResolver,
    assets_dir: PathBuf,
    catalog_file: PathBuf,
    rules: CurationRules,
}

impl CatalogLoader {
    pub fn new(
        resolver: RelaxedResolver,
        assets_dir: impl Into<PathBuf>,
        catalog_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            assets_dir: assets_dir.into(),
            catalog_file: catalog_file.into(),
            rules: CurationRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: CurationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn resolver(&self) -> &RelaxedResolver {
        &self.resolver
    }

    /// Directory holding the files of one section
    pub fn section_root(&self, section: &str) -> PathBuf {
        self.assets_dir.join(section)
    }

    /// Read and parse the catalog document without any fallback
    pub fn read_catalog_file(&self) -> Result<Catalog, CatalogError> {
        if !self.catalog_file.exists() {
            return Err(CatalogError::NotFound(self.catalog_file.display().to_string()));
        }
        let json = fs::read_to_string(&self.catalog_file)
            .map_err(|e| CatalogError::Read(format!("{}: {e}", self.catalog_file.display())))?;
        Catalog::from_json_str(&json)
    }

    /// Build a catalog from the directory layout: one section per sub-directory
    /// of the assets directory, one entry per document found beneath it.
    pub fn scan_assets(&self) -> Catalog {
        let mut section_dirs: Vec<PathBuf> = match fs::read_dir(&self.assets_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect(),
            Err(e) => {
                error!("Cannot scan assets directory {}: {e}", self.assets_dir.display());
                return Catalog::default();
            }
        };
        section_dirs.sort();

        let base = self.resolver.base_dir();
        let mut sections = Vec::new();
        for dir in section_dirs {
            let Some(key) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let mut files = Vec::new();
            walk_files(&dir, &mut files);
            files.retain(|path| is_document(path));
            files.sort();

            let items: Vec<CatalogItem> = files
                .iter()
                .map(|file| {
                    let title = file
                        .file_stem()
                        .map(|stem| stem.to_string_lossy().replace('_', " "))
                        .unwrap_or_default();
                    let absolute = fs::canonicalize(file).unwrap_or_else(|_| file.clone());
                    CatalogItem::Entry(CatalogEntry::new(title, relative_to(&absolute, base)))
                })
                .collect();

            if !items.is_empty() {
                sections.push(CatalogSection { key, items });
            }
        }

        Catalog::new(sections)
    }

    /// Load the catalog document, falling back to a directory scan, then curate.
    ///
    /// Never fails: a missing or broken document is logged and replaced by the
    /// scan result, which may itself be empty.
    pub fn load(&self) -> Catalog {
        let catalog = match self.read_catalog_file() {
            Ok(catalog) => catalog,
            Err(CatalogError::NotFound(path)) => {
                info!("No catalog file at {path}, scanning assets");
                self.scan_assets()
            }
            Err(e) => {
                error!("{e}; falling back to an assets scan");
                self.scan_assets()
            }
        };

        let mut sections = catalog.into_sections();
        self.rules.apply(&mut sections, &self.resolver);
        let catalog = Catalog::new(sections);

        let counts = catalog
            .counts()
            .iter()
            .map(|(key, count)| format!("{key}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        info!("Catalog loaded: {counts}");
        catalog
    }
}

/// Shared handle to the current catalog snapshot.
///
/// Readers take an `Arc` and drop the lock immediately; a reload swaps the
/// whole catalog in one write.
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Install a new catalog and return the previous one
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "office": [
            {"title": "Word", "path": "assets/office/word.pdf"}
        ],
        "extra": [],
        "prog": [
            {"title": "Rust", "path": "assets/prog/rust.pdf"},
            {"title": "Python series", "children": [
                {"title": "Part 1", "path": "assets/prog/py1.pdf"},
                {"title": "Part 2", "path": "assets/prog/py2.pdf"}
            ]}
        ]
    }"#;

    #[test]
    fn test_parse_entries_and_groups() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();

        assert_eq!(
            catalog.entry("prog", 0),
            Some(&CatalogEntry::new("Rust", "assets/prog/rust.pdf"))
        );
        let group = catalog.group("prog", 1).unwrap();
        assert_eq!(group.title, "Python series");
        assert_eq!(group.children.len(), 2);
        assert_eq!(catalog.child("prog", 1, 1).unwrap().declared_path, "assets/prog/py2.pdf");
        assert!(catalog.child("prog", 0, 0).is_none());
        assert!(catalog.item("prog", 5).is_none());
    }

    #[test]
    fn test_group_with_bad_child_is_skipped() {
        let catalog = Catalog::from_json_str(
            r#"{"prog": [
                {"title": "Broken series", "children": [{"title": "ok", "path": "a.pdf"}, {"title": 1}]},
                {"title": "No list", "children": null},
                {"title": "Rust", "path": "assets/prog/rust.pdf"}
            ]}"#,
        )
        .unwrap();

        let items = &catalog.section("prog").unwrap().items;
        assert_eq!(items.len(), 1);
        assert_eq!(catalog.entry("prog", 0).unwrap().title, "Rust");
    }

    #[test]
    fn test_canonical_section_order() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        let keys: Vec<&str> = catalog.sections().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["prog", "office", "extra"]);
    }

    #[test]
    fn test_non_list_section_becomes_empty() {
        let catalog = Catalog::from_json_str(r#"{"prog": {"oops": true}}"#).unwrap();
        assert_eq!(catalog.counts(), vec![("prog", 0)]);
    }

    #[test]
    fn test_missing_and_null_fields_default_to_empty() {
        let catalog =
            Catalog::from_json_str(r#"{"prog": [{"title": "No path"}, {"title": null, "path": null}]}"#)
                .unwrap();
        assert_eq!(catalog.entry("prog", 0).unwrap().declared_path, "");
        assert_eq!(catalog.entry("prog", 1), Some(&CatalogEntry::new("", "")));
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert!(matches!(
            Catalog::from_json_str("[1, 2]"),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(
            Catalog::from_json_str("{not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_exclusion_matches_entries_only() {
        let rules = CurationRules::default();
        let exclusion = &rules.exclusions[0];

        let by_path = CatalogItem::Entry(CatalogEntry::new(
            "Anything",
            "assets\\security\\security_language_programming_c.pdf",
        ));
        let by_marker = CatalogItem::Entry(CatalogEntry::new("البرمجة بلغة C", "x.pdf"));
        let by_exact = CatalogItem::Entry(CatalogEntry::new(" C ", "c.pdf"));
        let kept = CatalogItem::Entry(CatalogEntry::new("C# basics", "csharp.pdf"));
        let group = CatalogItem::Group(CatalogGroup {
            title: "البرمجة بلغة C".to_string(),
            children: Vec::new(),
        });

        assert!(exclusion.matches(&by_path));
        assert!(exclusion.matches(&by_marker));
        assert!(exclusion.matches(&by_exact));
        assert!(!exclusion.matches(&kept));
        assert!(!exclusion.matches(&group));
    }

    #[test]
    fn test_relative_to_uses_forward_slashes() {
        let base = Path::new("/srv/bot");
        assert_eq!(
            relative_to(Path::new("/srv/bot/assets/prog/a.pdf"), base),
            "assets/prog/a.pdf"
        );
    }

    #[test]
    fn test_is_document() {
        assert!(is_document(Path::new("a/b.PDF")));
        assert!(is_document(Path::new("a/b.zip")));
        assert!(!is_document(Path::new("a/b.txt")));
        assert!(!is_document(Path::new("a/pdf")));
    }

    #[test]
    fn test_store_snapshot_survives_replace() {
        let store = CatalogStore::new(Catalog::from_json_str(SAMPLE).unwrap());
        let before = store.snapshot();

        let previous = store.replace(Catalog::default());

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.sections().len(), 3);
        assert!(store.snapshot().is_empty());
    }
}
