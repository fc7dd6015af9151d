//! # Resolver Tests
//!
//! Filesystem-backed tests for the relaxed file resolver: every lookup
//! strategy, the fallback directories, and the not-found path.

use courses_bot::resolver::{normalize_stem, MatchStrategy, RelaxedResolver};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    /// Scratch tree with a canonical base so returned paths compare equal
    struct Library {
        _dir: TempDir,
        base: PathBuf,
    }

    impl Library {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let base = fs::canonicalize(dir.path()).unwrap();
            Self { _dir: dir, base }
        }

        fn add(&self, relative: &str) -> PathBuf {
            let path = self.base.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"%PDF-1.4").unwrap();
            path
        }

        fn resolver(&self) -> RelaxedResolver {
            RelaxedResolver::new(&self.base)
        }

        fn section(&self, key: &str) -> PathBuf {
            self.base.join("assets").join(key)
        }
    }

    #[test]
    fn test_exact_relative_path_returns_file_unchanged() {
        let lib = Library::new();
        let files = [
            lib.add("assets/prog/rust.pdf"),
            lib.add("assets/prog/Clean Code.pdf"),
            lib.add("assets/office/شرح_الوورد.pdf"),
            lib.add("assets/design/archive.zip"),
        ];
        let resolver = lib.resolver();

        for file in &files {
            let relative = file.strip_prefix(&lib.base).unwrap().to_str().unwrap();
            let hit = resolver.resolve_detailed(relative, None, None).unwrap();
            assert_eq!(&hit.path, file);
            assert_eq!(hit.strategy, MatchStrategy::Exact);
        }
    }

    #[test]
    fn test_backslash_paths_are_accepted() {
        let lib = Library::new();
        let file = lib.add("assets/prog/rust.pdf");

        let hit = lib.resolver().resolve("assets\\prog\\rust.pdf", None, None);
        assert_eq!(hit, Some(file));
    }

    #[test]
    fn test_case_flipped_names_resolve() {
        let lib = Library::new();
        let file = lib.add("assets/prog/Clean Code.pdf");
        let resolver = lib.resolver();

        for declared in [
            "assets/prog/clean code.pdf",
            "assets/prog/CLEAN CODE.PDF",
            "assets/prog/cLeAn cOdE.Pdf",
        ] {
            let hit = resolver.resolve_detailed(declared, None, None).unwrap();
            assert_eq!(hit.path, file, "{declared}");
            assert_eq!(hit.strategy, MatchStrategy::CaseInsensitive, "{declared}");
        }
    }

    #[test]
    fn test_separator_substitutions_resolve() {
        let lib = Library::new();
        let file = lib.add("assets/design/color theory-basics_v2.pdf");
        let resolver = lib.resolver();

        for separator in [" ", "-", "_", ""] {
            let stem = ["color", "theory", "basics", "v2"].join(separator);
            let declared = format!("assets/design/{stem}.pdf");
            assert_eq!(resolver.resolve(&declared, None, None), Some(file.clone()), "{declared}");
        }
    }

    #[test]
    fn test_substring_match_when_no_exact_normalized_candidate() {
        let lib = Library::new();
        let file = lib.add("assets/office/excel_formulas_reference.pdf");
        lib.add("assets/office/word_basics.pdf");
        let resolver = lib.resolver();

        let shorter = resolver
            .resolve_detailed("assets/office/formulas.pdf", None, None)
            .unwrap();
        assert_eq!(shorter.path, file);
        assert_eq!(shorter.strategy, MatchStrategy::Substring);

        let longer = resolver
            .resolve_detailed("assets/office/Excel Formulas Reference (3rd edition).pdf", None, None)
            .unwrap();
        assert_eq!(longer.path, file);
        assert_eq!(longer.strategy, MatchStrategy::Substring);
    }

    #[test]
    fn test_exact_normalized_beats_substring() {
        let lib = Library::new();
        let exact = lib.add("assets/office/excel.pdf");
        lib.add("assets/office/excel_advanced.pdf");
        lib.add("assets/office/excel_basics.pdf");

        let hit = lib
            .resolver()
            .resolve_detailed("assets/office/EXCEL", None, None)
            .unwrap();
        assert_eq!(hit.path, exact);
        assert_eq!(hit.strategy, MatchStrategy::NormalizedStem);
    }

    #[test]
    fn test_no_match_without_title_is_not_found() {
        let lib = Library::new();
        lib.add("assets/prog/rust.pdf");
        lib.add("assets/prog/go/concurrency.pdf");
        let root = lib.section("prog");

        let resolver = lib.resolver();
        assert_eq!(resolver.resolve("assets/prog/haskell.pdf", None, Some(&root)), None);
        assert_eq!(resolver.resolve("assets/missing/dir/haskell.pdf", None, Some(&root)), None);
        assert_eq!(resolver.resolve("", None, Some(&root)), None);
        assert_eq!(resolver.resolve("   ", None, None), None);
    }

    #[test]
    fn test_unreadable_section_root_is_not_an_error() {
        let lib = Library::new();
        let missing_root = lib.section("vanished");

        let hit = lib
            .resolver()
            .resolve("assets/vanished/book.pdf", Some("Book"), Some(&missing_root));
        assert_eq!(hit, None);
    }

    #[test]
    fn test_arabic_title_fallback() {
        let lib = Library::new();
        let file = lib.add("assets/office/شرح_الإكسل_خطوة_بخطوة.pdf");
        lib.add("assets/office/word_basics.pdf");

        let hit = lib
            .resolver()
            .resolve_detailed(
                "assets/office/excel_step_by_step.pdf",
                Some("شرح الإكسل خطوة بخطوة"),
                Some(&lib.section("office")),
            )
            .unwrap();
        assert_eq!(hit.path, file);
        assert_eq!(hit.strategy, MatchStrategy::TitleNormalized);
    }

    #[test]
    fn test_title_with_harakat_matches_plain_file_name() {
        let lib = Library::new();
        let file = lib.add("assets/office/شرح_الإكسل.pdf");

        let hit = lib
            .resolver()
            .resolve_detailed(
                "assets/office/excel.pdf",
                Some("شَرْح الإكْسِل"),
                Some(&lib.section("office")),
            )
            .unwrap();
        assert_eq!(hit.path, file);
        assert_eq!(hit.strategy, MatchStrategy::TitleNormalized);
    }

    #[test]
    fn test_partial_title_fallback() {
        let lib = Library::new();
        let file = lib.add("assets/languages/English Grammar in Use - Intermediate.pdf");

        let hit = lib
            .resolver()
            .resolve_detailed(
                "assets/languages/book_17.pdf",
                Some("English Grammar"),
                Some(&lib.section("languages")),
            )
            .unwrap();
        assert_eq!(hit.path, file);
        assert_eq!(hit.strategy, MatchStrategy::TitleSubstring);
    }

    #[test]
    fn test_vanished_directory_falls_back_to_section_root() {
        let lib = Library::new();
        let file = lib.add("assets/security/Network-Security-Essentials.pdf");
        lib.add("assets/security/web_hacking.pdf");

        let hit = lib
            .resolver()
            .resolve_detailed(
                "assets/security/old_books/network_security_essentials.pdf",
                None,
                Some(&lib.section("security")),
            )
            .unwrap();
        assert_eq!(hit.path, file);
        assert_eq!(hit.strategy, MatchStrategy::NormalizedStem);
    }

    #[test]
    fn test_recursive_last_resort() {
        let lib = Library::new();
        let file = lib.add("assets/maintenance/laptops/2022/Laptop Repair Guide.pdf");

        let hit = lib
            .resolver()
            .resolve_detailed(
                "assets/maintenance/laptop_repair_guide.pdf",
                None,
                Some(&lib.section("maintenance")),
            )
            .unwrap();
        assert_eq!(hit.path, file);
        assert_eq!(hit.strategy, MatchStrategy::Recursive);
    }

    #[test]
    fn test_recursive_search_also_uses_title() {
        let lib = Library::new();
        let file = lib.add("assets/marketing/2021/التسويق الرقمي.pdf");

        let hit = lib.resolver().resolve(
            "assets/marketing/digital_marketing.pdf",
            Some("التسويق الرقمي"),
            Some(&lib.section("marketing")),
        );
        assert_eq!(hit, Some(file));
    }

    #[test]
    fn test_duplicate_normalized_names_resolve_to_one_file_consistently() {
        let lib = Library::new();
        let a = lib.add("assets/prog/Report.pdf");
        let b = lib.add("assets/prog/report.PDF");
        let resolver = lib.resolver();

        let first = resolver.resolve("assets/prog/REPORT.pdf", None, None).unwrap();
        assert!(first == a || first == b);
        for _ in 0..5 {
            assert_eq!(resolver.resolve("assets/prog/REPORT.pdf", None, None), Some(first.clone()));
        }

        let by_stem = resolver.resolve("assets/prog/re-port", None, None).unwrap();
        assert!(by_stem == a || by_stem == b);
    }

    #[test]
    fn test_resolved_paths_are_absolute_files() {
        let lib = Library::new();
        lib.add("assets/prog/rust.pdf");
        let root = lib.section("prog");
        let resolver = lib.resolver();

        for declared in ["assets/prog/rust.pdf", "assets/prog/RUST", "assets/x/rust"] {
            let hit = resolver.resolve(declared, None, Some(&root)).unwrap();
            assert!(hit.is_absolute(), "{declared}");
            assert!(hit.is_file(), "{declared}");
        }
    }

    #[test]
    fn test_resolver_never_modifies_the_tree() {
        let lib = Library::new();
        lib.add("assets/prog/rust.pdf");
        let before = list_tree(&lib.base);

        let resolver = lib.resolver();
        let _ = resolver.resolve("assets/prog/nothing.pdf", Some("nothing"), Some(&lib.section("prog")));
        let _ = resolver.resolve("assets/prog/Rust.PDF", None, None);

        assert_eq!(list_tree(&lib.base), before);
    }

    #[test]
    fn test_normalize_stem_is_separator_and_case_insensitive() {
        let forms = ["Excel Step By Step", "excel-step-by-step", "EXCEL_STEP_BY_STEP", "excelstepbystep"];
        for form in forms {
            assert_eq!(normalize_stem(form), "excelstepbystep");
        }
        assert_eq!(normalize_stem("مُحَمَّد"), "محمد");
    }

    fn list_tree(root: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path.clone());
                }
                out.push(path);
            }
        }
        out.sort();
        out
    }
}
