//! Per-author language attribution by file extension.

use std::collections::BTreeMap;

use repopulse_core::{AuthorLanguages, CommitDetail};

use crate::author::author_key;

/// Language assigned to files whose extension is not recognized.
pub const OTHER_LANGUAGE: &str = "Other";

const EXTENSIONS: &[(&str, &str)] = &[
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("py", "Python"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("java", "Java"),
    ("cs", "C#"),
    ("php", "PHP"),
    ("rs", "Rust"),
    ("kt", "Kotlin"),
    ("swift", "Swift"),
    ("cpp", "C++"),
    ("c", "C"),
    ("m", "Objective-C"),
    ("mm", "Objective-C++"),
    ("scala", "Scala"),
    ("dart", "Dart"),
];

/// Language for `path`, judged by the extension of its file name.
///
/// The extension is the text after the last `.` of the final path segment,
/// compared case-insensitively. Files without one map to [`OTHER_LANGUAGE`].
///
/// # Examples
///
/// ```
/// use repopulse_metrics::language_for_path;
///
/// assert_eq!(language_for_path("web/App.TSX"), "TypeScript");
/// assert_eq!(language_for_path("crates/core/src/lib.rs"), "Rust");
/// assert_eq!(language_for_path("Makefile"), "Other");
/// ```
pub fn language_for_path(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, extension)) = name.rsplit_once('.') else {
        return OTHER_LANGUAGE;
    };
    let extension = extension.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, language)| *language)
        .unwrap_or(OTHER_LANGUAGE)
}

/// Change weight per language for every author, sorted by author key.
///
/// Each author of an analyzed commit gets an entry even when none of their
/// commits carry file data.
pub fn per_author_language(details: &[CommitDetail]) -> Vec<AuthorLanguages> {
    let mut ledger: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for detail in details {
        let languages = ledger.entry(author_key(detail).to_string()).or_default();
        for file in &detail.files {
            *languages
                .entry(language_for_path(&file.filename).to_string())
                .or_default() += file.change_weight();
        }
    }

    ledger
        .into_iter()
        .map(|(author, languages)| AuthorLanguages { author, languages })
        .collect()
}
