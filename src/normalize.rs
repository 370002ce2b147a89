//! Key normalization
//!
//! Input documents may spell keys for humans (`api-key`, `timeout ms`)
//! while record fields use identifier names (`api_key`, `timeout_ms`).
//! Every run of whitespace or hyphens becomes a single underscore.
//!
//! Nothing else changes: case, dots and existing underscores are kept, so
//! `normalize` is idempotent.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Whitespace (Unicode-aware) or hyphen runs
static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s-]+").expect("separator pattern is valid"));

/// Map an input key to its canonical field name
///
/// Borrows the key when it is already canonical.
pub fn normalize(key: &str) -> Cow<'_, str> {
    SEPARATOR_RUN.replace_all(key, "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphen_and_space() {
        assert_eq!(normalize("api-key"), "api_key");
        assert_eq!(normalize("timeout ms"), "timeout_ms");
        assert_eq!(normalize("db-credentials"), "db_credentials");
    }

    #[test]
    fn runs_collapse() {
        assert_eq!(normalize("timeout  ms"), "timeout_ms");
        assert_eq!(normalize("a - b"), "a_b");
        assert_eq!(normalize("a\t\n-b"), "a_b");
        assert_eq!(normalize("--a"), "_a");
    }

    #[test]
    fn canonical_keys_borrow() {
        assert!(matches!(normalize("api_key"), Cow::Borrowed("api_key")));
        assert!(matches!(normalize(""), Cow::Borrowed("")));
    }

    #[test]
    fn other_characters_kept() {
        assert_eq!(normalize("Api.Key"), "Api.Key");
        assert_eq!(normalize("a__b"), "a__b");
        assert_eq!(normalize("a_-b"), "a__b");
    }

    #[test]
    fn unicode_whitespace() {
        assert_eq!(normalize("a\u{00a0}b"), "a_b");
        assert_eq!(normalize("a\u{2003}\u{2003}b"), "a_b");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "", "api-key", "timeout ms", " - ", "a--b  c", "x\u{00a0}-y", "already_fine",
        ];
        for s in samples {
            let once = normalize(s).into_owned();
            assert_eq!(normalize(&once), once.as_str(), "input {s:?}");
        }
    }
}
