//! Error types with fix suggestions
//!
//! Binding is fail-fast: the first problem aborts the whole bind and is
//! returned as a single [`BindError`]. Errors raised below the top-level
//! record carry a location path (`sms_providers[0].port`) that is built
//! bottom-up while the error propagates out of the recursion.

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum BindError {
    // ─────────────────────────────────────────────────────────────
    // Shape declaration errors (BINDR-010)
    // ─────────────────────────────────────────────────────────────

    #[error("BINDR-010: '{type_name}' is not a record shape: {reason}")]
    TypeIntrospection { type_name: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Generic container errors (BINDR-020 to BINDR-022)
    // ─────────────────────────────────────────────────────────────

    #[error("BINDR-020: generic '{family}' is not a supported container{}", at(.path))]
    UnsupportedGeneric { family: String, path: String },

    #[error(
        "BINDR-021: '{family}' expects {expected} type argument(s), got {found}{}",
        at(.path)
    )]
    GenericArityMismatch {
        family: String,
        expected: usize,
        found: usize,
        path: String,
    },

    #[error("BINDR-022: unspecialized generic '{family}' cannot be bound{}", at(.path))]
    UnspecializedGeneric { family: String, path: String },

    // ─────────────────────────────────────────────────────────────
    // Field errors (BINDR-030 to BINDR-031)
    // ─────────────────────────────────────────────────────────────

    #[error("BINDR-030: record {record} has no field '{key}'{}", at(.path))]
    UnknownField {
        record: String,
        key: String,
        path: String,
    },

    #[error("BINDR-031: record {record} is missing required field '{field}'{}", at(.path))]
    MissingRequiredField {
        record: String,
        field: String,
        path: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Value errors (BINDR-040 to BINDR-041)
    // ─────────────────────────────────────────────────────────────

    #[error("BINDR-040: cannot coerce {found} into {expected}{}", at(.path))]
    Coercion {
        expected: String,
        found: String,
        path: String,
    },

    #[error("BINDR-041: bound {found} does not fit Rust type {expected}{}", at(.path))]
    ShapeMismatch {
        expected: String,
        found: String,
        path: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Resource errors (BINDR-050)
    // ─────────────────────────────────────────────────────────────

    #[error("BINDR-050: nesting exceeds depth limit of {limit}{}", at(.path))]
    DepthLimitExceeded { limit: usize, path: String },

    // ─────────────────────────────────────────────────────────────
    // Schema documents and sources (BINDR-060)
    // ─────────────────────────────────────────────────────────────

    #[error("BINDR-060: schema error: {details}")]
    Schema { details: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn at(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at '{path}'")
    }
}

/// One step of an error location, prepended as the error leaves a level.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PathSegment<'a> {
    /// Record field: `.name`
    Field(&'a str),
    /// Sequence or set element: `[3]`
    Index(usize),
    /// Mapping entry: `["key"]`
    Key(&'a str),
}

impl PathSegment<'_> {
    fn prefix(self, rest: &str) -> String {
        let head = match self {
            PathSegment::Field(name) => name.to_string(),
            PathSegment::Index(idx) => format!("[{idx}]"),
            PathSegment::Key(key) => format!("[{key:?}]"),
        };
        if rest.is_empty() {
            head
        } else if rest.starts_with('[') {
            head + rest
        } else {
            format!("{head}.{rest}")
        }
    }
}

impl BindError {
    /// Location of the failure relative to the record passed to `bind`.
    ///
    /// Returns `None` for variants that are not tied to a location
    /// (schema, parse, and IO errors). The root location is `Some("")`.
    pub fn path(&self) -> Option<&str> {
        match self {
            BindError::UnsupportedGeneric { path, .. }
            | BindError::GenericArityMismatch { path, .. }
            | BindError::UnspecializedGeneric { path, .. }
            | BindError::UnknownField { path, .. }
            | BindError::MissingRequiredField { path, .. }
            | BindError::Coercion { path, .. }
            | BindError::ShapeMismatch { path, .. }
            | BindError::DepthLimitExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn nest(mut self, segment: PathSegment<'_>) -> Self {
        match &mut self {
            BindError::UnsupportedGeneric { path, .. }
            | BindError::GenericArityMismatch { path, .. }
            | BindError::UnspecializedGeneric { path, .. }
            | BindError::UnknownField { path, .. }
            | BindError::MissingRequiredField { path, .. }
            | BindError::Coercion { path, .. }
            | BindError::ShapeMismatch { path, .. }
            | BindError::DepthLimitExceeded { path, .. } => {
                *path = segment.prefix(path);
            }
            _ => {}
        }
        self
    }

    pub(crate) fn coercion(expected: impl Into<String>, found: impl Into<String>) -> Self {
        BindError::Coercion {
            expected: expected.into(),
            found: found.into(),
            path: String::new(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        BindError::ShapeMismatch {
            expected: expected.into(),
            found: found.into(),
            path: String::new(),
        }
    }

    pub(crate) fn schema(details: impl Into<String>) -> Self {
        BindError::Schema {
            details: details.into(),
        }
    }
}

impl FixSuggestion for BindError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindError::TypeIntrospection { .. } => {
                Some("Declare the target with record! or RecordShape::builder, with unique field names")
            }
            BindError::UnsupportedGeneric { .. } => {
                Some("Use one of List, Iterable, Set, FrozenSet, Dict, Mapping, MutableMapping or Optional")
            }
            BindError::GenericArityMismatch { .. } => {
                Some("Sequences and sets take one type argument, mappings take two")
            }
            BindError::UnspecializedGeneric { .. } => {
                Some("Give the container its element type, e.g. List[str] instead of List")
            }
            BindError::UnknownField { .. } => {
                Some("Remove the key, fix its spelling, or bind in lenient mode")
            }
            BindError::MissingRequiredField { .. } => {
                Some("Add the key to the input or declare a default for the field")
            }
            BindError::Coercion { .. } => Some("Check the value matches the declared field type"),
            BindError::ShapeMismatch { .. } => {
                Some("Make the Rust field type agree with the declared field type")
            }
            BindError::DepthLimitExceeded { .. } => {
                Some("Flatten the input or raise max_depth in BindOptions")
            }
            BindError::Schema { .. } => Some("Check record names and type expressions in the schema"),
            BindError::Json(_) => Some("Check JSON syntax"),
            BindError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
            BindError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_codes() {
        let err = BindError::UnknownField {
            record: "S3Config".into(),
            key: "bucket".into(),
            path: String::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("BINDR-030"));
        assert!(msg.contains("S3Config"));
        assert!(msg.contains("'bucket'"));
        assert!(!msg.contains(" at "));
    }

    #[test]
    fn nest_builds_path_bottom_up() {
        let err = BindError::coercion("int", "string \"x\"")
            .nest(PathSegment::Field("port"))
            .nest(PathSegment::Index(0))
            .nest(PathSegment::Field("sms_providers"));
        assert_eq!(err.path(), Some("sms_providers[0].port"));
        assert!(err.to_string().contains("at 'sms_providers[0].port'"));
    }

    #[test]
    fn nest_map_key() {
        let err = BindError::coercion("int", "string \"x\"")
            .nest(PathSegment::Key("crink"))
            .nest(PathSegment::Field("accounts"));
        assert_eq!(err.path(), Some("accounts[\"crink\"]"));
    }

    #[test]
    fn nest_ignores_pathless_variants() {
        let err = BindError::schema("bad").nest(PathSegment::Field("x"));
        assert_eq!(err.path(), None);
    }

    #[test]
    fn every_variant_has_suggestion() {
        let errors = [
            BindError::schema("x"),
            BindError::coercion("int", "bool"),
            BindError::mismatch("u16", "int 70000"),
            BindError::DepthLimitExceeded {
                limit: 4,
                path: String::new(),
            },
        ];
        for err in errors {
            assert!(err.fix_suggestion().is_some(), "{err}");
        }
    }
}
