//! Schema documents
//!
//! Record shapes declared in YAML or JSON instead of Rust:
//!
//! ```yaml
//! root: Config
//! records:
//!   S3Config:
//!     default_bucket: str
//!     max_item_size: int
//!   Config:
//!     s3_settings: S3Config
//!     support_emails: List[str]
//!     no_reply_email: { type: str, default: no-reply@example.com }
//! ```
//!
//! Field types use the textual grammar `name ( '[' expr (',' expr)* ']' )?`.
//! Records may refer to each other in any order, including to themselves.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::binder::bind_record;
use crate::coerce::coerce;
use crate::error::BindError;
use crate::introspect::fields_of;
use crate::options::{BindOptions, DEFAULT_MAX_DEPTH};
use crate::source;
use crate::types::{
    Builtin, FieldDefault, FieldDescriptor, GenericFamily, RecordRef, RecordShape, TypeExpr,
};
use crate::value::BoundRecord;

// ============================================================================
// DOCUMENT FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    /// Default record for callers that do not name one
    #[serde(default)]
    root: Option<String>,

    /// Record name -> field name -> field spec, in document order
    records: Map<String, Value>,
}

/// Two forms of field spec (serde auto-detects via untagged)
///
/// - Short: `port: int`
/// - Full: `port: { type: int, default: 443 }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldSpec {
    Short(String),
    Full(FullFieldSpec),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FullFieldSpec {
    #[serde(rename = "type")]
    ty: String,

    /// `default: null` is a real default, distinct from no default
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// TYPE EXPRESSION PARSER
// ============================================================================

/// Parse a type expression that refers to no records
///
/// Examples:
/// - "List[str]" → `List[str]`
/// - "Optional[Dict[str, int]]" → `Union[Dict[str, int], None]`
pub fn parse_type_expr(text: &str) -> Result<TypeExpr, BindError> {
    TypeParser::new(text, &|_| None).parse()
}

type RecordLookup<'a> = dyn Fn(&str) -> Option<TypeExpr> + 'a;

struct TypeParser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
    records: &'a RecordLookup<'a>,
}

impl<'a> TypeParser<'a> {
    fn new(text: &'a str, records: &'a RecordLookup<'a>) -> Self {
        Self {
            text,
            pos: 0,
            depth: 0,
            records,
        }
    }

    fn parse(mut self) -> Result<TypeExpr, BindError> {
        let ty = self.expr()?;
        self.skip_ws();
        if self.pos < self.text.len() {
            return Err(self.error(format!("unexpected '{}'", &self.text[self.pos..])));
        }
        Ok(ty)
    }

    fn expr(&mut self) -> Result<TypeExpr, BindError> {
        self.depth += 1;
        if self.depth > DEFAULT_MAX_DEPTH {
            return Err(self.error("type arguments nested too deeply"));
        }

        self.skip_ws();
        let name = self.name()?;
        self.skip_ws();

        let args = if self.eat('[') {
            let mut args = vec![self.expr()?];
            loop {
                self.skip_ws();
                if self.eat(',') {
                    args.push(self.expr()?);
                } else if self.eat(']') {
                    break;
                } else {
                    return Err(self.error(format!("expected ',' or ']' after argument of '{name}'")));
                }
            }
            Some(args)
        } else {
            None
        };

        self.depth -= 1;
        self.build(name, args)
    }

    fn build(&self, name: &str, args: Option<Vec<TypeExpr>>) -> Result<TypeExpr, BindError> {
        if name == "Any" {
            return Err(self.error("'Any' cannot be bound; name a concrete type"));
        }

        let Some(args) = args else {
            // Bare name: builtin, unspecialized family, or record
            return match name {
                "None" | "NoneType" => Ok(TypeExpr::NoneType),
                "tuple" => Ok(TypeExpr::Tuple),
                "Optional" => Err(self.error("'Optional' needs a type argument")),
                _ => Builtin::from_name(name)
                    .map(TypeExpr::Builtin)
                    .or_else(|| GenericFamily::from_name(name).map(TypeExpr::bare))
                    .or_else(|| (self.records)(name))
                    .ok_or_else(|| self.error(format!("unknown type '{name}'"))),
            };
        };

        if name == "Optional" {
            return match <[TypeExpr; 1]>::try_from(args) {
                Ok([inner]) => Ok(TypeExpr::optional(inner)),
                Err(args) => Err(self.error(format!(
                    "'Optional' takes one type argument, got {}",
                    args.len()
                ))),
            };
        }

        if let Some(family) = GenericFamily::from_name(name) {
            return Ok(TypeExpr::generic(family, args));
        }

        let is_plain = matches!(name, "None" | "NoneType")
            || Builtin::from_name(name).is_some()
            || (self.records)(name).is_some();
        if is_plain {
            return Err(self.error(format!("'{name}' does not take type arguments")));
        }

        // Unknown family: kept so binding can report it as unsupported
        Ok(TypeExpr::generic(GenericFamily::Other(name.to_string()), args))
    }

    fn name(&mut self) -> Result<&'a str, BindError> {
        let text: &'a str = self.text;
        let rest = &text[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        let name = &rest[..len];
        // typing.List is List
        Ok(name.strip_prefix("typing.").unwrap_or(name))
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.text[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, reason: impl std::fmt::Display) -> BindError {
        BindError::schema(format!("invalid type '{}': {reason}", self.text))
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Record shapes loaded from one schema document
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    records: FxHashMap<String, Arc<RecordShape>>,
    order: Vec<String>,
    root: Option<String>,
}

impl SchemaRegistry {
    pub fn from_yaml_str(text: &str) -> Result<Self, BindError> {
        Self::from_value(&source::parse_yaml(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, BindError> {
        Self::from_value(&source::parse_json(text)?)
    }

    /// Load shapes from an already-parsed document
    ///
    /// Fails with [`BindError::Schema`] on a malformed document, an invalid
    /// type expression, an invalid record, a default that does not fit its
    /// field type, or an unknown root.
    pub fn from_value(document: &Value) -> Result<Self, BindError> {
        let doc = SchemaDocument::deserialize(document)
            .map_err(|e| BindError::schema(format!("malformed schema document: {e}")))?;

        if doc.records.is_empty() {
            return Err(BindError::schema("schema declares no records"));
        }

        if let Some(name) = doc.records.keys().find(|name| is_reserved(name)) {
            return Err(BindError::schema(format!(
                "record name '{name}' is a built-in type name"
            )));
        }

        // One slot per record so field types can point at records declared later
        let slots: FxHashMap<&str, Arc<OnceCell<Arc<RecordShape>>>> = doc
            .records
            .keys()
            .map(|name| (name.as_str(), Arc::new(OnceCell::new())))
            .collect();

        let lookup = |name: &str| {
            slots.get(name).map(|slot| {
                TypeExpr::Record(RecordRef::Late {
                    name: name.to_string(),
                    slot: Arc::clone(slot),
                })
            })
        };

        let mut records = FxHashMap::default();
        let mut order = Vec::with_capacity(doc.records.len());

        for (name, spec) in &doc.records {
            let shape = Arc::new(parse_record(name, spec, &lookup)?);
            fields_of(&shape).map_err(|e| match e {
                BindError::TypeIntrospection { type_name, reason } => {
                    BindError::schema(format!("record '{type_name}': {reason}"))
                }
                other => other,
            })?;

            if let Some(slot) = slots.get(name.as_str()) {
                slot.set(Arc::clone(&shape))
                    .map_err(|_| BindError::schema(format!("record '{name}' is declared twice")))?;
            }
            records.insert(name.clone(), shape);
            order.push(name.clone());
        }

        // All slots are filled; defaults may now reference any record
        for name in &order {
            check_defaults(&records[name])?;
        }

        if let Some(root) = &doc.root {
            if !records.contains_key(root) {
                return Err(BindError::schema(format!("root record '{root}' is not declared")));
            }
        }

        debug!(records = order.len(), root = ?doc.root, "schema loaded");
        Ok(Self {
            records,
            order,
            root: doc.root,
        })
    }

    /// Shape of a declared record
    pub fn record(&self, name: &str) -> Option<Arc<RecordShape>> {
        self.records.get(name).cloned()
    }

    /// Name of the document's default record
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Record names in document order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bind an input mapping to a declared record
    pub fn bind(
        &self,
        record: &str,
        input: &Value,
        options: &BindOptions,
    ) -> Result<BoundRecord, BindError> {
        let shape = self
            .record(record)
            .ok_or_else(|| BindError::schema(format!("record '{record}' is not declared")))?;
        bind_record(&shape, input, options)
    }
}

fn parse_record(
    name: &str,
    spec: &Value,
    lookup: &RecordLookup<'_>,
) -> Result<RecordShape, BindError> {
    let fields = match spec {
        Value::Object(fields) => fields.iter().collect::<Vec<_>>(),
        // `Empty: ~` declares a record with no fields
        Value::Null => Vec::new(),
        other => {
            return Err(BindError::schema(format!(
                "record '{name}' must be a mapping of field names to types, got {}",
                crate::coerce::describe(other)
            )))
        }
    };

    let mut builder = RecordShape::builder(name);
    for (field, spec) in fields {
        let spec = FieldSpec::deserialize(spec).map_err(|_| {
            BindError::schema(format!(
                "field '{name}.{field}' must be a type string or {{ type, default }} with no other keys"
            ))
        })?;

        let (ty, default) = match spec {
            FieldSpec::Short(ty) => (ty, None),
            FieldSpec::Full(FullFieldSpec { ty, default }) => (ty, default),
        };
        let ty = TypeParser::new(&ty, lookup).parse().map_err(|e| match e {
            BindError::Schema { details } => {
                BindError::schema(format!("field '{name}.{field}': {details}"))
            }
            other => other,
        })?;

        let mut descriptor = FieldDescriptor::new(field.as_str(), ty);
        if let Some(raw) = default {
            descriptor = descriptor.with_default(FieldDefault::Raw(raw));
        }
        builder = builder.with_field(descriptor);
    }
    Ok(builder.build())
}

/// Names the type grammar resolves before looking at records
fn is_reserved(name: &str) -> bool {
    matches!(name, "None" | "NoneType" | "tuple" | "Optional" | "Any")
        || Builtin::from_name(name).is_some()
        || GenericFamily::from_name(name).is_some()
}

fn check_defaults(shape: &RecordShape) -> Result<(), BindError> {
    let options = BindOptions::default();
    for field in shape.fields() {
        if let Some(FieldDefault::Raw(raw)) = field.default() {
            coerce(field.ty(), raw, &options).map_err(|e| {
                BindError::schema(format!(
                    "default for '{}.{}' does not fit {}: {e}",
                    shape.name(),
                    field.name(),
                    field.ty()
                ))
            })?;
        }
    }
    Ok(())
}
