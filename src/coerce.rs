//! Value coercion
//!
//! Turns one raw value into a [`BoundValue`] of a declared type:
//! - builtins go through their [`TryConvert`] rule (the only implicit
//!   conversion point);
//! - plain tuples are copied from a sequence;
//! - records recurse into the binder;
//! - specialized generics rebuild their container, coercing every element.
//!
//! Every level below the root record counts toward `max_depth`.

use serde_json::Value;

use crate::binder;
use crate::error::{BindError, PathSegment};
use crate::introspect::{classify, container_for_family, shape_of, ContainerKind, TypeClass};
use crate::options::BindOptions;
use crate::types::{Builtin, GenericFamily, TypeExpr};
use crate::value::BoundValue;

// ============================================================================
// SCALAR CONVERSION RULES
// ============================================================================

/// Explicit conversion from an untyped value
///
/// Rules per target:
/// - `String`: strings; numbers and booleans in their JSON text form
/// - `i64`: integers; floats with no fractional part; numeric strings
/// - `f64`: any number; numeric strings (including `inf` and `NaN`)
/// - `bool`: booleans; integers 0 and 1; `true/false/yes/no/on/off/1/0`
///   in any case
/// - `Vec<u8>`: strings as UTF-8; arrays of integers in `0..=255`
pub trait TryConvert: Sized {
    /// Declared type name used in error messages
    const EXPECTED: &'static str;

    fn try_convert(value: &Value) -> Option<Self>;

    fn convert(value: &Value) -> Result<Self, BindError> {
        Self::try_convert(value).ok_or_else(|| BindError::coercion(Self::EXPECTED, describe(value)))
    }
}

impl TryConvert for String {
    const EXPECTED: &'static str = "str";

    fn try_convert(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl TryConvert for i64 {
    const EXPECTED: &'static str = "int";

    fn try_convert(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                let x = n.as_f64()?;
                // Bounds are exclusive at the top: i64::MAX as f64 rounds up to 2^63.
                let in_range = x >= i64::MIN as f64 && x < i64::MAX as f64;
                (x.fract() == 0.0 && in_range).then_some(x as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl TryConvert for f64 {
    const EXPECTED: &'static str = "float";

    fn try_convert(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl TryConvert for bool {
    const EXPECTED: &'static str = "bool";

    fn try_convert(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64()? {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl TryConvert for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn try_convert(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.as_bytes().to_vec()),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect(),
            _ => None,
        }
    }
}

/// Kind plus a short rendering of scalars, e.g. `string "abc"`
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) if s.chars().count() > 40 => {
            let head: String = s.chars().take(40).collect();
            format!("string {head:?}…")
        }
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {} element(s)", items.len()),
        Value::Object(entries) => format!("mapping with {} key(s)", entries.len()),
    }
}

// ============================================================================
// COERCION
// ============================================================================

/// Recursion state carried through one bind
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame<'o> {
    pub options: &'o BindOptions,
    pub depth: usize,
}

impl<'o> Frame<'o> {
    pub fn root(options: &'o BindOptions) -> Self {
        Self { options, depth: 0 }
    }

    /// Frame for the next nesting level
    pub fn descend(self) -> Result<Self, BindError> {
        let depth = self.depth + 1;
        if depth > self.options.max_depth {
            return Err(BindError::DepthLimitExceeded {
                limit: self.options.max_depth,
                path: String::new(),
            });
        }
        Ok(Self { depth, ..self })
    }
}

/// Coerce a raw value into a declared type
pub fn coerce(ty: &TypeExpr, value: &Value, options: &BindOptions) -> Result<BoundValue, BindError> {
    coerce_at(ty, value, Frame::root(options))
}

pub(crate) fn coerce_at(ty: &TypeExpr, value: &Value, frame: Frame<'_>) -> Result<BoundValue, BindError> {
    match classify(ty) {
        TypeClass::Unspecialized(family) => Err(BindError::UnspecializedGeneric {
            family: family.name().to_string(),
            path: String::new(),
        }),
        TypeClass::Optional(args) => coerce_optional(args, value, frame),
        TypeClass::Specialized { family, args } => coerce_generic(ty, family, args, value, frame),
        TypeClass::Plain => coerce_plain(ty, value, frame),
    }
}

/// Builtins, plain tuples, records and `None`
fn coerce_plain(ty: &TypeExpr, value: &Value, frame: Frame<'_>) -> Result<BoundValue, BindError> {
    match ty {
        TypeExpr::Builtin(builtin) => coerce_builtin(*builtin, value),
        TypeExpr::Tuple => match value {
            Value::Array(items) => Ok(BoundValue::Tuple(
                items.iter().map(BoundValue::from_raw).collect(),
            )),
            other => Err(BindError::coercion("tuple", describe(other))),
        },
        TypeExpr::Record(_) => {
            let shape = shape_of(ty)?;
            let record = binder::bind_at(&shape, value, frame.descend()?)?;
            Ok(BoundValue::Record(record))
        }
        TypeExpr::NoneType => match value {
            Value::Null => Ok(BoundValue::None),
            other => Err(BindError::coercion("None", describe(other))),
        },
        TypeExpr::Generic { .. } => coerce_at(ty, value, frame),
    }
}

fn coerce_builtin(builtin: Builtin, value: &Value) -> Result<BoundValue, BindError> {
    Ok(match builtin {
        Builtin::Str => BoundValue::Str(String::convert(value)?),
        Builtin::Int => BoundValue::Int(i64::convert(value)?),
        Builtin::Float => BoundValue::Float(f64::convert(value)?),
        Builtin::Bool => BoundValue::Bool(bool::convert(value)?),
        Builtin::Bytes => BoundValue::Bytes(Vec::<u8>::convert(value)?),
        Builtin::List => match value {
            Value::Array(items) => BoundValue::List(items.iter().map(BoundValue::from_raw).collect()),
            other => return Err(BindError::coercion("list", describe(other))),
        },
        Builtin::Set | Builtin::FrozenSet => match value {
            Value::Array(items) => {
                BoundValue::Set(unique(items.iter().map(BoundValue::from_raw)))
            }
            other => return Err(BindError::coercion(builtin.name(), describe(other))),
        },
        Builtin::Dict => match value {
            Value::Object(_) => BoundValue::from_raw(value),
            other => return Err(BindError::coercion("dict", describe(other))),
        },
    })
}

/// `Union[T, None]`: `null` stays absent, anything else binds to `T`
pub(crate) fn coerce_optional(
    args: &[TypeExpr],
    value: &Value,
    frame: Frame<'_>,
) -> Result<BoundValue, BindError> {
    if value.is_null() {
        return Ok(BoundValue::None);
    }
    let present: Vec<&TypeExpr> = args.iter().filter(|t| **t != TypeExpr::NoneType).collect();
    match present.as_slice() {
        [inner] => coerce_at(inner, value, frame),
        _ => Err(BindError::GenericArityMismatch {
            family: "Optional".into(),
            expected: 1,
            found: present.len(),
            path: String::new(),
        }),
    }
}

/// Rebuild a specialized container, coercing every element
pub(crate) fn coerce_generic(
    ty: &TypeExpr,
    family: &GenericFamily,
    args: &[TypeExpr],
    value: &Value,
    frame: Frame<'_>,
) -> Result<BoundValue, BindError> {
    let container = container_for_family(family)?;
    if container.arity != args.len() {
        return Err(BindError::GenericArityMismatch {
            family: family.name().to_string(),
            expected: container.arity,
            found: args.len(),
            path: String::new(),
        });
    }
    let inner = frame.descend()?;

    match container.kind {
        ContainerKind::Mapping => {
            let Value::Object(entries) = value else {
                return Err(BindError::coercion(ty.to_string(), describe(value)));
            };
            let mut pairs: Vec<(BoundValue, BoundValue)> = Vec::with_capacity(entries.len());
            for (key, item) in entries {
                let nest = |e: BindError| e.nest(PathSegment::Key(key));
                let bound_key = coerce_at(&args[0], &Value::String(key.clone()), inner).map_err(nest)?;
                let bound_item = coerce_at(&args[1], item, inner).map_err(nest)?;
                // Keys that coerce to the same value collapse; the last one wins
                match pairs.iter_mut().find(|(existing, _)| *existing == bound_key) {
                    Some(entry) => entry.1 = bound_item,
                    None => pairs.push((bound_key, bound_item)),
                }
            }
            Ok(BoundValue::Map(pairs))
        }
        ContainerKind::Sequence | ContainerKind::Set => {
            let Value::Array(items) = value else {
                return Err(BindError::coercion(ty.to_string(), describe(value)));
            };
            let elements = items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    coerce_at(&args[0], item, inner).map_err(|e| e.nest(PathSegment::Index(idx)))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(match container.kind {
                ContainerKind::Set => BoundValue::Set(unique(elements)),
                _ => BoundValue::List(elements),
            })
        }
    }
}

// ============================================================================
// CONFORMANCE
// ============================================================================

/// Check that an already-bound value fits a declared type
///
/// Used for defaults that bypass coercion. No conversion happens here:
/// a `float` field needs a `Float`, a record needs a record of the same
/// name with every declared field in order. A bare family only checks the
/// container kind.
pub(crate) fn conform(ty: &TypeExpr, value: &BoundValue) -> Result<(), BindError> {
    let mismatch = || BindError::mismatch(ty.to_string(), value.describe());

    match classify(ty) {
        TypeClass::Unspecialized(family) => {
            let container = container_for_family(family)?;
            match (container.kind, value) {
                (ContainerKind::Sequence, BoundValue::List(_))
                | (ContainerKind::Set, BoundValue::Set(_))
                | (ContainerKind::Mapping, BoundValue::Map(_)) => Ok(()),
                _ => Err(mismatch()),
            }
        }
        TypeClass::Optional(_) if matches!(value, BoundValue::None) => Ok(()),
        TypeClass::Optional(args) => {
            let present: Vec<&TypeExpr> =
                args.iter().filter(|t| **t != TypeExpr::NoneType).collect();
            match present.as_slice() {
                [inner] => conform(inner, value),
                _ => Err(BindError::GenericArityMismatch {
                    family: "Optional".into(),
                    expected: 1,
                    found: present.len(),
                    path: String::new(),
                }),
            }
        }
        TypeClass::Specialized { family, args } => {
            let container = container_for_family(family)?;
            if container.arity != args.len() {
                return Err(BindError::GenericArityMismatch {
                    family: family.name().to_string(),
                    expected: container.arity,
                    found: args.len(),
                    path: String::new(),
                });
            }
            match (container.kind, value) {
                (ContainerKind::Sequence, BoundValue::List(items))
                | (ContainerKind::Set, BoundValue::Set(items)) => {
                    items.iter().enumerate().try_for_each(|(idx, item)| {
                        conform(&args[0], item).map_err(|e| e.nest(PathSegment::Index(idx)))
                    })
                }
                (ContainerKind::Mapping, BoundValue::Map(entries)) => {
                    entries.iter().try_for_each(|(key, item)| {
                        let label = key.key_label();
                        conform(&args[0], key)
                            .and_then(|_| conform(&args[1], item))
                            .map_err(|e| e.nest(PathSegment::Key(&label)))
                    })
                }
                _ => Err(mismatch()),
            }
        }
        TypeClass::Plain => match (ty, value) {
            (TypeExpr::Builtin(builtin), value) => {
                let fits = matches!(
                    (builtin, value),
                    (Builtin::Str, BoundValue::Str(_))
                        | (Builtin::Int, BoundValue::Int(_))
                        | (Builtin::Float, BoundValue::Float(_))
                        | (Builtin::Bool, BoundValue::Bool(_))
                        | (Builtin::Bytes, BoundValue::Bytes(_))
                        | (Builtin::List, BoundValue::List(_))
                        | (Builtin::Set | Builtin::FrozenSet, BoundValue::Set(_))
                        | (Builtin::Dict, BoundValue::Map(_))
                );
                if fits {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            (TypeExpr::Tuple, BoundValue::Tuple(_)) | (TypeExpr::NoneType, BoundValue::None) => {
                Ok(())
            }
            (TypeExpr::Record(_), BoundValue::Record(record)) => {
                let shape = shape_of(ty)?;
                if record.name() != shape.name() || record.len() != shape.fields().len() {
                    return Err(mismatch());
                }
                for (field, (name, item)) in shape.fields().iter().zip(record.fields()) {
                    if field.name() != name {
                        return Err(mismatch());
                    }
                    conform(field.ty(), item).map_err(|e| e.nest(PathSegment::Field(field.name())))?;
                }
                Ok(())
            }
            _ => Err(mismatch()),
        },
    }
}

/// First occurrence wins, order kept (NaN counts as one value)
fn unique(values: impl IntoIterator<Item = BoundValue>) -> Vec<BoundValue> {
    let mut out: Vec<BoundValue> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strict() -> BindOptions {
        BindOptions::default()
    }

    #[test]
    fn str_rules() {
        assert_eq!(String::try_convert(&json!("a")), Some("a".into()));
        assert_eq!(String::try_convert(&json!(443)), Some("443".into()));
        assert_eq!(String::try_convert(&json!(true)), Some("true".into()));
        assert_eq!(String::try_convert(&json!(null)), None);
        assert_eq!(String::try_convert(&json!(["a"])), None);
    }

    #[test]
    fn int_rules() {
        assert_eq!(i64::try_convert(&json!(2048)), Some(2048));
        assert_eq!(i64::try_convert(&json!("2048")), Some(2048));
        assert_eq!(i64::try_convert(&json!(" -7 ")), Some(-7));
        assert_eq!(i64::try_convert(&json!(3.0)), Some(3));
        assert_eq!(i64::try_convert(&json!(3.5)), None);
        assert_eq!(i64::try_convert(&json!("3.5")), None);
        assert_eq!(i64::try_convert(&json!("abc")), None);
        assert_eq!(i64::try_convert(&json!(true)), None);
        assert_eq!(i64::try_convert(&json!(1e300)), None);
    }

    #[test]
    fn float_rules() {
        assert_eq!(f64::try_convert(&json!(3.14)), Some(3.14));
        assert_eq!(f64::try_convert(&json!(3)), Some(3.0));
        assert_eq!(f64::try_convert(&json!("2.5")), Some(2.5));
        assert!(f64::try_convert(&json!("inf")).unwrap().is_infinite());
        assert_eq!(f64::try_convert(&json!("pi")), None);
        assert_eq!(f64::try_convert(&json!(false)), None);
    }

    #[test]
    fn bool_rules() {
        assert_eq!(bool::try_convert(&json!(true)), Some(true));
        assert_eq!(bool::try_convert(&json!(0)), Some(false));
        assert_eq!(bool::try_convert(&json!("YES")), Some(true));
        assert_eq!(bool::try_convert(&json!("off")), Some(false));
        assert_eq!(bool::try_convert(&json!(2)), None);
        assert_eq!(bool::try_convert(&json!("maybe")), None);
    }

    #[test]
    fn bytes_rules() {
        assert_eq!(Vec::<u8>::try_convert(&json!("hi")), Some(b"hi".to_vec()));
        assert_eq!(Vec::<u8>::try_convert(&json!([1, 255])), Some(vec![1, 255]));
        assert_eq!(Vec::<u8>::try_convert(&json!([256])), None);
        assert_eq!(Vec::<u8>::try_convert(&json!([-1])), None);
        assert_eq!(Vec::<u8>::try_convert(&json!(5)), None);
    }

    #[test]
    fn coercion_error_describes_value() {
        let err = coerce(&TypeExpr::int(), &json!("abc"), &strict()).unwrap_err();
        assert!(matches!(err, BindError::Coercion { .. }));
        let msg = err.to_string();
        assert!(msg.contains("BINDR-040"));
        assert!(msg.contains("string \"abc\""));
        assert!(msg.contains("int"));
    }

    #[test]
    fn bare_builtin_containers_copy_untyped() {
        let list = coerce(&TypeExpr::Builtin(Builtin::List), &json!([1, "a"]), &strict()).unwrap();
        assert_eq!(
            list,
            BoundValue::List(vec![BoundValue::Int(1), BoundValue::Str("a".into())])
        );

        let set = coerce(&TypeExpr::Builtin(Builtin::FrozenSet), &json!([1, 1, 2]), &strict()).unwrap();
        assert_eq!(set, BoundValue::Set(vec![BoundValue::Int(1), BoundValue::Int(2)]));

        let dict = coerce(&TypeExpr::Builtin(Builtin::Dict), &json!({"k": 1}), &strict()).unwrap();
        assert_eq!(
            dict,
            BoundValue::Map(vec![(BoundValue::Str("k".into()), BoundValue::Int(1))])
        );

        assert!(coerce(&TypeExpr::Builtin(Builtin::Dict), &json!([1]), &strict()).is_err());
    }

    #[test]
    fn plain_tuple_has_no_element_coercion() {
        let tuple = coerce(&TypeExpr::Tuple, &json!(["admin", 1]), &strict()).unwrap();
        assert_eq!(
            tuple,
            BoundValue::Tuple(vec![BoundValue::Str("admin".into()), BoundValue::Int(1)])
        );
        assert!(coerce(&TypeExpr::Tuple, &json!("admin"), &strict()).is_err());
    }

    #[test]
    fn none_type_accepts_only_null() {
        assert_eq!(coerce(&TypeExpr::NoneType, &json!(null), &strict()).unwrap(), BoundValue::None);
        assert!(coerce(&TypeExpr::NoneType, &json!(0), &strict()).is_err());
    }

    #[test]
    fn optional_path() {
        let ty = TypeExpr::optional(TypeExpr::str());
        assert_eq!(coerce(&ty, &json!(null), &strict()).unwrap(), BoundValue::None);
        assert_eq!(
            coerce(&ty, &json!("host.example.com"), &strict()).unwrap(),
            BoundValue::Str("host.example.com".into())
        );

        let reversed = TypeExpr::generic(GenericFamily::Union, vec![TypeExpr::NoneType, TypeExpr::int()]);
        assert_eq!(coerce(&reversed, &json!("5"), &strict()).unwrap(), BoundValue::Int(5));
    }

    #[test]
    fn optional_of_two_none_args() {
        let ty = TypeExpr::generic(GenericFamily::Union, vec![TypeExpr::NoneType, TypeExpr::NoneType]);
        assert_eq!(coerce(&ty, &json!(null), &strict()).unwrap(), BoundValue::None);
        let err = coerce(&ty, &json!(1), &strict()).unwrap_err();
        assert!(matches!(err, BindError::GenericArityMismatch { found: 0, .. }));
    }

    #[test]
    fn sequence_elements_coerced() {
        let ty = TypeExpr::list_of(TypeExpr::int());
        assert_eq!(
            coerce(&ty, &json!(["1", 2, 3.0]), &strict()).unwrap(),
            BoundValue::List(vec![BoundValue::Int(1), BoundValue::Int(2), BoundValue::Int(3)])
        );

        let err = coerce(&ty, &json!([1, "x"]), &strict()).unwrap_err();
        assert_eq!(err.path(), Some("[1]"));

        let err = coerce(&ty, &json!("1,2"), &strict()).unwrap_err();
        assert!(err.to_string().contains("List[int]"));
    }

    #[test]
    fn set_deduplicates_after_coercion() {
        let ty = TypeExpr::set_of(TypeExpr::int());
        assert_eq!(
            coerce(&ty, &json!([1, "1", 2]), &strict()).unwrap(),
            BoundValue::Set(vec![BoundValue::Int(1), BoundValue::Int(2)])
        );
    }

    #[test]
    fn mapping_keys_and_values_coerced() {
        let ty = TypeExpr::dict_of(TypeExpr::int(), TypeExpr::str());
        assert_eq!(
            coerce(&ty, &json!({"1": "a", "2": 3}), &strict()).unwrap(),
            BoundValue::Map(vec![
                (BoundValue::Int(1), BoundValue::Str("a".into())),
                (BoundValue::Int(2), BoundValue::Str("3".into())),
            ])
        );

        let err = coerce(&ty, &json!({"one": "a"}), &strict()).unwrap_err();
        assert_eq!(err.path(), Some("[\"one\"]"));
    }

    #[test]
    fn colliding_mapping_keys_keep_last_value() {
        let ty = TypeExpr::dict_of(TypeExpr::int(), TypeExpr::str());
        let bound = coerce(&ty, &json!({"1": "x", "2": "y", "01": "z"}), &strict()).unwrap();
        let BoundValue::Map(entries) = &bound else {
            panic!("expected a mapping, got {bound:?}");
        };
        assert_eq!(
            entries,
            &vec![
                (BoundValue::Int(1), BoundValue::Str("z".into())),
                (BoundValue::Int(2), BoundValue::Str("y".into())),
            ]
        );

        let distinct = coerce(&ty, &json!({"1": "z", "2": "y"}), &strict()).unwrap();
        assert_eq!(bound, distinct);
        assert_eq!(distinct, bound);
    }

    #[test]
    fn nan_set_elements_collapse() {
        let ty = TypeExpr::set_of(TypeExpr::float());
        let bound = coerce(&ty, &json!(["NaN", "nan", 1.5]), &strict()).unwrap();
        let BoundValue::Set(elements) = &bound else {
            panic!("expected a set, got {bound:?}");
        };
        assert_eq!(elements.len(), 2);
        assert_eq!(bound, bound.clone());
    }

    #[test]
    fn nested_generics() {
        let ty = TypeExpr::dict_of(TypeExpr::str(), TypeExpr::list_of(TypeExpr::optional(TypeExpr::int())));
        let bound = coerce(&ty, &json!({"a": [1, null]}), &strict()).unwrap();
        assert_eq!(
            bound,
            BoundValue::Map(vec![(
                BoundValue::Str("a".into()),
                BoundValue::List(vec![BoundValue::Int(1), BoundValue::None])
            )])
        );
    }

    #[test]
    fn arity_mismatch() {
        let ty = TypeExpr::generic(GenericFamily::Dict, vec![TypeExpr::str()]);
        let err = coerce(&ty, &json!({}), &strict()).unwrap_err();
        assert!(matches!(
            err,
            BindError::GenericArityMismatch { expected: 2, found: 1, .. }
        ));

        let ty = TypeExpr::generic(GenericFamily::List, vec![TypeExpr::str(), TypeExpr::int()]);
        assert!(matches!(
            coerce(&ty, &json!([]), &strict()),
            Err(BindError::GenericArityMismatch { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn unsupported_and_unspecialized() {
        let union = TypeExpr::generic(GenericFamily::Union, vec![TypeExpr::int(), TypeExpr::str()]);
        assert!(matches!(
            coerce(&union, &json!(1), &strict()),
            Err(BindError::UnsupportedGeneric { .. })
        ));

        let nested = TypeExpr::list_of(TypeExpr::bare(GenericFamily::List));
        let err = coerce(&nested, &json!([[1]]), &strict()).unwrap_err();
        assert!(matches!(err, BindError::UnspecializedGeneric { .. }));
        assert_eq!(err.path(), Some("[0]"));
    }

    #[test]
    fn conform_checks_bound_values() {
        let ty = TypeExpr::dict_of(TypeExpr::str(), TypeExpr::list_of(TypeExpr::optional(TypeExpr::int())));
        let good = coerce(&ty, &json!({"a": [1, null]}), &strict()).unwrap();
        assert!(conform(&ty, &good).is_ok());

        let bad = BoundValue::Map(vec![(
            BoundValue::Str("a".into()),
            BoundValue::List(vec![BoundValue::Int(1), BoundValue::Str("2".into())]),
        )]);
        let err = conform(&ty, &bad).unwrap_err();
        assert!(matches!(err, BindError::ShapeMismatch { .. }));
        assert_eq!(err.path(), Some("[\"a\"][1]"));

        assert!(conform(&TypeExpr::float(), &BoundValue::Int(1)).is_err());
        assert!(conform(&TypeExpr::optional(TypeExpr::str()), &BoundValue::None).is_ok());
        assert!(conform(&TypeExpr::Tuple, &BoundValue::List(vec![])).is_err());
    }

    #[test]
    fn depth_limit() {
        let ty = TypeExpr::list_of(TypeExpr::list_of(TypeExpr::list_of(TypeExpr::int())));
        let shallow = BindOptions::default().with_max_depth(2);
        let err = coerce(&ty, &json!([[[1]]]), &shallow).unwrap_err();
        assert!(matches!(err, BindError::DepthLimitExceeded { limit: 2, .. }));
        assert_eq!(err.path(), Some("[0][0]"));

        let enough = BindOptions::default().with_max_depth(3);
        assert!(coerce(&ty, &json!([[[1]]]), &enough).is_ok());
    }
}
