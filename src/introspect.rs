//! Type introspection
//!
//! Field lookup for record shapes and classification of declared field
//! types. Everything here is a pattern match over [`TypeExpr`].

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::BindError;
use crate::normalize::normalize;
use crate::types::{FieldDescriptor, GenericFamily, RecordShape, TypeExpr};

// ============================================================================
// FIELD MAPS
// ============================================================================

/// Declared fields of one record, in declaration order, indexed by name
///
/// Uses FxHashMap for faster hashing on small string keys.
#[derive(Debug)]
pub struct FieldMap<'s> {
    shape: &'s RecordShape,
    index: FxHashMap<&'s str, usize>,
}

impl<'s> FieldMap<'s> {
    pub fn record_name(&self) -> &'s str {
        self.shape.name()
    }

    /// Field and its declaration position
    pub fn lookup(&self, name: &str) -> Option<(usize, &'s FieldDescriptor)> {
        let idx = *self.index.get(name)?;
        Some((idx, &self.shape.fields()[idx]))
    }

    pub fn get(&self, name: &str) -> Option<&'s TypeExpr> {
        self.lookup(name).map(|(_, field)| field.ty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'s FieldDescriptor> {
        self.shape.fields().iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'s str> {
        self.iter().map(FieldDescriptor::name)
    }

    pub fn len(&self) -> usize {
        self.shape.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.fields().is_empty()
    }
}

/// Declared fields of a record shape
///
/// Rejects shapes no input could ever bind: an empty record name, empty
/// or duplicate field names, field names that are not normalized (they
/// could never match a normalized key), and defaults that do not form a
/// suffix of the field list.
pub fn fields_of(shape: &RecordShape) -> Result<FieldMap<'_>, BindError> {
    let invalid = |reason: String| BindError::TypeIntrospection {
        type_name: shape.name().to_string(),
        reason,
    };

    if shape.name().is_empty() {
        return Err(invalid("record name cannot be empty".into()));
    }

    let mut index = FxHashMap::default();
    index.reserve(shape.fields().len());
    let mut seen_default: Option<&str> = None;

    for (idx, field) in shape.fields().iter().enumerate() {
        let name = field.name();
        if name.is_empty() {
            return Err(invalid(format!("field #{idx} has an empty name")));
        }
        if normalize(name) != name {
            return Err(invalid(format!(
                "field '{name}' contains whitespace or '-' and can never match an input key"
            )));
        }
        if index.insert(name, idx).is_some() {
            return Err(invalid(format!("field '{name}' is declared twice")));
        }
        match (seen_default, field.is_required()) {
            (Some(previous), true) => {
                return Err(invalid(format!(
                    "required field '{name}' follows defaulted field '{previous}'"
                )));
            }
            (None, false) => seen_default = Some(name),
            _ => {}
        }
    }

    Ok(FieldMap { shape, index })
}

/// Record shape behind a declared type
pub fn shape_of(ty: &TypeExpr) -> Result<Arc<RecordShape>, BindError> {
    match ty {
        TypeExpr::Record(record) => record.resolve(),
        other => Err(BindError::TypeIntrospection {
            type_name: other.to_string(),
            reason: "type is not a record".into(),
        }),
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// True for any parametrized family, with or without arguments
pub fn is_generic(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Generic { .. })
}

/// Family named without type arguments, e.g. bare `List`
pub fn is_unspecialized_generic(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Generic { args, .. } if args.is_empty())
}

/// Family with resolved type arguments, e.g. `List[int]`
pub fn is_specialized_generic(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Generic { args, .. } if !args.is_empty())
}

/// `Union[T, None]`: exactly two arguments, one of them the absence marker
pub fn is_optional(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Generic {
            family: GenericFamily::Union,
            args,
        } => args.len() == 2 && args.contains(&TypeExpr::NoneType),
        _ => false,
    }
}

/// Binding route for a declared type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeClass<'t> {
    /// Builtin, tuple, record or `None`
    Plain,
    /// Never bindable
    Unspecialized(&'t GenericFamily),
    /// `Union[T, None]`, arguments as declared
    Optional(&'t [TypeExpr]),
    Specialized {
        family: &'t GenericFamily,
        args: &'t [TypeExpr],
    },
}

pub fn classify(ty: &TypeExpr) -> TypeClass<'_> {
    match ty {
        TypeExpr::Generic { family, args } if args.is_empty() => TypeClass::Unspecialized(family),
        TypeExpr::Generic { args, .. } if is_optional(ty) => TypeClass::Optional(args),
        TypeExpr::Generic { family, args } => TypeClass::Specialized { family, args },
        _ => TypeClass::Plain,
    }
}

// ============================================================================
// CONCRETE CONTAINERS
// ============================================================================

/// Constructible container behind a generic family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Sequence,
    Set,
    Mapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcreteContainer {
    pub kind: ContainerKind,
    /// Expected number of type arguments
    pub arity: usize,
}

/// Concrete container for a generic type
///
/// One allow-list for every declaration idiom: List and Iterable build a
/// sequence, Set and FrozenSet a set, Dict, Mapping and MutableMapping a
/// mapping. Anything else, including non-optional unions and typed
/// tuples, is unsupported.
pub fn concrete_container_for(ty: &TypeExpr) -> Result<ConcreteContainer, BindError> {
    let TypeExpr::Generic { family, .. } = ty else {
        return Err(BindError::UnsupportedGeneric {
            family: ty.to_string(),
            path: String::new(),
        });
    };
    container_for_family(family)
}

pub(crate) fn container_for_family(
    family: &GenericFamily,
) -> Result<ConcreteContainer, BindError> {
    let (kind, arity) = match family {
        GenericFamily::List | GenericFamily::Iterable => (ContainerKind::Sequence, 1),
        GenericFamily::Set | GenericFamily::FrozenSet => (ContainerKind::Set, 1),
        GenericFamily::Dict | GenericFamily::Mapping | GenericFamily::MutableMapping => {
            (ContainerKind::Mapping, 2)
        }
        GenericFamily::Union | GenericFamily::Tuple | GenericFamily::Other(_) => {
            return Err(BindError::UnsupportedGeneric {
                family: family.name().to_string(),
                path: String::new(),
            });
        }
    };
    Ok(ConcreteContainer { kind, arity })
}
