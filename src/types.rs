//! Declared type model
//!
//! A record shape is registered once (by the `record!` macro, by hand with
//! [`RecordShape::builder`], or from a schema document) and never changes
//! afterwards. Binding pattern-matches on [`TypeExpr`]; there is no runtime
//! reflection.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::BindError;
use crate::value::BoundValue;

// ============================================================================
// BUILTINS AND GENERIC FAMILIES
// ============================================================================

/// Built-in scalar and bare container types
///
/// Each is constructed directly from the raw value through its conversion
/// rule; bare containers copy their elements without coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Str,
    Int,
    Float,
    Bool,
    Bytes,
    Dict,
    List,
    Set,
    FrozenSet,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::Bytes => "bytes",
            Builtin::Dict => "dict",
            Builtin::List => "list",
            Builtin::Set => "set",
            Builtin::FrozenSet => "frozenset",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "str" => Builtin::Str,
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "bool" => Builtin::Bool,
            "bytes" => Builtin::Bytes,
            "dict" => Builtin::Dict,
            "list" => Builtin::List,
            "set" => Builtin::Set,
            "frozenset" => Builtin::FrozenSet,
            _ => return None,
        })
    }
}

/// Parametrized type families
///
/// Only the container families resolve to a concrete container; `Union`
/// is bindable solely in its optional form and everything else is
/// rejected when a value is bound against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    List,
    Iterable,
    Set,
    FrozenSet,
    Dict,
    Mapping,
    MutableMapping,
    Union,
    Tuple,
    Other(String),
}

impl GenericFamily {
    pub fn name(&self) -> &str {
        match self {
            GenericFamily::List => "List",
            GenericFamily::Iterable => "Iterable",
            GenericFamily::Set => "Set",
            GenericFamily::FrozenSet => "FrozenSet",
            GenericFamily::Dict => "Dict",
            GenericFamily::Mapping => "Mapping",
            GenericFamily::MutableMapping => "MutableMapping",
            GenericFamily::Union => "Union",
            GenericFamily::Tuple => "Tuple",
            GenericFamily::Other(name) => name,
        }
    }

    /// Known family for a name; lowercase container names are accepted as
    /// their parametrizable aliases (`list[int]` is `List[int]`).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "List" | "list" => GenericFamily::List,
            "Iterable" => GenericFamily::Iterable,
            "Set" | "set" => GenericFamily::Set,
            "FrozenSet" | "frozenset" => GenericFamily::FrozenSet,
            "Dict" | "dict" => GenericFamily::Dict,
            "Mapping" => GenericFamily::Mapping,
            "MutableMapping" => GenericFamily::MutableMapping,
            "Union" => GenericFamily::Union,
            "Tuple" | "tuple" => GenericFamily::Tuple,
            _ => return None,
        })
    }
}

impl fmt::Display for GenericFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TYPE EXPRESSIONS
// ============================================================================

/// Declared type of a field
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Scalar or bare built-in container
    Builtin(Builtin),
    /// Plain tuple: copied from a sequence, elements uncoerced
    Tuple,
    /// Nested record
    Record(RecordRef),
    /// The absence marker (`None`)
    NoneType,
    /// Parametrized family; empty `args` means unspecialized
    Generic {
        family: GenericFamily,
        args: Vec<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn str() -> Self {
        TypeExpr::Builtin(Builtin::Str)
    }

    pub fn int() -> Self {
        TypeExpr::Builtin(Builtin::Int)
    }

    pub fn float() -> Self {
        TypeExpr::Builtin(Builtin::Float)
    }

    pub fn bool() -> Self {
        TypeExpr::Builtin(Builtin::Bool)
    }

    pub fn bytes() -> Self {
        TypeExpr::Builtin(Builtin::Bytes)
    }

    pub fn generic(family: GenericFamily, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic { family, args }
    }

    /// Family named without type arguments (never bindable)
    pub fn bare(family: GenericFamily) -> Self {
        TypeExpr::generic(family, Vec::new())
    }

    pub fn list_of(element: TypeExpr) -> Self {
        TypeExpr::generic(GenericFamily::List, vec![element])
    }

    pub fn set_of(element: TypeExpr) -> Self {
        TypeExpr::generic(GenericFamily::Set, vec![element])
    }

    pub fn dict_of(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::generic(GenericFamily::Dict, vec![key, value])
    }

    /// `Optional[T]`, i.e. `Union[T, None]`
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::generic(GenericFamily::Union, vec![inner, TypeExpr::NoneType])
    }

    pub fn record(shape: Arc<RecordShape>) -> Self {
        TypeExpr::Record(RecordRef::Shared(shape))
    }

    /// Record resolved on first use; lets a record refer to itself
    pub fn deferred(shape: fn() -> Arc<RecordShape>) -> Self {
        TypeExpr::Record(RecordRef::Deferred(shape))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Builtin(builtin) => f.write_str(builtin.name()),
            TypeExpr::Tuple => f.write_str("tuple"),
            TypeExpr::Record(record) => f.write_str(&record.name()),
            TypeExpr::NoneType => f.write_str("None"),
            TypeExpr::Generic { family, args } => {
                if let (GenericFamily::Union, [inner, TypeExpr::NoneType]) = (family, args.as_slice())
                {
                    return write!(f, "Optional[{inner}]");
                }
                f.write_str(family.name())?;
                if !args.is_empty() {
                    f.write_str("[")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// RECORD REFERENCES
// ============================================================================

/// How a field type points at a nested record shape
#[derive(Clone)]
pub enum RecordRef {
    /// Shape built before the referring shape
    Shared(Arc<RecordShape>),
    /// Shape produced on demand (macro-declared records)
    Deferred(fn() -> Arc<RecordShape>),
    /// Slot filled after construction (schema documents with forward
    /// or recursive references)
    Late {
        name: String,
        slot: Arc<OnceCell<Arc<RecordShape>>>,
    },
}

impl RecordRef {
    pub fn resolve(&self) -> Result<Arc<RecordShape>, BindError> {
        match self {
            RecordRef::Shared(shape) => Ok(Arc::clone(shape)),
            RecordRef::Deferred(shape) => Ok(shape()),
            RecordRef::Late { name, slot } => {
                slot.get()
                    .cloned()
                    .ok_or_else(|| BindError::TypeIntrospection {
                        type_name: name.clone(),
                        reason: "record referenced before it was defined".into(),
                    })
            }
        }
    }

    pub fn name(&self) -> String {
        match self {
            RecordRef::Shared(shape) => shape.name().to_string(),
            RecordRef::Deferred(shape) => shape().name().to_string(),
            RecordRef::Late { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordRef({})", self.name())
    }
}

/// Record types are nominal
impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

// ============================================================================
// RECORD SHAPES
// ============================================================================

/// Value used when a field is absent from the input
#[derive(Clone)]
pub enum FieldDefault {
    /// Already bound value, cloned on use
    Value(BoundValue),
    /// Untyped value, coerced against the field type on use
    Raw(serde_json::Value),
    /// Computed on use
    Factory(Arc<dyn Fn() -> BoundValue + Send + Sync>),
}

impl FieldDefault {
    pub fn factory(f: impl Fn() -> BoundValue + Send + Sync + 'static) -> Self {
        FieldDefault::Factory(Arc::new(f))
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
            FieldDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// One declared field
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    ty: TypeExpr,
    default: Option<FieldDefault>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeExpr {
        &self.ty
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    /// A field without a default must be present in the input
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Named, fixed-shape record type
#[derive(Debug, Clone)]
pub struct RecordShape {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordShape {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn builder(name: impl Into<String>) -> RecordShapeBuilder {
        RecordShapeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Builder for [`RecordShape`]
///
/// Shapes are validated when they are introspected, not here, so that
/// declaration stays infallible inside lazily-initialized statics.
#[derive(Debug)]
pub struct RecordShapeBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordShapeBuilder {
    pub fn field(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        ty: TypeExpr,
        default: FieldDefault,
    ) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, ty).with_default(default));
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> RecordShape {
        RecordShape::new(self.name, self.fields)
    }

    pub fn shared(self) -> Arc<RecordShape> {
        Arc::new(self.build())
    }
}
