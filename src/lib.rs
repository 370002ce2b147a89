//! bindr - recursive binding of untyped mappings into typed records

pub mod binder;
pub mod coerce;
pub mod error;
pub mod introspect;
pub mod normalize;
pub mod options;
pub mod record;
pub mod schema;
pub mod source;
pub mod types;
pub mod value;

pub use binder::bind_record;
pub use coerce::{coerce, TryConvert};
pub use error::{BindError, FixSuggestion};
pub use introspect::{
    classify, concrete_container_for, fields_of, is_generic, is_optional,
    is_specialized_generic, is_unspecialized_generic, shape_of, ConcreteContainer, ContainerKind,
    FieldMap, TypeClass,
};
pub use normalize::normalize;
pub use options::{BindOptions, DEFAULT_MAX_DEPTH};
pub use record::{bind, bind_with, record_from_bound, Bindable, Bytes, Record};
pub use schema::{parse_type_expr, SchemaRegistry};
pub use source::{bind_document, load_document, parse_document, Format};
pub use types::{
    Builtin, FieldDefault, FieldDescriptor, GenericFamily, RecordRef, RecordShape,
    RecordShapeBuilder, TypeExpr,
};
pub use value::{BoundRecord, BoundValue};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
