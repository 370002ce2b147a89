//! Typed records
//!
//! [`Bindable`] connects a Rust type to its declared [`TypeExpr`] and moves
//! values out of the bound tree. [`Record`] adds a shape. The `record!`
//! macro writes both for a plain struct:
//!
//! ```
//! use bindr::{bind, record};
//! use serde_json::json;
//!
//! record! {
//!     #[derive(Debug)]
//!     pub struct SmtpConfig {
//!         pub host: String,
//!         pub use_tls: Option<bool>,
//!         pub port: u16 = 25,
//!     }
//! }
//!
//! let config: SmtpConfig = bind(&json!({"host": "mail", "use tls": "yes"})).unwrap();
//! assert_eq!(config.port, 25);
//! assert_eq!(config.use_tls, Some(true));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use serde_json::Value;

use crate::binder::bind_record;
use crate::error::{BindError, PathSegment};
use crate::options::BindOptions;
use crate::types::{RecordShape, TypeExpr};
use crate::value::{BoundRecord, BoundValue};

/// A Rust type with a declared binding type
pub trait Bindable: Sized {
    /// Type the binder coerces input against
    fn declared_type() -> TypeExpr;

    /// Take the value out of a bound tree
    fn from_bound(value: BoundValue) -> Result<Self, BindError>;

    /// Inverse of [`Bindable::from_bound`]
    ///
    /// Lossless for every value binding can produce. The one lossy case is
    /// a `u64` or `usize` above `i64::MAX` built in Rust: `int` is 64-bit
    /// signed, so it saturates to `i64::MAX`.
    fn to_bound(&self) -> BoundValue;
}

/// A Rust struct backed by a record shape
pub trait Record: Bindable {
    fn shape() -> Arc<RecordShape>;

    fn from_record(record: BoundRecord) -> Result<Self, BindError>;
}

/// Bind an input mapping into `R` with default (strict) options
pub fn bind<R: Record>(input: &Value) -> Result<R, BindError> {
    bind_with(input, &BindOptions::default())
}

/// Bind an input mapping into `R`
pub fn bind_with<R: Record>(input: &Value, options: &BindOptions) -> Result<R, BindError> {
    let shape = R::shape();
    let record = bind_record(&shape, input, options)?;
    R::from_record(record)
}

/// [`Bindable::from_bound`] for record types
pub fn record_from_bound<R: Record>(value: BoundValue) -> Result<R, BindError> {
    match value {
        BoundValue::Record(record) if record.name() == R::shape().name() => R::from_record(record),
        other => Err(BindError::mismatch(R::shape().name(), other.describe())),
    }
}

// ============================================================================
// SCALARS
// ============================================================================

impl Bindable for String {
    fn declared_type() -> TypeExpr {
        TypeExpr::str()
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Str(s) => Ok(s),
            other => Err(BindError::mismatch("String", other.describe())),
        }
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::Str(self.clone())
    }
}

impl Bindable for bool {
    fn declared_type() -> TypeExpr {
        TypeExpr::bool()
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Bool(b) => Ok(b),
            other => Err(BindError::mismatch("bool", other.describe())),
        }
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::Bool(*self)
    }
}

/// Integers are bound as `int` and range-checked on the way out.
/// Input above `i64::MAX` never binds, so only Rust-built `u64`/`usize`
/// values can saturate when flattened back.
macro_rules! int_bindable {
    ($($t:ty),+) => {$(
        impl Bindable for $t {
            fn declared_type() -> TypeExpr {
                TypeExpr::int()
            }

            fn from_bound(value: BoundValue) -> Result<Self, BindError> {
                match value {
                    BoundValue::Int(i) => <$t>::try_from(i)
                        .map_err(|_| BindError::mismatch(stringify!($t), format!("int {i}"))),
                    other => Err(BindError::mismatch(stringify!($t), other.describe())),
                }
            }

            fn to_bound(&self) -> BoundValue {
                BoundValue::Int(i64::try_from(*self).unwrap_or(i64::MAX))
            }
        }
    )+};
}

int_bindable!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! float_bindable {
    ($($t:ty),+) => {$(
        impl Bindable for $t {
            fn declared_type() -> TypeExpr {
                TypeExpr::float()
            }

            fn from_bound(value: BoundValue) -> Result<Self, BindError> {
                match value {
                    BoundValue::Float(x) => Ok(x as $t),
                    BoundValue::Int(i) => Ok(i as $t),
                    other => Err(BindError::mismatch(stringify!($t), other.describe())),
                }
            }

            fn to_bound(&self) -> BoundValue {
                BoundValue::Float(f64::from(*self))
            }
        }
    )+};
}

float_bindable!(f32, f64);

/// Byte string, bound as `bytes`
///
/// `Vec<u8>` binds as a list of integers instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl Bindable for Bytes {
    fn declared_type() -> TypeExpr {
        TypeExpr::bytes()
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Bytes(bytes) => Ok(Bytes(bytes)),
            other => Err(BindError::mismatch("Bytes", other.describe())),
        }
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::Bytes(self.0.clone())
    }
}

// ============================================================================
// CONTAINERS
// ============================================================================

impl<T: Bindable> Bindable for Option<T> {
    fn declared_type() -> TypeExpr {
        TypeExpr::optional(T::declared_type())
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::None => Ok(None),
            other => T::from_bound(other).map(Some),
        }
    }

    fn to_bound(&self) -> BoundValue {
        self.as_ref().map_or(BoundValue::None, T::to_bound)
    }
}

impl<T: Bindable> Bindable for Box<T> {
    fn declared_type() -> TypeExpr {
        T::declared_type()
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        T::from_bound(value).map(Box::new)
    }

    fn to_bound(&self) -> BoundValue {
        T::to_bound(self)
    }
}

fn elements<T, C>(value: BoundValue, expected: &str) -> Result<C, BindError>
where
    T: Bindable,
    C: FromIterator<T>,
{
    match value {
        BoundValue::List(items) | BoundValue::Set(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| T::from_bound(item).map_err(|e| e.nest(PathSegment::Index(idx))))
            .collect(),
        other => Err(BindError::mismatch(expected, other.describe())),
    }
}

fn entries<K, V, C>(value: BoundValue, expected: &str) -> Result<C, BindError>
where
    K: Bindable,
    V: Bindable,
    C: FromIterator<(K, V)>,
{
    match value {
        BoundValue::Map(pairs) => pairs
            .into_iter()
            .map(|(k, v)| {
                let label = k.key_label();
                let nest = |e: BindError| e.nest(PathSegment::Key(&label));
                Ok::<_, BindError>((K::from_bound(k).map_err(nest)?, V::from_bound(v).map_err(nest)?))
            })
            .collect(),
        other => Err(BindError::mismatch(expected, other.describe())),
    }
}

impl<T: Bindable> Bindable for Vec<T> {
    fn declared_type() -> TypeExpr {
        TypeExpr::list_of(T::declared_type())
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        elements(value, "Vec")
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::List(self.iter().map(T::to_bound).collect())
    }
}

impl<T: Bindable + Eq + Hash> Bindable for HashSet<T> {
    fn declared_type() -> TypeExpr {
        TypeExpr::set_of(T::declared_type())
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        elements(value, "HashSet")
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::Set(self.iter().map(T::to_bound).collect())
    }
}

impl<T: Bindable + Ord> Bindable for BTreeSet<T> {
    fn declared_type() -> TypeExpr {
        TypeExpr::set_of(T::declared_type())
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        elements(value, "BTreeSet")
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::Set(self.iter().map(T::to_bound).collect())
    }
}

impl<K: Bindable + Eq + Hash, V: Bindable> Bindable for HashMap<K, V> {
    fn declared_type() -> TypeExpr {
        TypeExpr::dict_of(K::declared_type(), V::declared_type())
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        entries(value, "HashMap")
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::Map(self.iter().map(|(k, v)| (k.to_bound(), v.to_bound())).collect())
    }
}

impl<K: Bindable + Ord, V: Bindable> Bindable for BTreeMap<K, V> {
    fn declared_type() -> TypeExpr {
        TypeExpr::dict_of(K::declared_type(), V::declared_type())
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        entries(value, "BTreeMap")
    }

    fn to_bound(&self) -> BoundValue {
        BoundValue::Map(self.iter().map(|(k, v)| (k.to_bound(), v.to_bound())).collect())
    }
}

/// Tuples bind as a plain `tuple`: the sequence is copied as-is and each
/// element must already fit its Rust type.
macro_rules! tuple_bindable {
    ($len:literal => $($T:ident $idx:tt),+) => {
        impl<$($T: Bindable),+> Bindable for ($($T,)+) {
            fn declared_type() -> TypeExpr {
                TypeExpr::Tuple
            }

            fn from_bound(value: BoundValue) -> Result<Self, BindError> {
                let items = match value {
                    BoundValue::Tuple(items) | BoundValue::List(items) if items.len() == $len => items,
                    other => {
                        return Err(BindError::mismatch(
                            concat!("tuple of ", stringify!($len)),
                            other.describe(),
                        ))
                    }
                };
                let mut items = items.into_iter();
                Ok(($(
                    $T::from_bound(items.next().unwrap_or(BoundValue::None))
                        .map_err(|e| e.nest(PathSegment::Index($idx)))?,
                )+))
            }

            fn to_bound(&self) -> BoundValue {
                BoundValue::Tuple(vec![$(self.$idx.to_bound()),+])
            }
        }
    };
}

tuple_bindable!(2 => A 0, B 1);
tuple_bindable!(3 => A 0, B 1, C 2);
tuple_bindable!(4 => A 0, B 1, C 2, D 3);

// ============================================================================
// RECORD MACRO
// ============================================================================

/// Declare a struct together with its record shape
///
/// Field names are used as declared; `= expr` gives a default evaluated
/// each time the field is absent. Defaulted fields must come last.
#[macro_export]
macro_rules! record {
    (@field $field:ident, $ty:ty) => {
        $crate::FieldDescriptor::new(
            stringify!($field),
            <$ty as $crate::Bindable>::declared_type(),
        )
    };
    (@field $field:ident, $ty:ty, $default:expr) => {
        $crate::record!(@field $field, $ty).with_default($crate::FieldDefault::factory(|| {
            let value: $ty = $default;
            $crate::Bindable::to_bound(&value)
        }))
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn shape() -> ::std::sync::Arc<$crate::RecordShape> {
                static SHAPE: $crate::__private::Lazy<::std::sync::Arc<$crate::RecordShape>> =
                    $crate::__private::Lazy::new(|| {
                        $crate::RecordShape::builder(stringify!($name))
                            $(.with_field($crate::record!(@field $field, $ty $(, $default)?)))*
                            .shared()
                    });
                ::std::sync::Arc::clone(&SHAPE)
            }

            #[allow(unused_mut, unused_variables)]
            fn from_record(
                mut record: $crate::BoundRecord,
            ) -> ::std::result::Result<Self, $crate::BindError> {
                ::std::result::Result::Ok(Self {
                    $($field: record.take(stringify!($field))?,)*
                })
            }
        }

        impl $crate::Bindable for $name {
            fn declared_type() -> $crate::TypeExpr {
                $crate::TypeExpr::deferred(<$name as $crate::Record>::shape)
            }

            fn from_bound(
                value: $crate::BoundValue,
            ) -> ::std::result::Result<Self, $crate::BindError> {
                $crate::record_from_bound(value)
            }

            fn to_bound(&self) -> $crate::BoundValue {
                $crate::BoundValue::Record($crate::BoundRecord::new(
                    stringify!($name),
                    vec![$((
                        stringify!($field).to_string(),
                        $crate::Bindable::to_bound(&self.$field),
                    )),*],
                ))
            }
        }
    };
}
