//! Defines the [`Value`] enum, representing any valid renderable data.

mod cow;
mod from;
mod object;
#[cfg(feature = "serde")]
mod ser;

pub use std::collections::BTreeMap as Map;
use std::fmt;
use std::mem;
use std::sync::Arc;
pub use std::vec::Vec as List;

pub use crate::value::cow::ValueCow;
pub use crate::value::object::Object;
#[cfg(feature = "serde")]
pub use crate::value::ser::to_value;

/// Data to be rendered represented as a recursive enum.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(List<Value>),
    Map(Map<String, Value>),
    /// A record exposing named fields or accessors, see [`Object`].
    Object(Arc<dyn Object>),
}

impl Value {
    /// Wraps a custom record type.
    pub fn object<O>(object: O) -> Self
    where
        O: Object + 'static,
    {
        Self::Object(Arc::new(object))
    }

    /// Whether this value only ever answers the self reference `.`.
    ///
    /// Scalars and lists have no named members to look up.
    pub(crate) fn is_basic(&self) -> bool {
        !matches!(self, Self::Map(_) | Self::Object(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(s), Self::Bool(o)) => s == o,
            (Self::Integer(s), Self::Integer(o)) => s == o,
            (Self::Float(s), Self::Float(o)) => s == o,
            (Self::String(s), Self::String(o)) => s == o,
            (Self::List(s), Self::List(o)) => s == o,
            (Self::Map(s), Self::Map(o)) => s == o,
            (Self::Object(s), Self::Object(o)) => Arc::ptr_eq(s, o),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

/// The string form of a value, as written by the renderer.
///
/// `None` and objects display as nothing, lists as `[a, b]` and maps as
/// `{k=v}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None | Self::Object(_) => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::List(list) => {
                f.write_str("[")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
