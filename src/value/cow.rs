//! Defines a clone-on-write [`Value`].

use std::ops::Deref;

use crate::Value;

/// A value that is either borrowed from the render data or produced during
/// the render, e.g. by an [`Object`][crate::Object] accessor.
#[derive(Debug, Clone)]
pub enum ValueCow<'a> {
    Borrowed(&'a Value),
    Owned(Value),
}

impl Deref for ValueCow<'_> {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Borrowed(v) => v,
            Self::Owned(v) => v,
        }
    }
}

impl ValueCow<'_> {
    pub fn into_owned(self) -> Value {
        match self {
            Self::Borrowed(v) => v.clone(),
            Self::Owned(v) => v,
        }
    }
}
