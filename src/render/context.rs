use crate::types::query::Query;
use crate::value::ValueCow;
use crate::Value;

/// A single data value that queries are resolved against.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    value: ValueCow<'a>,
}

impl<'a> Context<'a> {
    pub fn new(value: ValueCow<'a>) -> Self {
        Self { value }
    }

    /// Whether this context can only answer the self reference.
    pub fn is_basic(&self) -> bool {
        self.value.is_basic()
    }

    /// Whether the first segment of the query resolves in this context.
    ///
    /// Used to decide which section owns a query. The rest of the path is
    /// not looked at since it may still fail to resolve.
    pub fn has_base_variable(&self, query: &Query) -> bool {
        match query.base() {
            None => true,
            Some(_) if self.is_basic() => false,
            Some(base) => member(&self.value, base).is_some(),
        }
    }

    /// Resolves a query, returning `None` if any segment is not found.
    ///
    /// Never substitutes an empty value, callers decide what a missing
    /// value means.
    pub fn resolve(&self, query: &Query) -> Option<ValueCow<'a>> {
        match &self.value {
            ValueCow::Borrowed(v) => lookup_path(*v, query.path()),
            ValueCow::Owned(v) => {
                lookup_path(v, query.path()).map(|v| ValueCow::Owned(v.into_owned()))
            }
        }
    }
}

/// Walks the path from `value`, borrowing for as long as possible.
///
/// Once an object produces a value the rest of the walk is over owned data.
fn lookup_path<'v>(value: &'v Value, path: &[String]) -> Option<ValueCow<'v>> {
    let mut current = ValueCow::Borrowed(value);
    for segment in path {
        current = match current {
            ValueCow::Borrowed(v) => member(v, segment)?,
            ValueCow::Owned(v) => ValueCow::Owned(member(&v, segment)?.into_owned()),
        };
    }
    Some(current)
}

/// Looks up a single named member: a map key, or an object field then
/// accessor.
fn member<'v>(value: &'v Value, name: &str) -> Option<ValueCow<'v>> {
    match value {
        Value::Map(map) => map.get(name).map(ValueCow::Borrowed),
        Value::Object(object) => object
            .field(name)
            .or_else(|| object.call(name))
            .map(ValueCow::Owned),
        _ => None,
    }
}
