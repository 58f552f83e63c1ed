use std::fmt;

use crate::Value;

/// A record-like value that exposes named members to templates.
///
/// Maps and serialized structs already support lookups by key. Implement this
/// trait for types that compute their members on demand, then wrap them
/// using [`Value::object`].
///
/// A lookup of `name` first tries [`field`][Object::field] and then falls
/// back to [`call`][Object::call].
///
/// # Examples
///
/// ```
/// use moustache::{Object, Value};
///
/// #[derive(Debug)]
/// struct User {
///     first: String,
///     last: String,
/// }
///
/// impl Object for User {
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "first" => Some(Value::from(self.first.as_str())),
///             "last" => Some(Value::from(self.last.as_str())),
///             _ => None,
///         }
///     }
///
///     fn call(&self, name: &str) -> Option<Value> {
///         match name {
///             "full_name" => Some(Value::from(format!("{} {}", self.first, self.last))),
///             _ => None,
///         }
///     }
/// }
///
/// let user = User { first: "John".into(), last: "Smith".into() };
/// let data = Value::from([("user", Value::object(user))]);
///
/// let result = moustache::Engine::new()
///     .compile("{{user.full_name}}")?
///     .render_from(&data)
///     .to_string()?;
/// assert_eq!(result, "John Smith");
/// # Ok::<(), moustache::Error>(())
/// ```
pub trait Object: fmt::Debug + Send + Sync {
    /// Returns the value of the named field, if there is one.
    fn field(&self, name: &str) -> Option<Value>;

    /// Returns the result of the named zero-argument accessor, if there is
    /// one.
    fn call(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }
}
