//! Defines the [`PartialLoader`] trait used to fetch partial sources.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::io;

/// Fetches the source of a partial by name.
///
/// The engine calls the loader while compiling, once per partial name and
/// compile. Returning an error with kind [`io::ErrorKind::NotFound`] fails
/// compilation with [`ErrorKind::PartialNotFound`][crate::ErrorKind], any
/// other error with [`ErrorKind::Io`][crate::ErrorKind].
///
/// # Examples
///
/// Load partials from a directory.
///
/// ```no_run
/// use std::{fs, io};
///
/// let mut engine = moustache::Engine::new();
/// engine.set_partial_loader(|name: &str| -> io::Result<String> {
///     fs::read_to_string(format!("templates/{name}.mustache"))
/// });
/// ```
pub trait PartialLoader: Send + Sync {
    fn load(&self, name: &str) -> io::Result<String>;
}

impl<F> PartialLoader for F
where
    F: Fn(&str) -> io::Result<String> + Send + Sync,
{
    fn load(&self, name: &str) -> io::Result<String> {
        self(name)
    }
}

impl<S> PartialLoader for HashMap<String, String, S>
where
    S: BuildHasher + Send + Sync,
{
    fn load(&self, name: &str) -> io::Result<String> {
        self.get(name).cloned().ok_or_else(|| not_found(name))
    }
}

impl PartialLoader for BTreeMap<String, String> {
    fn load(&self, name: &str) -> io::Result<String> {
        self.get(name).cloned().ok_or_else(|| not_found(name))
    }
}

fn not_found(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no partial named `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_loaders() {
        let map = HashMap::from([(String::from("a"), String::from("A"))]);
        assert_eq!(map.load("a").unwrap(), "A");
        assert_eq!(map.load("b").unwrap_err().kind(), io::ErrorKind::NotFound);

        let map = BTreeMap::from([(String::from("a"), String::from("A"))]);
        assert_eq!(map.load("a").unwrap(), "A");
        assert_eq!(map.load("b").unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn closure_loader() {
        let loader = |name: &str| -> io::Result<String> { Ok(name.to_uppercase()) };
        assert_eq!(PartialLoader::load(&loader, "x").unwrap(), "X");
    }
}
