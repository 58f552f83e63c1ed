//! Defines a [`Query`], the dot-separated path used to look up values.

use std::fmt;

/// The query that refers to the current context itself.
pub const SELF: &str = ".";

/// A validated dot path, e.g. `user.name`, or the self reference `.`.
///
/// Validity is purely syntactic, resolving a valid query against some data
/// can still fail to find a value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Query {
    raw: String,
    path: Vec<String>,
}

impl Query {
    /// Parses a query, returning `None` if it is not valid.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == SELF {
            return Some(Self {
                raw: raw.to_owned(),
                path: Vec::new(),
            });
        }
        let path: Vec<String> = raw.split('.').map(String::from).collect();
        if !path.iter().all(|s| is_ident(s)) {
            return None;
        }
        Some(Self {
            raw: raw.to_owned(),
            path,
        })
    }

    /// Whether the query refers to the current context itself.
    pub fn is_self(&self) -> bool {
        self.path.is_empty()
    }

    /// The path segments, empty for the self reference.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The first path segment.
    pub fn base(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_continue),
        _ => false,
    }
}

fn is_ident_start(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '_')
}

fn is_ident_continue(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_')
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({:?})", self.raw)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Query {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Query {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Query::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid query `{raw}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_self() {
        let q = Query::parse(".").unwrap();
        assert!(q.is_self());
        assert_eq!(q.base(), None);
    }

    #[test]
    fn query_path() {
        let q = Query::parse("dog.body.tail_2").unwrap();
        assert_eq!(q.path(), ["dog", "body", "tail_2"]);
        assert_eq!(q.base(), Some("dog"));
        assert_eq!(q.to_string(), "dog.body.tail_2");
    }

    #[test]
    fn query_invalid() {
        for raw in ["", "..", "a.", ".a", "a..b", "1a", "a b", "a-b", "a.1", "é"] {
            assert!(Query::parse(raw).is_none(), "{raw:?} should be invalid");
        }
    }
}
