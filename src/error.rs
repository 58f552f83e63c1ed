use std::cmp::max;
use std::fmt;
use std::io;

use crate::types::span::Span;

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid template syntax, e.g. a malformed tag or an unterminated tag.
    Syntax,
    /// A section was closed out of order or never opened.
    SectionMismatch,
    /// A partial could not be resolved while compiling.
    PartialNotFound,
    /// The renderer or processor was driven in a way it does not support.
    ContractViolation,
    /// Partials were nested deeper than the configured maximum.
    RecursionLimit,
    /// Reading a partial or writing the output failed.
    Io,
    /// The render data could not be converted to a [`Value`][crate::Value].
    Serialize,
}

/// An error that can occur during template compilation or rendering.
pub struct Error {
    kind: ErrorKind,
    msg: String,
    name: Option<String>,
    pretty: Option<Pretty>,
    source: Option<io::Error>,
}

/// The template source and the region of it the error refers to.
#[derive(Clone)]
struct Pretty {
    source: String,
    span: Span,
}

/// A 1-based line and column in a template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            name: None,
            pretty: None,
            source: None,
        }
    }

    /// Constructs a syntax error pointing at a region of the template.
    pub(crate) fn syntax(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Syntax, msg).with_span(source, span)
    }

    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContractViolation, msg)
    }

    pub(crate) fn partial_not_found(name: &str) -> Self {
        Self::new(ErrorKind::PartialNotFound, format!("unknown partial `{name}`"))
    }

    pub(crate) fn partial_io(name: &str, err: io::Error) -> Self {
        let mut e = Self::new(ErrorKind::Io, format!("failed to load partial `{name}`"));
        e.source = Some(err);
        e
    }

    pub(crate) fn max_partial_depth(max: usize) -> Self {
        Self::new(
            ErrorKind::RecursionLimit,
            format!("reached maximum partial depth ({max})"),
        )
    }

    /// Attaches the template source and span, unless already present.
    pub(crate) fn with_span(mut self, source: &str, span: impl Into<Span>) -> Self {
        if self.pretty.is_none() {
            self.pretty = Some(Pretty {
                source: source.to_owned(),
                span: span.into(),
            });
        }
        self
    }

    /// Attaches the name of the partial being compiled, unless already
    /// present. The innermost partial wins.
    pub(crate) fn with_template_name(mut self, name: &str) -> Self {
        if self.name.is_none() {
            self.name = Some(name.to_owned());
        }
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the name of the partial the error occurred in, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the line and column in the template source the error refers
    /// to, if known.
    pub fn position(&self) -> Option<Position> {
        self.pretty
            .as_ref()
            .map(|p| to_position(&p.source, p.span.m))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let mut e = Self::new(ErrorKind::Io, "io error");
        e.source = Some(err);
        e
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Self::new(ErrorKind::Io, "format error")
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::new(ErrorKind::Serialize, msg.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::new(ErrorKind::Serialize, msg.to_string())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Error");
        d.field("kind", &self.kind).field("msg", &self.msg);
        if let Some(name) = &self.name {
            d.field("name", name);
        }
        if let Some(pos) = self.position() {
            d.field("position", &pos);
        }
        if let Some(source) = &self.source {
            d.field("source", source);
        }
        d.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pretty {
            Some(Pretty { source, span }) if f.alternate() => {
                if let Some(name) = &self.name {
                    write!(f, "\n  --> {name}")?;
                }
                fmt_pretty(&self.msg, source, *span, f)
            }
            Some(Pretty { source, span }) => {
                let Position { line, column } = to_position(source, span.m);
                write!(f, "{} at line {} column {}", self.msg, line, column)?;
                if let Some(name) = &self.name {
                    write!(f, " in partial `{name}`")?;
                }
                Ok(())
            }
            None => {
                f.write_str(&self.msg)?;
                if let Some(name) = &self.name {
                    write!(f, " in partial `{name}`")?;
                }
                if let Some(source) = &self.source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
        }
    }
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Position { line, column } = to_position(source, span.m);
    let code = source
        .split_terminator('\n')
        .nth(line - 1)
        .unwrap_or("")
        .trim_end_matches('\r');
    // Only underline the part of the span that is on the first line.
    let highlight = source[span].split('\n').next().unwrap_or("");
    let width = max(1, str_width(highlight));

    let num = line.to_string();
    let pad = str_width(&num);
    let pipe = "|";
    let underline = "^".repeat(width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = column - 1 + width,
        msg = msg
    )
}

/// Converts a byte offset into a 1-based line and column, counting line
/// feeds.
fn to_position(source: &str, offset: usize) -> Position {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = str_width(&before[start..]) + 1;
    Position { line, column }
}

#[cfg(feature = "unicode")]
fn str_width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn str_width(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_first_line() {
        assert_eq!(
            to_position("lorem {{ ipsum", 6),
            Position { line: 1, column: 7 }
        );
    }

    #[test]
    fn position_after_line_feeds() {
        let source = "lorem\nipsum\n  {{dolor";
        assert_eq!(to_position(source, 14), Position { line: 3, column: 3 });
    }

    #[test]
    fn display_with_span() {
        let err = Error::syntax("invalid tag content `a b`", "x\n{{a b}}", 2..9);
        assert_eq!(err.to_string(), "invalid tag content `a b` at line 2 column 1");
        assert_eq!(
            format!("{err:#}"),
            "
   |
 2 | {{a b}}
   | ^^^^^^^ invalid tag content `a b`
"
        );
    }

    #[test]
    fn display_with_name() {
        let err = Error::partial_not_found("inner").with_template_name("outer");
        assert_eq!(err.to_string(), "unknown partial `inner` in partial `outer`");
        assert_eq!(err.kind(), ErrorKind::PartialNotFound);
    }
}
