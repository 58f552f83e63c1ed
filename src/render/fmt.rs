//! Value formatting.
//!
//! A [`Formatter`] is a [`std::fmt::Write`] façade over the render output, be
//! it a [`String`] or an arbitrary [`std::io::Write`] buffer. The engine's
//! default formatter is called with it for every escaped `{{variable}}` tag.

use std::fmt;
use std::fmt::Write;
use std::io;

use crate::{Result, Value};

/// A formatter function or closure.
pub(crate) type FormatFn = dyn Fn(&mut Formatter<'_>, &Value) -> Result<()> + Sync + Send + 'static;

/// A [`std::fmt::Write`] façade.
pub struct Formatter<'a> {
    buf: &'a mut (dyn fmt::Write + 'a),
}

/// Adapts an [`io::Write`] into a [`fmt::Write`], stashing the I/O error so
/// that it can be returned to the caller instead of a bare [`fmt::Error`].
pub(crate) struct Writer<W> {
    writer: W,
    err: Option<io::Error>,
}

impl<'a> Formatter<'a> {
    pub(crate) fn with_string(buf: &'a mut String) -> Self {
        Self { buf }
    }

    pub(crate) fn with_writer<W>(buf: &'a mut Writer<W>) -> Self
    where
        W: io::Write,
    {
        Self { buf }
    }
}

impl fmt::Write for Formatter<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        fmt::Write::write_str(self.buf, s)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        fmt::Write::write_char(self.buf, c)
    }

    #[inline]
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        fmt::Write::write_fmt(self.buf, args)
    }
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer, err: None }
    }

    pub fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}

impl<W> fmt::Write for Writer<W>
where
    W: io::Write,
{
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_all(s.as_bytes()).map_err(|e| {
            self.err = Some(e);
            fmt::Error
        })
    }
}

/// The default value formatter, HTML escapes the string form of the value.
///
/// Values are formatted as follows:
/// - [`Value::None`] and [`Value::Object`]: empty string
/// - [`Value::Bool`]: `true` or `false`
/// - [`Value::Integer`] and [`Value::Float`]: using [`Display`][std::fmt::Display]
/// - [`Value::String`]: the string
/// - [`Value::List`]: `[a, b]`
/// - [`Value::Map`]: `{k=v}`
///
/// The characters `&`, `<`, `>` and `"` are replaced by their HTML entities.
#[inline]
pub fn format(f: &mut Formatter<'_>, value: &Value) -> Result<()> {
    match value {
        Value::None | Value::Object(_) => {}
        Value::Bool(b) => write!(f, "{b}")?,
        Value::Integer(n) => write!(f, "{n}")?,
        Value::Float(n) => write!(f, "{n}")?,
        Value::String(s) => escape_html(f, s)?,
        value => escape_html(f, &value.to_string())?,
    }
    Ok(())
}

/// Formats a value without any escaping.
#[inline]
pub fn format_unescaped(f: &mut Formatter<'_>, value: &Value) -> Result<()> {
    write!(f, "{value}")?;
    Ok(())
}

/// Writes `s` replacing `&`, `<`, `>` and `"` with HTML entities.
pub fn escape_html(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    let mut last = 0;
    for (i, c) in s.char_indices() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            _ => continue,
        };
        f.write_str(&s[last..i])?;
        f.write_str(entity)?;
        last = i + 1;
    }
    f.write_str(&s[last..])
}
