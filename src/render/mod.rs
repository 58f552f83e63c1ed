#![allow(clippy::wrong_self_convention)]

mod context;
mod core;
mod fmt;
mod processor;
mod stack;

use std::io;

pub use crate::render::fmt::{escape_html, format, format_unescaped, Formatter};
pub(crate) use crate::render::fmt::FormatFn;
pub use crate::render::processor::Processor;
pub(crate) use crate::render::processor::DEFAULT_MAX_PARTIAL_DEPTH;

use crate::render::core::RendererImpl;
use crate::render::fmt::Writer;
use crate::render::stack::SectionStack;
use crate::types::program::Program;
use crate::{Engine, Error, Result, Value};

fn to_string(
    engine: &Engine,
    program: &Program,
    globals: &Value,
    max_partial_depth: usize,
) -> Result<String> {
    let mut s = String::with_capacity(program.source().len());
    let mut f = Formatter::with_string(&mut s);
    RendererImpl {
        engine,
        program,
        stack: SectionStack::new(globals),
        max_partial_depth,
    }
    .render(&mut f)?;
    Ok(s)
}

fn to_writer<W>(
    engine: &Engine,
    program: &Program,
    globals: &Value,
    writer: W,
    max_partial_depth: usize,
) -> Result<()>
where
    W: io::Write,
{
    let mut w = Writer::new(writer);
    let mut f = Formatter::with_writer(&mut w);
    RendererImpl {
        engine,
        program,
        stack: SectionStack::new(globals),
        max_partial_depth,
    }
    .render(&mut f)
    .map_err(|err| w.take_err().map(Error::from).unwrap_or(err))
}

/// A renderer that interprets a compiled [`Template`][crate::Template].
///
/// This struct is created by one of the following functions:
/// - [`Template{,Ref}::render`][crate::Template::render]
/// - [`Template{,Ref}::render_from`][crate::Template::render_from]
///
/// Every render gets its own processor and section stack, so one template
/// can be rendered from many threads at once.
#[must_use = "must call `.to_string()` or `.to_writer(..)` on the renderer"]
pub struct Renderer<'render> {
    engine: &'render Engine,
    program: &'render Program,
    globals: Globals<'render>,
    max_partial_depth: Option<usize>,
}

enum Globals<'render> {
    #[cfg(feature = "serde")]
    Owned(Result<Value>),
    Borrowed(&'render Value),
}

impl<'render> Renderer<'render> {
    fn new(engine: &'render Engine, program: &'render Program, globals: Globals<'render>) -> Self {
        Self {
            engine,
            program,
            globals,
            max_partial_depth: None,
        }
    }

    #[cfg(feature = "serde")]
    pub(crate) fn with_serde<S>(engine: &'render Engine, program: &'render Program, globals: S) -> Self
    where
        S: ::serde::Serialize,
    {
        Self::new(engine, program, Globals::Owned(crate::to_value(globals)))
    }

    pub(crate) fn with_value(
        engine: &'render Engine,
        program: &'render Program,
        globals: &'render Value,
    ) -> Self {
        Self::new(engine, program, Globals::Borrowed(globals))
    }

    /// Set the maximum number of nested partials.
    ///
    /// A template that includes itself, directly or through other partials,
    /// must stop recursing because of the data. Rendering fails with a
    /// [`RecursionLimit`][crate::ErrorKind::RecursionLimit] error once this
    /// depth is exceeded.
    ///
    /// Defaults to the engine setting.
    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = Some(depth);
        self
    }

    /// Render the template to a string.
    pub fn to_string(self) -> Result<String> {
        let depth = self.max_partial_depth();
        match self.globals {
            #[cfg(feature = "serde")]
            Globals::Owned(result) => {
                let value = result?;
                to_string(self.engine, self.program, &value, depth)
            }
            Globals::Borrowed(value) => to_string(self.engine, self.program, value, depth),
        }
    }

    /// Render the template to the given writer.
    ///
    /// Output written before an error is not rolled back.
    pub fn to_writer<W>(self, w: W) -> Result<()>
    where
        W: io::Write,
    {
        let depth = self.max_partial_depth();
        match self.globals {
            #[cfg(feature = "serde")]
            Globals::Owned(result) => {
                let value = result?;
                to_writer(self.engine, self.program, &value, w, depth)
            }
            Globals::Borrowed(value) => to_writer(self.engine, self.program, value, w, depth),
        }
    }

    fn max_partial_depth(&self) -> usize {
        self.max_partial_depth
            .unwrap_or(self.engine.max_partial_depth)
    }
}
