//! A Mustache template compiler and renderer.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Variables: `{{ user.name }}`, HTML escaped
//! - Unescaped variables: `{{{ user.bio }}}` or `{{& user.bio }}`
//! - Sections: `{{# users }} ... {{/ users }}`
//! - Inverted sections: `{{^ users }} ... {{/ users }}`
//! - Partials: `{{> user }}`
//! - Comments: `{{! ignored }}`
//! - Delimiter changes: `{{=<% %>=}}`
//!
//! ### Engine
//!
//! - Templates are compiled once into a flat instruction sequence with
//!   precomputed section jumps, including every partial they reference
//! - Standalone lines and partial indentation as Mustache requires
//! - Render to a [`String`] or any [`std::io::Write`] implementor
//! - Render using any [`serde`] serializable values
//! - Custom record types using the [`Object`] trait
//! - Convenient macro for quick rendering:
//!   `moustache::value!{ name: "John", age: 42 }`
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the partial
//! loader, the value formatter, and compiled templates. Generally, you only
//! need to construct one engine during the lifetime of a program.
//!
//! ```
//! let engine = moustache::Engine::new();
//! ```
//!
//! Next, [`.add_template`][Engine::add_template] is used to compile and store
//! a template in the engine.
//!
//! ```
//! # let mut engine = moustache::Engine::new();
//! engine.add_template("hello", "Hello {{ user.name }}!")?;
//! # Ok::<(), moustache::Error>(())
//! ```
//!
//! Finally, the template is rendered by fetching it using
//! [`.get_template`][Engine::get_template] and calling
//! [`.render`][TemplateRef::render].
//!
//! ```
//! # let mut engine = moustache::Engine::new();
//! # engine.add_template("hello", "Hello {{ user.name }}!")?;
//! let template = engine.get_template("hello").unwrap();
//! let result = template
//!     .render(moustache::value!{ user: { name: "John Smith" }})
//!     .to_string()?;
//! assert_eq!(result, "Hello John Smith!");
//! # Ok::<(), moustache::Error>(())
//! ```
//!
//! Templates added to the engine double as partials for every template the
//! engine compiles afterwards.
//!
//! # Examples
//!
//! ### Render a list
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Context { users: Vec<User> }
//!
//! #[derive(serde::Serialize)]
//! struct User { name: String }
//!
//! let ctx = Context {
//!     users: vec![User { name: "Ann".into() }, User { name: "Bob".into() }],
//! };
//!
//! let result = moustache::Engine::new()
//!     .compile("{{#users}}<li>{{name}}</li>{{/users}}{{^users}}nobody{{/users}}")?
//!     .render(&ctx)
//!     .to_string()?;
//!
//! assert_eq!(result, "<li>Ann</li><li>Bob</li>");
//! # Ok::<(), moustache::Error>(())
//! ```
//!
//! ### Load partials on demand
//!
//! Partials that are not registered with the engine are fetched from the
//! [`PartialLoader`] while compiling.
//!
//! ```
//! use std::collections::HashMap;
//!
//! let mut partials = HashMap::new();
//! partials.insert("user".to_owned(), "<b>{{name}}</b>\n".to_owned());
//!
//! let mut engine = moustache::Engine::new();
//! engine.set_partial_loader(partials);
//!
//! let result = engine
//!     .compile("{{#users}}\n  {{> user}}\n{{/users}}\n")?
//!     .render(moustache::value!{ users: [{ name: "Ann" }, { name: "Bob" }] })
//!     .to_string()?;
//!
//! assert_eq!(result, "  <b>Ann</b>\n  <b>Bob</b>\n");
//! # Ok::<(), moustache::Error>(())
//! ```
//!
//! ### Render a template to an `impl io::Write`
//!
//! ```
//! use std::io;
//!
//! let stdout = io::BufWriter::new(io::stdout());
//!
//! moustache::Engine::new()
//!     .compile("Hello {{ user.name }}")?
//!     .render(moustache::value! { user: { name: "John Smith" }})
//!     .to_writer(stdout)?;
//! # Ok::<(), moustache::Error>(())
//! ```
//!
//! ### Change the default formatter
//!
//! Escaped variables are written with the engine's default formatter, which
//! HTML escapes by default. Use [`Engine::set_default_formatter`] to change
//! that, for example when rendering plain text.
//!
//! ```
//! let mut engine = moustache::Engine::new();
//! engine.set_default_formatter(moustache::format_unescaped);
//!
//! let result = engine
//!     .compile("{{ a }}")?
//!     .render(moustache::value! { a: "<&>" })
//!     .to_string()?;
//!
//! assert_eq!(result, "<&>");
//! # Ok::<(), moustache::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod compile;
mod error;
mod loader;
mod macros;
mod render;
mod types;
mod value;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io;

pub use crate::error::{Error, ErrorKind, Position};
pub use crate::loader::PartialLoader;
pub use crate::render::{
    escape_html, format, format_unescaped, Formatter, Processor, Renderer,
};
pub use crate::types::program::{Instr, Program};
pub use crate::types::query::Query;
#[cfg(feature = "serde")]
pub use crate::value::to_value;
pub use crate::value::{List, Map, Object, Value};

use crate::render::{FormatFn, DEFAULT_MAX_PARTIAL_DEPTH};

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The compilation and rendering engine.
pub struct Engine {
    default_formatter: Box<FormatFn>,
    loader: Option<Box<dyn PartialLoader>>,
    templates: BTreeMap<String, Program>,
    max_partial_depth: usize,
}

/// A compiled template.
pub struct Template<'engine> {
    engine: &'engine Engine,
    program: Program,
}

/// A reference to a compiled template in an [`Engine`].
#[derive(Clone, Copy)]
pub struct TemplateRef<'engine> {
    engine: &'engine Engine,
    program: &'engine Program,
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Construct a new engine.
    #[inline]
    pub fn new() -> Self {
        Self {
            default_formatter: Box::new(format),
            loader: None,
            templates: BTreeMap::new(),
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }

    /// Set the loader used to fetch partials that are not registered with
    /// [`.add_template(..)`][Engine::add_template].
    #[inline]
    pub fn set_partial_loader<L>(&mut self, loader: L)
    where
        L: PartialLoader + 'static,
    {
        self.loader = Some(Box::new(loader));
    }

    /// Set the default formatter, used for every escaped `{{variable}}`.
    #[inline]
    pub fn set_default_formatter<F>(&mut self, f: F)
    where
        F: Fn(&mut Formatter<'_>, &Value) -> Result<()> + Sync + Send + 'static,
    {
        self.default_formatter = Box::new(f);
    }

    /// Set the default maximum number of nested partials when rendering.
    ///
    /// Defaults to 64.
    #[inline]
    pub fn set_max_partial_depth(&mut self, depth: usize) {
        self.max_partial_depth = depth;
    }

    /// Add a template to the engine.
    ///
    /// The template will be compiled and stored under the given name. It is
    /// also available as a partial to templates compiled afterwards, and to
    /// itself.
    #[inline]
    pub fn add_template<N, S>(&mut self, name: N, source: S) -> Result<()>
    where
        N: Into<String>,
        S: AsRef<str>,
    {
        let name = name.into();
        let program = compile::template(self, Some(&name), source.as_ref())?;
        self.templates.insert(name, program);
        Ok(())
    }

    /// Lookup a template by name.
    #[inline]
    pub fn get_template(&self, name: &str) -> Option<TemplateRef<'_>> {
        self.templates.get(name).map(|program| TemplateRef {
            engine: self,
            program,
        })
    }

    /// Compile a template.
    ///
    /// The template will not be stored in the engine.
    #[inline]
    pub fn compile(&self, source: &str) -> Result<Template<'_>> {
        let program = compile::template(self, None, source)?;
        Ok(Template {
            engine: self,
            program,
        })
    }

    /// Compile a template read from the given reader.
    pub fn compile_reader<R>(&self, mut reader: R) -> Result<Template<'_>>
    where
        R: io::Read,
    {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        self.compile(&source)
    }

    /// Load a previously compiled program, e.g. one that was deserialized.
    #[inline]
    pub fn load(&self, program: Program) -> Template<'_> {
        Template {
            engine: self,
            program,
        }
    }

    /// Returns the source of the named partial.
    pub(crate) fn load_partial(&self, name: &str) -> Result<Cow<'_, str>> {
        if let Some(program) = self.templates.get(name) {
            return Ok(Cow::Borrowed(program.source()));
        }
        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| Error::partial_not_found(name))?;
        log::debug!("loading partial `{name}`");
        match loader.load(name) {
            Ok(source) => Ok(Cow::Owned(source)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(Error::partial_not_found(name))
            }
            Err(err) => Err(Error::partial_io(name, err)),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("has_loader", &self.loader.is_some())
            .field("templates", &self.templates.keys())
            .field("max_partial_depth", &self.max_partial_depth)
            .finish_non_exhaustive()
    }
}

impl<'engine> Template<'engine> {
    /// Render the template using the provided serializable value.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Renderer<'_>
    where
        S: ::serde::Serialize,
    {
        Renderer::with_serde(self.engine, &self.program, ctx)
    }

    /// Render the template using the provided value.
    #[inline]
    pub fn render_from<'render>(&'render self, ctx: &'render Value) -> Renderer<'render> {
        Renderer::with_value(self.engine, &self.program, ctx)
    }

    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &str {
        self.program.source()
    }

    /// Returns the compiled program.
    #[inline]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Consumes the template, returning the compiled program.
    #[inline]
    pub fn into_program(self) -> Program {
        self.program
    }
}

impl fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl<'engine> TemplateRef<'engine> {
    /// Render the template using the provided serializable value.
    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Renderer<'engine>
    where
        S: ::serde::Serialize,
    {
        Renderer::with_serde(self.engine, self.program, ctx)
    }

    /// Render the template using the provided value.
    #[inline]
    pub fn render_from<'render>(&self, ctx: &'render Value) -> Renderer<'render>
    where
        'engine: 'render,
    {
        Renderer::with_value(self.engine, self.program, ctx)
    }

    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &'engine str {
        self.program.source()
    }

    /// Returns the compiled program.
    #[inline]
    pub fn program(&self) -> &'engine Program {
        self.program
    }
}

impl fmt::Debug for TemplateRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRef")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}
