use std::collections::VecDeque;

use crate::render::context::Context;
use crate::types::query::Query;
use crate::value::ValueCow;
use crate::{Error, Result, Value};

/// A LIFO stack of sections.
///
/// The root section wraps the render data and is never popped, so the stack
/// is never empty.
#[derive(Debug)]
pub struct SectionStack<'a> {
    sections: Vec<Section<'a>>,
}

/// A section frame holding the contexts it has yet to render.
///
/// The front context is the one the section is currently rendered with. A
/// list produces one context per element which are consumed one at a time as
/// the section repeats.
#[derive(Debug)]
pub struct Section<'a> {
    /// `None` for the root section.
    name: Option<Query>,
    contexts: VecDeque<Context<'a>>,
}

impl<'a> Section<'a> {
    fn current(&self) -> Option<&Context<'a>> {
        self.contexts.front()
    }

    /// Whether the section still has a context to render.
    pub fn is_rendered(&self) -> bool {
        !self.contexts.is_empty()
    }
}

impl<'a> SectionStack<'a> {
    pub fn new(root: &'a Value) -> Self {
        let root = Section {
            name: None,
            contexts: VecDeque::from([Context::new(ValueCow::Borrowed(root))]),
        };
        Self {
            sections: vec![root],
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Resolves a query against the innermost section that owns it.
    ///
    /// A section owns a query if the first segment of the query resolves in
    /// its current context, the self reference is owned by any section that
    /// has a current context. Returns `None` if no section owns the query or
    /// if the rest of the path does not resolve.
    pub fn get_value(&self, query: &Query) -> Option<ValueCow<'a>> {
        self.sections
            .iter()
            .rev()
            .filter_map(Section::current)
            .find(|ctx| ctx.has_base_variable(query))
            .and_then(|ctx| ctx.resolve(query))
    }

    /// Opens a section, returning whether it should be rendered.
    ///
    /// The resolved value is coerced to a number of contexts: none for a
    /// missing value, `None`, `false` or an empty list, one per element for a
    /// list, and exactly one for anything else. A normal section renders if
    /// there is at least one context, an inverted section if there are none.
    ///
    /// A frame is only pushed if the section renders. An inverted section
    /// gets a frame without contexts so lookups inside it fall through to
    /// the enclosing sections.
    pub fn open_section(&mut self, query: &Query, inverted: bool) -> bool {
        let contexts = match self.get_value(query) {
            None => VecDeque::new(),
            Some(value) => to_contexts(value),
        };
        let rendered = contexts.is_empty() == inverted;
        if rendered {
            self.sections.push(Section {
                name: Some(query.clone()),
                contexts: if inverted { VecDeque::new() } else { contexts },
            });
        }
        rendered
    }

    /// Closes the innermost section, returning whether it should be rendered
    /// again with its next context.
    ///
    /// The section is popped once it has no contexts left.
    pub fn close_section(&mut self, query: &Query) -> Result<bool> {
        if self.len() == 1 {
            return Err(Error::contract(format!(
                "cannot close section `{query}`, only the root section is open"
            )));
        }
        let top = self.sections.len() - 1;
        let section = &mut self.sections[top];
        match &section.name {
            Some(name) if name == query => {}
            name => {
                let name = name.as_ref().map(Query::as_str).unwrap_or_default();
                return Err(Error::contract(format!(
                    "cannot close section `{query}`, the innermost section is `{name}`"
                )));
            }
        }
        section.contexts.pop_front();
        if section.is_rendered() {
            return Ok(true);
        }
        self.sections.pop();
        Ok(false)
    }
}

fn to_contexts(value: ValueCow<'_>) -> VecDeque<Context<'_>> {
    match value {
        ValueCow::Borrowed(Value::List(list)) => list
            .iter()
            .map(|v| Context::new(ValueCow::Borrowed(v)))
            .collect(),
        ValueCow::Owned(Value::List(list)) => list
            .into_iter()
            .map(|v| Context::new(ValueCow::Owned(v)))
            .collect(),
        value if matches!(*value, Value::None | Value::Bool(false)) => VecDeque::new(),
        value => VecDeque::from([Context::new(value)]),
    }
}
