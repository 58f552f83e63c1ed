use std::fmt::Write;

use crate::render::fmt::{format_unescaped, Formatter};
use crate::render::processor::Processor;
use crate::render::stack::SectionStack;
use crate::types::program::{Instr, Program};
use crate::value::ValueCow;
use crate::{Engine, Error, Result, Value};

/// A variable that does not resolve renders like `None`.
const NONE: ValueCow<'static> = ValueCow::Owned(Value::None);

pub struct RendererImpl<'render> {
    pub(crate) engine: &'render Engine,
    pub(crate) program: &'render Program,
    pub(crate) stack: SectionStack<'render>,
    pub(crate) max_partial_depth: usize,
}

/// Tracks whether the output is at the start of a line so that the
/// indentation of a partial can be written before the first piece of every
/// line it produces.
struct Output<'a, 'f> {
    f: &'a mut Formatter<'f>,
    line_start: bool,
}

impl<'render> RendererImpl<'render> {
    pub(crate) fn render(mut self, f: &mut Formatter<'_>) -> Result<()> {
        let mut processor = Processor::new(self.program).with_max_depth(self.max_partial_depth);
        let mut out = Output {
            f,
            line_start: true,
        };
        // Scratch space for formatted values, they must be formatted in full
        // before we know whether to indent them.
        let mut buf = String::new();

        while processor.has_next() {
            let instr = processor.next()?;
            match &*instr {
                Instr::AppendText { text } => {
                    out.write(processor.indentation(), text)?;
                }

                Instr::AppendVariable { name } => {
                    buf.clear();
                    let value = self.stack.get_value(name).unwrap_or(NONE);
                    (self.engine.default_formatter)(&mut Formatter::with_string(&mut buf), &value)?;
                    out.write(processor.indentation(), &buf)?;
                }

                Instr::AppendUnescapedVariable { name } => {
                    buf.clear();
                    let value = self.stack.get_value(name).unwrap_or(NONE);
                    format_unescaped(&mut Formatter::with_string(&mut buf), &value)?;
                    out.write(processor.indentation(), &buf)?;
                }

                Instr::OpenSection { name, .. } => {
                    if self.stack.open_section(name, false) {
                        processor.enter_section()?;
                    }
                }

                Instr::OpenInvertedSection { name, .. } => {
                    if self.stack.open_section(name, true) {
                        processor.enter_section()?;
                    }
                }

                Instr::CloseSection { name, .. } => {
                    if self.stack.close_section(name)? {
                        processor.exit_section()?;
                    }
                }

                Instr::EnterPartial { name, .. } => {
                    return Err(Error::contract(format!(
                        "processor yielded partial `{name}` instead of entering it"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Output<'_, '_> {
    fn write(&mut self, indent: &str, s: &str) -> Result<()> {
        if s.is_empty() {
            return Ok(());
        }
        if self.line_start && !indent.is_empty() {
            self.f.write_str(indent)?;
        }
        self.f.write_str(s)?;
        self.line_start = s.ends_with(['\n', '\r']);
        Ok(())
    }
}
