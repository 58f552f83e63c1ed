use std::borrow::Cow;

use crate::types::program::{Instr, Program, Sequence};
use crate::{Error, Result};

/// The default maximum number of nested partials.
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 64;

/// A cursor based interpreter over a compiled [`Program`].
///
/// The processor yields the instructions the renderer should act upon.
/// Sections are skipped unless the renderer acknowledges them with
/// [`.enter_section()`][Processor::enter_section] and are repeated only when
/// the renderer calls [`.exit_section()`][Processor::exit_section]. Partials
/// are inlined by pushing a frame, they are never yielded.
#[derive(Debug)]
pub struct Processor<'p> {
    program: &'p Program,

    /// One frame for the main sequence and one for every active partial.
    frames: Vec<Frame<'p>>,

    /// The section instruction that was just yielded.
    pending: Pending,

    max_depth: usize,
}

#[derive(Debug)]
struct Frame<'p> {
    seq: &'p Sequence,

    /// The index of the last yielded instruction, `None` before the first.
    cursor: Option<usize>,

    /// The indentation applied to every line of text in this frame.
    indent: String,
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Nothing,
    /// An open section was yielded, skipped unless entered.
    Open { close: usize },
    /// A close section was yielded, falls through unless exited.
    Close { open: usize },
    /// A close section was exited, the section body runs again.
    Repeat { open: usize },
}

impl<'p> Processor<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            frames: vec![Frame::new(&program.main, String::new())],
            pending: Pending::Nothing,
            max_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns to the state before the first instruction.
    pub fn reset(&mut self) {
        self.frames.truncate(1);
        self.frames[0].cursor = None;
        self.pending = Pending::Nothing;
    }

    /// The indentation of the frame the last instruction came from.
    pub fn indentation(&self) -> &str {
        self.frames.last().map_or("", |f| f.indent.as_str())
    }

    /// The number of active partials.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Whether there is another instruction to yield.
    pub fn has_next(&self) -> bool {
        let mut frames = self.frames.iter().rev();
        if let Some(top) = frames.next() {
            if self.next_index(top) < top.seq.len() {
                return true;
            }
        }
        // Outer frames are always positioned at the partial they entered.
        frames.any(|f| f.cursor.map_or(0, |c| c + 1) < f.seq.len())
    }

    /// Yields the next instruction.
    ///
    /// Text is indented after every line break it contains, except a
    /// trailing one, using the indentation of the partial it belongs to.
    pub fn next(&mut self) -> Result<Cow<'p, Instr>> {
        loop {
            let top = self.frames.len() - 1;
            let i = self.next_index(&self.frames[top]);
            self.pending = Pending::Nothing;

            let seq = self.frames[top].seq;
            let instr = match seq.get(i) {
                Some(instr) => instr,
                None if top > 0 => {
                    log::trace!("leaving partial at depth {top}");
                    self.frames.pop();
                    continue;
                }
                None => {
                    return Err(Error::contract(
                        "called `next` on an exhausted processor",
                    ));
                }
            };
            self.frames[top].cursor = Some(i);

            match instr {
                Instr::OpenSection { close, .. } | Instr::OpenInvertedSection { close, .. } => {
                    self.pending = Pending::Open { close: *close };
                }
                Instr::CloseSection { open, .. } => {
                    self.pending = Pending::Close { open: *open };
                }
                Instr::EnterPartial { name, indentation } => {
                    self.enter_partial(name, indentation)?;
                    continue;
                }
                Instr::AppendText { text } => {
                    let indent = &self.frames[top].indent;
                    if !indent.is_empty() && has_inner_line_break(text) {
                        let text = indent_text(text, indent);
                        return Ok(Cow::Owned(Instr::AppendText { text }));
                    }
                }
                Instr::AppendVariable { .. } | Instr::AppendUnescapedVariable { .. } => {}
            }
            return Ok(Cow::Borrowed(instr));
        }
    }

    /// Acknowledges the open section that was just yielded, its body will be
    /// yielded next.
    pub fn enter_section(&mut self) -> Result<()> {
        match self.pending {
            Pending::Open { .. } => {
                self.pending = Pending::Nothing;
                Ok(())
            }
            _ => Err(Error::contract(
                "called `enter_section` but no open section is pending",
            )),
        }
    }

    /// Acknowledges the close section that was just yielded, the section body
    /// will be yielded again.
    pub fn exit_section(&mut self) -> Result<()> {
        match self.pending {
            Pending::Close { open } => {
                self.pending = Pending::Repeat { open };
                Ok(())
            }
            _ => Err(Error::contract(
                "called `exit_section` but no close section is pending",
            )),
        }
    }

    fn next_index(&self, frame: &Frame<'_>) -> usize {
        match self.pending {
            Pending::Open { close } => close + 1,
            Pending::Repeat { open } => open + 1,
            Pending::Nothing | Pending::Close { .. } => frame.cursor.map_or(0, |c| c + 1),
        }
    }

    fn enter_partial(&mut self, name: &str, indentation: &str) -> Result<()> {
        if self.depth() >= self.max_depth {
            return Err(Error::max_partial_depth(self.max_depth).with_template_name(name));
        }
        let outer = &self.frames[self.frames.len() - 1];
        // Programs are always compiled with every partial they reference, an
        // unknown name can only come from a deserialized program. Treat it as a
        // reference to the enclosing template.
        let seq = match self.program.partial(name) {
            Some(seq) => seq,
            None => {
                log::debug!("partial `{name}` is not in the program, using enclosing template");
                outer.seq
            }
        };
        let mut indent = String::with_capacity(outer.indent.len() + indentation.len());
        indent.push_str(&outer.indent);
        indent.push_str(indentation);
        log::trace!("entering partial `{name}` at depth {}", self.frames.len());
        self.frames.push(Frame::new(seq, indent));
        Ok(())
    }
}

impl<'p> Frame<'p> {
    fn new(seq: &'p Sequence, indent: String) -> Self {
        Self {
            seq,
            cursor: None,
            indent,
        }
    }
}

/// Whether the text has a line break that is not the trailing one.
fn has_inner_line_break(text: &str) -> bool {
    match text.find(['\n', '\r']) {
        Some(j) if text[j..].starts_with("\r\n") => j + 2 < text.len(),
        Some(j) => j + 1 < text.len(),
        None => false,
    }
}

/// Inserts `indent` after every line break that is followed by more text.
fn indent_text(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len() + indent.len());
    let mut rest = text;
    while let Some(j) = rest.find(['\n', '\r']) {
        let k = if rest[j..].starts_with("\r\n") { j + 2 } else { j + 1 };
        out.push_str(&rest[..k]);
        rest = &rest[k..];
        if !rest.is_empty() {
            out.push_str(indent);
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::compile::Sequencer;
    use crate::types::program::FIXME;
    use crate::types::query::Query;

    fn q(s: &str) -> Query {
        Query::parse(s).unwrap()
    }

    fn seq(instrs: Vec<Instr>) -> Sequence {
        let mut seq = Sequencer::new();
        seq.extend(instrs).unwrap();
        seq.finish().unwrap()
    }

    fn program(main: Vec<Instr>, partials: Vec<(&str, Vec<Instr>)>) -> Program {
        Program {
            source: String::new(),
            main: seq(main),
            partials: partials
                .into_iter()
                .map(|(name, instrs)| (name.to_owned(), seq(instrs)))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn open(name: &str) -> Instr {
        Instr::OpenSection {
            name: q(name),
            close: FIXME,
        }
    }

    fn close(name: &str) -> Instr {
        Instr::CloseSection {
            name: q(name),
            open: FIXME,
        }
    }

    fn partial(name: &str, indentation: &str) -> Instr {
        Instr::EnterPartial {
            name: name.into(),
            indentation: indentation.into(),
        }
    }

    /// Drives the processor, entering sections while `enter` returns true
    /// and repeating them while `repeat` returns true. Returns the text.
    fn run(
        p: &mut Processor<'_>,
        mut enter: impl FnMut(&str) -> bool,
        mut repeat: impl FnMut(&str) -> bool,
    ) -> String {
        let mut out = String::new();
        while p.has_next() {
            match p.next().unwrap().into_owned() {
                Instr::AppendText { text } => out.push_str(&text),
                Instr::AppendVariable { name } => out.push_str(&format!("<{name}>")),
                Instr::OpenSection { name, .. } => {
                    if enter(name.as_str()) {
                        p.enter_section().unwrap();
                    }
                }
                Instr::CloseSection { name, .. } => {
                    if repeat(name.as_str()) {
                        p.exit_section().unwrap();
                    }
                }
                instr => panic!("unexpected {instr:?}"),
            }
        }
        out
    }

    #[test]
    fn skips_unentered_section() {
        let prog = program(
            vec![Instr::text("a"), open("s"), Instr::text("b"), close("s"), Instr::text("c")],
            vec![],
        );
        let mut p = Processor::new(&prog);
        assert_eq!(run(&mut p, |_| false, |_| false), "ac");
        p.reset();
        assert_eq!(run(&mut p, |_| true, |_| false), "abc");
    }

    #[test]
    fn repeats_exited_section() {
        let prog = program(vec![open("s"), Instr::text("x"), close("s")], vec![]);
        let mut p = Processor::new(&prog);
        let mut n = 0;
        let out = run(
            &mut p,
            |_| true,
            |_| {
                n += 1;
                n < 3
            },
        );
        assert_eq!(out, "xxx");
    }

    #[test]
    fn inlines_partials_with_indentation() {
        let prog = program(
            vec![Instr::text("a\n"), partial("p", "  "), Instr::text("z")],
            vec![
                ("p", vec![Instr::text("1\n2\n"), partial("q", "> ")]),
                ("q", vec![Instr::text("3\n4\n")]),
            ],
        );
        let mut p = Processor::new(&prog);
        assert_eq!(run(&mut p, |_| true, |_| true), "a\n1\n  2\n3\n  > 4\nz");
    }

    #[test]
    fn indentation_follows_frames() {
        let prog = program(
            vec![partial("p", " "), Instr::AppendVariable { name: q("v") }],
            vec![("p", vec![Instr::AppendVariable { name: q("w") }])],
        );
        let mut p = Processor::new(&prog);
        p.next().unwrap();
        assert_eq!(p.indentation(), " ");
        assert_eq!(p.depth(), 1);
        p.next().unwrap();
        assert_eq!(p.indentation(), "");
        assert_eq!(p.depth(), 0);
        assert!(!p.has_next());
    }

    #[test]
    fn unknown_partial_is_self_reference() {
        let prog = program(
            vec![open("s"), Instr::text("x"), partial("nope", ""), close("s")],
            vec![],
        );
        let mut p = Processor::new(&prog);
        let mut depth = 0;
        let out = run(
            &mut p,
            |_| {
                depth += 1;
                depth <= 3
            },
            |_| false,
        );
        assert_eq!(out, "xxx");
    }

    #[test]
    fn partial_depth_limit() {
        let prog = program(vec![partial("p", "")], vec![("p", vec![partial("p", "")])]);
        let mut p = Processor::new(&prog).with_max_depth(8);
        let err = p.next().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::RecursionLimit);
        assert_eq!(
            err.to_string(),
            "reached maximum partial depth (8) in partial `p`"
        );
    }

    #[test]
    fn contract_violations() {
        let prog = program(vec![Instr::text("x")], vec![]);
        let mut p = Processor::new(&prog);
        assert!(p.enter_section().is_err());
        assert!(p.exit_section().is_err());
        p.next().unwrap();
        assert!(!p.has_next());
        let err = p.next().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ContractViolation);
    }

    #[test]
    fn indent_text_inner_breaks() {
        assert_eq!(indent_text("a\r\nb\rc\n", "--"), "a\r\n--b\r--c\n");
        assert_eq!(indent_text("\n\n", "-"), "\n-\n");
        assert_eq!(indent_text("abc", "-"), "abc");
    }
}
