use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use crate::compile::lex::{Lexer, Piece};
use crate::compile::lines::Lines;
use crate::compile::sequence::Sequencer;
use crate::compile::tag::Tag;
use crate::types::program::{Instr, Sequence, FIXME};
use crate::types::span::Span;
use crate::{Engine, Error, ErrorKind, Result};

/// The partials compiled during one top level parse.
#[derive(Default)]
pub struct Partials {
    pub compiled: BTreeMap<String, Sequence>,

    /// Partials that are currently being parsed further up the call stack.
    in_progress: BTreeSet<String>,
}

impl Partials {
    /// Treats `name` as being compiled so that references to it from the
    /// template itself or its partials are not loaded again.
    pub fn with_root(name: &str) -> Self {
        let mut partials = Self::default();
        partials.in_progress.insert(name.to_owned());
        partials
    }
}

/// A parser that drives the lexer over the source one line at a time and
/// feeds the classified tags to a [`Sequencer`].
///
/// Each template, including every partial, is parsed by its own parser so
/// that delimiter changes never leak between templates.
pub struct Parser<'engine, 'source, 'p> {
    engine: &'engine Engine,

    /// The original template source.
    source: &'source str,

    lexer: Lexer,

    seq: Sequencer,

    /// The partials compiled so far, shared with nested parsers.
    partials: &'p mut Partials,

    /// The pieces of the current logical line.
    line: Vec<Item>,

    /// Literal text that has not been pushed to the sequencer yet.
    text: String,

    /// The spans of the section tags opened and not yet closed.
    opens: Vec<Span>,
}

/// A classified piece of a line.
enum Item {
    Text(Span),
    Tag(Tag, Span),
}

impl<'engine, 'source, 'p> Parser<'engine, 'source, 'p> {
    pub fn new(engine: &'engine Engine, source: &'source str, partials: &'p mut Partials) -> Self {
        Self {
            engine,
            source,
            lexer: Lexer::new(),
            seq: Sequencer::new(),
            partials,
            line: Vec::new(),
            text: String::new(),
            opens: Vec::new(),
        }
    }

    /// Parses the entire template into a processable sequence.
    pub fn parse(mut self) -> Result<Sequence> {
        for (offset, line) in Lines::new(self.source) {
            let mut pos = 0;
            while pos < line.len() {
                let (next, piece) = self.lexer.parse(line, offset, pos);
                if let Some(piece) = piece {
                    self.push_piece(piece)?;
                }
                pos = next;
            }

            if self.lexer.is_inside_tag() {
                // Only comments may span multiple lines, otherwise the tag
                // is missing its closing delimiter.
                let body = self.lexer.partial_body(offset + line.len());
                if !body.map_or(false, |b| self.source[b].trim_start().starts_with('!')) {
                    let m = self.lexer.tag_start().unwrap_or(offset);
                    let n = offset + line.trim_end_matches(['\n', '\r']).len();
                    return Err(self.err_unterminated_tag(Span::new(m, n.max(m))));
                }
                continue;
            }

            self.flush_line()?;
        }

        if let Some(m) = self.lexer.tag_start() {
            return Err(self.err_unterminated_tag(m..self.source.len()));
        }
        self.flush_line()?;
        self.flush_text()?;

        if let Some(span) = self.opens.last() {
            let name = self.seq.current().map(|q| q.to_string()).unwrap_or_default();
            return Err(Error::new(
                ErrorKind::SectionMismatch,
                format!("unclosed section `{name}`"),
            )
            .with_span(self.source, *span));
        }

        if self.seq.is_empty() {
            self.seq.push(Instr::text(""))?;
        }
        self.seq.finish()
    }

    /// Classifies a piece as soon as the lexer yields it.
    ///
    /// Delimiter changes must take effect immediately since they change how
    /// the rest of the line is lexed.
    fn push_piece(&mut self, piece: Piece) -> Result<()> {
        match piece {
            Piece::Text(span) => self.line.push(Item::Text(span)),
            Piece::Tag {
                unescaped,
                body,
                span,
            } => {
                let tag = Tag::classify(self.source, unescaped, body, span)?;
                match &tag {
                    Tag::Open(_) | Tag::OpenInverted(_) => self.opens.push(span),
                    Tag::Close(_) => {
                        self.opens.pop();
                    }
                    Tag::Delimiters(delims) => {
                        if !self.opens.is_empty() {
                            return Err(Error::syntax(
                                "cannot change delimiters inside a section",
                                self.source,
                                span,
                            ));
                        }
                        self.lexer.set_delimiters(delims.clone());
                    }
                    _ => {}
                }
                self.line.push(Item::Tag(tag, span));
            }
        }
        Ok(())
    }

    /// Emits the current logical line, applying the standalone rule.
    fn flush_line(&mut self) -> Result<()> {
        let items = mem::take(&mut self.line);
        let source = self.source;

        if let Some(i) = self.standalone(&items) {
            let indentation = match &items[..i] {
                [Item::Text(span)] => &source[*span],
                _ => "",
            };
            if let Item::Tag(tag, span) = &items[i] {
                self.push_tag(tag.clone(), *span, indentation)?;
            }
            return Ok(());
        }

        for item in items {
            match item {
                Item::Text(span) => self.text.push_str(&source[span]),
                Item::Tag(tag, span) => self.push_tag(tag, span, "")?,
            }
        }
        Ok(())
    }

    /// Returns the index of the tag if the line consists of exactly one tag
    /// that can stand alone and otherwise only whitespace.
    fn standalone(&self, items: &[Item]) -> Option<usize> {
        let mut tag = None;
        for (i, item) in items.iter().enumerate() {
            match item {
                Item::Tag(t, _) if tag.is_none() && t.can_be_standalone() => tag = Some(i),
                Item::Tag(..) => return None,
                Item::Text(span) if is_blank(&self.source[*span]) => {}
                Item::Text(_) => return None,
            }
        }
        tag
    }

    fn push_tag(&mut self, tag: Tag, span: Span, indentation: &str) -> Result<()> {
        let instr = match tag {
            Tag::Variable(name) => Instr::AppendVariable { name },
            Tag::Unescaped(name) => Instr::AppendUnescapedVariable { name },
            Tag::Open(name) => Instr::OpenSection { name, close: FIXME },
            Tag::OpenInverted(name) => Instr::OpenInvertedSection { name, close: FIXME },
            Tag::Close(name) => Instr::CloseSection { name, open: FIXME },
            Tag::Partial(name) => {
                self.flush_text()?;
                self.compile_partial(&name, span)?;
                Instr::EnterPartial {
                    name,
                    indentation: indentation.to_owned(),
                }
            }
            Tag::Delimiters(_) | Tag::Comment => return Ok(()),
        };
        self.flush_text()?;
        self.seq
            .push(instr)
            .map_err(|e| e.with_span(self.source, span))?;
        Ok(())
    }

    fn flush_text(&mut self) -> Result<()> {
        if !self.text.is_empty() {
            let text = mem::take(&mut self.text);
            self.seq.push(Instr::AppendText { text })?;
        }
        Ok(())
    }

    /// Compiles the named partial, unless it is already compiled or being
    /// compiled.
    fn compile_partial(&mut self, name: &str, span: Span) -> Result<()> {
        if self.partials.compiled.contains_key(name) || self.partials.in_progress.contains(name) {
            return Ok(());
        }
        let source = self
            .engine
            .load_partial(name)
            .map_err(|e| e.with_span(self.source, span))?;

        log::debug!("compiling partial `{name}`");
        self.partials.in_progress.insert(name.to_owned());
        let result = Parser::new(self.engine, &source, &mut *self.partials).parse();
        self.partials.in_progress.remove(name);

        let seq = result.map_err(|e| e.with_template_name(name))?;
        self.partials.compiled.insert(name.to_owned(), seq);
        Ok(())
    }

    fn err_unterminated_tag(&self, span: impl Into<Span>) -> Error {
        Error::syntax("unterminated tag", self.source, span)
    }
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<String> {
        let engine = Engine::new();
        let mut partials = Partials::default();
        let seq = Parser::new(&engine, source, &mut partials).parse()?;
        Ok(format!("{seq:?}"))
    }

    #[test]
    fn parse_text_is_coalesced() {
        assert_eq!(
            parse("a\nb {{! c }} d\r\ne").unwrap(),
            r#"[AppendText("a\nb  d\r\ne")]"#
        );
    }

    #[test]
    fn parse_empty_source() {
        assert_eq!(parse("").unwrap(), r#"[AppendText("")]"#);
        assert_eq!(parse("{{! only a comment }}").unwrap(), r#"[AppendText("")]"#);
    }

    #[test]
    fn parse_standalone_section() {
        assert_eq!(
            parse("| x\n  {{#a}}  \r\n|{{b}}\n{{/a}}\n").unwrap(),
            r#"[AppendText("| x\n"), OpenSection(a, 5), AppendText("|"), AppendVariable(b), AppendText("\n"), CloseSection(a, 1)]"#
        );
    }

    #[test]
    fn parse_not_standalone() {
        assert_eq!(
            parse(" {{#a}}{{/a}} \n").unwrap(),
            r#"[AppendText(" "), OpenSection(a, 2), CloseSection(a, 1), AppendText(" \n")]"#
        );
        assert_eq!(
            parse("  {{a}}\n").unwrap(),
            r#"[AppendText("  "), AppendVariable(a), AppendText("\n")]"#
        );
    }

    #[test]
    fn parse_multiline_comment_is_standalone() {
        assert_eq!(
            parse("a\n  {{! one\ntwo }}\nb").unwrap(),
            r#"[AppendText("a\nb")]"#
        );
    }

    #[test]
    fn parse_delimiters_change() {
        assert_eq!(
            parse("{{=<% %>=}}\n<%a%>{{b}}").unwrap(),
            r#"[AppendVariable(a), AppendText("{{b}}")]"#
        );
    }

    #[test]
    fn parse_err_unterminated_tag() {
        let err = parse("lorem\n ipsum {{ dolor\n}}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(
            format!("{err:#}"),
            "
   |
 2 |  ipsum {{ dolor
   |        ^^^^^^^^ unterminated tag
"
        );

        let err = parse("{{! never closed").unwrap_err();
        assert_eq!(err.to_string(), "unterminated tag at line 1 column 1");
    }

    #[test]
    fn parse_err_unclosed_section() {
        let err = parse("{{#a}}{{#b}}{{/b}}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SectionMismatch);
        assert_eq!(err.to_string(), "unclosed section `a` at line 1 column 1");
    }

    #[test]
    fn parse_err_delimiters_in_section() {
        let err = parse("{{#a}}\n{{=<% %>=}}\n{{/a}}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot change delimiters inside a section at line 2 column 1"
        );
    }

    #[test]
    fn parse_err_unknown_partial() {
        let err = parse("x {{> missing }}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialNotFound);
        assert_eq!(
            err.to_string(),
            "unknown partial `missing` at line 1 column 3"
        );
    }
}
