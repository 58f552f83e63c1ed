use crate::types::span::Span;

/// The pair of strings that begin and end a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

/// The delimiters of an unescaped variable tag, always recognized.
pub const UNESCAPED_OPEN: &str = "{{{";
pub const UNESCAPED_CLOSE: &str = "}}}";

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// A tokenizer that splits one line at a time into literal text and tags.
///
/// The lexer keeps the active delimiters and whether it is currently inside
/// a tag between calls, so a tag that is not closed by the end of a line is
/// continued on the next one. Whether that is allowed is up to the caller,
/// see [`.is_inside_tag()`][Lexer::is_inside_tag].
#[derive(Debug, Default)]
pub struct Lexer {
    delims: Delimiters,
    state: State,
}

#[derive(Debug, Default, Clone, Copy)]
enum State {
    /// Scanning literal text for the next tag.
    #[default]
    Text,

    /// Inside a tag body.
    Tag {
        /// Whether this is a `{{{ }}}` tag.
        unescaped: bool,
        /// The offset of the opening delimiter.
        start: usize,
        /// The offset just after the opening delimiter.
        body: usize,
    },
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    /// Literal template text.
    Text(Span),

    /// A complete tag.
    Tag {
        /// Whether the tag used the unescaped delimiters.
        unescaped: bool,
        /// The text between the delimiters.
        body: Span,
        /// The whole tag including delimiters.
        span: Span,
    },
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_delimiters(&mut self, delims: Delimiters) {
        self.delims = delims;
    }

    /// Whether a tag was opened but not yet closed.
    pub fn is_inside_tag(&self) -> bool {
        matches!(self.state, State::Tag { .. })
    }

    /// The offset of the opening delimiter of the unclosed tag, if any.
    pub fn tag_start(&self) -> Option<usize> {
        match self.state {
            State::Tag { start, .. } => Some(start),
            State::Text => None,
        }
    }

    /// The body of the unclosed tag so far, if any.
    pub fn partial_body(&self, end: usize) -> Option<Span> {
        match self.state {
            State::Tag { body, .. } => Some(Span::from(body..end)),
            State::Text => None,
        }
    }

    /// Lexes `line` from byte position `pos`.
    ///
    /// `offset` is the position of the line in the template source, all
    /// spans are relative to the source. Returns the position to continue
    /// from and the piece that was completed, if any. The line is finished
    /// once the returned position equals the line length.
    pub fn parse(&mut self, line: &str, offset: usize, pos: usize) -> (usize, Option<Piece>) {
        match self.state {
            State::Text => self.parse_text(line, offset, pos),
            State::Tag {
                unescaped,
                start,
                body,
            } => {
                let close = if unescaped {
                    UNESCAPED_CLOSE
                } else {
                    self.delims.close.as_str()
                };
                match line[pos..].find(close) {
                    Some(j) => {
                        let j = pos + j;
                        let k = j + close.len();
                        self.state = State::Text;
                        let piece = Piece::Tag {
                            unescaped,
                            body: Span::from(body..offset + j),
                            span: Span::from(start..offset + k),
                        };
                        (k, Some(piece))
                    }
                    None => (line.len(), None),
                }
            }
        }
    }

    fn parse_text(&mut self, line: &str, offset: usize, pos: usize) -> (usize, Option<Piece>) {
        // xxxxxxx{{xxxxxxxxx
        //    ^   ^
        //  pos   j
        let rest = &line[pos..];
        let active = rest.find(self.delims.open.as_str());
        let unescaped = rest.find(UNESCAPED_OPEN);

        let found = match (active, unescaped) {
            (Some(a), Some(u)) if a < u => Some((a, false)),
            (Some(a), Some(u)) if a == u => {
                // On a tie the unescaped pair wins unless the active opener
                // is the longer one.
                Some((a, self.delims.open.len() <= UNESCAPED_OPEN.len()))
            }
            (_, Some(u)) => Some((u, true)),
            (Some(a), None) => Some((a, false)),
            (None, None) => None,
        };

        match found {
            Some((0, unescaped)) => {
                let open = if unescaped {
                    UNESCAPED_OPEN.len()
                } else {
                    self.delims.open.len()
                };
                self.state = State::Tag {
                    unescaped,
                    start: offset + pos,
                    body: offset + pos + open,
                };
                (pos + open, None)
            }
            Some((j, _)) => {
                let j = pos + j;
                (j, Some(Piece::Text(Span::from(offset + pos..offset + j))))
            }
            None if rest.is_empty() => (line.len(), None),
            None => (
                line.len(),
                Some(Piece::Text(Span::from(offset + pos..offset + line.len()))),
            ),
        }
    }
}
