use crate::compile::lex::{Delimiters, UNESCAPED_CLOSE, UNESCAPED_OPEN};
use crate::types::query::Query;
use crate::types::span::Span;
use crate::{Error, Result};

/// A classified tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// `{{name}}`
    Variable(Query),
    /// `{{&name}}` or `{{{name}}}`
    Unescaped(Query),
    /// `{{#name}}`
    Open(Query),
    /// `{{^name}}`
    OpenInverted(Query),
    /// `{{/name}}`
    Close(Query),
    /// `{{>name}}`
    Partial(String),
    /// `{{=<% %>=}}`
    Delimiters(Delimiters),
    /// `{{! ... }}`
    Comment,
}

impl Tag {
    /// Classifies the tag at `span` whose body (the text between the
    /// delimiters) is at `body`.
    pub fn classify(source: &str, unescaped: bool, body: Span, span: Span) -> Result<Self> {
        let raw = source[body].trim();

        if unescaped {
            return parse_query(raw, source, span).map(Self::Unescaped);
        }

        let mut chars = raw.chars();
        let (token, content) = match chars.next() {
            Some(c @ ('&' | '#' | '^' | '/' | '>' | '=' | '!')) => (Some(c), chars.as_str()),
            _ => (None, raw),
        };

        let tag = match token {
            None => Self::Variable(parse_query(content, source, span)?),
            Some('&') => Self::Unescaped(parse_query(content.trim(), source, span)?),
            Some('#') => Self::Open(parse_query(content.trim(), source, span)?),
            Some('^') => Self::OpenInverted(parse_query(content.trim(), source, span)?),
            Some('/') => Self::Close(parse_query(content.trim(), source, span)?),
            Some('>') => {
                let name = content.trim();
                if name.is_empty() {
                    return Err(Error::syntax("expected partial name", source, span));
                }
                Self::Partial(name.to_owned())
            }
            Some('=') => Self::Delimiters(parse_delimiters(content, source, span)?),
            Some('!') => Self::Comment,
            Some(_) => unreachable!(),
        };
        Ok(tag)
    }

    /// Whether the tag may stand alone on a line, in which case the line's
    /// surrounding whitespace is removed from the output.
    pub fn can_be_standalone(&self) -> bool {
        !matches!(self, Self::Variable(_) | Self::Unescaped(_))
    }
}

fn parse_query(raw: &str, source: &str, span: Span) -> Result<Query> {
    if raw.is_empty() {
        return Err(Error::syntax("empty tag", source, span));
    }
    Query::parse(raw)
        .ok_or_else(|| Error::syntax(format!("invalid tag content `{raw}`"), source, span))
}

/// Parses the part of a `{{=<% %>=}}` tag after the first `=`.
fn parse_delimiters(content: &str, source: &str, span: Span) -> Result<Delimiters> {
    let err = || {
        Error::syntax(
            format!("invalid delimiter directive `={content}`"),
            source,
            span,
        )
    };
    let inner = content.strip_suffix('=').ok_or_else(err)?;
    let mut parts = inner.split_whitespace();
    let (open, close) = match (parts.next(), parts.next(), parts.next()) {
        (Some(open), Some(close), None) => (open, close),
        _ => return Err(err()),
    };
    if open.contains('=') || close.contains('=') {
        return Err(err());
    }
    if open == UNESCAPED_OPEN || close == UNESCAPED_CLOSE {
        return Err(Error::syntax(
            format!("delimiters may not be `{UNESCAPED_OPEN}` or `{UNESCAPED_CLOSE}`"),
            source,
            span,
        ));
    }
    Ok(Delimiters::new(open, close))
}
