//! Compile a template into a program that can be executed by the renderer.
//!
//! This process has three stages:
//! - The lexer splits each line of the source into literal text and tags.
//! - The parser classifies the tags, applies the standalone line rule, and
//!   compiles every referenced partial.
//! - The sequencer validates the instructions and resolves the jump target of
//!   every section.

mod lex;
mod lines;
mod parse;
mod sequence;
mod tag;

pub use crate::compile::sequence::Sequencer;

use crate::compile::parse::{Parser, Partials};
use crate::types::program::{Instr, Program, Sequence};
use crate::{Engine, Result};

/// Compile a template into a program.
///
/// A named template may include itself as a partial.
pub fn template(engine: &Engine, name: Option<&str>, source: &str) -> Result<Program> {
    log::debug!("compiling template ({} bytes)", source.len());
    let mut partials = match name {
        Some(name) => Partials::with_root(name),
        None => Partials::default(),
    };
    let main = Parser::new(engine, source, &mut partials).parse()?;
    let mut partials = partials.compiled;
    if let Some(name) = name {
        if includes(&main, name) || partials.values().any(|seq| includes(seq, name)) {
            partials.insert(name.to_owned(), main.clone());
        }
    }
    Ok(Program {
        source: source.to_owned(),
        main,
        partials,
    })
}

fn includes(seq: &Sequence, name: &str) -> bool {
    seq.instrs()
        .iter()
        .any(|instr| matches!(instr, Instr::EnterPartial { name: n, .. } if n == name))
}
