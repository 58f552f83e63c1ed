//! Defines a compiled [`Program`] which is a sequence of [`Instr`] plus the
//! compiled partials it references.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::query::Query;

/// Placeholder for a jump target that the sequencer has not resolved yet.
pub const FIXME: usize = !0;

/// A single instruction.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum Instr {
    /// Emit literal template text
    AppendText { text: String },

    /// Emit an escaped variable
    AppendVariable { name: Query },

    /// Emit a variable as is
    AppendUnescapedVariable { name: Query },

    /// Open a section, `close` is the index of the matching close
    OpenSection {
        name: Query,
        #[cfg_attr(feature = "serde", serde(skip, default = "fixme"))]
        close: usize,
    },

    /// Open an inverted section, `close` is the index of the matching close
    OpenInvertedSection {
        name: Query,
        #[cfg_attr(feature = "serde", serde(skip, default = "fixme"))]
        close: usize,
    },

    /// Close a section, `open` is the index of the matching open
    CloseSection {
        name: Query,
        #[cfg_attr(feature = "serde", serde(skip, default = "fixme"))]
        open: usize,
    },

    /// Render the named partial, indenting each of its lines
    EnterPartial { name: String, indentation: String },
}

#[cfg(feature = "serde")]
fn fixme() -> usize {
    FIXME
}

/// A processable sequence of instructions.
///
/// Only the sequencer constructs this, which guarantees that it is not empty
/// and that every section is closed with all jump targets resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct Sequence {
    instrs: Vec<Instr>,
}

/// A compiled template.
///
/// Holds the main instruction sequence and every partial it references,
/// directly or through other partials, compiled once by name. A `Program` is
/// immutable and can be rendered from many threads at once.
#[derive(Clone, PartialEq, Eq)]
pub struct Program {
    pub(crate) source: String,
    pub(crate) main: Sequence,
    pub(crate) partials: BTreeMap<String, Sequence>,
}

impl Instr {
    pub fn text(text: impl Into<String>) -> Self {
        Self::AppendText { text: text.into() }
    }

    /// The section name if this instruction opens or closes a section.
    pub fn section(&self) -> Option<&Query> {
        match self {
            Self::OpenSection { name, .. }
            | Self::OpenInvertedSection { name, .. }
            | Self::CloseSection { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppendText { text } => write!(f, "AppendText({text:?})"),
            Self::AppendVariable { name } => write!(f, "AppendVariable({name})"),
            Self::AppendUnescapedVariable { name } => {
                write!(f, "AppendUnescapedVariable({name})")
            }
            Self::OpenSection { name, close } => write!(f, "OpenSection({name}, {close})"),
            Self::OpenInvertedSection { name, close } => {
                write!(f, "OpenInvertedSection({name}, {close})")
            }
            Self::CloseSection { name, open } => write!(f, "CloseSection({name}, {open})"),
            Self::EnterPartial { name, indentation } => {
                write!(f, "EnterPartial({name:?}, {indentation:?})")
            }
        }
    }
}

impl Sequence {
    pub(crate) fn new_unchecked(instrs: Vec<Instr>) -> Self {
        debug_assert!(!instrs.is_empty());
        Self { instrs }
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn get(&self, i: usize) -> Option<&Instr> {
        self.instrs.get(i)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.instrs).finish()
    }
}

impl Program {
    /// Returns the original template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the names of all partials compiled into this program.
    pub fn partial_names(&self) -> impl Iterator<Item = &str> {
        self.partials.keys().map(String::as_str)
    }

    pub(crate) fn partial(&self, name: &str) -> Option<&Sequence> {
        self.partials.get(name)
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("main", &self.main)
            .field("partials", &self.partials)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "serde")]
mod ser {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Serialize};

    use super::{Instr, Program, Sequence};
    use crate::compile::Sequencer;
    use crate::Error;

    #[derive(Serialize)]
    struct ProgramRef<'a> {
        source: &'a str,
        main: &'a [Instr],
        partials: BTreeMap<&'a str, &'a [Instr]>,
    }

    #[derive(Deserialize)]
    struct RawProgram {
        #[serde(default)]
        source: String,
        main: Vec<Instr>,
        #[serde(default)]
        partials: BTreeMap<String, Vec<Instr>>,
    }

    impl Serialize for Program {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            ProgramRef {
                source: &self.source,
                main: self.main.instrs(),
                partials: self
                    .partials
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.instrs()))
                    .collect(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Program {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let raw = RawProgram::deserialize(deserializer)?;
            Program::try_from(raw).map_err(D::Error::custom)
        }
    }

    impl TryFrom<RawProgram> for Program {
        type Error = Error;

        fn try_from(raw: RawProgram) -> Result<Self, Self::Error> {
            // Never trust the serialized jump targets, sequence everything
            // again so the indices are recomputed and validated.
            let resequence = |instrs: Vec<Instr>| -> Result<Sequence, Error> {
                let mut seq = Sequencer::new();
                seq.extend(instrs)?;
                seq.finish()
            };
            let main = resequence(raw.main)?;
            let partials = raw
                .partials
                .into_iter()
                .map(|(name, instrs)| {
                    let seq = resequence(instrs).map_err(|e| e.with_template_name(&name))?;
                    Ok((name, seq))
                })
                .collect::<Result<_, Error>>()?;
            Ok(Program {
                source: raw.source,
                main,
                partials,
            })
        }
    }
}
