use crate::types::program::{Instr, Sequence, FIXME};
use crate::types::query::Query;
use crate::{Error, ErrorKind, Result};

/// Accumulates instructions into a flat [`Sequence`], resolving the jump
/// target of every section as soon as it is closed.
#[derive(Debug, Default)]
pub struct Sequencer {
    instrs: Vec<Instr>,

    /// The name and index of each section that is currently open.
    open: Vec<(Query, usize)>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single instruction.
    ///
    /// Closing a section that does not match the innermost open section is
    /// an error and leaves the sequencer unchanged.
    pub fn push(&mut self, instr: Instr) -> Result<usize> {
        let i = self.instrs.len();
        match instr {
            Instr::OpenSection { name, .. } => {
                self.open.push((name.clone(), i));
                self.instrs.push(Instr::OpenSection { name, close: FIXME });
            }
            Instr::OpenInvertedSection { name, .. } => {
                self.open.push((name.clone(), i));
                self.instrs
                    .push(Instr::OpenInvertedSection { name, close: FIXME });
            }
            Instr::CloseSection { name, .. } => {
                let open = self.close(&name, i)?;
                self.instrs.push(Instr::CloseSection { name, open });
            }
            instr => self.instrs.push(instr),
        }
        Ok(i)
    }

    /// Appends many instructions.
    ///
    /// Either every instruction is appended or, on error, none of them are.
    pub fn extend<I>(&mut self, instrs: I) -> Result<()>
    where
        I: IntoIterator<Item = Instr>,
    {
        let len = self.instrs.len();
        let open = self.open.clone();
        for instr in instrs {
            if let Err(err) = self.push(instr) {
                self.rollback(len, open);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Whether the sequence can be executed: it is not empty and every
    /// section has been closed.
    pub fn is_processable(&self) -> bool {
        !self.instrs.is_empty() && self.depth() == 0
    }

    /// The number of sections that are currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// The innermost open section, if any.
    pub fn current(&self) -> Option<&Query> {
        self.open.last().map(|(name, _)| name)
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Returns the finished sequence.
    pub fn finish(self) -> Result<Sequence> {
        if !self.is_processable() {
            let msg = match self.current() {
                Some(name) => format!("sequence is not processable, section `{name}` is never closed"),
                None => String::from("sequence is not processable, it is empty"),
            };
            return Err(Error::contract(msg));
        }
        Ok(Sequence::new_unchecked(self.instrs))
    }

    /// Pops the innermost open section, patching its jump target to `close`
    /// and returning its index.
    fn close(&mut self, name: &Query, close: usize) -> Result<usize> {
        let open = match self.open.last() {
            Some((expected, _)) if expected != name => {
                return Err(Error::new(
                    ErrorKind::SectionMismatch,
                    format!("expected `{{{{/{expected}}}}}` but found `{{{{/{name}}}}}`"),
                ));
            }
            Some(&(_, open)) => open,
            None => {
                return Err(Error::new(
                    ErrorKind::SectionMismatch,
                    format!("unexpected `{{{{/{name}}}}}`, no section is open"),
                ));
            }
        };
        self.open.pop();
        match &mut self.instrs[open] {
            Instr::OpenSection { close: j, .. } | Instr::OpenInvertedSection { close: j, .. } => {
                *j = close;
            }
            _ => unreachable!("open section index does not point at an open instruction"),
        }
        Ok(open)
    }

    fn rollback(&mut self, len: usize, open: Vec<(Query, usize)>) {
        self.instrs.truncate(len);
        self.open = open;
        // Sections opened before the rollback point may have been closed by a
        // later instruction, reset their jump targets.
        for &(_, i) in &self.open {
            if let Instr::OpenSection { close, .. } | Instr::OpenInvertedSection { close, .. } =
                &mut self.instrs[i]
            {
                *close = FIXME;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Query {
        Query::parse(s).unwrap()
    }

    fn open(s: &str) -> Instr {
        Instr::OpenSection {
            name: q(s),
            close: FIXME,
        }
    }

    fn close(s: &str) -> Instr {
        Instr::CloseSection {
            name: q(s),
            open: FIXME,
        }
    }

    #[test]
    fn sequencer_resolves_jumps() {
        let mut seq = Sequencer::new();
        seq.extend([
            open("a"),
            Instr::text("x"),
            Instr::OpenInvertedSection {
                name: q("b"),
                close: FIXME,
            },
            close("b"),
            close("a"),
        ])
        .unwrap();
        let seq = seq.finish().unwrap();
        assert_eq!(
            format!("{seq:?}"),
            r#"[OpenSection(a, 4), AppendText("x"), OpenInvertedSection(b, 3), CloseSection(b, 2), CloseSection(a, 0)]"#
        );
    }

    #[test]
    fn sequencer_mismatch() {
        let mut seq = Sequencer::new();
        seq.push(open("a")).unwrap();
        let err = seq.push(close("b")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SectionMismatch);
        assert_eq!(err.to_string(), "expected `{{/a}}` but found `{{/b}}`");
        assert_eq!(seq.depth(), 1);
    }

    #[test]
    fn sequencer_close_without_open() {
        let mut seq = Sequencer::new();
        let err = seq.push(close("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SectionMismatch);
        assert!(seq.is_empty());
    }

    #[test]
    fn sequencer_extend_is_all_or_nothing() {
        let mut seq = Sequencer::new();
        seq.push(open("a")).unwrap();
        let err = seq
            .extend([Instr::text("x"), close("a"), close("a")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SectionMismatch);
        assert_eq!(seq.depth(), 1);
        assert!(!seq.is_processable());
        seq.extend([close("a")]).unwrap();
        let seq = seq.finish().unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(
            seq.get(0),
            Some(&Instr::OpenSection {
                name: q("a"),
                close: 1
            })
        );
    }

    #[test]
    fn sequencer_not_processable() {
        let err = Sequencer::new().finish().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);

        let mut seq = Sequencer::new();
        seq.push(open("a")).unwrap();
        assert!(!seq.is_processable());
        let err = seq.finish().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
    }
}
