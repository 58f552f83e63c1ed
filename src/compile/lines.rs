/// An iterator over the lines of a template source.
///
/// `\n`, `\r\n` and a lone `\r` each terminate a line. Each item is the byte
/// offset of the line in the source and the line itself *including* its
/// terminator. A final line without a terminator is still yielded.
pub struct Lines<'source> {
    source: &'source str,
    cursor: usize,
}

impl<'source> Lines<'source> {
    pub fn new(source: &'source str) -> Self {
        Self { source, cursor: 0 }
    }
}

impl<'source> Iterator for Lines<'source> {
    type Item = (usize, &'source str);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.cursor;
        let rest = &self.source[i..];
        if rest.is_empty() {
            return None;
        }
        let n = match rest.find(['\n', '\r']) {
            Some(j) if rest[j..].starts_with("\r\n") => j + 2,
            Some(j) => j + 1,
            None => rest.len(),
        };
        self.cursor += n;
        Some((i, &rest[..n]))
    }
}
