use anyhow::Result;
use std::io::BufRead;

use super::{LineReader, SeqRecord};

/// Multi-line FASTA reader. Text before the first `>` is ignored.
pub struct FastaReader<R: BufRead> {
    lines: LineReader<R>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: LineReader::new(reader) }
    }

    /// Fill `rec` with the next record; `false` at end of input.
    ///
    /// Sequence lines are joined with all whitespace removed. Case is kept;
    /// the packer folds it.
    pub fn read_into(&mut self, rec: &mut SeqRecord) -> Result<bool> {
        loop {
            if !self.lines.advance()? {
                return Ok(false);
            }
            if self.lines.line().first() == Some(&b'>') {
                break;
            }
        }
        rec.set_header(&self.lines.line()[1..]);
        rec.seq.clear();
        rec.qual = None;

        while self.lines.advance()? {
            let line = self.lines.line();
            if line.first() == Some(&b'>') {
                self.lines.hold();
                break;
            }
            rec.seq.extend(line.iter().copied().filter(|b| !b.is_ascii_whitespace()));
        }
        Ok(true)
    }
}
