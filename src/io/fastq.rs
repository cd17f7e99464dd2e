use anyhow::{bail, Result};
use std::io::BufRead;

use super::{LineReader, SeqRecord};

/// Four-line FASTQ reader; sequence and quality must each fit on one line.
pub struct FastqReader<R: BufRead> {
    lines: LineReader<R>,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: LineReader::new(reader) }
    }

    fn expect_line(&mut self, id: &str, what: &str) -> Result<()> {
        if !self.lines.advance()? {
            bail!("FASTQ record '{}': input ends before the {} line", id, what);
        }
        Ok(())
    }

    /// Fill `rec` with the next record; `false` at end of input.
    pub fn read_into(&mut self, rec: &mut SeqRecord) -> Result<bool> {
        // blank lines between records are skipped
        loop {
            if !self.lines.advance()? {
                return Ok(false);
            }
            if !self.lines.line().iter().all(u8::is_ascii_whitespace) {
                break;
            }
        }
        let header = self.lines.line();
        if header.first() != Some(&b'@') {
            bail!("FASTQ header not starting with '@'");
        }
        rec.set_header(&header[1..]);

        self.expect_line(&rec.id, "sequence")?;
        rec.seq.clear();
        rec.seq.extend_from_slice(self.lines.line());

        self.expect_line(&rec.id, "'+'")?;
        if self.lines.line().first() != Some(&b'+') {
            bail!("FASTQ record '{}': missing '+' line", rec.id);
        }

        self.expect_line(&rec.id, "quality")?;
        let qual = rec.qual.get_or_insert_with(Vec::new);
        qual.clear();
        qual.extend_from_slice(self.lines.line());
        if qual.len() != rec.seq.len() {
            bail!(
                "FASTQ record '{}': {} bases but {} quality values",
                rec.id,
                rec.seq.len(),
                qual.len()
            );
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_records_with_blank_separator() {
        let data = b"@r1 lane=1\nACGT\n+\nIIII\n\n@r2\r\nGG\r\n+r2\r\n##\r\n";
        let mut r = FastqReader::new(Cursor::new(&data[..]));
        let mut rec = SeqRecord::default();

        assert!(r.read_into(&mut rec).unwrap());
        assert_eq!(rec.id, "r1");
        assert_eq!(rec.desc.as_deref(), Some("lane=1"));
        assert_eq!(rec.seq, b"ACGT");
        assert_eq!(rec.qual.as_deref(), Some(&b"IIII"[..]));

        assert!(r.read_into(&mut rec).unwrap());
        assert_eq!(rec.id, "r2");
        assert_eq!(rec.desc, None);
        assert_eq!(rec.seq, b"GG");
        assert_eq!(rec.qual.as_deref(), Some(&b"##"[..]));

        assert!(!r.read_into(&mut rec).unwrap());
    }

    #[test]
    fn truncated_record_names_the_read() {
        let mut r = FastqReader::new(Cursor::new(&b"@r1\nACGT\n"[..]));
        let err = r.read_into(&mut SeqRecord::default()).unwrap_err();
        assert!(err.to_string().contains("'r1'"), "{}", err);
    }

    #[test]
    fn rejects_bad_header_and_length_mismatch() {
        let mut r = FastqReader::new(Cursor::new(&b">r1\nACGT\n+\nIIII\n"[..]));
        assert!(r.read_into(&mut SeqRecord::default()).is_err());

        let mut r = FastqReader::new(Cursor::new(&b"@r1\nACGT\n+\nII\n"[..]));
        assert!(r.read_into(&mut SeqRecord::default()).is_err());
    }
}
