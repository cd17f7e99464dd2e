//! FASTA / FASTQ record readers.
//!
//! Both formats fill the same [`SeqRecord`]. Readers write into a caller-owned
//! record so its buffers are reused from one record to the next; [`open`] picks
//! the parser from the first non-blank byte of the input (`>` or `@`).

pub mod fasta;
pub mod fastq;

use anyhow::{bail, Context, Result};
use std::io::BufRead;

use fasta::FastaReader;
use fastq::FastqReader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqRecord {
    pub id: String,
    pub desc: Option<String>,
    /// Bases as read, whitespace removed.
    pub seq: Vec<u8>,
    /// Quality string, FASTQ only.
    pub qual: Option<Vec<u8>>,
}

impl SeqRecord {
    /// Replace id and description from a header line without its `>`/`@`.
    pub(crate) fn set_header(&mut self, header: &[u8]) {
        let header = String::from_utf8_lossy(header);
        let header = header.trim();
        let (id, desc) = match header.find(char::is_whitespace) {
            Some(i) => (&header[..i], header[i..].trim()),
            None => (header, ""),
        };
        self.id.clear();
        self.id.push_str(id);
        if desc.is_empty() {
            self.desc = None;
        } else {
            let d = self.desc.get_or_insert_with(String::new);
            d.clear();
            d.push_str(desc);
        }
    }
}

/// Byte line reader shared by both formats. Line terminators (`\n`, `\r\n`)
/// are stripped; one line can be held back and returned again.
pub(crate) struct LineReader<R> {
    inner: R,
    line: Vec<u8>,
    held: bool,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, line: Vec::new(), held: false }
    }

    /// Move to the next line; `false` at end of input.
    pub(crate) fn advance(&mut self) -> Result<bool> {
        if self.held {
            self.held = false;
            return Ok(true);
        }
        self.line.clear();
        if self.inner.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(false);
        }
        while matches!(self.line.last(), Some(b'\n' | b'\r')) {
            self.line.pop();
        }
        Ok(true)
    }

    #[inline]
    pub(crate) fn line(&self) -> &[u8] {
        &self.line
    }

    /// Return the current line again on the next `advance`.
    pub(crate) fn hold(&mut self) {
        self.held = true;
    }
}

pub enum SeqReader<R: BufRead> {
    Fasta(FastaReader<R>),
    Fastq(FastqReader<R>),
}

impl<R: BufRead> SeqReader<R> {
    /// Sniff the format from the first non-whitespace byte; leading whitespace is consumed.
    pub fn sniff(mut reader: R) -> Result<Self> {
        let first = loop {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                break None;
            }
            match buf.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(i) => {
                    let b = buf[i];
                    reader.consume(i);
                    break Some(b);
                }
                None => {
                    let n = buf.len();
                    reader.consume(n);
                }
            }
        };
        match first {
            Some(b'>') | None => Ok(SeqReader::Fasta(FastaReader::new(reader))),
            Some(b'@') => Ok(SeqReader::Fastq(FastqReader::new(reader))),
            Some(b) => bail!("unrecognized sequence format (first byte {:?})", b as char),
        }
    }

    /// Fill `rec` with the next record; `false` at end of input.
    pub fn read_into(&mut self, rec: &mut SeqRecord) -> Result<bool> {
        match self {
            SeqReader::Fasta(r) => r.read_into(rec),
            SeqReader::Fastq(r) => r.read_into(rec),
        }
    }

    pub fn next_record(&mut self) -> Result<Option<SeqRecord>> {
        let mut rec = SeqRecord::default();
        Ok(self.read_into(&mut rec)?.then_some(rec))
    }

    /// Fill up to `n` records of `batch`, reusing the records already there.
    /// Returns how many were filled; 0 means end of input.
    pub fn fill_batch(&mut self, batch: &mut Vec<SeqRecord>, n: usize) -> Result<usize> {
        if batch.len() < n {
            batch.resize_with(n, SeqRecord::default);
        }
        let mut filled = 0;
        while filled < n && self.read_into(&mut batch[filled])? {
            filled += 1;
        }
        Ok(filled)
    }
}

/// Open a FASTA/FASTQ file, or stdin when `path` is `-`.
pub fn open(path: &str) -> Result<SeqReader<Box<dyn BufRead>>> {
    let inner: Box<dyn BufRead> = if path == "-" {
        Box::new(std::io::BufReader::new(std::io::stdin()))
    } else {
        let fh = std::fs::File::open(path).with_context(|| format!("cannot open input '{}'", path))?;
        Box::new(std::io::BufReader::new(fh))
    };
    SeqReader::sniff(inner).with_context(|| format!("cannot read input '{}'", path))
}
