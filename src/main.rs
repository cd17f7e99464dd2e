use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::time::Instant;

use nucstrstr::io::{self, SeqRecord};
use nucstrstr::search::{NucStrstr, SeqFilter};
use nucstrstr::util::dna;

#[derive(Parser, Debug)]
#[command(name = "nucstrstr", author, version, about = "Compiled nucleotide pattern search over FASTA/FASTQ", arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print records matching a query
    Search {
        /// Query expression, e.g. "^ACGT & !'NNNN'"
        query: String,
        /// FASTA or FASTQ file ("-" for stdin)
        input: String,
        /// Report the 1-based position of each hit (boolean operators not allowed)
        #[arg(long)]
        positional: bool,
        /// Print records that do not match instead
        #[arg(long)]
        invert: bool,
        /// Also search the reverse complement
        #[arg(long = "both-strands")]
        both_strands: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
        format: OutputFormat,
        /// Output path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Worker threads (0 = all cores)
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
        /// Records per parallel batch
        #[arg(long, default_value_t = 4096)]
        batch: usize,
    },
    /// Show how a query compiles
    Explain {
        query: String,
        #[arg(long)]
        positional: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Tsv,
    Json,
}

#[derive(Clone, Copy, Debug)]
struct SearchOpt {
    positional: bool,
    invert: bool,
    both_strands: bool,
    format: OutputFormat,
    threads: usize,
    batch: usize,
}

/// One output line.
#[derive(Debug, Serialize)]
struct Row {
    id: String,
    strand: char,
    position: Option<u32>,
    length: Option<u32>,
    matched_bases: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Search {
            query,
            input,
            positional,
            invert,
            both_strands,
            format,
            out,
            threads,
            batch,
        } => {
            let opt = SearchOpt {
                positional,
                invert,
                both_strands,
                format,
                threads,
                batch: batch.max(1),
            };
            run_search(&query, &input, out.as_deref(), opt)
        }
        Commands::Explain { query, positional } => run_explain(&query, positional),
    }
}

fn compile(query: &str, positional: bool) -> Result<NucStrstr> {
    NucStrstr::compile(query, positional).with_context(|| format!("invalid query '{}'", query))
}

fn run_explain(query: &str, positional: bool) -> Result<()> {
    let nss = compile(query, positional)?;
    println!("query: {}", nss.root());
    println!("mode: {}", if nss.is_positional() { "positional" } else { "boolean" });
    for (i, p) in nss.leaves().iter().enumerate() {
        println!("leaf {}\t{}\t{} bases\t{}-bit lanes\t'{}'", i, p.alphabet(), p.len(), p.width(), p.bases());
    }
    Ok(())
}

fn run_search(query: &str, input: &str, out_path: Option<&str>, opt: SearchOpt) -> Result<()> {
    let nss = compile(query, opt.positional)?;
    let mut reader = io::open(input)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build()
        .context("cannot build worker pool")?;

    let mut out: Box<dyn Write> = if let Some(p) = out_path {
        let fh = std::fs::File::create(p).with_context(|| format!("cannot create output '{}'", p))?;
        Box::new(std::io::BufWriter::new(fh))
    } else {
        Box::new(std::io::BufWriter::new(std::io::stdout()))
    };

    let start = Instant::now();
    let mut n_records = 0usize;
    let mut n_written = 0usize;
    // records are refilled in place batch after batch
    let mut batch = Vec::new();
    loop {
        let n = reader.fill_batch(&mut batch, opt.batch)?;
        if n == 0 {
            break;
        }
        n_records += n;

        let rows: Vec<Option<Row>> = pool.install(|| {
            batch[..n]
                .par_iter()
                .map_init(|| SeqFilter::new(&nss), |filter, rec| evaluate(filter, rec, &opt))
                .collect()
        });
        for row in rows.into_iter().flatten() {
            write_row(&mut out, &row, opt.format)?;
            n_written += 1;
        }
    }
    out.flush()?;

    log::info!(
        "{} records searched, {} written in {:.2?} ({} threads)",
        n_records,
        n_written,
        start.elapsed(),
        pool.current_num_threads()
    );
    Ok(())
}

/// Evaluate one record; `None` means nothing is printed for it.
fn evaluate(filter: &mut SeqFilter<'_>, rec: &SeqRecord, opt: &SearchOpt) -> Option<Row> {
    // the filter keeps the last packed strand, so span() must follow the hit's locate()
    let mut hit = filter.locate(&rec.seq).map(|h| ('+', h));
    if hit.is_none() && opt.both_strands {
        hit = filter.locate(&dna::revcomp(&rec.seq)).map(|h| ('-', h));
    }

    match (hit, opt.invert) {
        (Some((strand, h)), false) => Some(Row {
            id: rec.id.clone(),
            strand,
            position: h.position,
            length: h.len,
            matched_bases: filter.span(h).map(|b| String::from_utf8_lossy(&b).into_owned()),
        }),
        (None, true) => Some(Row {
            id: rec.id.clone(),
            strand: '.',
            position: None,
            length: None,
            matched_bases: None,
        }),
        _ => None,
    }
}

fn write_row(out: &mut dyn Write, row: &Row, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Tsv => writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            row.id,
            row.strand,
            row.position.unwrap_or(0),
            row.length.unwrap_or(0),
            row.matched_bases.as_deref().unwrap_or("*"),
        )?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, row)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, seq: &[u8]) -> SeqRecord {
        SeqRecord { id: id.to_string(), desc: None, seq: seq.to_vec(), qual: None }
    }

    fn opt() -> SearchOpt {
        SearchOpt {
            positional: true,
            invert: false,
            both_strands: false,
            format: OutputFormat::Tsv,
            threads: 1,
            batch: 16,
        }
    }

    #[test]
    fn forward_hit_row() {
        let nss = NucStrstr::compile("ACGA", true).unwrap();
        let mut f = SeqFilter::new(&nss);
        let row = evaluate(&mut f, &rec("r1", b"ttacgatt"), &opt()).unwrap();
        assert_eq!(row.strand, '+');
        assert_eq!(row.position, Some(3));
        assert_eq!(row.matched_bases.as_deref(), Some("ACGA"));
    }

    #[test]
    fn reverse_strand_hit() {
        let nss = NucStrstr::compile("GGGA", true).unwrap();
        let mut f = SeqFilter::new(&nss);
        let r = rec("r1", b"ATCCCAAA");
        assert!(evaluate(&mut f, &r, &opt()).is_none());
        let both = SearchOpt { both_strands: true, ..opt() };
        let row = evaluate(&mut f, &r, &both).unwrap();
        assert_eq!(row.strand, '-');
        // revcomp = TTTGGGAT
        assert_eq!(row.position, Some(4));
        assert_eq!(row.matched_bases.as_deref(), Some("GGGA"));
    }

    #[test]
    fn invert_prints_misses_only() {
        let nss = NucStrstr::compile("AAAA", false).unwrap();
        let mut f = SeqFilter::new(&nss);
        let inv = SearchOpt { invert: true, ..opt() };
        assert!(evaluate(&mut f, &rec("hit", b"CAAAAC"), &inv).is_none());
        let row = evaluate(&mut f, &rec("miss", b"CCCC"), &inv).unwrap();
        assert_eq!(row.id, "miss");
        assert_eq!(row.strand, '.');
    }

    #[test]
    fn tsv_and_json_rows() {
        let row = Row {
            id: "r1".to_string(),
            strand: '+',
            position: None,
            length: Some(4),
            matched_bases: None,
        };
        let mut buf = Vec::new();
        write_row(&mut buf, &row, OutputFormat::Tsv).unwrap();
        assert_eq!(buf, b"r1\t+\t0\t4\t*\n");

        buf.clear();
        write_row(&mut buf, &row, OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["id"], "r1");
        assert!(v["position"].is_null());
        assert_eq!(v["length"], 4);
    }

    #[test]
    fn cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "nucstrstr", "-vv", "search", "ACGT", "reads.fq", "--positional", "--both-strands", "--format", "json", "-t", "4",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { positional, both_strands, format, threads, invert, .. } => {
                assert!(positional && both_strands && !invert);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(threads, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
