use crate::boundary::{BitwiseBoundary, BoundaryPredicate, SpecifiedBoundary};
use crate::driver::process_chunks;
use crate::error::{ChunkError, Result};
use crate::sink::compress::CompressSink;
use crate::sink::extract::{ExtractSink, ExtractSource, ExtractState};
use crate::sink::print::PrintSink;
use crate::sink::stats::StatsSink;
use crate::sink::store::StoreSink;
use crate::sink::{ChunkSink, SinkSet};
use crate::source;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;

pub use crate::sink::stats::StatsParams;

/// Resolved options of one chunking run, as handed over by the CLI.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub in_path: PathBuf,
    pub out_path: Option<PathBuf>,
    pub bits: u8,
    /// 0 together with a zero `max_size` selects the bitwise predicate.
    pub min_size: u32,
    pub max_size: u32,
    pub boundary_marker: u64,
    pub print: bool,
    pub compress: bool,
    pub extract: bool,
    pub chunk_dir: Option<PathBuf>,
    pub stats: Option<StatsParams>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            in_path: PathBuf::new(),
            out_path: None,
            bits: 13,
            min_size: 2 * 1024,
            max_size: 64 * 1024,
            boundary_marker: 0,
            print: false,
            compress: false,
            extract: false,
            chunk_dir: None,
            stats: None,
        }
    }
}

/// Builds the predicate and sink chain from `opts` and drives the whole
/// input through them. Sinks run in registration order: print, store,
/// stats, compress, extract.
pub fn run(opts: &RunOptions) -> Result<()> {
    let boundary: Box<dyn BoundaryPredicate> = if opts.min_size != 0 && opts.max_size != 0 {
        Box::new(SpecifiedBoundary::new(
            opts.bits,
            opts.min_size,
            opts.max_size,
            opts.boundary_marker,
        ))
    } else {
        Box::new(BitwiseBoundary::new(opts.bits))
    };
    let max_size = boundary.max_chunk_size();

    let mut sinks = SinkSet::new();

    if opts.print {
        sinks.push(Box::new(PrintSink::stderr()));
    }
    if let Some(dir) = &opts.chunk_dir {
        sinks.push(Box::new(StoreSink::new(dir.clone())));
    }
    if let Some(params) = &opts.stats {
        sinks.push(Box::new(StatsSink::new(params.clone(), &opts.in_path)?));
    }
    if opts.compress {
        let out: Box<dyn Write> = match &opts.out_path {
            Some(path) => {
                let f = File::create(path).map_err(|source| ChunkError::Open {
                    path: path.clone(),
                    source,
                })?;
                Box::new(BufWriter::new(f))
            }
            None => Box::new(std::io::stdout()),
        };
        sinks.push(Box::new(CompressSink::new(out, max_size)));
    }

    if opts.extract {
        let out_path = opts
            .out_path
            .as_ref()
            .ok_or_else(|| ChunkError::Format("extract requires an output path".into()))?;
        let state = Rc::new(RefCell::new(ExtractState::open(&opts.in_path, out_path)?));
        sinks.push(Box::new(ExtractSink::new(state.clone(), max_size)));

        let mut src = ExtractSource::new(state);
        process_chunks(&mut src, boundary.as_ref(), &mut sinks)?;
    } else {
        let mut src = source::open(&opts.in_path)?;
        process_chunks(&mut src, boundary.as_ref(), &mut sinks)?;
    }

    sinks.finish()
}
