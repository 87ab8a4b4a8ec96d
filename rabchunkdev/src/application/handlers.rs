use crate::presentation::cli::Cli;
use rabchunk_core::{ChunkError, RunOptions, StatsParams};

pub fn handle(cli: Cli) -> i32 {
    let opts = match resolve(cli) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{msg}");
            return -1;
        }
    };

    match rabchunk_core::run(&opts) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            exit_code(&e)
        }
    }
}

fn exit_code(err: &ChunkError) -> i32 {
    match err {
        ChunkError::Open { .. } => -2,
        ChunkError::TempChunk { .. } => -3,
        _ => -1,
    }
}

/// Applies `-f`, checks flag combinations the way the original tool did, and
/// builds the resolved option set for the core.
fn resolve(cli: Cli) -> Result<RunOptions, String> {
    let mut bits = cli.bits;
    let mut min_size = cli.min_chunk_size;
    let mut max_size = cli.max_chunk_size;
    let mut min_max_warnings = true;
    if let Some(fixed) = cli.fixed_size {
        min_size = fixed;
        max_size = fixed;
        bits = 32;
        min_max_warnings = false;
    }

    if cli.print && (cli.compress || cli.extract) && cli.out.is_none() {
        return Err(
            "-p (print) combined with -c (compress) or -x (extract) requires -o for the \
             compress/extract output"
                .into(),
        );
    }
    if cli.compress && cli.extract {
        return Err("-c (compress) cannot be combined with -x (extract)".into());
    }
    if cli.extract && cli.out.is_none() {
        return Err(
            "-x (extract) requires -o; earlier chunks are re-read from the output file".into(),
        );
    }

    if min_size != 0 && max_size != 0 {
        if min_size > max_size {
            return Err("min chunk size (-m) must not exceed max chunk size (-M)".into());
        }
        let probable = 1u64 << bits.min(63);
        if min_max_warnings && 2 * probable > u64::from(max_size) {
            log::warn!("max chunk size (-M) should be at least 2 * 2**bits");
        } else if min_max_warnings && probable <= 2 * u64::from(min_size) {
            log::warn!("min chunk size (-m) should be no more than 0.5 * 2**bits");
        }
    } else if min_size != 0 || max_size != 0 {
        return Err("-m and -M must be given together; set both or neither to zero".into());
    }

    let stats = cli.stats_dir.map(|stats_dir| StatsParams {
        stats_dir,
        notation: cli.stats_notation.clone().filter(|s| !s.is_empty()),
        levels: cli.stats_levels,
    });

    Ok(RunOptions {
        in_path: cli.input,
        out_path: cli.out,
        bits,
        min_size,
        max_size,
        boundary_marker: cli.boundary_marker,
        print: cli.print,
        compress: cli.compress,
        extract: cli.extract,
        chunk_dir: cli.chunk_dir,
        stats,
    })
}
