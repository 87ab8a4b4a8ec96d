use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Content-defined chunking with Rabin fingerprints", long_about = None)]
pub struct Cli {
    /// log2 of the average chunk length desired
    #[arg(short = 'b', long = "bits", default_value_t = 13)]
    pub bits: u8,

    /// Maximum chunk size in bytes (0 = derive from bits)
    #[arg(short = 'M', long = "max-size", default_value_t = 64 * 1024)]
    pub max_chunk_size: u32,

    /// Minimum chunk size in bytes (0 = derive from bits)
    #[arg(short = 'm', long = "min-size", default_value_t = 2 * 1024)]
    pub min_chunk_size: u32,

    /// Boundary marker the masked fingerprint must match (decimal or 0x-hex)
    #[arg(short = 'B', long = "boundary-marker", value_parser = parse_marker, default_value_t = 0)]
    pub boundary_marker: u64,

    /// Fixed chunk size in bytes; sets min == max and bits = 32
    #[arg(short = 'f', long = "fixed-size")]
    pub fixed_size: Option<u32>,

    /// Directory in which to put chunks, one file per unique chunk hash
    #[arg(short = 'd', long = "chunk-dir")]
    pub chunk_dir: Option<PathBuf>,

    /// Directory in which to put per-chunk statistics
    #[arg(short = 's', long = "stats-dir")]
    pub stats_dir: Option<PathBuf>,

    /// Number of subdirectory levels for the statistics directory
    #[arg(short = 'l', long = "stats-levels", default_value_t = 0)]
    pub stats_levels: u8,

    /// Notation to prefix stats file names with, e.g. to mark the host
    #[arg(short = 'n', long = "notation")]
    pub stats_notation: Option<String>,

    /// Print one line per chunk
    #[arg(short = 'p', long = "print")]
    pub print: bool,

    /// Compress the input stream (to stdout or -o)
    #[arg(short = 'c', long = "compress")]
    pub compress: bool,

    /// Extract a compressed stream (requires -o)
    #[arg(short = 'x', long = "extract")]
    pub extract: bool,

    /// Output file
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Input file
    pub input: PathBuf,
}

fn parse_marker(s: &str) -> Result<u64, String> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hexdigits) => u64::from_str_radix(hexdigits, 16),
        None => t.parse::<u64>(),
    };
    parsed.map_err(|_| format!("{s} is not a number"))
}
