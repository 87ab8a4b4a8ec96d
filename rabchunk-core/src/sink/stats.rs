use super::ChunkSink;
use crate::error::{ChunkError, Result};
use crate::util::hex::to_hex16;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where and how the stats sink lays out its tree.
#[derive(Clone, Debug)]
pub struct StatsParams {
    pub stats_dir: PathBuf,
    pub notation: Option<String>,
    pub levels: u8,
}

/// Records one metadata file per chunk under a hashed-prefix directory tree,
/// suppressing all-zero chunks into a run-wide tally.
///
/// Layout: `<stats_dir>/<h0>/…/<hL-1>/<hash>.hash/<prefix>-<n>.stats`, where
/// the `hN` are leading hex characters of the chunk hash and `prefix` names
/// the host plus the input file's device and inode. The `.hash` directory
/// also gets a `<size>.size` marker when first created, and the tally lands
/// in `<stats_dir>/<prefix>.zeroes` at teardown.
pub struct StatsSink {
    params: StatsParams,
    input_name: String,
    file_prefix: String,
    size: u32,
    // offset starts one below zero so the first byte lands on offset 0; the
    // chunk size derives from it with wrapping arithmetic.
    offset: u64,
    chunk_start: u64,
    chunk_number: u64,
    zero_count: u64,
    zero_blocks: u64,
    zero_block_size: u64,
}

impl StatsSink {
    pub fn new(params: StatsParams, input: &Path) -> Result<Self> {
        if usize::from(params.levels) > 16 {
            return Err(ChunkError::Format(
                "stats directory levels must be at most 16".into(),
            ));
        }
        let dir_md = fs::metadata(&params.stats_dir).map_err(|e| {
            ChunkError::Format(format!(
                "could not examine stats directory {}: {e}",
                params.stats_dir.display()
            ))
        })?;
        if !dir_md.is_dir() {
            return Err(ChunkError::Format(format!(
                "provided stats directory {} is not a directory",
                params.stats_dir.display()
            )));
        }

        let md = fs::metadata(input).map_err(|source| ChunkError::Open {
            path: input.to_path_buf(),
            source,
        })?;
        let (dev, ino) = dev_ino(&md);
        let host = gethostname::gethostname().to_string_lossy().into_owned();

        Ok(StatsSink {
            file_prefix: format!("{host}-{dev}-{ino}"),
            input_name: input.display().to_string(),
            params,
            size: 0,
            offset: u64::MAX,
            chunk_start: 0,
            chunk_number: 0,
            zero_count: 0,
            zero_blocks: 0,
            zero_block_size: 0,
        })
    }

    /// Creates (if needed) and returns the `.hash` directory for this chunk,
    /// writing the `.size` marker on first creation. A missing level prefix
    /// is created once and the leaf retried.
    fn hash_dir(&self, hash_hex: &str, chunk_size: u64) -> Result<PathBuf> {
        let mut dir = self.params.stats_dir.clone();
        for l in 0..usize::from(self.params.levels) {
            dir.push(&hash_hex[l..l + 1]);
        }
        dir.push(format!("{hash_hex}.hash"));

        for attempt in 0..2 {
            match fs::create_dir(&dir) {
                Ok(()) => {
                    let marker = dir.join(format!("{chunk_size}.size"));
                    let mut f = File::create(marker)?;
                    writeln!(f, "{chunk_size}")?;
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => break,
                Err(e) => {
                    if attempt == 0 {
                        self.make_level_dirs(hash_hex)?;
                    } else {
                        return Err(ChunkError::Format(format!(
                            "could not create directory {}: {e}",
                            dir.display()
                        )));
                    }
                }
            }
        }

        Ok(dir)
    }

    fn make_level_dirs(&self, hash_hex: &str) -> Result<()> {
        let mut dir = self.params.stats_dir.clone();
        for l in 0..usize::from(self.params.levels) {
            dir.push(&hash_hex[l..l + 1]);
            match fs::create_dir(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(ChunkError::Format(format!(
                        "could not make directory {}: {e}",
                        dir.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl ChunkSink for StatsSink {
    fn process_byte(&mut self, b: u8) -> Result<()> {
        self.size += 1;
        self.offset = self.offset.wrapping_add(1);
        if b == 0 {
            self.zero_count += 1;
        } else {
            self.zero_count = 0;
        }
        Ok(())
    }

    fn complete_chunk(&mut self, hash: u64, _fingerprint: u64) -> Result<()> {
        let chunk_size = self.offset.wrapping_sub(self.chunk_start).wrapping_add(1);

        if chunk_size != 0 && self.zero_count >= chunk_size {
            self.zero_blocks += 1;
            self.zero_count = 0;
            if self.zero_block_size == 0 {
                self.zero_block_size = chunk_size;
            }
        } else {
            let hash_hex = to_hex16(hash);
            let dir = self.hash_dir(&hash_hex, chunk_size)?;

            let mut name = format!("{}-{}.stats", self.file_prefix, self.chunk_number);
            if let Some(notation) = &self.params.notation {
                name = format!("{notation}-{name}");
            }
            let path = dir.join(name);
            let mut f = File::create(&path).map_err(|e| {
                ChunkError::Format(format!("could not open stats file {}: {e}", path.display()))
            })?;
            write!(
                f,
                "file name: {}\nchunk number: {}\nstart offset: {}\nend offset: {}\nsize: {}\n",
                self.input_name, self.chunk_number, self.chunk_start, self.offset, chunk_size
            )?;
        }

        self.chunk_start = self.offset.wrapping_add(1);
        self.chunk_number += 1;
        self.size = 0;
        Ok(())
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn finish(&mut self) -> Result<()> {
        let path = self
            .params
            .stats_dir
            .join(format!("{}.zeroes", self.file_prefix));
        let mut f = File::create(path)?;
        write!(
            f,
            "zero blocks: {}\nzero block size: {}\n",
            self.zero_blocks, self.zero_block_size
        )?;
        Ok(())
    }
}

fn dev_ino(_md: &fs::Metadata) -> (u64, u64) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        (_md.dev(), _md.ino())
    }
    #[cfg(not(unix))]
    {
        (0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::SpecifiedBoundary;
    use crate::driver::process_chunks;
    use crate::source::ReaderSource;
    use std::io::Cursor;

    fn run_stats(data: &[u8], params: StatsParams, input: &Path) -> StatsSink {
        let boundary = SpecifiedBoundary::new(32, 16, 16, 0);
        let mut sink = StatsSink::new(params, input).unwrap();
        let mut src = ReaderSource::new(Cursor::new(data.to_vec()));
        process_chunks(&mut src, &boundary, &mut sink).unwrap();
        sink.finish().unwrap();
        sink
    }

    fn input_file(dir: &Path, data: &[u8]) -> PathBuf {
        let p = dir.join("input.bin");
        fs::write(&p, data).unwrap();
        p
    }

    #[test]
    fn stats_file_records_the_chunk_extent() {
        let tmp = tempfile::tempdir().unwrap();
        let stats_dir = tmp.path().join("stats");
        fs::create_dir(&stats_dir).unwrap();
        let input = input_file(tmp.path(), b"A");

        let sink = run_stats(
            b"A",
            StatsParams {
                stats_dir: stats_dir.clone(),
                notation: Some("n1".into()),
                levels: 2,
            },
            &input,
        );

        let hash_dir = stats_dir.join("0").join("0").join("0000000000000141.hash");
        assert!(hash_dir.is_dir());
        assert!(hash_dir.join("1.size").is_file());

        let stats_path = hash_dir.join(format!("n1-{}-0.stats", sink.file_prefix));
        let body = fs::read_to_string(stats_path).unwrap();
        assert_eq!(
            body,
            format!(
                "file name: {}\nchunk number: 0\nstart offset: 0\nend offset: 0\nsize: 1\n",
                input.display()
            )
        );

        let zeroes = fs::read_to_string(stats_dir.join(format!("{}.zeroes", sink.file_prefix)))
            .unwrap();
        assert_eq!(zeroes, "zero blocks: 0\nzero block size: 0\n");
    }

    #[test]
    fn all_zero_chunks_are_tallied_not_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let stats_dir = tmp.path().join("stats");
        fs::create_dir(&stats_dir).unwrap();
        let data = vec![0u8; 64];
        let input = input_file(tmp.path(), &data);

        let sink = run_stats(
            &data,
            StatsParams {
                stats_dir: stats_dir.clone(),
                notation: None,
                levels: 0,
            },
            &input,
        );

        assert_eq!(sink.zero_blocks, 4);
        assert_eq!(sink.zero_block_size, 16);

        // The input ends exactly on a cut, so the trailing empty completion
        // still records a size-0 stats file for the seed hash.
        let empty_dir = stats_dir.join("0000000000000001.hash");
        assert!(empty_dir.join("0.size").is_file());
        let body =
            fs::read_to_string(empty_dir.join(format!("{}-4.stats", sink.file_prefix))).unwrap();
        assert!(body.ends_with("size: 0\n"));

        let zeroes = fs::read_to_string(stats_dir.join(format!("{}.zeroes", sink.file_prefix)))
            .unwrap();
        assert_eq!(zeroes, "zero blocks: 4\nzero block size: 16\n");
    }

    #[test]
    fn rejects_a_missing_stats_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let input = input_file(tmp.path(), b"x");
        let err = StatsSink::new(
            StatsParams {
                stats_dir: tmp.path().join("absent"),
                notation: None,
                levels: 0,
            },
            &input,
        );
        assert!(err.is_err());
    }
}
