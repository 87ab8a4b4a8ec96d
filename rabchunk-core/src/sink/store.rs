use super::ChunkSink;
use crate::error::{ChunkError, Result};
use crate::util::hex::to_hex16;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const TMP_CHUNK_NAME: &str = "tempChunk.rabin.tmp";

/// Content-addressed chunk store: each chunk is streamed into a temp file
/// and renamed to `<hash>.rabin` on completion, or discarded when that name
/// already exists. After every completed chunk the temp file is gone.
pub struct StoreSink {
    chunk_dir: PathBuf,
    tmp: Option<BufWriter<File>>,
    size: u32,
}

impl StoreSink {
    pub fn new(chunk_dir: PathBuf) -> Self {
        StoreSink {
            chunk_dir,
            tmp: None,
            size: 0,
        }
    }

    fn tmp_path(&self) -> PathBuf {
        self.chunk_dir.join(TMP_CHUNK_NAME)
    }
}

impl ChunkSink for StoreSink {
    fn process_byte(&mut self, b: u8) -> Result<()> {
        if self.tmp.is_none() {
            let path = self.tmp_path();
            let f = File::create(&path).map_err(|source| ChunkError::TempChunk { path, source })?;
            self.tmp = Some(BufWriter::new(f));
        }
        if let Some(tmp) = self.tmp.as_mut() {
            tmp.write_all(&[b])?;
        }
        self.size += 1;
        Ok(())
    }

    fn complete_chunk(&mut self, hash: u64, _fingerprint: u64) -> Result<()> {
        if let Some(mut tmp) = self.tmp.take() {
            tmp.flush()?;
            drop(tmp);

            let tmp_path = self.tmp_path();
            let chunk_path = self.chunk_dir.join(format!("{}.rabin", to_hex16(hash)));
            if chunk_path.exists() {
                fs::remove_file(&tmp_path)?;
            } else {
                fs::rename(&tmp_path, &chunk_path)?;
            }
        }
        self.size = 0;
        Ok(())
    }

    fn size(&self) -> u32 {
        self.size
    }
}

impl Drop for StoreSink {
    fn drop(&mut self) {
        // The hash is not final, so the temp file cannot be renamed.
        if self.tmp.is_some() {
            log::warn!(
                "final chunk never completed; {} left behind",
                self.tmp_path().display()
            );
        }
    }
}
