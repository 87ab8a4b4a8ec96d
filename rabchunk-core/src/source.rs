use crate::error::{ChunkError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Pull-based byte stream feeding the chunk driver.
pub trait ByteSource {
    /// Next byte, or `None` at end of stream.
    fn next_byte(&mut self) -> std::io::Result<Option<u8>>;
}

/// Byte source over any buffered reader.
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        ReaderSource { inner }
    }
}

impl<R: BufRead> ByteSource for ReaderSource<R> {
    #[inline]
    fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        match buf.first() {
            Some(&b) => {
                self.inner.consume(1);
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }
}

/// Opens `path` as a buffered raw file source.
pub fn open(path: &Path) -> Result<ReaderSource<BufReader<File>>> {
    let f = File::open(path).map_err(|source| ChunkError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderSource::new(BufReader::new(f)))
}
