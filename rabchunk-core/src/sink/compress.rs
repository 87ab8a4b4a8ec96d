use super::ChunkSink;
use crate::error::{ChunkError, Result};
use crate::util::varint;
use std::collections::HashMap;
use std::io::Write;

/// Marks a back-reference frame: `0xFE` followed by the varint distance.
pub const BACKREF_MARK: u8 = 0xfe;
/// Escapes a literal chunk whose first byte would read as a frame marker.
pub const LITERAL_ESCAPE: u8 = 0xff;

/// Replaces repeated chunks with back-references to their first occurrence.
///
/// Literal chunks are copied through, prefixed with `0xFF` when their first
/// byte collides with the frame markers; repeats become `0xFE` plus the
/// varint distance in chunks. The very first chunk of the stream is always
/// raw, matching the extractor's initial literal state.
pub struct CompressSink<W: Write> {
    out: W,
    buf: Vec<u8>,
    max_size: u32,
    size: u32,
    chunk_num: u64,
    locations: HashMap<u64, u64>,
}

impl<W: Write> CompressSink<W> {
    pub fn new(out: W, max_size: u32) -> Self {
        CompressSink {
            out,
            buf: Vec::with_capacity(max_size.min(1 << 16) as usize),
            max_size,
            size: 0,
            chunk_num: 0,
            locations: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChunkSink for CompressSink<W> {
    fn process_byte(&mut self, b: u8) -> Result<()> {
        if self.max_size != 0 && self.size >= self.max_size {
            return Err(ChunkError::Format(format!(
                "compression buffer overflow, size = {}",
                self.size
            )));
        }
        self.buf.push(b);
        self.size += 1;
        Ok(())
    }

    fn complete_chunk(&mut self, hash: u64, _fingerprint: u64) -> Result<()> {
        if self.chunk_num == 0 {
            self.out.write_all(&self.buf)?;
        } else if let Some(&first) = self.locations.get(&hash) {
            self.out.write_all(&[BACKREF_MARK])?;
            varint::write(&mut self.out, self.chunk_num - first)?;
        } else {
            if matches!(self.buf.first(), Some(&BACKREF_MARK) | Some(&LITERAL_ESCAPE)) {
                self.out.write_all(&[LITERAL_ESCAPE])?;
            }
            self.out.write_all(&self.buf)?;
        }

        self.locations.entry(hash).or_insert(self.chunk_num);
        self.chunk_num += 1;
        self.buf.clear();
        self.size = 0;
        Ok(())
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
