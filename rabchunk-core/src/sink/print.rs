use super::ChunkSink;
use crate::error::Result;
use crate::util::hex::to_hex16;
use std::io::Write;

/// Emits one line per chunk with its hash, fingerprint and length.
pub struct PrintSink<W: Write> {
    out: W,
    size: u32,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        PrintSink { out, size: 0 }
    }
}

impl PrintSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        PrintSink::new(std::io::stderr())
    }
}

impl<W: Write> ChunkSink for PrintSink<W> {
    fn process_byte(&mut self, _b: u8) -> Result<()> {
        self.size += 1;
        Ok(())
    }

    fn complete_chunk(&mut self, hash: u64, fingerprint: u64) -> Result<()> {
        writeln!(
            self.out,
            "Found chunk hash: {} fingerprint: {} length: {}",
            to_hex16(hash),
            to_hex16(fingerprint),
            self.size
        )?;
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
