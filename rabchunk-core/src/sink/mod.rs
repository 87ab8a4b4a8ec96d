use crate::error::Result;

/// Receiver for the chunk driver's events.
///
/// A sink sees every payload byte through `process_byte`, then one
/// `complete_chunk` per chunk carrying the content hash and the rolling
/// fingerprint at the cut. The final chunk of a stream is completed
/// unconditionally and may be shorter than the predicate's minimum — or
/// empty, for an empty input.
pub trait ChunkSink {
    fn process_byte(&mut self, b: u8) -> Result<()>;

    fn complete_chunk(&mut self, hash: u64, fingerprint: u64) -> Result<()>;

    /// Bytes accepted since the last completed chunk.
    fn size(&self) -> u32;

    /// Teardown after the final chunk: flush buffers, write tallies.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

pub mod compress;
pub mod extract;
pub mod print;
pub mod stats;
pub mod store;

/// Ordered fan-out over any number of child sinks. Keeps its own size
/// counter so the driver has one authoritative answer regardless of what the
/// children count internally.
pub struct SinkSet {
    sinks: Vec<Box<dyn ChunkSink>>,
    size: u32,
}

impl SinkSet {
    pub fn new() -> Self {
        SinkSet {
            sinks: Vec::new(),
            size: 0,
        }
    }

    pub fn push(&mut self, sink: Box<dyn ChunkSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Default for SinkSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSink for SinkSet {
    fn process_byte(&mut self, b: u8) -> Result<()> {
        self.size += 1;
        for s in &mut self.sinks {
            s.process_byte(b)?;
        }
        Ok(())
    }

    fn complete_chunk(&mut self, hash: u64, fingerprint: u64) -> Result<()> {
        self.size = 0;
        for s in &mut self.sinks {
            s.complete_chunk(hash, fingerprint)?;
        }
        Ok(())
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn finish(&mut self) -> Result<()> {
        for s in &mut self.sinks {
            s.finish()?;
        }
        Ok(())
    }
}
