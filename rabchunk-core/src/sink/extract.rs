use super::ChunkSink;
use super::compress::{BACKREF_MARK, LITERAL_ESCAPE};
use crate::error::{ChunkError, Result};
use crate::source::ByteSource;
use crate::util::varint;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;

/// Shared I/O state of an extraction run: the compressed input stream and
/// the output file, which doubles as the byte source while a back-reference
/// is being replayed. All access is serial; one output handle with explicit
/// seeks is enough.
pub struct ExtractState {
    input: BufReader<File>,
    output: File,
    from_output: bool,
    // End of the written data; where the next chunk lands.
    resume_pos: u64,
}

impl ExtractState {
    pub fn open(in_path: &Path, out_path: &Path) -> Result<Self> {
        let input = File::open(in_path).map_err(|source| ChunkError::Open {
            path: in_path.to_path_buf(),
            source,
        })?;
        let output = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(out_path)
            .map_err(|source| ChunkError::Open {
                path: out_path.to_path_buf(),
                source,
            })?;
        Ok(ExtractState {
            input: BufReader::new(input),
            output,
            from_output: false,
            resume_pos: 0,
        })
    }

    pub fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
        if self.from_output {
            let mut b = [0u8; 1];
            match self.output.read(&mut b)? {
                0 => Ok(None),
                _ => Ok(Some(b[0])),
            }
        } else {
            self.next_input_byte()
        }
    }

    fn next_input_byte(&mut self) -> std::io::Result<Option<u8>> {
        let buf = self.input.fill_buf()?;
        match buf.first() {
            Some(&b) => {
                self.input.consume(1);
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }

    fn peek_input(&mut self) -> std::io::Result<Option<u8>> {
        Ok(self.input.fill_buf()?.first().copied())
    }

    fn write_chunk(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.output.write_all(buf)?;
        self.resume_pos += buf.len() as u64;
        Ok(())
    }

    /// Starts replaying an earlier chunk: reads come from the output file at
    /// `pos` until the boundary predicate ends the chunk.
    fn begin_backref(&mut self, pos: u64) -> std::io::Result<()> {
        self.output.seek(SeekFrom::Start(pos))?;
        self.from_output = true;
        Ok(())
    }

    /// Puts the write cursor back at the end of the data and returns reads
    /// to the input stream.
    fn restore(&mut self) -> std::io::Result<()> {
        self.output.seek(SeekFrom::Start(self.resume_pos))?;
        self.from_output = false;
        Ok(())
    }
}

/// Byte source face of the shared extraction state.
pub struct ExtractSource {
    state: Rc<RefCell<ExtractState>>,
}

impl ExtractSource {
    pub fn new(state: Rc<RefCell<ExtractState>>) -> Self {
        ExtractSource { state }
    }
}

impl ByteSource for ExtractSource {
    fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
        self.state.borrow_mut().next_byte()
    }
}

/// Rebuilds the original stream from the compressed frame sequence.
///
/// The sink buffers each chunk, writes it at the end of the output file,
/// then peeks the input to classify the next frame: `0xFE` switches the
/// byte source to the output file at the referenced chunk's position, `0xFF`
/// is consumed as a literal escape, anything else starts a literal chunk.
/// Chunk boundaries are re-derived by the driver over the produced bytes
/// with the same predicate used during compression.
pub struct ExtractSink {
    state: Rc<RefCell<ExtractState>>,
    buf: Vec<u8>,
    max_size: u32,
    size: u32,
    positions: Vec<u64>,
    chunk_begin: u64,
    finished: bool,
}

impl ExtractSink {
    pub fn new(state: Rc<RefCell<ExtractState>>, max_size: u32) -> Self {
        ExtractSink {
            state,
            buf: Vec::with_capacity(max_size.min(1 << 16) as usize),
            max_size,
            size: 0,
            positions: Vec::new(),
            chunk_begin: 0,
            finished: false,
        }
    }
}

impl ChunkSink for ExtractSink {
    fn process_byte(&mut self, b: u8) -> Result<()> {
        if self.max_size != 0 && self.size >= self.max_size {
            return Err(ChunkError::Format(format!(
                "extraction buffer overflow, size = {}",
                self.size
            )));
        }
        self.buf.push(b);
        self.size += 1;
        Ok(())
    }

    fn complete_chunk(&mut self, _hash: u64, _fingerprint: u64) -> Result<()> {
        if self.finished {
            // Trailing unconditional completion after the input ran dry.
            self.buf.clear();
            self.size = 0;
            return Ok(());
        }

        self.positions.push(self.chunk_begin);

        let mut st = self.state.borrow_mut();
        if st.from_output {
            st.restore()?;
        }
        st.write_chunk(&self.buf)?;

        match st.peek_input()? {
            None => self.finished = true,
            Some(BACKREF_MARK) => {
                let _ = st.next_input_byte()?;
                let delta = varint::read(|| st.next_input_byte())?;
                let known = self.positions.len() as u64;
                if delta == 0 || delta > known {
                    return Err(ChunkError::Format(format!(
                        "back-reference {delta} beyond {known} known chunks"
                    )));
                }
                let target = self.positions[(known - delta) as usize];
                self.chunk_begin = st.resume_pos;
                st.begin_backref(target)?;
            }
            Some(LITERAL_ESCAPE) => {
                let _ = st.next_input_byte()?;
                self.chunk_begin = st.resume_pos;
            }
            Some(_) => {
                self.chunk_begin = st.resume_pos;
            }
        }

        self.buf.clear();
        self.size = 0;
        Ok(())
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn finish(&mut self) -> Result<()> {
        self.state.borrow_mut().output.flush()?;
        Ok(())
    }
}
