use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not open chunk temp file {}: {source}", path.display())]
    TempChunk {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Format error: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, ChunkError>;
