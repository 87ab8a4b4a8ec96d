#![forbid(unsafe_code)]

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;

pub mod util {
    pub mod hex;
    pub mod varint;
}

pub mod rabin {
    pub mod poly;
    pub mod window;
}

pub mod boundary;
pub mod driver;
pub mod run;
pub mod sink;
pub mod source;

pub use crate::error::{ChunkError, Result};

pub use boundary::{BitwiseBoundary, BoundaryPredicate, SpecifiedBoundary};

pub use driver::process_chunks;

pub use run::{RunOptions, StatsParams, run};

pub use sink::{ChunkSink, SinkSet};

pub mod prelude {
    pub use crate::Result;
    pub use crate::boundary::{BitwiseBoundary, BoundaryPredicate, SpecifiedBoundary};
    pub use crate::driver::process_chunks;
    pub use crate::rabin::poly::{POLY, RabinPoly};
    pub use crate::rabin::window::{RollingWindow, WINDOW_SIZE};
    pub use crate::run::{RunOptions, StatsParams, run};
    pub use crate::sink::{ChunkSink, SinkSet};
    pub use crate::source::ByteSource;
}
