//! The adaptive response writer and its configuration.
//!
//! [`AdaptiveWriter`] walks through the following states for one response:
//!
//! ```text
//! Ready ──begin──> Buffering ──overflow──> FlushedChunked ──finish──> Finished
//!          │            └──────finish (Content-Length)──────────────────┘
//!          ├─────> FlushedFixedLength / FlushedChunked (declared by the handler)
//!          ├─────> FlushedBodiless (1xx, 204, 304)
//!          └─────> Counting (HEAD) ──finish──> Finished
//! ```

mod adaptive_writer;
mod config;

pub use adaptive_writer::AdaptiveWriter;
pub use adaptive_writer::WriterState;
pub use config::DEFAULT_BUFFER_SIZE;
pub use config::DEFAULT_CHUNK_SIZE;
pub use config::WriterConfig;
pub use config::WriterOverrides;
