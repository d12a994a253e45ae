use crate::protocol::ConfigError;
use crate::utils::ensure;
use serde::Deserialize;

pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Buffering behaviour of the [`AdaptiveWriter`](super::AdaptiveWriter).
///
/// `buffer_size` is the largest body still sent with a computed
/// `Content-Length`, one byte more switches the response to chunked
/// transfer encoding. `chunk_size` bounds every chunk frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    buffer_size: usize,
    chunk_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE, chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

impl WriterConfig {
    pub fn new(buffer_size: usize, chunk_size: usize) -> Result<Self, ConfigError> {
        Self { buffer_size, chunk_size }.validate()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn with_buffer_size(self, buffer_size: usize) -> Self {
        Self { buffer_size, ..self }
    }

    pub fn with_chunk_size(self, chunk_size: usize) -> Result<Self, ConfigError> {
        Self { chunk_size, ..self }.validate()
    }

    /// Applies per route overrides on top of this server wide configuration.
    pub fn with_overrides(self, overrides: &WriterOverrides) -> Result<Self, ConfigError> {
        Self {
            buffer_size: overrides.buffer_size.unwrap_or(self.buffer_size),
            chunk_size: overrides.chunk_size.unwrap_or(self.chunk_size),
        }
        .validate()
    }

    /// Checks values that may come from deserialization.
    pub fn validate(self) -> Result<Self, ConfigError> {
        ensure!(self.chunk_size > 0, ConfigError::ZeroChunkSize);
        Ok(self)
    }
}

/// Per route replacement of some [`WriterConfig`] values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterOverrides {
    pub buffer_size: Option<usize>,
    pub chunk_size: Option<usize>,
}

impl WriterOverrides {
    pub fn is_empty(&self) -> bool {
        self.buffer_size.is_none() && self.chunk_size.is_none()
    }
}
