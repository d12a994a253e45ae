use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("media type error: {source}")]
    MediaTypeError {
        #[from]
        source: MediaTypeError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("config error: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },
}

/// Errors raised while reading a single media type entry.
///
/// Header parsing never fails as a whole: an entry producing one of these
/// errors is skipped and parsing resumes after the next comma.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    #[error("empty media type entry")]
    Empty,

    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("unterminated quoted string starting at offset {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("missing subtype after '/' at offset {offset}")]
    MissingSubtype { offset: usize },

    #[error("server declared media type {media_type} uses `q`, expected `qs`")]
    ClientQualityOnServerType { media_type: String },
}

impl MediaTypeError {
    pub fn unexpected(found: char, offset: usize) -> Self {
        Self::UnexpectedChar { found, offset }
    }

    pub fn client_quality_on_server_type<S: ToString>(media_type: S) -> Self {
        Self::ClientQualityOnServerType { media_type: media_type.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("declared content-length {declared} but body produced {written} bytes")]
    LengthMismatch { declared: u64, written: u64 },

    #[error("response already finished")]
    Finished,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }
}

/// Rejected writer configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,
}
