//! Response framing codecs.
//!
//! The codecs turn a [`ResponseHead`](crate::protocol::ResponseHead) and a
//! stream of [`PayloadItem`](crate::protocol::PayloadItem)s into HTTP/1.1 wire
//! bytes. They are plain `tokio_util` [`Encoder`](tokio_util::codec::Encoder)s
//! writing into a `BytesMut`, the [`writer`](crate::writer) module decides
//! which framing to use and when the bytes reach the sink.
//!
//! - [`HeaderEncoder`]: status line and headers, rewriting `Content-Length` and
//!   `Transfer-Encoding` to match the chosen [`PayloadSize`](crate::protocol::PayloadSize)
//! - [`PayloadEncoder`]: fixed length, chunked or bodiless payloads

mod body;
mod header;

pub use body::PayloadEncoder;
pub use header::HeaderEncoder;
