//! Protocol layer of the micro-rest dispatch engine.
//!
//! This crate holds everything that only depends on HTTP itself, not on
//! routes or handlers:
//!
//! - [`media`]: media type grammar, the lenient `q`/`qs` scanner, `Accept-Charset`
//!   and the compatibility algebra used for content negotiation
//! - [`protocol`]: payload framing types, response head helpers, the
//!   `Cache-Control` directive table and the error types
//! - [`codec`]: `tokio_util` encoders for response heads and payloads
//! - [`writer`]: the [`AdaptiveWriter`](writer::AdaptiveWriter) choosing between
//!   `Content-Length` and chunked framing while the body is produced
//!
//! # Example
//!
//! ```
//! use micro_rest_http::media::{best_match, parse_accept, parse_server_types};
//!
//! let produces = parse_server_types("application/json, text/html;qs=0.5").unwrap();
//! let accept = parse_accept("text/*, application/*;q=0.8");
//! let best = best_match(&produces, &accept, None).unwrap();
//! assert_eq!(best.media_type().essence(), "text/html");
//! ```
//!
//! Writing a response whose size is only known once the handler is done:
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use bytes::Bytes;
//! use http::Response;
//! use micro_rest_http::writer::{AdaptiveWriter, WriterConfig};
//!
//! let mut writer = AdaptiveWriter::new(Vec::new(), WriterConfig::default());
//! writer.begin(Response::new(()), false).unwrap();
//! writer.write(Bytes::from_static(b"hello")).await.unwrap();
//! writer.finish().await.unwrap();
//! assert!(writer.get_ref().ends_with(b"content-length: 5\r\n\r\nhello"));
//! # }
//! ```

pub mod codec;
pub mod media;
pub mod protocol;
pub mod writer;

mod utils;
