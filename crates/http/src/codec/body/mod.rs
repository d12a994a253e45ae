//! Response payload encoders.
//!
//! - [`ChunkedEncoder`](chunked_encoder::ChunkedEncoder): `Transfer-Encoding: chunked`
//!   frames, no frame larger than the configured chunk size
//! - [`LengthEncoder`](length_encoder::LengthEncoder): raw bytes, checked against
//!   the declared `Content-Length`
//! - [`PayloadEncoder`]: dispatches to one of the above, or rejects any byte
//!   for bodiless responses

mod chunked_encoder;
mod length_encoder;
mod payload_encoder;

pub use payload_encoder::PayloadEncoder;
