//! Response header serialization.

mod header_encoder;

pub use header_encoder::HeaderEncoder;
