use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{PayloadItem, PayloadSize, SendError};
use bytes::{Buf, BytesMut};

use tokio_util::codec::Encoder;

/// Encodes a response payload with the framing chosen for its head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// content-length payload
    Length(LengthEncoder),

    /// transfer-encoding chunked payload
    Chunked(ChunkedEncoder),

    /// the response carries no body, any payload byte is an error
    NoBody { eof: bool },
}

impl PayloadEncoder {
    /// create an encoder rejecting every payload byte
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody { eof: false } }
    }

    /// create a chunked `PayloadEncoder` with frames of at most `chunk_size` bytes
    pub fn chunked(chunk_size: usize) -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new(chunk_size)) }
    }

    /// create a fixed length `PayloadEncoder`
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    /// Picks the encoder matching the framing announced by the head.
    pub fn for_size(payload_size: PayloadSize, chunk_size: usize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => Self::fix_length(size),
            PayloadSize::Chunked => Self::chunked(chunk_size),
            PayloadSize::Empty | PayloadSize::Undeclared => Self::empty(),
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody { .. })
    }

    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }

    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::Chunked(encoder) => encoder.is_finish(),
            Kind::NoBody { eof } => *eof,
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::NoBody { eof } => match item {
                PayloadItem::Chunk(bytes) if bytes.has_remaining() => {
                    Err(SendError::invalid_body("response status does not allow a body"))
                }
                PayloadItem::Chunk(_) => Ok(()),
                PayloadItem::Eof => {
                    *eof = true;
                    Ok(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_for_size() {
        assert!(PayloadEncoder::for_size(PayloadSize::Length(3), 16).is_fix_length());
        assert!(PayloadEncoder::for_size(PayloadSize::Chunked, 16).is_chunked());
        assert!(PayloadEncoder::for_size(PayloadSize::Empty, 16).is_empty());
        assert!(PayloadEncoder::for_size(PayloadSize::Undeclared, 16).is_empty());
    }

    #[test]
    fn test_no_body_rejects_bytes() {
        let mut encoder = PayloadEncoder::empty();
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::new()), &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"x")), &mut dst);
        assert!(matches!(result, Err(SendError::InvalidBody { .. })));

        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        assert!(encoder.is_finish());
        assert!(dst.is_empty());
    }
}
