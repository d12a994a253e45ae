use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

/// Writes a payload whose length was declared up front.
///
/// Writing past the declared length, or ending the payload short of it,
/// fails with [`SendError::LengthMismatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    declared: u64,
    written: u64,
    eof: bool,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { declared: length, written: 0, eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }

    fn mismatch(&self, written: u64) -> SendError {
        SendError::LengthMismatch { declared: self.declared, written }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Err(SendError::Finished);
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let remaining = bytes.remaining() as u64;
                if remaining == 0 {
                    return Ok(());
                }
                if self.written + remaining > self.declared {
                    warn!(declared = self.declared, "payload exceeds the declared content-length");
                    return Err(self.mismatch(self.written + remaining));
                }

                dst.reserve(bytes.remaining());
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let n = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(n);
                }
                self.written += remaining;
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                if self.written == self.declared { Ok(()) } else { Err(self.mismatch(self.written)) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_exact_length() {
        let mut encoder = LengthEncoder::new(5);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hel")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"lo")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        assert_eq!(&dst[..], b"hello");
        assert!(encoder.is_finish());
    }

    #[test]
    fn test_too_long() {
        let mut encoder = LengthEncoder::new(2);
        let result = encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"abc")), &mut BytesMut::new());
        assert!(matches!(result, Err(SendError::LengthMismatch { declared: 2, written: 3 })));
    }

    #[test]
    fn test_too_short() {
        let mut encoder = LengthEncoder::new(4);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"ab")), &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst);
        assert!(matches!(result, Err(SendError::LengthMismatch { declared: 4, written: 2 })));
    }
}
