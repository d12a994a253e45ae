use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use std::io::Write;

use tokio_util::codec::Encoder;

/// Writes `Transfer-Encoding: chunked` frames.
///
/// A payload chunk larger than `chunk_size` is split into several frames,
/// empty chunks are skipped since a zero sized frame terminates the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    chunk_size: usize,
}

impl ChunkedEncoder {
    pub fn new(chunk_size: usize) -> Self {
        Self { eof: false, chunk_size: chunk_size.max(1) }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Err(SendError::Finished);
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                while bytes.has_remaining() {
                    let size = bytes.remaining().min(self.chunk_size);
                    write!(helper::Writer(dst), "{size:X}\r\n")?;
                    dst.reserve(size + 2);

                    let mut left = size;
                    while left > 0 {
                        let chunk = bytes.chunk();
                        let n = chunk.len().min(left);
                        dst.extend_from_slice(&chunk[..n]);
                        bytes.advance(n);
                        left -= n;
                    }
                    dst.extend_from_slice(b"\r\n");
                }
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_split_into_frames() {
        let mut encoder = ChunkedEncoder::new(4);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"abcdefghij")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"4\r\nabcd\r\n4\r\nefgh\r\n2\r\nij\r\n0\r\n\r\n");
        assert!(encoder.is_finish());
    }

    #[test]
    fn test_empty_chunk_is_skipped() {
        let mut encoder = ChunkedEncoder::new(4096);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::new()), &mut dst).unwrap();
        assert!(dst.is_empty());
    }

    #[test]
    fn test_hex_size() {
        let mut encoder = ChunkedEncoder::new(4096);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::Chunk(Bytes::from(vec![b'x'; 26])), &mut dst).unwrap();
        assert!(dst.starts_with(b"1A\r\n"));
    }

    #[test]
    fn test_encode_after_eof() {
        let mut encoder = ChunkedEncoder::new(4096);
        let mut dst = BytesMut::new();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"a")), &mut dst);
        assert!(matches!(result, Err(SendError::Finished)));
    }
}
