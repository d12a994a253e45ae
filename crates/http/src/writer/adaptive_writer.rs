use crate::codec::{HeaderEncoder, PayloadEncoder};
use crate::protocol::{
    PayloadItem, PayloadSize, ResponseHead, SendError, declared_content_length, declares_chunked, is_bodiless_status,
};
use crate::writer::WriterConfig;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::Response;
use http_body::Body;
use http_body_util::BodyExt;
use std::fmt::Display;
use std::mem;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::trace;

/// Observable state of an [`AdaptiveWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// no response head yet
    Ready,
    /// holding the head and up to `buffer_size` body bytes
    Buffering,
    /// `HEAD` response, body bytes are only counted
    Counting,
    /// head sent with a `Content-Length`
    FlushedFixedLength,
    /// head sent with `Transfer-Encoding: chunked`
    FlushedChunked,
    /// head sent for a status that has no body
    FlushedBodiless,
    Finished,
}

#[derive(Debug)]
enum State {
    Ready,
    Buffering { head: ResponseHead, buffer: BytesMut },
    Counting { head: ResponseHead, count: u64 },
    Flushed { encoder: PayloadEncoder },
    Finished,
}

/// Response writer choosing between `Content-Length` and chunked framing
/// while the body is being produced.
///
/// Body bytes are held back until either the body ends, and the exact
/// length is announced, or the buffered amount would exceed
/// [`WriterConfig::buffer_size`], and the response switches to chunked
/// encoding: the head, then the buffered prefix, then the overflow, then
/// every later write passes straight through the chunked encoder and is
/// flushed to the sink right away.
///
/// A handler that declared `Content-Length` (which wins over a declared
/// `Transfer-Encoding: chunked`) or chunked encoding bypasses the buffer.
/// An error leaves the writer finished.
#[derive(Debug)]
pub struct AdaptiveWriter<W> {
    writer: W,
    config: WriterConfig,
    out: BytesMut,
    header_encoder: HeaderEncoder,
    state: State,
}

impl<W> AdaptiveWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W, config: WriterConfig) -> Self {
        Self { writer, config, out: BytesMut::new(), header_encoder: HeaderEncoder, state: State::Ready }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn state(&self) -> WriterState {
        match &self.state {
            State::Ready => WriterState::Ready,
            State::Buffering { .. } => WriterState::Buffering,
            State::Counting { .. } => WriterState::Counting,
            State::Flushed { encoder } if encoder.is_chunked() => WriterState::FlushedChunked,
            State::Flushed { encoder } if encoder.is_fix_length() => WriterState::FlushedFixedLength,
            State::Flushed { .. } => WriterState::FlushedBodiless,
            State::Finished => WriterState::Finished,
        }
    }

    /// Starts a response. `head_only` is set for `HEAD` requests: the body
    /// is counted but never written.
    pub fn begin(&mut self, head: ResponseHead, head_only: bool) -> Result<(), SendError> {
        if !matches!(self.state, State::Ready) {
            return Err(SendError::invalid_body("response head already written"));
        }

        self.state = if is_bodiless_status(head.status()) {
            self.commit(head, PayloadSize::Undeclared)?
        } else if head_only {
            State::Counting { head, count: 0 }
        } else if let Some(length) = declared_content_length(&head) {
            self.commit(head, PayloadSize::Length(length))?
        } else if declares_chunked(&head) {
            self.commit(head, PayloadSize::Chunked)?
        } else {
            State::Buffering { head, buffer: BytesMut::new() }
        };
        Ok(())
    }

    fn commit(&mut self, head: ResponseHead, payload_size: PayloadSize) -> Result<State, SendError> {
        trace!(?payload_size, "response head committed");
        self.header_encoder.encode((head, payload_size), &mut self.out)?;
        Ok(State::Flushed { encoder: PayloadEncoder::for_size(payload_size, self.config.chunk_size()) })
    }

    /// Writes body bytes.
    pub async fn write<D: Buf>(&mut self, data: D) -> Result<(), SendError> {
        self.state = match mem::replace(&mut self.state, State::Finished) {
            State::Ready => return Err(SendError::invalid_body("response head has not been written")),
            State::Finished => return Err(SendError::Finished),
            State::Buffering { head, mut buffer } => {
                if buffer.len() + data.remaining() <= self.config.buffer_size() {
                    buffer.put(data);
                    State::Buffering { head, buffer }
                } else {
                    trace!(buffered = buffer.len(), overflow = data.remaining(), "buffer exceeded, switch to chunked");
                    let mut state = self.commit(head, PayloadSize::Chunked)?;
                    if let State::Flushed { encoder } = &mut state {
                        encoder.encode(PayloadItem::Chunk(buffer.freeze()), &mut self.out)?;
                        encoder.encode(PayloadItem::Chunk(data), &mut self.out)?;
                    }
                    state
                }
            }
            State::Counting { head, count } => State::Counting { head, count: count + data.remaining() as u64 },
            State::Flushed { mut encoder } => {
                encoder.encode(PayloadItem::Chunk(data), &mut self.out)?;
                State::Flushed { encoder }
            }
        };

        if matches!(self.state, State::Flushed { .. }) {
            self.flush().await?;
        }
        Ok(())
    }

    /// Ends the body and flushes everything to the sink.
    pub async fn finish(&mut self) -> Result<(), SendError> {
        match mem::replace(&mut self.state, State::Finished) {
            State::Ready => return Err(SendError::invalid_body("response head has not been written")),
            State::Finished => return Err(SendError::Finished),
            State::Buffering { head, buffer } => {
                let payload_size = if buffer.is_empty() { PayloadSize::Empty } else { PayloadSize::Length(buffer.len() as u64) };
                trace!(?payload_size, "body completed within buffer");
                self.header_encoder.encode((head, payload_size), &mut self.out)?;
                self.out.extend_from_slice(&buffer);
            }
            State::Counting { head, count } => {
                let payload_size = match declared_content_length(&head) {
                    Some(length) => PayloadSize::Length(length),
                    None if count <= self.config.buffer_size() as u64 => PayloadSize::Length(count),
                    None => PayloadSize::Undeclared,
                };
                trace!(count, ?payload_size, "head response counted");
                self.header_encoder.encode((head, payload_size), &mut self.out)?;
            }
            State::Flushed { mut encoder } => encoder.encode(PayloadItem::<Bytes>::Eof, &mut self.out)?,
        }

        self.flush().await
    }

    /// Writes a whole response, driving its body frame by frame.
    pub async fn send<B>(&mut self, response: Response<B>, head_only: bool) -> Result<(), SendError>
    where
        B: Body + Unpin,
        B::Error: Display,
    {
        let (parts, mut body) = response.into_parts();
        self.begin(ResponseHead::from_parts(parts, ()), head_only)?;

        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|e| SendError::invalid_body(format!("resolve response body error: {e}")))?;
            match frame.into_data() {
                Ok(data) => self.write(data).await?,
                Err(_) => trace!("skip response trailers"),
            }
        }

        self.finish().await
    }

    async fn flush(&mut self) -> Result<(), SendError> {
        if self.out.is_empty() {
            return Ok(());
        }

        self.writer.write_all(&self.out).await?;
        self.out.clear();
        Ok(self.writer.flush().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use http::{StatusCode, header};
    use http_body::Frame;
    use http_body_util::{Full, StreamBody};
    use indoc::indoc;
    use std::convert::Infallible;

    fn crlf(s: &str) -> String {
        s.replace('\n', "\r\n")
    }

    fn small_writer() -> AdaptiveWriter<Vec<u8>> {
        AdaptiveWriter::new(Vec::new(), WriterConfig::new(8, 4).unwrap())
    }

    fn text_head() -> ResponseHead {
        Response::builder().header(header::CONTENT_TYPE, "text/plain").body(()).unwrap()
    }

    fn output(writer: AdaptiveWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn test_body_at_threshold_gets_content_length() {
        let mut writer = small_writer();
        writer.begin(text_head(), false).unwrap();
        writer.write(Bytes::from_static(b"abcd")).await.unwrap();
        writer.write(Bytes::from_static(b"efgh")).await.unwrap();
        assert_eq!(writer.state(), WriterState::Buffering);
        assert!(writer.get_ref().is_empty());

        writer.finish().await.unwrap();
        assert_eq!(writer.state(), WriterState::Finished);

        let expected = indoc! {"
            HTTP/1.1 200 OK
            content-type: text/plain
            content-length: 8

            abcdefgh"};
        assert_eq!(output(writer), crlf(expected));
    }

    #[tokio::test]
    async fn test_one_byte_over_threshold_switches_to_chunked() {
        let mut writer = small_writer();
        writer.begin(text_head(), false).unwrap();
        writer.write(Bytes::from_static(b"abcdefgh")).await.unwrap();
        writer.write(Bytes::from_static(b"i")).await.unwrap();
        assert_eq!(writer.state(), WriterState::FlushedChunked);

        let head = "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ntransfer-encoding: chunked\r\n\r\n";
        let prefix = "4\r\nabcd\r\n4\r\nefgh\r\n";
        let overflow = "1\r\ni\r\n";
        assert_eq!(String::from_utf8_lossy(writer.get_ref()), format!("{head}{prefix}{overflow}"));

        writer.write(&b"jk"[..]).await.unwrap();
        assert_eq!(String::from_utf8_lossy(writer.get_ref()), format!("{head}{prefix}{overflow}2\r\njk\r\n"));
        writer.finish().await.unwrap();
        assert_eq!(output(writer), format!("{head}{prefix}{overflow}2\r\njk\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_empty_body() {
        let mut writer = small_writer();
        writer.begin(Response::builder().status(StatusCode::NOT_FOUND).body(()).unwrap(), false).unwrap();
        writer.finish().await.unwrap();
        assert_eq!(output(writer), "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_declared_length_bypasses_buffer() {
        let mut writer = small_writer();
        let head = Response::builder()
            .header(header::CONTENT_LENGTH, "12")
            .header(header::TRANSFER_ENCODING, "chunked")
            .body(())
            .unwrap();
        writer.begin(head, false).unwrap();
        assert_eq!(writer.state(), WriterState::FlushedFixedLength);

        writer.write(Bytes::from_static(b"hello ")).await.unwrap();
        assert_eq!(writer.get_ref().as_slice(), b"HTTP/1.1 200 OK\r\ncontent-length: 12\r\n\r\nhello ");
        writer.write(Bytes::from_static(b"world!")).await.unwrap();
        writer.finish().await.unwrap();
        assert_eq!(output(writer), "HTTP/1.1 200 OK\r\ncontent-length: 12\r\n\r\nhello world!");
    }

    #[tokio::test]
    async fn test_declared_length_mismatch() {
        let mut writer = small_writer();
        let head = Response::builder().header(header::CONTENT_LENGTH, "5").body(()).unwrap();
        writer.begin(head, false).unwrap();
        writer.write(Bytes::from_static(b"abc")).await.unwrap();
        let result = writer.finish().await;
        assert!(matches!(result, Err(SendError::LengthMismatch { declared: 5, written: 3 })));
    }

    #[tokio::test]
    async fn test_declared_chunked() {
        let mut writer = small_writer();
        let head = Response::builder().header(header::TRANSFER_ENCODING, "chunked").body(()).unwrap();
        writer.begin(head, false).unwrap();
        assert_eq!(writer.state(), WriterState::FlushedChunked);
        writer.write(Bytes::from_static(b"ab")).await.unwrap();
        writer.finish().await.unwrap();
        assert_eq!(output(writer), "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n2\r\nab\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_head_within_threshold() {
        let mut writer = small_writer();
        writer.begin(text_head(), true).unwrap();
        writer.write(Bytes::from_static(b"abcdef")).await.unwrap();
        assert_eq!(writer.state(), WriterState::Counting);
        writer.finish().await.unwrap();

        assert_eq!(output(writer), "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 6\r\n\r\n");
    }

    #[tokio::test]
    async fn test_head_over_threshold() {
        let mut writer = small_writer();
        writer.begin(text_head(), true).unwrap();
        writer.write(Bytes::from(vec![b'x'; 9])).await.unwrap();
        writer.finish().await.unwrap();
        assert_eq!(output(writer), "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\r\n");
    }

    #[tokio::test]
    async fn test_bodiless_status() {
        let mut writer = small_writer();
        let head = Response::builder().status(StatusCode::NO_CONTENT).header(header::CONTENT_LENGTH, "3").body(()).unwrap();
        writer.begin(head, false).unwrap();
        assert_eq!(writer.state(), WriterState::FlushedBodiless);
        assert!(matches!(writer.write(Bytes::from_static(b"abc")).await, Err(SendError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn test_not_modified_has_no_framing() {
        let mut writer = small_writer();
        writer.begin(Response::builder().status(StatusCode::NOT_MODIFIED).body(()).unwrap(), false).unwrap();
        writer.finish().await.unwrap();
        assert_eq!(output(writer), "HTTP/1.1 304 Not Modified\r\n\r\n");
    }

    #[tokio::test]
    async fn test_misuse() {
        let mut writer = small_writer();
        assert!(matches!(writer.write(Bytes::new()).await, Err(SendError::InvalidBody { .. })));

        let mut writer = small_writer();
        writer.begin(text_head(), false).unwrap();
        assert!(writer.begin(text_head(), false).is_err());
        writer.finish().await.unwrap();
        assert!(matches!(writer.finish().await, Err(SendError::Finished)));
        assert!(matches!(writer.write(Bytes::from_static(b"a")).await, Err(SendError::Finished)));
    }

    #[tokio::test]
    async fn test_send_full_body() {
        let mut writer = AdaptiveWriter::new(Vec::new(), WriterConfig::default());
        let response = Response::new(Full::new(Bytes::from_static(b"Hello World!")));
        writer.send(response, false).await.unwrap();
        assert_eq!(output(writer), "HTTP/1.1 200 OK\r\ncontent-length: 12\r\n\r\nHello World!");
    }

    #[tokio::test]
    async fn test_send_streaming_body() {
        let chunks = vec![
            Ok::<_, Infallible>(Frame::data(Bytes::from_static(b"12345"))),
            Ok(Frame::data(Bytes::from_static(b"67890"))),
        ];
        let response = Response::new(StreamBody::new(stream::iter(chunks)));
        let mut writer = small_writer();
        writer.send(response, false).await.unwrap();

        let expected = concat!(
            "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n",
            "4\r\n1234\r\n1\r\n5\r\n",
            "4\r\n6789\r\n1\r\n0\r\n",
            "0\r\n\r\n",
        );
        assert_eq!(output(writer), expected);
    }
}
