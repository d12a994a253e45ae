use bytes::{Buf, Bytes};

/// One step of an outgoing payload: a data chunk, or the end of the body.
///
/// The body encoders consume chunks terminated by a single [`PayloadItem::Eof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    Chunk(Data),
    Eof,
}

/// How the payload of a response is framed on the wire.
///
/// - `Length(n)`: `Content-Length: n`
/// - `Chunked`: `Transfer-Encoding: chunked`, no `Content-Length`
/// - `Empty`: `Content-Length: 0`
/// - `Undeclared`: neither header, for bodiless responses whose size is not advertised
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    Length(u64),
    Chunked,
    Empty,
    Undeclared,
}
