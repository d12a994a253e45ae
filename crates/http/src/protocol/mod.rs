//! Core HTTP protocol types shared by the codecs, the writer and the web layer.
//!
//! - **Payload framing** ([`message`]): [`PayloadItem`] and [`PayloadSize`]
//! - **Response heads** ([`response`]): [`ResponseHead`] and helpers reading
//!   the framing a handler asked for
//! - **Cache-Control** ([`cache_control`]): directive table driven parsing and formatting
//! - **Errors** ([`error`]): [`HttpError`], [`MediaTypeError`], [`SendError`], [`ConfigError`]

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod response;
pub use response::ResponseHead;
pub use response::declared_content_length;
pub use response::declares_chunked;
pub use response::is_bodiless_status;

mod cache_control;
pub use cache_control::CacheControl;
pub use cache_control::DirectiveValue;

mod error;
pub use error::ConfigError;
pub use error::HttpError;
pub use error::MediaTypeError;
pub use error::SendError;
