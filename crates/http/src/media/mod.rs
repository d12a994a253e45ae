//! Media type parsing and content negotiation.
//!
//! # Components
//!
//! - [`MediaType`]: a parsed `type/subtype;params` value with its quality
//! - [`parse_accept`], [`parse_content_type`], [`parse_server_types`]: header grammar
//! - [`scan_quality`]: lenient `q` / `qs` extraction working on raw offsets
//! - [`parse_accept_charset`]: `Accept-Charset` preference list
//! - [`resolve`] / [`compatible`]: the compatibility algebra producing ranked [`CompatibleMatch`]es
//!
//! All functions here are pure, the constants ([`WILDCARD_TYPE`],
//! [`APPLICATION_OCTET_STREAM`]) are created once and shared.

mod charset;
mod media_type;
mod negotiate;
mod parser;
mod quality;

pub use charset::is_charset_accepted;
pub use charset::parse_accept_charset;
pub use media_type::APPLICATION_OCTET_STREAM;
pub use media_type::MediaType;
pub use media_type::QualityKey;
pub use media_type::WILDCARD;
pub use media_type::WILDCARD_TYPE;
pub use negotiate::CompatibleMatch;
pub use negotiate::best_match;
pub use negotiate::compatible;
pub use negotiate::resolve;
pub use parser::parse_accept;
pub use parser::parse_content_type;
pub use parser::parse_entry;
pub use parser::parse_lenient;
pub use parser::parse_server_types;
pub use quality::DEFAULT_QUALITY;
pub use quality::scan_quality;
