//! Stream handling
//!
//! Negotiates ICY metadata with the server, frames the metadata block out of
//! the body, and extracts the StreamTitle.

pub mod fetch;
pub mod framing;
pub mod metadata;
pub mod session;

#[cfg(test)]
pub(crate) mod test_server;

pub use fetch::{get_current_stream_title, read_stream_title};
pub use framing::{
    encode_meta_block, meta_block_len, read_meta, read_meta_block, skip_audio, MetadataBlock,
};
pub use metadata::parse_stream_title;
pub use session::{open_stream, parse_metaint, StreamSession};
