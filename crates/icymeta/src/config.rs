//! Configuration constants for icymeta

/// ICY protocol constants
pub mod protocol {
    /// Request header asking the server to interleave metadata blocks
    pub const METADATA_REQUEST_HEADER: &str = "Icy-MetaData";

    /// Response header carrying the number of audio bytes between metadata blocks
    pub const METAINT_HEADER: &str = "icy-metaint";

    /// The length byte counts metadata in units of this many bytes
    pub const META_BLOCK_UNIT: usize = 16;

    /// Largest possible metadata payload (length byte 255)
    pub const MAX_META_BLOCK_LEN: usize = u8::MAX as usize * META_BLOCK_UNIT;

    /// Key of the current track title inside a metadata payload
    pub const STREAM_TITLE_PREFIX: &str = "StreamTitle='";
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("icymeta/", env!("CARGO_PKG_VERSION"));

    /// Number of body chunks the worker may queue ahead of the reader
    pub const BODY_CHANNEL_BOUND: usize = 32;

    /// How often a blocked reader wakes up to check for cancellation (milliseconds)
    pub const CANCEL_POLL_MS: u64 = 50;
}
