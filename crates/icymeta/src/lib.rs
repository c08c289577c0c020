//! icymeta — ICY stream title reader
//!
//! Reads the current `StreamTitle` from a SHOUTcast/Icecast stream: request
//! metadata with `Icy-MetaData: 1`, skip `Icy-Metaint` audio bytes, read one
//! length-prefixed metadata block, parse the title.
//!
//! ## Quick start
//!
//! ```no_run
//! use icymeta::{get_current_stream_title, CancelToken};
//!
//! let title = get_current_stream_title(&CancelToken::new(), "http://radio.example/live")?;
//! println!("{title}");
//! # Ok::<(), icymeta::IcyError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod stream;

pub use cancel::{CancelToken, Cancelled};
pub use error::{IcyError, Phase, Result};
pub use stream::{get_current_stream_title, parse_stream_title, read_meta};
