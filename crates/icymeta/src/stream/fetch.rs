//! Title fetch
//!
//! Drives one session from connect to parsed title: open the stream, skip
//! one audio segment, read the first metadata block, extract StreamTitle.

use std::io::Read;

use tracing::{debug, instrument};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::stream::framing::{read_meta, skip_audio};
use crate::stream::metadata::parse_stream_title;
use crate::stream::session::open_stream;

/// Open `url`, read the first metadata block, and return its StreamTitle.
///
/// The connection is released before this returns, on success and on error.
/// Cancelling `cancel` aborts the call with a connection error.
#[instrument(skip(cancel), level = "debug")]
pub fn get_current_stream_title(cancel: &CancelToken, url: &str) -> Result<String> {
    let mut session = open_stream(cancel, url)?;
    let interval = session.metadata_interval();

    let title = read_stream_title(&mut session, interval)
        .map_err(|err| err.lift_cancellation(url))?;
    debug!(title = %title, "stream title");
    Ok(title)
}

/// Read the StreamTitle from a body positioned at the start of an audio segment.
pub fn read_stream_title<R: Read>(reader: &mut R, metadata_interval: usize) -> Result<String> {
    skip_audio(reader, metadata_interval)?;
    let meta = read_meta(reader)?;
    parse_stream_title(&meta).map(str::to_owned)
}
