//! ICY metadata framing
//!
//! An ICY body is `metaint` audio bytes, one length byte, then
//! `length * 16` metadata bytes, repeating. The functions here work on any
//! `Read` so they can be driven by a network session or an in-memory buffer.

use std::io::{self, Read};

use tracing::{debug, trace};

use crate::config::protocol::{MAX_META_BLOCK_LEN, META_BLOCK_UNIT};
use crate::error::{IcyError, Result};

/// One metadata block, exactly as it appeared on the wire (padding included).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBlock {
    bytes: Vec<u8>,
}

impl MetadataBlock {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Empty blocks mean "no change since the previous block".
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Payload as text. NUL padding is kept.
    ///
    /// Valid UTF-8 is decoded as such; anything else is read as Latin-1, one
    /// char per byte, so no byte is ever replaced.
    pub fn text(&self) -> String {
        match std::str::from_utf8(&self.bytes) {
            Ok(text) => text.to_owned(),
            Err(_) => self.bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Payload size announced by a length byte.
pub fn meta_block_len(length_byte: u8) -> usize {
    length_byte as usize * META_BLOCK_UNIT
}

/// Read one length-prefixed metadata block.
///
/// The reader must be positioned on the length byte. On success it is left
/// just past the block; nothing beyond it is consumed.
pub fn read_meta_block<R: Read>(reader: &mut R) -> Result<MetadataBlock> {
    let mut len_byte = [0u8; 1];
    reader.read_exact(&mut len_byte)?;

    let expected = meta_block_len(len_byte[0]);
    if expected == 0 {
        trace!("empty metadata block");
        return Ok(MetadataBlock::default());
    }

    let mut bytes = vec![0u8; expected];
    reader
        .read_exact(&mut bytes)
        .map_err(|source| IcyError::Framing { expected, source })?;

    debug!(len = expected, "read metadata block");
    Ok(MetadataBlock { bytes })
}

/// Read one metadata block and return its payload as text.
pub fn read_meta<R: Read>(reader: &mut R) -> Result<String> {
    read_meta_block(reader).map(|block| block.text())
}

/// Discard exactly `interval` bytes of audio.
pub fn skip_audio<R: Read>(reader: &mut R, interval: usize) -> Result<()> {
    let expected = interval as u64;
    let mut segment = reader.by_ref().take(expected);
    let skipped = match io::copy(&mut segment, &mut io::sink()) {
        Ok(n) => n,
        Err(source) => {
            return Err(IcyError::Skip {
                expected: interval,
                skipped: (expected - segment.limit()) as usize,
                source,
            })
        }
    };

    if skipped < expected {
        return Err(IcyError::Skip {
            expected: interval,
            skipped: skipped as usize,
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended inside audio segment",
            ),
        });
    }

    debug!(bytes = interval, "skipped audio segment");
    Ok(())
}

/// Frame `text` as a metadata block: length byte, payload, NUL padding.
pub fn encode_meta_block(text: &str) -> Result<Vec<u8>> {
    let len = text.len();
    if len > MAX_META_BLOCK_LEN {
        return Err(IcyError::Oversized { len });
    }

    let units = len.div_ceil(META_BLOCK_UNIT);
    let mut block = Vec::with_capacity(1 + units * META_BLOCK_UNIT);
    // units <= 255 by the check above
    block.push(units as u8);
    block.extend_from_slice(text.as_bytes());
    block.resize(1 + units * META_BLOCK_UNIT, 0);
    Ok(block)
}
