//! StreamTitle parsing
//!
//! Pure text scanning over an ICY metadata payload.
//!
//! ICY metadata format: `StreamTitle='Artist - Song';StreamUrl='...';`

use crate::config::protocol::STREAM_TITLE_PREFIX;
use crate::error::{IcyError, Result};

/// Extract the StreamTitle value from a metadata payload.
///
/// The value runs from `StreamTitle='` to the next `;`, minus one closing
/// quote. The closing quote is optional: `StreamTitle='abc;` yields `abc`,
/// as some servers drop it. Semicolons cannot appear inside a title: `StreamTitle='A;B';`
/// yields `A`. The value is returned verbatim, without trimming or
/// unescaping. The leftmost occurrence wins.
pub fn parse_stream_title(meta: &str) -> Result<&str> {
    let not_found = || IcyError::TitleNotFound {
        text: meta.to_string(),
    };

    let start = meta.find(STREAM_TITLE_PREFIX).ok_or_else(not_found)? + STREAM_TITLE_PREFIX.len();
    let len = meta[start..].find(';').ok_or_else(not_found)?;
    let value = &meta[start..start + len];

    Ok(value.strip_suffix('\'').unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_title() {
        let title = parse_stream_title("StreamTitle='Beethoven - Moonlight Sonata';").unwrap();
        assert_eq!(title, "Beethoven - Moonlight Sonata");
    }

    #[test]
    fn parse_with_url_field() {
        let raw = "StreamTitle='Song Name';StreamUrl='http://example.com';";
        assert_eq!(parse_stream_title(raw).unwrap(), "Song Name");
    }

    #[test]
    fn parse_field_after_other_keys() {
        let raw = "StreamUrl='';StreamTitle='Late Key';";
        assert_eq!(parse_stream_title(raw).unwrap(), "Late Key");
    }

    #[test]
    fn semicolon_ends_title_early() {
        assert_eq!(parse_stream_title("StreamTitle='A;B';").unwrap(), "A");
    }

    #[test]
    fn empty_title_is_not_an_error() {
        assert_eq!(parse_stream_title("StreamTitle='';StreamUrl='';").unwrap(), "");
    }

    #[test]
    fn whitespace_is_kept() {
        assert_eq!(parse_stream_title("StreamTitle='  Spaced  ';").unwrap(), "  Spaced  ");
    }

    #[test]
    fn quotes_inside_title() {
        assert_eq!(parse_stream_title("StreamTitle='It's Alright';").unwrap(), "It's Alright");
    }

    #[test]
    fn no_unescaping() {
        let raw = "StreamTitle='Rock \\'n\\' Roll';";
        assert_eq!(parse_stream_title(raw).unwrap(), "Rock \\'n\\' Roll");
    }

    #[test]
    fn first_match_wins() {
        let raw = "StreamTitle='First';StreamTitle='Second';";
        assert_eq!(parse_stream_title(raw).unwrap(), "First");
    }

    #[test]
    fn unicode_title() {
        let raw = "StreamTitle='ΠΑΝΟΣ ΚΙΑΜΟΣ - ΘΑ ΜΕ ΖΗΤΑΣ - 2022';StreamUrl='';";
        assert_eq!(parse_stream_title(raw).unwrap(), "ΠΑΝΟΣ ΚΙΑΜΟΣ - ΘΑ ΜΕ ΖΗΤΑΣ - 2022");
    }

    #[test]
    fn null_padding_never_reaches_title() {
        let mut raw = "StreamTitle='Test Song';".to_string();
        raw.push_str(&"\0".repeat(8));
        assert_eq!(parse_stream_title(&raw).unwrap(), "Test Song");
    }

    #[test]
    fn missing_key_is_not_found() {
        let err = parse_stream_title("SomeOtherField='value';").unwrap_err();
        match err {
            IcyError::TitleNotFound { text } => assert_eq!(text, "SomeOtherField='value';"),
            other => panic!("expected TitleNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_semicolon_is_not_found() {
        // No trailing `;`: padding is not stripped to rescue the match.
        let err = parse_stream_title("StreamTitle='No Terminator'\0\0\0").unwrap_err();
        assert!(matches!(err, IcyError::TitleNotFound { .. }));
    }

    #[test]
    fn closing_quote_is_optional() {
        assert_eq!(parse_stream_title("StreamTitle='abc;").unwrap(), "abc");
        assert_eq!(parse_stream_title("StreamTitle='abc';").unwrap(), "abc");
        // Only one quote is removed.
        assert_eq!(parse_stream_title("StreamTitle='abc'';").unwrap(), "abc'");
    }

    #[test]
    fn empty_payload_is_not_found() {
        assert!(matches!(
            parse_stream_title(""),
            Err(IcyError::TitleNotFound { .. })
        ));
    }

    #[test]
    fn key_is_case_sensitive() {
        assert!(parse_stream_title("streamtitle='lower';").is_err());
    }
}
