//! Message decoder: component B.
//!
//! Decodes exactly one framed PostgreSQL message from the start of a
//! buffer, reporting whether enough bytes were present.

use super::codec::{read_bytes, read_cstr, read_cstring, read_i32_be, read_u16_be, read_u32_be};
use super::message::{
    ERROR_FIELD_CODE, ERROR_FIELD_MESSAGE, ERROR_FIELD_SEVERITY, RECOGNIZED_TAGS, TAG_BIND,
    TAG_BIND_COMPLETE, TAG_COMMAND_COMPLETE, TAG_ERROR_RESPONSE, TAG_PARAMETER_STATUS, TAG_PARSE,
    TAG_PARSE_COMPLETE, TAG_QUERY, TAG_ROW_DESCRIPTION,
};

/// A message that was fully framed, classified for the per-flow parser.
#[derive(Debug, Clone)]
pub enum DecodedFrame {
    /// Request-bearing (Q, P, B): push onto the pending FIFO.
    Request { query: String },
    /// Response-completing (T, C, 1, 2, E, S): pop the pending FIFO.
    Response {
        error_info: Option<String>,
        error_code: Option<String>,
        error_severity: Option<String>,
    },
    /// Recognized but not request- or response-bearing (I, Z, others): no-op.
    Ignored,
}

/// Why a buffer was rejected, per the "Rejected(reason)" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not enough bytes yet to tell: the tag byte is fine but there
    /// aren't 6 bytes to read the length field. Indistinguishable from
    /// `Incomplete` to a caller that retains and appends more.
    TooShort,
    /// The tag byte itself is outside the recognized set. Terminal: more
    /// data appended to the same leading byte won't change that.
    InvalidTag,
}

/// Outcome of attempting to decode one frame from a buffer.
#[derive(Debug, Clone)]
pub enum DecodeOutcome {
    /// A full frame was present and decoded.
    Complete { consumed: usize, tag: u8, length: u32, frame: DecodedFrame },
    /// Fewer than `1 + length` bytes are available; retain and append more.
    Incomplete,
    /// Tag not in the recognized set, or buffer shorter than 6 bytes.
    Rejected(RejectReason),
}

/// Attempt to decode exactly one message from the start of `buf`.
///
/// Never consumes bytes on `Incomplete` or `Rejected`; the caller is
/// expected to retain `buf` and append more data before retrying.
pub fn decode_message(buf: &[u8]) -> DecodeOutcome {
    let Some(&tag) = buf.first() else {
        return DecodeOutcome::Rejected(RejectReason::TooShort);
    };
    if !RECOGNIZED_TAGS.contains(&tag) {
        return DecodeOutcome::Rejected(RejectReason::InvalidTag);
    }
    if buf.len() < 6 {
        return DecodeOutcome::Rejected(RejectReason::TooShort);
    }
    let Ok((length, _)) = read_u32_be(&buf[1..]) else {
        return DecodeOutcome::Rejected(RejectReason::TooShort);
    };
    let Ok(frame_len) = usize::try_from(length).map(|l| l.saturating_add(1)) else {
        return DecodeOutcome::Rejected(RejectReason::InvalidTag);
    };
    if buf.len() < frame_len {
        return DecodeOutcome::Incomplete;
    }
    // payload excludes the tag byte and the 4-byte length field itself.
    let payload_len = (length as usize).saturating_sub(4);
    let payload = &buf[5..5 + payload_len];

    let frame = match tag {
        TAG_QUERY => decode_query(payload),
        TAG_PARSE => decode_parse(payload),
        TAG_BIND => decode_bind(payload),
        TAG_ROW_DESCRIPTION | TAG_COMMAND_COMPLETE | TAG_PARSE_COMPLETE | TAG_PARAMETER_STATUS => {
            DecodedFrame::Response {
                error_info: None,
                error_code: None,
                error_severity: None,
            }
        }
        TAG_BIND_COMPLETE => decode_bind_complete(payload),
        TAG_ERROR_RESPONSE => decode_error_response(payload),
        _ => DecodedFrame::Ignored,
    };

    DecodeOutcome::Complete { consumed: frame_len, tag, length, frame }
}

/// Simple query: payload is `text \0`. The trailing NUL is required; a
/// missing terminator drops the message (logged) but still consumes the
/// frame, since the length field already bounded it.
fn decode_query(payload: &[u8]) -> DecodedFrame {
    match read_cstr(payload) {
        Ok((text, _rest)) => DecodedFrame::Request { query: text.to_string() },
        Err(err) => {
            tracing::warn!(%err, "simple query payload missing NUL terminator, dropping");
            DecodedFrame::Ignored
        }
    }
}

/// Parse: NUL-terminated statement name (discarded), then NUL-terminated
/// SQL text. Empty SQL text is dropped rather than queued.
fn decode_parse(payload: &[u8]) -> DecodedFrame {
    let result: Result<DecodedFrame, crate::error::Error> = (|| {
        let (_stmt_name, rest) = read_cstring(payload)?;
        let (query, _rest) = read_cstr(rest)?;
        if query.is_empty() {
            Ok(DecodedFrame::Ignored)
        } else {
            Ok(DecodedFrame::Request { query: query.to_string() })
        }
    })();
    result.unwrap_or_else(|err| {
        tracing::warn!(%err, "malformed Parse payload, dropping");
        DecodedFrame::Ignored
    })
}

/// Bind: two discarded names, `pn` format codes skipped, then `pc`
/// length-prefixed parameter values joined with `", "`.
fn decode_bind(payload: &[u8]) -> DecodedFrame {
    let result: Result<String, crate::error::Error> = (|| {
        let (_portal, rest) = read_cstring(payload)?;
        let (_stmt, rest) = read_cstring(rest)?;
        let (format_code_count, rest) = read_u16_be(rest)?;
        let (_skipped, rest) = read_bytes(rest, usize::from(format_code_count) * 2)?;
        let (param_count, mut rest) = read_u16_be(rest)?;
        let mut values = Vec::with_capacity(usize::from(param_count));
        for _ in 0..param_count {
            let (len, after_len) = read_i32_be(rest)?;
            let len = usize::try_from(len).unwrap_or(0);
            let (value, after_value) = read_bytes(after_len, len)?;
            values.push(String::from_utf8_lossy(value).into_owned());
            rest = after_value;
        }
        Ok(values.join(", "))
    })();
    match result {
        Ok(query) => DecodedFrame::Request { query },
        Err(err) => {
            tracing::warn!(%err, "malformed Bind payload, dropping");
            DecodedFrame::Ignored
        }
    }
}

/// BindComplete has no published payload; this decoder nonetheless skips
/// 10 bytes before attempting to read error fields, matching the observed
/// (likely buggy) original behavior. A well-formed zero-length BindComplete
/// simply finds nothing there and yields no error fields.
fn decode_bind_complete(payload: &[u8]) -> DecodedFrame {
    let after_skip = if payload.len() >= 10 { &payload[10..] } else { &[] };
    let (error_info, error_code, error_severity) = parse_error_fields(after_skip);
    DecodedFrame::Response { error_info, error_code, error_severity }
}

/// ErrorResponse: a sequence of `type (1 byte) | value (NUL-terminated)`
/// fields, terminated by a zero type byte.
fn decode_error_response(payload: &[u8]) -> DecodedFrame {
    let (error_info, error_code, error_severity) = parse_error_fields(payload);
    DecodedFrame::Response { error_info, error_code, error_severity }
}

/// Shared field-loop for ErrorResponse and BindComplete's post-skip scan.
/// Tolerant of truncated or absent field data: stops at the first failure
/// and returns whatever was captured so far.
fn parse_error_fields(mut data: &[u8]) -> (Option<String>, Option<String>, Option<String>) {
    let mut error_info = None;
    let mut error_code = None;
    let mut error_severity = None;
    loop {
        let Some((&field_type, rest)) = data.split_first() else {
            break;
        };
        if field_type == 0 {
            break;
        }
        let Ok((value, rest)) = read_cstr(rest) else {
            break;
        };
        match field_type {
            ERROR_FIELD_MESSAGE => error_info = Some(value.to_string()),
            ERROR_FIELD_CODE => error_code = Some(value.to_string()),
            ERROR_FIELD_SEVERITY => error_severity = Some(value.to_string()),
            _ => {}
        }
        data = rest;
    }
    (error_info, error_code, error_severity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(5 + payload.len());
        buf.push(tag);
        #[allow(clippy::cast_possible_truncation)]
        let len = (payload.len() + 4) as u32;
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn rejects_short_buffer() {
        let buf = [b'Q', 0, 0, 0];
        assert!(matches!(
            decode_message(&buf),
            DecodeOutcome::Rejected(RejectReason::TooShort)
        ));
    }

    #[test]
    fn rejects_unknown_tag() {
        let buf = frame(b'~', b"SELECT 1\0");
        assert!(matches!(
            decode_message(&buf),
            DecodeOutcome::Rejected(RejectReason::InvalidTag)
        ));
    }

    #[test]
    fn incomplete_waits_for_more_bytes() {
        let full = frame(TAG_QUERY, b"SELECT 1\0");
        let partial = &full[..full.len() - 1];
        assert!(matches!(decode_message(partial), DecodeOutcome::Incomplete));
    }

    #[test]
    fn simple_query_round_trip() {
        let buf = frame(TAG_QUERY, b"SELECT 1\0");
        match decode_message(&buf) {
            DecodeOutcome::Complete { consumed, frame: DecodedFrame::Request { query }, .. } => {
                assert_eq!(consumed, buf.len());
                assert_eq!(query, "SELECT 1");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn parse_with_empty_query_is_ignored() {
        let mut payload = Vec::new();
        payload.push(0); // empty statement name
        payload.push(0); // empty query text
        let buf = frame(TAG_PARSE, &payload);
        match decode_message(&buf) {
            DecodeOutcome::Complete { frame: DecodedFrame::Ignored, .. } => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn bind_joins_parameters() {
        let mut payload = Vec::new();
        payload.push(0); // portal
        payload.push(0); // statement
        payload.extend_from_slice(&0u16.to_be_bytes()); // 0 format codes
        payload.extend_from_slice(&1u16.to_be_bytes()); // 1 parameter
        payload.extend_from_slice(&2i32.to_be_bytes());
        payload.extend_from_slice(b"42");
        let buf = frame(TAG_BIND, &payload);
        match decode_message(&buf) {
            DecodeOutcome::Complete { frame: DecodedFrame::Request { query }, .. } => {
                assert_eq!(query, "42");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn bind_complete_plain_does_not_panic() {
        let buf = frame(TAG_BIND_COMPLETE, b"");
        match decode_message(&buf) {
            DecodeOutcome::Complete {
                frame: DecodedFrame::Response { error_info, error_code, error_severity },
                ..
            } => {
                assert!(error_info.is_none());
                assert!(error_code.is_none());
                assert!(error_severity.is_none());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn error_response_extracts_three_fields() {
        let mut payload = Vec::new();
        payload.push(ERROR_FIELD_SEVERITY);
        payload.extend_from_slice(b"ERROR\0");
        payload.push(ERROR_FIELD_CODE);
        payload.extend_from_slice(b"42601\0");
        payload.push(ERROR_FIELD_MESSAGE);
        payload.extend_from_slice(b"syntax error at or near \"SELEC\"\0");
        payload.push(0);
        let buf = frame(TAG_ERROR_RESPONSE, &payload);
        match decode_message(&buf) {
            DecodeOutcome::Complete {
                frame: DecodedFrame::Response { error_info, error_code, error_severity },
                ..
            } => {
                assert_eq!(error_severity.as_deref(), Some("ERROR"));
                assert_eq!(error_code.as_deref(), Some("42601"));
                assert_eq!(error_info.as_deref(), Some("syntax error at or near \"SELEC\""));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
