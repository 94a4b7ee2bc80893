//! The decoded message record (component B/C data model).

use std::time::Instant;

/// Simple query.
pub const TAG_QUERY: u8 = b'Q';
/// Parse (extended query, prepare statement).
pub const TAG_PARSE: u8 = b'P';
/// Bind (extended query, bind parameters to a portal).
pub const TAG_BIND: u8 = b'B';
/// RowDescription.
pub const TAG_ROW_DESCRIPTION: u8 = b'T';
/// CommandComplete.
pub const TAG_COMMAND_COMPLETE: u8 = b'C';
/// ParseComplete.
pub const TAG_PARSE_COMPLETE: u8 = b'1';
/// BindComplete.
pub const TAG_BIND_COMPLETE: u8 = b'2';
/// ErrorResponse.
pub const TAG_ERROR_RESPONSE: u8 = b'E';
/// ParameterStatus.
pub const TAG_PARAMETER_STATUS: u8 = b'S';
/// EmptyQueryResponse.
pub const TAG_EMPTY_QUERY_RESPONSE: u8 = b'I';
/// ReadyForQuery.
pub const TAG_READY_FOR_QUERY: u8 = b'Z';

/// The full set of recognized PostgreSQL v3 frame tags.
///
/// Any tag outside this set causes the decoder to reject the buffer as
/// unrecognized, which doubles as a resynchronization guard when attaching
/// mid-stream.
pub const RECOGNIZED_TAGS: &[u8] = b"123ABCDEFGHIKNPQRSTVWXZcdfnpst";

/// ErrorResponse/NoticeResponse field-type bytes we care about; all other
/// field types are read and discarded.
pub const ERROR_FIELD_SEVERITY: u8 = b'S';
pub const ERROR_FIELD_CODE: u8 = b'C';
pub const ERROR_FIELD_MESSAGE: u8 = b'M';

/// A decoded PostgreSQL protocol frame, tracked from request to response.
#[derive(Debug, Clone)]
pub struct Message {
    /// Single-byte tag identifying the message kind.
    pub tag: u8,
    /// Declared payload length (the wire length field's value: includes
    /// itself, excludes the tag byte).
    pub length: u32,
    /// SQL text (or joined Bind parameter values) extracted from this
    /// message. May be empty.
    pub query: String,
    /// Wall-clock instant captured when a request-bearing message was
    /// decoded.
    pub created_at: Instant,
    /// Elapsed time from `created_at` to the matching response, in whole
    /// microseconds. Set only once this message has left the pending FIFO.
    pub cost_micros: Option<u64>,
    pub error_info: Option<String>,
    pub error_code: Option<String>,
    pub error_severity: Option<String>,
}

impl Message {
    /// A freshly decoded request-bearing message (Q, P, B), not yet paired
    /// with a response.
    pub fn request(tag: u8, length: u32, query: String) -> Self {
        Self {
            tag,
            length,
            query,
            created_at: Instant::now(),
            cost_micros: None,
            error_info: None,
            error_code: None,
            error_severity: None,
        }
    }

    /// Finish a pending message with a response, computing `cost_micros`
    /// from `created_at` to now.
    pub fn complete(mut self) -> Self {
        let elapsed = self.created_at.elapsed();
        self.cost_micros = Some(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
        self
    }

    /// True if any error field was populated from an ErrorResponse.
    pub fn has_error(&self) -> bool {
        self.error_info.is_some() || self.error_code.is_some() || self.error_severity.is_some()
    }
}
