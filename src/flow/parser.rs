//! Per-flow parser: component C.
//!
//! Owns the pending FIFO for one direction of one TCP flow and turns
//! decoded frames into completed [`Message`]s handed to the aggregator.

use std::collections::VecDeque;

use tokio::sync::mpsc;

use crate::protocol::Message;
use crate::protocol::decode::{DecodeOutcome, DecodedFrame, RejectReason};
use crate::protocol::decode_message;

/// Outcome of [`FlowParser::parse`], distinguishing "wait for more bytes"
/// from "give up on these bytes" so the stream adapter knows whether to
/// retain the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A whole frame was consumed from the start of the buffer.
    Complete,
    /// Too few bytes for a full frame; retain and append more.
    Incomplete,
    /// Unrecognized tag or undersized buffer; not a framing-in-progress
    /// state, so the bytes are not retained.
    Rejected,
}

/// Maintains the in-flight request FIFO for one flow and forwards completed
/// messages to the statistics aggregator.
pub struct FlowParser {
    pending: VecDeque<Message>,
    intake: mpsc::Sender<Message>,
}

impl FlowParser {
    pub fn new(intake: mpsc::Sender<Message>) -> Self {
        Self { pending: VecDeque::new(), intake }
    }

    /// Attempt to decode and dispatch exactly one frame from the start of
    /// `buffer`.
    pub async fn parse(&mut self, buffer: &[u8]) -> ParseOutcome {
        match decode_message(buffer) {
            DecodeOutcome::Incomplete => ParseOutcome::Incomplete,
            // Too few bytes to read the length field is framing-in-progress,
            // not a genuine rejection: the caller must retain and retry
            // exactly as it does for `Incomplete`.
            DecodeOutcome::Rejected(RejectReason::TooShort) => ParseOutcome::Incomplete,
            DecodeOutcome::Rejected(RejectReason::InvalidTag) => ParseOutcome::Rejected,
            DecodeOutcome::Complete { tag, length, frame, .. } => {
                self.dispatch(tag, length, frame).await;
                ParseOutcome::Complete
            }
        }
    }

    async fn dispatch(&mut self, tag: u8, length: u32, frame: DecodedFrame) {
        match frame {
            DecodedFrame::Request { query } => {
                self.pending.push_back(Message::request(tag, length, query));
            }
            DecodedFrame::Response { error_info, error_code, error_severity } => {
                let Some(mut msg) = self.pending.pop_front() else {
                    tracing::warn!(tag = tag as char, "response-completing tag with empty pending FIFO, ignoring");
                    return;
                };
                msg = msg.complete();
                msg.error_info = error_info;
                msg.error_code = error_code;
                msg.error_severity = error_severity;
                if self.intake.send(msg).await.is_err() {
                    tracing::warn!("aggregator intake channel closed, dropping completed message");
                }
            }
            DecodedFrame::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::TAG_QUERY;

    fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(5 + payload.len());
        buf.push(tag);
        #[allow(clippy::cast_possible_truncation)]
        let len = (payload.len() + 4) as u32;
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[tokio::test]
    async fn simple_query_then_command_complete_emits_one_message() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut parser = FlowParser::new(tx);

        let q = frame(TAG_QUERY, b"SELECT 1\0");
        assert_eq!(parser.parse(&q).await, ParseOutcome::Complete);

        let c = frame(b'C', b"SELECT 1\0");
        assert_eq!(parser.parse(&c).await, ParseOutcome::Complete);

        let msg = rx.recv().await.expect("aggregator should receive a message");
        assert_eq!(msg.query, "SELECT 1");
        assert!(msg.cost_micros.is_some());
        assert!(!msg.has_error());
    }

    #[tokio::test]
    async fn response_with_empty_pending_is_ignored_not_fatal() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut parser = FlowParser::new(tx);

        let c = frame(b'C', b"\0");
        assert_eq!(parser.parse(&c).await, ParseOutcome::Complete);

        drop(parser);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn extended_query_path_tracks_parse_and_bind_separately() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut parser = FlowParser::new(tx);

        let mut parse_payload = vec![0]; // empty statement name
        parse_payload.extend_from_slice(b"SELECT $1\0");
        assert_eq!(parser.parse(&frame(b'P', &parse_payload)).await, ParseOutcome::Complete);

        let mut bind_payload = vec![0, 0]; // empty portal, empty statement
        bind_payload.extend_from_slice(&0u16.to_be_bytes()); // 0 format codes
        bind_payload.extend_from_slice(&1u16.to_be_bytes()); // 1 parameter
        bind_payload.extend_from_slice(&2i32.to_be_bytes());
        bind_payload.extend_from_slice(b"42");
        assert_eq!(parser.parse(&frame(b'B', &bind_payload)).await, ParseOutcome::Complete);

        assert_eq!(parser.parse(&frame(b'1', b"")).await, ParseOutcome::Complete);
        assert_eq!(parser.parse(&frame(b'2', b"")).await, ParseOutcome::Complete);

        let first = rx.recv().await.expect("ParseComplete should complete the Parse message");
        let second = rx.recv().await.expect("BindComplete should complete the Bind message");
        assert_eq!(first.query, "SELECT $1");
        assert_eq!(second.query, "42");
    }
}
