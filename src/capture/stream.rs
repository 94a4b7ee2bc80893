//! Stream adapter: component D.
//!
//! Drives one flow's parser from a channel of reassembled byte chunks,
//! buffering partial frames across reads exactly as described: a whole
//! frame per read is the fast path (no copy); a frame split across reads
//! grows a residual buffer. Two frames concatenated in one read are not
//! both decoded — the second is lost once the first is consumed. This is a
//! known limitation, not a bug to fix here.

use tokio::sync::mpsc;

use crate::buffer_pool::GLOBAL_BUFFER_POOL;
use crate::flow::{FlowParser, ParseOutcome};

/// Run the stream adapter loop for one flow until its chunk channel closes
/// (the flow was reaped, or the ingest side was torn down).
///
/// The residual buffer is drawn from the shared pool for the lifetime of
/// this task and returned to it when the task exits.
pub async fn run_stream_adapter(mut rx: mpsc::UnboundedReceiver<Vec<u8>>, mut parser: FlowParser) {
    let mut residual = GLOBAL_BUFFER_POOL.get_buffer();
    while let Some(chunk) = rx.recv().await {
        if chunk.is_empty() {
            continue;
        }
        if residual.is_empty() {
            match parser.parse(&chunk).await {
                ParseOutcome::Complete | ParseOutcome::Rejected => {}
                ParseOutcome::Incomplete => {
                    residual.clear();
                    residual.extend_from_slice(&chunk);
                }
            }
        } else {
            residual.extend_from_slice(&chunk);
            if parser.parse(&residual).await == ParseOutcome::Complete {
                residual.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc as tokio_mpsc;

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
    async fn split_frame_across_two_reads_still_completes() {
        let (intake_tx, mut intake_rx) = tokio_mpsc::channel(8);
        let parser = FlowParser::new(intake_tx);
        let (chunk_tx, chunk_rx) = tokio_mpsc::unbounded_channel();

        let full_q = frame(b'Q', b"SELECT 1\0");
        let split_at = 6;
        chunk_tx.send(full_q[..split_at].to_vec()).unwrap();
        chunk_tx.send(full_q[split_at..].to_vec()).unwrap();
        chunk_tx.send(frame(b'C', b"\0")).unwrap();
        drop(chunk_tx);

        run_stream_adapter(chunk_rx, parser).await;

        let msg = intake_rx.recv().await.expect("expected one completed message");
        assert_eq!(msg.query, "SELECT 1");
    }

    #[tokio::test]
    async fn byte_by_byte_feed_produces_same_outcome() {
        let (intake_tx, mut intake_rx) = tokio_mpsc::channel(8);
        let parser = FlowParser::new(intake_tx);
        let (chunk_tx, chunk_rx) = tokio_mpsc::unbounded_channel();

        let mut all = frame(b'Q', b"SELECT 1\0");
        all.extend(frame(b'C', b"\0"));
        for byte in all {
            chunk_tx.send(vec![byte]).unwrap();
        }
        drop(chunk_tx);

        run_stream_adapter(chunk_rx, parser).await;

        let msg = intake_rx.recv().await.expect("expected one completed message");
        assert_eq!(msg.query, "SELECT 1");
    }
}
