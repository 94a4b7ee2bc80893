//! Flow registry: component E.
//!
//! Maps a flow hash to the channel feeding that flow's stream-adapter task,
//! creating the task on first sight. The hash is the ordered endpoint pair
//! as handed to us by the capture layer — direction-sensitive, so the two
//! halves of one TCP connection land in different entries. This mirrors a
//! known correlation bug (see `capture::reassembly`) rather than fixing it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use crate::flow::parser::FlowParser;
use crate::protocol::Message;

/// A chunk of bytes observed for one flow, in arrival order.
pub type FlowChunk = Vec<u8>;

struct Inner {
    flows: RwLock<HashMap<u64, mpsc::UnboundedSender<FlowChunk>>>,
    intake: mpsc::Sender<Message>,
}

/// Shared handle; cheaply cloned and handed to the packet-ingest task.
#[derive(Clone)]
pub struct FlowRegistry {
    inner: Arc<Inner>,
}

impl FlowRegistry {
    pub fn new(intake: mpsc::Sender<Message>) -> Self {
        Self { inner: Arc::new(Inner { flows: RwLock::new(HashMap::new()), intake }) }
    }

    /// Forward one chunk of bytes to the flow identified by `flow_hash`,
    /// spawning its stream-adapter task on first sight.
    pub async fn dispatch(&self, flow_hash: u64, chunk: FlowChunk) {
        {
            let flows = self.inner.flows.read().await;
            if let Some(tx) = flows.get(&flow_hash) {
                if tx.send(chunk.clone()).is_ok() {
                    return;
                }
            }
        }
        let mut flows = self.inner.flows.write().await;
        // Re-check under the write lock: another task may have created
        // this flow (or the existing sender may have since closed) while
        // we waited for the lock.
        let needs_create = match flows.get(&flow_hash) {
            Some(tx) => tx.send(chunk.clone()).is_err(),
            None => true,
        };
        if needs_create {
            let (tx, rx) = mpsc::unbounded_channel();
            let parser = FlowParser::new(self.inner.intake.clone());
            tokio::spawn(crate::capture::stream::run_stream_adapter(rx, parser));
            let _ignored = tx.send(chunk);
            flows.insert(flow_hash, tx);
        }
    }
}
