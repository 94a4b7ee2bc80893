//! Statistics aggregator: component F.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};

use crate::protocol::Message;

/// Running statistics for one distinct SQL text, all in microseconds.
#[derive(Debug, Clone)]
pub struct SqlStats {
    pub min: u64,
    pub max: u64,
    pub calls: Vec<u64>,
}

/// A read-only view of the aggregator's tables, handed to the reporter at
/// shutdown. The aggregator task exits immediately after sending this; no
/// other task ever reads its state concurrently.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub by_sql: HashMap<String, SqlStats>,
    pub errors: Vec<Message>,
}

/// Sent by the signal-waiting task to request a final snapshot and end the
/// aggregator task in one step.
pub struct ShutdownRequest(pub oneshot::Sender<Snapshot>);

/// Runs until `control` yields a [`ShutdownRequest`] or its sender is
/// dropped. Does not drain `intake` after that point, matching the
/// cancellation policy: ingest tasks are abandoned, not waited on.
pub async fn run_aggregator(
    mut intake: mpsc::Receiver<Message>,
    mut control: mpsc::Receiver<ShutdownRequest>,
    verbose: bool,
) {
    let mut state = Snapshot::default();
    loop {
        tokio::select! {
            biased;
            request = control.recv() => {
                let Some(ShutdownRequest(reply)) = request else { return };
                let _ignored = reply.send(state);
                return;
            }
            msg = intake.recv() => {
                let Some(msg) = msg else { return };
                if verbose {
                    log_verbose(&msg);
                }
                update(&mut state, msg);
            }
        }
    }
}

fn log_verbose(msg: &Message) {
    let Some(micros) = msg.cost_micros else { return };
    #[allow(clippy::float_arithmetic)]
    let millis = micros as f64 / 1000.0;
    tracing::info!("{} {:.2}ms", msg.query, millis);
}

/// The update rule from component F: errors are mutually exclusive with
/// `by_sql`, empty queries are dropped, and samples extend min/max/calls.
fn update(state: &mut Snapshot, msg: Message) {
    if msg.has_error() {
        state.errors.push(msg);
        return;
    }
    if msg.query.is_empty() {
        return;
    }
    let cost = msg.cost_micros.unwrap_or(0);
    state
        .by_sql
        .entry(msg.query.clone())
        .and_modify(|stats| {
            stats.min = stats.min.min(cost);
            stats.max = stats.max.max(cost);
            stats.calls.push(cost);
        })
        .or_insert_with(|| SqlStats { min: cost, max: cost, calls: vec![cost] });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn completed(query: &str, micros: u64) -> Message {
        Message {
            tag: b'C',
            length: 0,
            query: query.to_string(),
            created_at: Instant::now(),
            cost_micros: Some(micros),
            error_info: None,
            error_code: None,
            error_severity: None,
        }
    }

    #[test]
    fn repeated_query_tracks_min_max_and_samples() {
        let mut state = Snapshot::default();
        update(&mut state, completed("SELECT 1", 100));
        update(&mut state, completed("SELECT 1", 50));
        update(&mut state, completed("SELECT 1", 200));

        let stats = state.by_sql.get("SELECT 1").expect("entry should exist");
        assert_eq!(stats.min, 50);
        assert_eq!(stats.max, 200);
        assert_eq!(stats.calls, vec![100, 50, 200]);
    }

    #[test]
    fn error_message_never_enters_by_sql() {
        let mut state = Snapshot::default();
        let mut msg = completed("SELEC 1", 10);
        msg.error_code = Some("42601".to_string());
        update(&mut state, msg);

        assert!(state.by_sql.is_empty());
        assert_eq!(state.errors.len(), 1);
    }

    #[test]
    fn empty_query_without_error_is_dropped() {
        let mut state = Snapshot::default();
        update(&mut state, completed("", 10));
        assert!(state.by_sql.is_empty());
        assert!(state.errors.is_empty());
    }
}
