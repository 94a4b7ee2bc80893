//! Orchestration: wires components D–G into the running process.

use tokio::sync::{mpsc, oneshot};

use crate::capture::source::{list_devices, run_capture};
use crate::cli::Cli;
use crate::error::Result;
use crate::flow::FlowRegistry;
use crate::stats::aggregator::ShutdownRequest;
use crate::stats::{print_report, run_aggregator};

const INTAKE_CAPACITY: usize = 2000;

/// Print every capturable interface, one per line.
fn print_device_list() -> Result<()> {
    for (name, desc) in list_devices()? {
        match desc {
            Some(desc) => println!("{name}\t{desc}"),
            None => println!("{name}"),
        }
    }
    Ok(())
}

fn print_usage() {
    println!("pgsniffer - passive PostgreSQL query latency sniffer");
    println!();
    println!("  -i <interface>  capture interface name (default: lo0)");
    println!("  -f <filter>     BPF filter expression (default: tcp port 5432)");
    println!("  -n <count>      top-N slowest queries to print (default: 50)");
    println!("  -v <bool>       log every captured query with its latency (default: true)");
    println!("  -l              list interfaces and exit");
    println!("  -h              print this message and list interfaces");
    println!();
    println!("Available interfaces:");
}

/// Run pgsniffer to completion: either a one-shot informational mode
/// (`-l`/`-h`) or the full capture-until-signal lifecycle.
pub async fn run(cli: Cli) -> Result<()> {
    if cli.help {
        print_usage();
        return print_device_list();
    }
    if cli.list_devices {
        return print_device_list();
    }

    let (intake_tx, intake_rx) = mpsc::channel(INTAKE_CAPACITY);
    let (control_tx, control_rx) = mpsc::channel(1);

    let aggregator = tokio::spawn(run_aggregator(intake_rx, control_rx, cli.verbose));

    let registry = FlowRegistry::new(intake_tx);
    let rt = tokio::runtime::Handle::current();
    let interface = cli.interface.clone();
    let filter = cli.filter.clone();
    let mut ingest =
        tokio::task::spawn_blocking(move || run_capture(&interface, &filter, registry, rt));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                tracing::warn!(%err, "error waiting for ctrl-c signal");
            }
        }
        result = &mut ingest => {
            if let Ok(Err(err)) = result {
                tracing::warn!(%err, "capture loop ended with an error");
            }
        }
    }

    let (reply_tx, reply_rx) = oneshot::channel();
    let _ignored = control_tx.send(ShutdownRequest(reply_tx)).await;
    if let Ok(snapshot) = reply_rx.await {
        print_report(&snapshot, cli.top_n);
    }
    drop(aggregator);

    Ok(())
}
