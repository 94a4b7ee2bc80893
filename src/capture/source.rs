//! Capture source: component H.
//!
//! Owns the `pcap` collaborator: interface enumeration, live capture with a
//! fixed snaplen and promiscuous mode, BPF filter installation, and the
//! packet loop. A `nil` packet (capture source exhausted) ends the loop; a
//! packet with no Ethernet+IPv4+TCP layers is silently skipped, per the
//! capture library contract.

use tokio::runtime::Handle;

use crate::capture::reassembly::{Reassembler, flow_hash, parse_ipv4_tcp};
use crate::error::{Error, Result};
use crate::flow::FlowRegistry;

const SNAPLEN: i32 = 65535;

/// List capturable interfaces, as `(name, description)` pairs.
pub fn list_devices() -> Result<Vec<(String, Option<String>)>> {
    let devices = pcap::Device::list()?;
    Ok(devices.into_iter().map(|d| (d.name, d.desc)).collect())
}

/// Run the blocking packet-capture loop on `interface`, applying `filter`
/// as a BPF expression, until the capture source ends. Intended to run
/// inside `tokio::task::spawn_blocking`; `rt` lets it hand reassembled
/// chunks back into the async world via `FlowRegistry::dispatch`.
pub fn run_capture(
    interface: &str,
    filter: &str,
    registry: FlowRegistry,
    rt: Handle,
) -> Result<()> {
    let device = pcap::Device::list()?
        .into_iter()
        .find(|d| d.name == interface)
        .ok_or_else(|| Error::Capture(pcap::Error::PcapError(format!("no such device: {interface}"))))?;

    let mut capture = pcap::Capture::from_device(device)?
        .promisc(true)
        .snaplen(SNAPLEN)
        .timeout(1000)
        .open()?;
    capture.filter(filter, true)?;

    let mut reassembler = Reassembler::new();

    loop {
        let packet = match capture.next_packet() {
            Ok(packet) => packet,
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(pcap::Error::NoMorePackets) => break,
            Err(err) => {
                tracing::warn!(%err, "capture error, ending capture loop");
                break;
            }
        };
        let Some(segment) = parse_ipv4_tcp(packet.data) else {
            continue;
        };
        let hash = flow_hash(&segment);
        let chunk = reassembler.feed(hash, &segment);
        if chunk.is_empty() {
            continue;
        }
        rt.block_on(registry.dispatch(hash, chunk));
    }
    Ok(())
}
