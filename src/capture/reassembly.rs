//! Minimal TCP reassembler.
//!
//! No crate in reach offers gopacket's `tcpassembly`-equivalent, so this is
//! hand-rolled: just enough sequence-number ordering to hand the stream
//! adapter (component D) a best-effort ordered per-flow byte stream.
//! Retransmit/overlap handling is simplistic (exact-sequence dedup only);
//! full stream reconstruction is explicitly the capture library's job,
//! which this module stands in for.

use std::collections::{BTreeMap, HashMap};

/// One TCP/IPv4 segment with its payload already sliced out.
pub struct TcpSegment<'a> {
    pub src_ip: [u8; 4],
    pub dst_ip: [u8; 4],
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub syn: bool,
    pub payload: &'a [u8],
}

/// Direction-sensitive flow hash: the ordered (src, dst) endpoint pair.
/// Deliberately NOT canonicalized — see `flow::registry`'s doc comment for
/// why this reproduces a known correlation bug rather than fixing it.
pub fn flow_hash(seg: &TcpSegment<'_>) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    seg.src_ip.hash(&mut hasher);
    seg.src_port.hash(&mut hasher);
    seg.dst_ip.hash(&mut hasher);
    seg.dst_port.hash(&mut hasher);
    hasher.finish()
}

/// Parse an Ethernet + IPv4 + TCP frame, returning the segment if all three
/// layers are present and well-formed. Anything else (IPv6, ARP, non-TCP
/// IPv4, truncated headers) is treated as "unusable" per the capture
/// contract: silently skipped.
pub fn parse_ipv4_tcp(frame: &[u8]) -> Option<TcpSegment<'_>> {
    const ETH_HEADER_LEN: usize = 14;
    const ETHERTYPE_IPV4: u16 = 0x0800;

    if frame.len() < ETH_HEADER_LEN + 20 {
        return None;
    }
    let ethertype = u16::from_be_bytes([frame[12], frame[13]]);
    if ethertype != ETHERTYPE_IPV4 {
        return None;
    }
    let ip = &frame[ETH_HEADER_LEN..];
    let version = ip[0] >> 4;
    if version != 4 {
        return None;
    }
    let ihl = usize::from(ip[0] & 0x0f) * 4;
    if ihl < 20 || ip.len() < ihl + 20 {
        return None;
    }
    const PROTO_TCP: u8 = 6;
    if ip[9] != PROTO_TCP {
        return None;
    }
    let src_ip = [ip[12], ip[13], ip[14], ip[15]];
    let dst_ip = [ip[16], ip[17], ip[18], ip[19]];
    let tcp = &ip[ihl..];
    let src_port = u16::from_be_bytes([tcp[0], tcp[1]]);
    let dst_port = u16::from_be_bytes([tcp[2], tcp[3]]);
    let seq = u32::from_be_bytes([tcp[4], tcp[5], tcp[6], tcp[7]]);
    let data_offset = usize::from(tcp[12] >> 4) * 4;
    if data_offset < 20 || tcp.len() < data_offset {
        return None;
    }
    let syn = tcp[13] & 0x02 != 0;
    let payload = &tcp[data_offset..];
    Some(TcpSegment { src_ip, dst_ip, src_port, dst_port, seq, syn, payload })
}

struct FlowState {
    next_seq: Option<u32>,
    out_of_order: BTreeMap<u32, Vec<u8>>,
}

/// Tracks per-flow expected sequence numbers and reorders segments that
/// arrive out of order, emitting contiguous runs as they become available.
#[derive(Default)]
pub struct Reassembler {
    flows: HashMap<u64, FlowState>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self { flows: HashMap::new() }
    }

    /// Feed one segment in, returning any bytes now ready for delivery in
    /// order (may be empty if the segment was buffered awaiting an earlier
    /// one, or a duplicate/retransmit of already-delivered data).
    pub fn feed(&mut self, hash: u64, seg: &TcpSegment<'_>) -> Vec<u8> {
        let state = self
            .flows
            .entry(hash)
            .or_insert_with(|| FlowState { next_seq: None, out_of_order: BTreeMap::new() });

        let mut expected = match state.next_seq {
            None => {
                // First segment seen for this flow: a SYN's data starts the
                // stream at seq+1; otherwise trust the first observed seq.
                let start = if seg.syn { seg.seq.wrapping_add(1) } else { seg.seq };
                state.next_seq = Some(start);
                start
            }
            Some(next) => next,
        };

        if !seg.payload.is_empty() {
            if seg.seq == expected {
                state.out_of_order.insert(seg.seq, seg.payload.to_vec());
            } else if seg.seq > expected {
                state.out_of_order.entry(seg.seq).or_insert_with(|| seg.payload.to_vec());
            }
            // seg.seq < expected: fully-delivered retransmit, drop.
        }

        let mut out = Vec::new();
        while let Some((&seq, _)) = state.out_of_order.iter().next() {
            if seq != expected {
                break;
            }
            let Some(data) = state.out_of_order.remove(&seq) else {
                break;
            };
            expected = expected.wrapping_add(u32::try_from(data.len()).unwrap_or(u32::MAX));
            out.extend(data);
        }
        state.next_seq = Some(expected);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_order_segments_reorder() {
        let mut r = Reassembler::new();
        let seg_a = TcpSegment {
            src_ip: [1, 1, 1, 1],
            dst_ip: [2, 2, 2, 2],
            src_port: 1000,
            dst_port: 5432,
            seq: 100,
            syn: false,
            payload: b"AAAA",
        };
        let seg_b = TcpSegment {
            src_ip: [1, 1, 1, 1],
            dst_ip: [2, 2, 2, 2],
            src_port: 1000,
            dst_port: 5432,
            seq: 104,
            syn: false,
            payload: b"BBBB",
        };
        let hash = flow_hash(&seg_a);
        // seg_b arrives first but seq 104 follows seg_a's 100..104.
        assert!(r.feed(hash, &seg_b).is_empty());
        assert_eq!(r.feed(hash, &seg_a), b"AAAABBBB".to_vec());
    }
}
