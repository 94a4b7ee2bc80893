//! Packet capture and TCP reassembly: component H, plus the stream
//! adapter (component D), which lives here because it is the immediate
//! consumer of reassembled bytes.

pub mod reassembly;
pub mod source;
pub mod stream;
