//! Error types for pgsniffer.

use thiserror::Error;

/// Result type for pgsniffer operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Top-level error type.
///
/// None of these tear down a per-flow task or the aggregator: decode
/// failures are handled inline by the per-flow parser and only surface here
/// when they come from the capture layer or CLI setup, where there is no
/// flow to keep alive.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a capture stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure opening or configuring the capture device (bad interface
    /// name, rejected BPF filter, insufficient privileges).
    #[error("capture error: {0}")]
    Capture(#[from] pcap::Error),
}

impl<Src: std::fmt::Debug, Dst: std::fmt::Debug + ?Sized> From<zerocopy::error::CastError<Src, Dst>>
    for Error
{
    fn from(err: zerocopy::error::CastError<Src, Dst>) -> Self {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("zerocopy cast error: {err:?}"),
        ))
    }
}
