use core::future::Future;

/// Error type for stream input operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// USB/UDP/serial I/O error.
    Io,
    /// Connection lost / timeout.
    Disconnected,
    /// Received chunk larger than the receive buffer.
    BufferOverflow,
    /// UART framing error.
    Framing,
}

impl core::fmt::Display for InputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::BufferOverflow => write!(f, "buffer overflow"),
            Self::Framing => write!(f, "framing error"),
        }
    }
}

/// Async trait for export stream sources.
///
/// This trait abstracts where simulator telemetry arrives from (USB CDC,
/// UDP multicast, serial), so the bridge can be driven by any of them.
/// Chunks may be split anywhere; the parser reassembles them.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait StreamSource {
    /// Wait for the next chunk of stream bytes and copy it into `buf`.
    ///
    /// Returns the number of bytes written. The bridge drops this future
    /// when a tick comes first, so no bytes may be lost on cancellation.
    fn receive(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, InputError>>;

    /// Check if the source is connected.
    fn is_connected(&self) -> bool;
}
