use core::future::Future;
use panel_core::HidReport;

/// Error type for transport output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/UDP/serial I/O error.
    Io,
    /// Transport not ready (e.g., USB not enumerated).
    NotReady,
    /// Item dropped (e.g., host not polling fast enough).
    Dropped,
    /// Endpoint busy.
    Busy,
    /// This transport cannot carry the item.
    NotSupported,
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::NotReady => write!(f, "not ready"),
            Self::Dropped => write!(f, "dropped"),
            Self::Busy => write!(f, "busy"),
            Self::NotSupported => write!(f, "not supported"),
        }
    }
}

/// Async trait for the link back to the simulator (or the USB host in HID
/// mode).
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait CommandTransport {
    /// Write one serialized command line, terminator included.
    fn send_line(&mut self, line: &[u8]) -> impl Future<Output = Result<(), OutputError>>;

    /// Send one HID gamepad report.
    fn send_report(&mut self, report: &HidReport) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the transport is ready to accept data.
    fn is_ready(&self) -> bool;
}
