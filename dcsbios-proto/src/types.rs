//! Decoded stream items: telemetry writes and frame boundaries.

/// One decoded `(address, value)` pair from the export stream.
///
/// Produced once per completed data word and consumed immediately by the
/// dispatcher. Never retained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryWrite {
    pub address: u16,
    pub value: u16,
}

impl TelemetryWrite {
    #[must_use]
    pub const fn new(address: u16, value: u16) -> Self {
        Self { address, value }
    }
}

/// Event emitted by [`StreamParser`](crate::StreamParser) for a single byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum StreamEvent {
    /// A data word was decoded.
    Write(TelemetryWrite),
    /// A sync marker closed a frame that carried at least one write.
    FrameComplete,
}

