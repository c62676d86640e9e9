//! Periodic wake-up for the bridge loop.

use core::future::Future;

/// Default tick period of the bridge loop.
pub const TICK_PERIOD_MS: u64 = 10;

/// Completes once per tick period.
///
/// The bridge races this against its stream source, so arbitration, stream
/// health and HID reports keep running while the simulator is silent.
pub trait TickSource {
    /// Wait for the next tick.
    fn next(&mut self) -> impl Future<Output = ()>;
}

#[cfg(feature = "time")]
impl TickSource for embassy_time::Ticker {
    fn next(&mut self) -> impl Future<Output = ()> {
        embassy_time::Ticker::next(self)
    }
}

/// A ticker firing every [`TICK_PERIOD_MS`].
#[cfg(feature = "time")]
#[must_use]
pub fn default_ticker() -> embassy_time::Ticker {
    embassy_time::Ticker::every(embassy_time::Duration::from_millis(TICK_PERIOD_MS))
}
