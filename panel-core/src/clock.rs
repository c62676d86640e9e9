//! Monotonic time source.

use core::cell::Cell;

/// Monotonic microsecond clock.
///
/// The engine never reads wall-clock time directly; firmware passes a timer
/// driver, tests pass a [`ManualClock`].
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&self) -> u64;

    #[inline]
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    #[inline]
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: Cell<u64>,
}

impl ManualClock {
    #[must_use]
    pub const fn new() -> Self {
        Self { now_us: Cell::new(0) }
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_us.set(ms * 1000);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }

    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_us(&self) -> u64 {
        self.now_us.get()
    }
}
