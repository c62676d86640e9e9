//! USB-HID gamepad output mode.
//!
//! Instead of sending command lines to the simulator, the controller can
//! present itself as a gamepad. Arbitration still runs; winning values land
//! in a [`HidReport`] through per-label [`HidBinding`]s.

/// Number of buttons in the report.
pub const HID_BUTTONS: u8 = 32;

/// Number of 16-bit axes in the report.
pub const HID_AXES: usize = 8;

/// Report slot a command label drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "json", derive(serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum HidTarget {
    /// Button index (0-31); pressed while the value is nonzero.
    Button(u8),
    /// Axis index (0-7); takes the value as-is.
    Axis(u8),
}

/// Maps a command label to a report slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidBinding {
    pub label: &'static str,
    pub target: HidTarget,
}

impl HidBinding {
    #[must_use]
    pub const fn button(label: &'static str, index: u8) -> Self {
        Self {
            label,
            target: HidTarget::Button(index),
        }
    }

    #[must_use]
    pub const fn axis(label: &'static str, index: u8) -> Self {
        Self {
            label,
            target: HidTarget::Axis(index),
        }
    }
}

/// USB HID gamepad report.
///
/// Total size: 20 bytes (buttons: 4, axes: 8x2), little-endian.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidReport {
    /// Button bitfield (32 buttons)
    pub buttons: u32,
    pub axes: [u16; HID_AXES],
}

impl HidReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 4 + 2 * HID_AXES;

    /// Neutral/zero report.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: 0,
            axes: [0; HID_AXES],
        }
    }

    /// Apply one value to a report slot. Out-of-range slots are ignored.
    pub fn apply(&mut self, target: HidTarget, value: u16) {
        match target {
            HidTarget::Button(index) if index < HID_BUTTONS => {
                let bit = 1u32 << index;
                if value != 0 {
                    self.buttons |= bit;
                } else {
                    self.buttons &= !bit;
                }
            }
            HidTarget::Axis(index) if usize::from(index) < HID_AXES => {
                self.axes[usize::from(index)] = value;
            }
            _ => log::warn!("HID target {:?} out of range", target),
        }
    }

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.buttons.to_le_bytes());
        for (i, axis) in self.axes.iter().enumerate() {
            out[4 + 2 * i..6 + 2 * i].copy_from_slice(&axis.to_le_bytes());
        }
        out
    }
}

/// Report under construction plus its send pacing.
#[derive(Clone, Copy, Debug, Default)]
pub struct HidState {
    report: HidReport,
    dirty: bool,
    last_sent_us: Option<u64>,
}

impl HidState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            report: HidReport::neutral(),
            dirty: false,
            last_sent_us: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn report(&self) -> &HidReport {
        &self.report
    }

    /// Write a value into the report, marking it for the next send.
    pub fn apply(&mut self, target: HidTarget, value: u16) {
        let before = self.report;
        self.report.apply(target, value);
        self.dirty |= self.report != before;
    }

    /// Whether a changed report may go out now.
    #[must_use]
    pub fn is_due(&self, now_us: u64, min_interval_us: u64, forced: bool) -> bool {
        if !self.dirty {
            return false;
        }
        forced
            || self
                .last_sent_us
                .map_or(true, |last| now_us.saturating_sub(last) >= min_interval_us)
    }

    pub fn mark_sent(&mut self, now_us: u64) {
        self.dirty = false;
        self.last_sent_us = Some(now_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_buttons_and_axes() {
        let mut report = HidReport::neutral();
        report.apply(HidTarget::Button(0), 1);
        report.apply(HidTarget::Button(31), 2);
        report.apply(HidTarget::Axis(1), 0x1234);
        assert_eq!(report.buttons, 0x8000_0001);
        assert_eq!(report.axes[1], 0x1234);

        report.apply(HidTarget::Button(0), 0);
        assert_eq!(report.buttons, 0x8000_0000);
    }

    #[test]
    fn test_report_out_of_range_ignored() {
        let mut report = HidReport::neutral();
        report.apply(HidTarget::Button(40), 1);
        report.apply(HidTarget::Axis(9), 1);
        assert_eq!(report, HidReport::neutral());
    }

    #[test]
    fn test_report_bytes() {
        let mut report = HidReport::neutral();
        report.buttons = 0x0403_0201;
        report.axes[0] = 0xBBAA;
        let bytes = report.as_bytes();
        assert_eq!(&bytes[..6], &[0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB]);
        assert_eq!(bytes.len(), HidReport::SIZE);
    }

    #[test]
    fn test_state_pacing() {
        let mut state = HidState::new();
        assert!(!state.is_due(0, 10_000, false));

        state.apply(HidTarget::Button(3), 1);
        assert!(state.is_due(0, 10_000, false));
        state.mark_sent(1_000);

        state.apply(HidTarget::Button(3), 0);
        assert!(!state.is_due(5_000, 10_000, false));
        assert!(state.is_due(5_000, 10_000, true));
        assert!(state.is_due(11_000, 10_000, false));
    }

    #[test]
    fn test_unchanged_value_keeps_state_clean() {
        let mut state = HidState::new();
        state.apply(HidTarget::Axis(0), 0);
        assert!(!state.is_due(0, 0, true));
    }
}
