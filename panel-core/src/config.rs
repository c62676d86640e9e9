//! Bridge timing and output configuration.

/// Where winning command values go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    /// `<LABEL> <VALUE>` lines to the simulator.
    #[default]
    DcsBios,
    /// USB-HID gamepad report.
    Hid,
}

/// Timing knobs for arbitration, throttling and stream health.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Time a grouped change must stay stable before it can win a flush.
    pub selector_dwell_ms: u64,
    /// Minimum spacing between two sends for one selector group.
    pub group_min_interval_us: u64,
    /// Repeats of the last sent value inside this window are dropped.
    pub value_throttle_ms: u64,
    /// A different value inside this window is parked until the next flush.
    pub any_value_throttle_ms: u64,
    /// Stream counts as alive while the last write is younger than this.
    pub stream_timeout_ms: u64,
    /// A dead stream must stay dead this long before it is reported paused.
    pub stream_down_debounce_ms: u64,
    /// An alive stream must stay alive this long before it is reported resumed.
    pub stream_up_debounce_ms: u64,
    /// Delay between mission start and the automatic panel sync.
    pub panel_sync_delay_ms: u64,
    /// Minimum spacing between HID reports.
    pub hid_min_interval_ms: u64,
    pub output_mode: OutputMode,
}

/// Default configuration: DCS-BIOS output, 250 ms dwell, 30 Hz per group.
pub const DEFAULT_CONFIG: BridgeConfig = BridgeConfig {
    selector_dwell_ms: 250,
    group_min_interval_us: 33_333,
    value_throttle_ms: 50,
    any_value_throttle_ms: 33,
    stream_timeout_ms: 1_000,
    stream_down_debounce_ms: 5_000,
    stream_up_debounce_ms: 100,
    panel_sync_delay_ms: 500,
    hid_min_interval_ms: 10,
    output_mode: OutputMode::DcsBios,
};

impl Default for BridgeConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

impl BridgeConfig {
    /// Same timings, different output mode.
    #[must_use]
    pub const fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }
}
