//! Panel source fed by input-polling tasks through an embassy channel.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use heapless::FnvIndexMap;
use panel_core::PanelSource;

/// Most distinct control labels remembered for panel sync.
pub const MAX_POSITIONS: usize = 256;

/// One physical control change: command or position label and its value.
pub type ControlChange = (&'static str, u16);

/// Collects control changes that switch, encoder and potentiometer tasks
/// push into a channel.
///
/// The last value seen for every label is kept, so a panel sync replays the
/// current panel state.
pub struct ChannelPanels<'ch, M: RawMutex, const N: usize> {
    rx: Receiver<'ch, M, ControlChange, N>,
    positions: FnvIndexMap<&'static str, u16, MAX_POSITIONS>,
}

impl<'ch, M: RawMutex, const N: usize> ChannelPanels<'ch, M, N> {
    pub fn new(rx: Receiver<'ch, M, ControlChange, N>) -> Self {
        Self {
            rx,
            positions: FnvIndexMap::new(),
        }
    }

    /// Last value reported for `label`.
    #[must_use]
    pub fn position(&self, label: &str) -> Option<u16> {
        self.positions.get(label).copied()
    }

    fn remember(&mut self, label: &'static str, value: u16) {
        if self.positions.insert(label, value).is_err() {
            log_warn!("panel position table full, {} not kept", label);
        }
    }
}

impl<M: RawMutex, const N: usize> PanelSource for ChannelPanels<'_, M, N> {
    fn resync(&mut self, request: &mut dyn FnMut(&str, u16)) {
        while let Ok((label, value)) = self.rx.try_receive() {
            self.remember(label, value);
        }
        for (&label, &value) in self.positions.iter() {
            request(label, value);
        }
    }

    fn poll_changes(&mut self, request: &mut dyn FnMut(&str, u16)) {
        while let Ok((label, value)) = self.rx.try_receive() {
            self.remember(label, value);
            request(label, value);
        }
    }
}
