//! Change detection and fan-out for decoded telemetry writes.
//!
//! Selector and metadata changes are reported as they arrive. LED, analog and
//! gauge changes are held until the frame boundary so outputs update
//! atomically, together with changed display strings.

use crate::display::{DisplayBuffers, TextBuffer};
use crate::resolver::{AddressIndex, MAX_DESCRIPTORS};
use crate::tables::TableError;
use crate::types::{ControlDescriptor, ControlType, DisplayField, UNSEEN};
use dcsbios_proto::TelemetryWrite;
use heapless::{FnvIndexMap, Vec};

/// Capacity of the per-frame output update queue.
pub const MAX_PENDING_UPDATES: usize = 220;

/// Maximum number of metadata labels cached (power of two).
pub const MAX_METADATA: usize = 32;

/// First address of the mission/aircraft name field.
pub const MISSION_NAME_ADDRESS: u16 = 0x0000;

/// Length of the mission/aircraft name field in bytes.
pub const MISSION_NAME_LEN: usize = 24;

/// A batched output change awaiting the frame boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingUpdate {
    pub label: &'static str,
    pub value: u16,
    pub max_value: u16,
}

/// Change delivered while the write is processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    Selector { label: &'static str, value: u16 },
    Metadata { label: &'static str, value: u16 },
}

/// Change delivered at the frame boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEvent<'t> {
    Display { label: &'static str, text: &'t str },
    Output(PendingUpdate),
}

/// Per-descriptor change detector and frame batcher.
#[derive(Debug)]
pub struct Dispatcher {
    last_seen: Vec<u16, MAX_DESCRIPTORS>,
    pending: Vec<PendingUpdate, MAX_PENDING_UPDATES>,
    dropped: u32,
    displays: DisplayBuffers,
    mission_name: TextBuffer<MISSION_NAME_LEN>,
    mission_dirty: bool,
    metadata: FnvIndexMap<&'static str, u16, MAX_METADATA>,
}

impl Dispatcher {
    /// # Errors
    ///
    /// Capacity errors from the descriptor or display tables.
    pub fn new(descriptor_count: usize, displays: &[DisplayField]) -> Result<Self, TableError> {
        let mut last_seen = Vec::new();
        last_seen
            .resize(descriptor_count, UNSEEN)
            .map_err(|_| TableError::TooManyDescriptors)?;
        Ok(Self {
            last_seen,
            pending: Vec::new(),
            dropped: 0,
            displays: DisplayBuffers::build(displays)?,
            mission_name: TextBuffer::new(MISSION_NAME_LEN),
            mission_dirty: false,
            metadata: FnvIndexMap::new(),
        })
    }

    /// Process one telemetry write.
    ///
    /// Display and mission name bytes are stored by address range. Each
    /// other descriptor at the address is checked against its last seen value.
    pub fn on_write(
        &mut self,
        write: TelemetryWrite,
        index: &AddressIndex,
        mut on_event: impl FnMut(ControlEvent),
    ) {
        let offset = usize::from(write.address.wrapping_sub(MISSION_NAME_ADDRESS));
        if offset < MISSION_NAME_LEN {
            self.mission_name.write_word(offset, write.value);
            self.mission_dirty = true;
        }

        self.displays.write(write.address, write.value);

        for (i, descriptor) in index.resolve(write.address) {
            if descriptor.control_type == ControlType::Display {
                continue;
            }

            let value = descriptor.extract(write.value);
            let Some(seen) = self.last_seen.get_mut(i) else {
                continue;
            };
            if *seen == value {
                continue;
            }
            *seen = value;

            if descriptor.control_type.is_batched() {
                let update = PendingUpdate {
                    label: descriptor.label,
                    value,
                    max_value: descriptor.max_value,
                };
                if self.pending.push(update).is_err() {
                    self.dropped = self.dropped.saturating_add(1);
                    log::warn!(
                        "update queue full, dropped {} ({} total)",
                        descriptor.label,
                        self.dropped
                    );
                }
                continue;
            }

            match descriptor.control_type {
                ControlType::Selector => on_event(ControlEvent::Selector {
                    label: descriptor.label,
                    value,
                }),
                ControlType::Metadata => {
                    if self.metadata.insert(descriptor.label, value).is_err() {
                        log::warn!("metadata cache full, {} not stored", descriptor.label);
                    }
                    on_event(ControlEvent::Metadata {
                        label: descriptor.label,
                        value,
                    });
                }
                _ => {}
            }
        }
    }

    /// Deliver the frame: changed displays, then queued output updates.
    ///
    /// Returns the mission name if it changed during the frame.
    pub fn commit_frame(
        &mut self,
        mut on_event: impl FnMut(FrameEvent<'_>),
    ) -> Option<[u8; MISSION_NAME_LEN]> {
        self.displays
            .commit(|label, text| on_event(FrameEvent::Display { label, text }));

        for update in self.pending.iter() {
            on_event(FrameEvent::Output(*update));
        }
        self.pending.clear();

        if !self.mission_dirty {
            return None;
        }
        self.mission_dirty = false;
        if !self.mission_name.is_dirty() {
            return None;
        }
        self.mission_name.commit();

        let mut name = [b' '; MISSION_NAME_LEN];
        name.copy_from_slice(self.mission_name.bytes());
        Some(name)
    }

    /// Forget every last seen value and display shadow.
    pub fn invalidate_caches(&mut self) {
        self.last_seen.fill(UNSEEN);
        self.displays.invalidate();
    }

    /// Forget last seen values of selector descriptors only.
    pub fn invalidate_selectors(&mut self, descriptors: &[ControlDescriptor]) {
        for (seen, descriptor) in self.last_seen.iter_mut().zip(descriptors) {
            if descriptor.control_type == ControlType::Selector {
                *seen = UNSEEN;
            }
        }
    }

    /// Blank the mission name and poison its shadow.
    pub fn force_mission_stop(&mut self) {
        self.mission_name.clear();
        self.mission_name.invalidate();
        self.mission_dirty = false;
    }

    #[must_use]
    pub fn metadata(&self, label: &str) -> Option<u16> {
        self.metadata.get(label).copied()
    }

    #[must_use]
    pub fn display_text(&self, label: &str) -> Option<&str> {
        self.displays.text(label)
    }

    #[must_use]
    pub fn mission_name(&self) -> &[u8] {
        self.mission_name.bytes()
    }

    /// Updates dropped because the frame queue was full.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::fixtures::{mission_name_words, DESCRIPTORS, DISPLAYS};
    use std::string::String;
    use std::vec::Vec;

    fn setup() -> (AddressIndex, Dispatcher) {
        let index = AddressIndex::build(DESCRIPTORS).unwrap();
        let dispatcher = Dispatcher::new(DESCRIPTORS.len(), DISPLAYS).unwrap();
        (index, dispatcher)
    }

    fn collect_frame(dispatcher: &mut Dispatcher) -> (Vec<(String, String)>, Vec<PendingUpdate>) {
        let mut displays = Vec::new();
        let mut outputs = Vec::new();
        dispatcher.commit_frame(|event| match event {
            FrameEvent::Display { label, text } => displays.push((String::from(label), String::from(text))),
            FrameEvent::Output(update) => outputs.push(update),
        });
        (displays, outputs)
    }

    #[test]
    fn test_selector_delivered_immediately_once() {
        let (index, mut dispatcher) = setup();
        let mut events = Vec::new();

        dispatcher.on_write(TelemetryWrite::new(0x7514, 2 << 11), &index, |e| events.push(e));
        dispatcher.on_write(TelemetryWrite::new(0x7514, 2 << 11), &index, |e| events.push(e));

        assert_eq!(
            events,
            [ControlEvent::Selector {
                label: "ECM_MODE_SW",
                value: 2
            }]
        );
    }

    #[test]
    fn test_leds_batched_until_frame() {
        let (index, mut dispatcher) = setup();
        let mut events = Vec::new();

        // Both lamps share the word
        dispatcher.on_write(TelemetryWrite::new(0x7408, 0x0A00), &index, |e| events.push(e));
        assert!(events.is_empty());

        let (_, outputs) = collect_frame(&mut dispatcher);
        assert_eq!(
            outputs,
            [
                PendingUpdate { label: "MASTER_CAUTION_LT", value: 1, max_value: 1 },
                PendingUpdate { label: "APU_READY_LT", value: 1, max_value: 1 },
            ]
        );

        // Only the APU lamp changes
        dispatcher.on_write(TelemetryWrite::new(0x7408, 0x0200), &index, |_| {});
        let (_, outputs) = collect_frame(&mut dispatcher);
        assert_eq!(
            outputs,
            [PendingUpdate { label: "APU_READY_LT", value: 0, max_value: 1 }]
        );
    }

    #[test]
    fn test_change_suppression_and_invalidation() {
        let (index, mut dispatcher) = setup();

        dispatcher.on_write(TelemetryWrite::new(0x7500, 1234), &index, |_| {});
        dispatcher.on_write(TelemetryWrite::new(0x7500, 1234), &index, |_| {});
        assert_eq!(collect_frame(&mut dispatcher).1.len(), 1);

        dispatcher.on_write(TelemetryWrite::new(0x7500, 1234), &index, |_| {});
        assert!(collect_frame(&mut dispatcher).1.is_empty());

        dispatcher.invalidate_caches();
        dispatcher.on_write(TelemetryWrite::new(0x7500, 1234), &index, |_| {});
        assert_eq!(
            collect_frame(&mut dispatcher).1,
            [PendingUpdate { label: "HYD_IND_LEFT", value: 1234, max_value: 65535 }]
        );
    }

    #[test]
    fn test_queue_overflow_counts_drops() {
        let (index, mut dispatcher) = setup();
        for v in 0..(MAX_PENDING_UPDATES as u16 + 5) {
            dispatcher.on_write(TelemetryWrite::new(0x7500, v), &index, |_| {});
        }
        assert_eq!(dispatcher.dropped(), 5);
        assert_eq!(collect_frame(&mut dispatcher).1.len(), MAX_PENDING_UPDATES);
    }

    #[test]
    fn test_metadata_cached_and_delivered() {
        let (index, mut dispatcher) = setup();
        let mut events = Vec::new();
        dispatcher.on_write(TelemetryWrite::new(0xFFFE, 0x1207), &index, |e| events.push(e));
        assert_eq!(
            events,
            [ControlEvent::Metadata { label: "_UPDATE_COUNTER", value: 7 }]
        );
        assert_eq!(dispatcher.metadata("_UPDATE_COUNTER"), Some(7));
        assert_eq!(dispatcher.metadata("OTHER"), None);
    }

    #[test]
    fn test_display_committed_at_frame() {
        let (index, mut dispatcher) = setup();
        dispatcher.on_write(TelemetryWrite::new(0x7428, u16::from_le_bytes(*b"CH")), &index, |_| {});
        dispatcher.on_write(TelemetryWrite::new(0x742A, u16::from_le_bytes(*b"AN")), &index, |_| {});

        let (displays, _) = collect_frame(&mut dispatcher);
        assert_eq!(
            displays,
            [(String::from("UFC_OPTION_DISPLAY_1"), String::from("CHAN"))]
        );
        assert!(collect_frame(&mut dispatcher).0.is_empty());

        dispatcher.invalidate_caches();
        assert_eq!(collect_frame(&mut dispatcher).0.len(), 1);
    }

    #[test]
    fn test_mission_name_reported_on_change() {
        let (index, mut dispatcher) = setup();
        for (i, w) in mission_name_words("FA-18C_hornet").iter().enumerate() {
            dispatcher.on_write(TelemetryWrite::new(2 * i as u16, *w), &index, |_| {});
        }
        let name = dispatcher.commit_frame(|_| {}).unwrap();
        assert!(name.starts_with(b"FA-18C_hornet "));

        // Same name again: no report
        for (i, w) in mission_name_words("FA-18C_hornet").iter().enumerate() {
            dispatcher.on_write(TelemetryWrite::new(2 * i as u16, *w), &index, |_| {});
        }
        assert!(dispatcher.commit_frame(|_| {}).is_none());
    }

    #[test]
    fn test_force_mission_stop_poisons_shadow() {
        let (index, mut dispatcher) = setup();
        for (i, w) in mission_name_words("").iter().enumerate() {
            dispatcher.on_write(TelemetryWrite::new(2 * i as u16, *w), &index, |_| {});
        }
        assert!(dispatcher.commit_frame(|_| {}).is_some());

        dispatcher.force_mission_stop();
        assert!(dispatcher.mission_name().iter().all(|&b| b == b' '));

        // A blank update is now a change again
        dispatcher.on_write(TelemetryWrite::new(0, u16::from_le_bytes(*b"  ")), &index, |_| {});
        assert!(dispatcher.commit_frame(|_| {}).is_some());
    }

    #[test]
    fn test_invalidate_selectors_only() {
        let (index, mut dispatcher) = setup();
        let mut count = 0;
        dispatcher.on_write(TelemetryWrite::new(0x7514, 1 << 11), &index, |_| count += 1);
        dispatcher.on_write(TelemetryWrite::new(0x7500, 9), &index, |_| {});
        collect_frame(&mut dispatcher);

        dispatcher.invalidate_selectors(DESCRIPTORS);
        dispatcher.on_write(TelemetryWrite::new(0x7514, 1 << 11), &index, |_| count += 1);
        dispatcher.on_write(TelemetryWrite::new(0x7500, 9), &index, |_| {});
        assert_eq!(count, 2);
        assert!(collect_frame(&mut dispatcher).1.is_empty());
    }
}
