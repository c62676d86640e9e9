//! Per-aircraft control tables.
//!
//! The tables are generated from the simulator's control reference for one
//! airframe. They are read-only for the life of the process: either `const`
//! slices compiled into the firmware, or (with the `json` feature) a JSON
//! document parsed once at boot.

use crate::hid::HidBinding;
use crate::types::{ControlDescriptor, DisplayField, SelectorPosition, TrackedCommand};

/// Error building engine state from a table set. Always a boot-time failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// More descriptors than the per-descriptor cache can hold.
    TooManyDescriptors,
    /// More distinct telemetry addresses than the address index can hold.
    TooManyAddresses,
    /// More tracked commands than the history table can hold.
    TooManyCommands,
    /// A command label appears twice in the tracked command table.
    DuplicateCommand,
    /// More display fields than the display registry can hold.
    TooManyDisplays,
    /// A display field is longer than a display buffer.
    DisplayTooLong,
    /// The JSON document could not be parsed.
    Json,
}

impl core::fmt::Display for TableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooManyDescriptors => write!(f, "too many control descriptors"),
            Self::TooManyAddresses => write!(f, "too many telemetry addresses"),
            Self::TooManyCommands => write!(f, "too many tracked commands"),
            Self::DuplicateCommand => write!(f, "duplicate command label"),
            Self::TooManyDisplays => write!(f, "too many display fields"),
            Self::DisplayTooLong => write!(f, "display field too long"),
            Self::Json => write!(f, "malformed aircraft table document"),
        }
    }
}

/// Everything the engine knows about one airframe.
#[derive(Clone, Copy, Debug)]
pub struct AircraftTables {
    /// Expected aircraft name prefix, matched against the mission name field.
    /// Empty accepts any non-blank name.
    pub aircraft_name: &'static str,
    pub descriptors: &'static [ControlDescriptor],
    pub selectors: &'static [SelectorPosition],
    pub commands: &'static [TrackedCommand],
    pub displays: &'static [DisplayField],
    pub hid_bindings: &'static [HidBinding],
}

impl AircraftTables {
    /// Tables with no controls at all.
    pub const EMPTY: Self = Self {
        aircraft_name: "",
        descriptors: &[],
        selectors: &[],
        commands: &[],
        displays: &[],
        hid_bindings: &[],
    };

    /// Look up a selector position by its position label.
    #[must_use]
    pub fn selector_position(&self, label: &str) -> Option<&'static SelectorPosition> {
        self.selectors.iter().find(|p| p.label == label)
    }

    /// Human-readable position for a command value.
    ///
    /// Exact `(command, value)` match first; otherwise a position whose label
    /// is the command label itself (two-position switches often alias the
    /// command name).
    #[must_use]
    pub fn position_label(&self, command: &str, value: u16) -> Option<&'static str> {
        self.selectors
            .iter()
            .find(|p| p.command == command && p.value == value)
            .or_else(|| self.selectors.iter().find(|p| p.label == command))
            .map(|p| p.label)
    }

    #[must_use]
    pub fn hid_binding(&self, label: &str) -> Option<&'static HidBinding> {
        self.hid_bindings.iter().find(|b| b.label == label)
    }
}

#[cfg(feature = "json")]
mod json {
    use super::{AircraftTables, TableError};
    use crate::hid::{HidBinding, HidTarget};
    use crate::types::{ControlDescriptor, ControlType, DisplayField, SelectorPosition, TrackedCommand};
    use serde::Deserialize;
    use std::boxed::Box;
    use std::string::String;
    use std::vec::Vec;

    #[derive(Deserialize)]
    struct Document {
        #[serde(default)]
        aircraft: String,
        #[serde(default)]
        controls: Vec<ControlRecord>,
        #[serde(default)]
        selectors: Vec<SelectorRecord>,
        #[serde(default)]
        commands: Vec<CommandRecord>,
        #[serde(default)]
        displays: Vec<DisplayRecord>,
        #[serde(default)]
        hid: Vec<HidRecord>,
    }

    #[derive(Deserialize)]
    struct ControlRecord {
        label: String,
        address: u16,
        #[serde(default = "full_mask")]
        mask: u16,
        #[serde(default)]
        shift: u8,
        #[serde(default = "full_mask")]
        max_value: u16,
        #[serde(rename = "type")]
        control_type: ControlType,
    }

    #[derive(Deserialize)]
    struct SelectorRecord {
        label: String,
        command: String,
        value: u16,
        #[serde(default)]
        group: u16,
    }

    #[derive(Deserialize)]
    struct CommandRecord {
        label: String,
        #[serde(default)]
        group: u16,
        #[serde(default)]
        selector: bool,
    }

    #[derive(Deserialize)]
    struct DisplayRecord {
        label: String,
        address: u16,
        length: u8,
    }

    #[derive(Deserialize)]
    struct HidRecord {
        label: String,
        target: HidTarget,
    }

    fn full_mask() -> u16 {
        0xFFFF
    }

    fn leak_str(s: String) -> &'static str {
        Box::leak(s.into_boxed_str())
    }

    fn leak_slice<T>(v: Vec<T>) -> &'static [T] {
        Box::leak(v.into_boxed_slice())
    }

    impl AircraftTables {
        /// Parse a table document and pin it for the process lifetime.
        ///
        /// Meant to be called once at boot; the memory is never reclaimed.
        ///
        /// # Errors
        ///
        /// [`TableError::Json`] if the document does not match the schema.
        pub fn from_json(text: &str) -> Result<Self, TableError> {
            let doc: Document = serde_json::from_str(text).map_err(|e| {
                log::error!("aircraft table: {}", e);
                TableError::Json
            })?;

            let descriptors = doc
                .controls
                .into_iter()
                .map(|c| {
                    ControlDescriptor::new(
                        leak_str(c.label),
                        c.address,
                        c.mask,
                        c.shift,
                        c.max_value,
                        c.control_type,
                    )
                })
                .collect();
            let selectors = doc
                .selectors
                .into_iter()
                .map(|s| SelectorPosition::new(leak_str(s.label), leak_str(s.command), s.value, s.group))
                .collect();
            let commands = doc
                .commands
                .into_iter()
                .map(|c| TrackedCommand::new(leak_str(c.label), c.group, c.selector))
                .collect();
            let displays = doc
                .displays
                .into_iter()
                .map(|d| DisplayField::new(leak_str(d.label), d.address, d.length))
                .collect();
            let hid_bindings = doc
                .hid
                .into_iter()
                .map(|h| HidBinding {
                    label: leak_str(h.label),
                    target: h.target,
                })
                .collect();

            Ok(Self {
                aircraft_name: leak_str(doc.aircraft),
                descriptors: leak_slice(descriptors),
                selectors: leak_slice(selectors),
                commands: leak_slice(commands),
                displays: leak_slice(displays),
                hid_bindings: leak_slice(hid_bindings),
            })
        }
    }
}
