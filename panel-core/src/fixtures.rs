//! Small F/A-18C table set shared by the unit tests.

extern crate std;

use crate::hid::HidBinding;
use std::vec::Vec;
use crate::tables::AircraftTables;
use crate::types::{
    ControlDescriptor, ControlType, DisplayField, SelectorPosition, TrackedCommand,
};

pub const DESCRIPTORS: &[ControlDescriptor] = &[
    ControlDescriptor::new("MASTER_CAUTION_LT", 0x7408, 0x0200, 9, 1, ControlType::Led),
    ControlDescriptor::new("APU_READY_LT", 0x7408, 0x0800, 11, 1, ControlType::Led),
    ControlDescriptor::new("HMD_OFF_BRT", 0x7410, 0xFFFF, 0, 65535, ControlType::Analog),
    ControlDescriptor::new("ECM_MODE_SW", 0x7514, 0x3800, 11, 4, ControlType::Selector),
    ControlDescriptor::new("MASTER_ARM_SW", 0x740C, 0x2000, 13, 1, ControlType::Selector),
    ControlDescriptor::new("HYD_IND_LEFT", 0x7500, 0xFFFF, 0, 65535, ControlType::Gauge),
    ControlDescriptor::new("_UPDATE_COUNTER", 0xFFFE, 0x00FF, 0, 255, ControlType::Metadata),
    ControlDescriptor::new("UFC_OPTION_DISPLAY_1", 0x7428, 0xFFFF, 0, 65535, ControlType::Display),
    ControlDescriptor::new("RADAR_SW_OFF", 0x7418, 0x0100, 8, 1, ControlType::Selector),
    ControlDescriptor::new("RADAR_SW_STBY", 0x7418, 0x0200, 9, 1, ControlType::Selector),
    ControlDescriptor::new("RADAR_SW_OPR", 0x7418, 0x0400, 10, 1, ControlType::Selector),
];

pub const SELECTORS: &[SelectorPosition] = &[
    SelectorPosition::new("ECM_MODE_SW_OFF", "ECM_MODE_SW", 0, 3),
    SelectorPosition::new("ECM_MODE_SW_STBY", "ECM_MODE_SW", 1, 3),
    SelectorPosition::new("ECM_MODE_SW_BIT", "ECM_MODE_SW", 2, 3),
    SelectorPosition::new("ECM_MODE_SW_REC", "ECM_MODE_SW", 3, 3),
    SelectorPosition::new("ECM_MODE_SW_XMIT", "ECM_MODE_SW", 4, 3),
    SelectorPosition::new("RADAR_SW_OFF", "RADAR_SW_OFF", 1, 7),
    SelectorPosition::new("RADAR_SW_STBY", "RADAR_SW_STBY", 1, 7),
    SelectorPosition::new("RADAR_SW_OPR", "RADAR_SW_OPR", 1, 7),
    SelectorPosition::new("MASTER_ARM_SW_SAFE", "MASTER_ARM_SW", 0, 0),
    SelectorPosition::new("MASTER_ARM_SW_ARM", "MASTER_ARM_SW", 1, 0),
];

pub const COMMANDS: &[TrackedCommand] = &[
    TrackedCommand::new("ECM_MODE_SW", 3, true),
    TrackedCommand::new("RADAR_SW_OFF", 7, true),
    TrackedCommand::new("RADAR_SW_STBY", 7, true),
    TrackedCommand::new("RADAR_SW_OPR", 7, true),
    TrackedCommand::new("MASTER_ARM_SW", 0, true),
    TrackedCommand::new("MASTER_CAUTION_RESET_SW", 0, false),
    TrackedCommand::new("HMD_OFF_BRT", 0, false),
];

pub const DISPLAYS: &[DisplayField] = &[DisplayField::new("UFC_OPTION_DISPLAY_1", 0x7428, 4)];

pub const HID_BINDINGS: &[HidBinding] = &[
    HidBinding::button("MASTER_CAUTION_RESET_SW", 0),
    HidBinding::button("MASTER_ARM_SW", 1),
    HidBinding::button("RADAR_SW_OPR", 5),
    HidBinding::axis("HMD_OFF_BRT", 0),
    HidBinding::axis("ECM_MODE_SW", 1),
];

pub const TABLES: AircraftTables = AircraftTables {
    aircraft_name: "FA-18C_hornet",
    descriptors: DESCRIPTORS,
    selectors: SELECTORS,
    commands: COMMANDS,
    displays: DISPLAYS,
    hid_bindings: HID_BINDINGS,
};

/// Encode one `address/count/data` block.
pub fn block(address: u16, words: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&address.to_le_bytes());
    out.extend_from_slice(&(words.len() as u16).to_le_bytes());
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

/// Sync marker.
pub const SYNC: [u8; 4] = [0x55; 4];

/// Mission name field words for `name`, padded with spaces.
pub fn mission_name_words(name: &str) -> [u16; 12] {
    let mut bytes = [b' '; 24];
    bytes[..name.len()].copy_from_slice(name.as_bytes());
    let mut words = [0u16; 12];
    for (i, w) in words.iter_mut().enumerate() {
        *w = u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]);
    }
    words
}
