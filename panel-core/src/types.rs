//! Static control descriptions shared by the resolver, dispatcher and
//! command history.

/// "Never seen" marker for the per-descriptor value cache.
///
/// Real fields never carry it: masks are at most 16 bits wide and a full
/// word field with value `0xFFFF` is re-delivered once after invalidation,
/// which is harmless.
pub const UNSEEN: u16 = 0xFFFF;

/// Kind of output a telemetry field drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "json", derive(serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum ControlType {
    Led,
    Analog,
    Gauge,
    Selector,
    Display,
    Metadata,
}

impl ControlType {
    /// LED, analog and gauge updates are batched until the frame ends.
    #[inline]
    #[must_use]
    pub const fn is_batched(self) -> bool {
        matches!(self, Self::Led | Self::Analog | Self::Gauge)
    }
}

/// Location of one logical control inside a telemetry word.
///
/// Several descriptors may share an address when a word packs bitfields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlDescriptor {
    pub address: u16,
    pub mask: u16,
    pub shift: u8,
    pub max_value: u16,
    pub label: &'static str,
    pub control_type: ControlType,
}

impl ControlDescriptor {
    #[must_use]
    pub const fn new(
        label: &'static str,
        address: u16,
        mask: u16,
        shift: u8,
        max_value: u16,
        control_type: ControlType,
    ) -> Self {
        Self {
            address,
            mask,
            shift,
            max_value,
            label,
            control_type,
        }
    }

    /// Extract this control's field from a raw telemetry word.
    #[inline]
    #[must_use]
    pub const fn extract(&self, raw: u16) -> u16 {
        (raw & self.mask) >> self.shift
    }
}

/// One named position of a selector.
///
/// Input drivers refer to positions (`ECM_MODE_SW_STBY`); the simulator only
/// knows the command label (`ECM_MODE_SW`) and a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelectorPosition {
    pub label: &'static str,
    pub command: &'static str,
    pub value: u16,
    pub group: u16,
}

impl SelectorPosition {
    #[must_use]
    pub const fn new(label: &'static str, command: &'static str, value: u16, group: u16) -> Self {
        Self {
            label,
            command,
            value,
            group,
        }
    }
}

/// A command label the controller may originate, with its exclusion group.
///
/// Group `0` means ungrouped. Labels sharing a nonzero group are mutually
/// exclusive positions of one physical control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackedCommand {
    pub label: &'static str,
    pub group: u16,
    pub is_selector: bool,
}

impl TrackedCommand {
    #[must_use]
    pub const fn new(label: &'static str, group: u16, is_selector: bool) -> Self {
        Self {
            label,
            group,
            is_selector,
        }
    }
}

/// A string field in telemetry memory (`length` bytes from `address`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayField {
    pub label: &'static str,
    pub address: u16,
    pub length: u8,
}

impl DisplayField {
    #[must_use]
    pub const fn new(label: &'static str, address: u16, length: u8) -> Self {
        Self {
            label,
            address,
            length,
        }
    }
}
