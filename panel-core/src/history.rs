//! Command history: the controller's belief of simulator state per label,
//! and the outbound changes it still wants to make.

use crate::config::BridgeConfig;
use crate::tables::TableError;
use crate::types::TrackedCommand;
use heapless::Vec;

/// Maximum number of tracked command labels.
pub const MAX_COMMANDS: usize = 128;

/// Group ids must be below this.
pub const MAX_GROUPS: usize = 64;

/// One controllable label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandHistoryEntry {
    pub label: &'static str,
    /// Last value confirmed by telemetry or successfully sent.
    pub last_value: u16,
    pub last_send_ms: Option<u64>,
    pub is_selector: bool,
    /// `0` means ungrouped.
    pub group: u16,
    pub pending_value: u16,
    pub last_change_ms: u64,
    pub has_pending: bool,
    pub last_hid_send_ms: Option<u64>,
}

impl CommandHistoryEntry {
    #[must_use]
    pub const fn new(command: &TrackedCommand) -> Self {
        Self {
            label: command.label,
            last_value: 0,
            last_send_ms: None,
            is_selector: command.is_selector,
            group: command.group,
            pending_value: 0,
            last_change_ms: 0,
            has_pending: false,
            last_hid_send_ms: None,
        }
    }

    #[inline]
    fn set_pending(&mut self, value: u16, now_ms: u64) {
        self.pending_value = value;
        self.last_change_ms = now_ms;
        self.has_pending = true;
    }
}

/// Delivers one command value to wherever outbound commands go.
pub trait Transmitter {
    /// Send `value` for `entry`. Returns `false` if the send was dropped.
    ///
    /// The history records `last_value`/`last_send_ms` itself; implementations
    /// only touch output-specific fields.
    fn transmit(&mut self, entry: &mut CommandHistoryEntry, value: u16) -> bool;
}

/// What happened to a change request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestOutcome {
    /// Transmitted now.
    Sent,
    /// Parked for the next flush.
    Deferred,
    /// Same value sent too recently; nothing to do.
    Suppressed,
    /// Send attempted but dropped (simulator not ready, sink full).
    Dropped,
    /// Label not in the command table.
    Unknown,
}

/// Fixed table of [`CommandHistoryEntry`] plus per-group send timestamps.
#[derive(Debug)]
pub struct CommandHistory {
    pub(crate) entries: Vec<CommandHistoryEntry, MAX_COMMANDS>,
    pub(crate) last_group_send_us: [Option<u64>; MAX_GROUPS],
}

impl CommandHistory {
    /// Build the table from the aircraft's tracked commands.
    ///
    /// # Errors
    ///
    /// [`TableError::DuplicateCommand`] or [`TableError::TooManyCommands`].
    ///
    /// # Panics
    ///
    /// If a group id is `MAX_GROUPS` or larger. That is a table generation
    /// bug, not a runtime condition.
    pub fn build(commands: &[TrackedCommand]) -> Result<Self, TableError> {
        let mut entries: Vec<CommandHistoryEntry, MAX_COMMANDS> = Vec::new();
        for command in commands {
            assert!(
                usize::from(command.group) < MAX_GROUPS,
                "command {} has group {} (max {})",
                command.label,
                command.group,
                MAX_GROUPS - 1
            );
            if entries.iter().any(|e| e.label == command.label) {
                log::error!("duplicate command label {}", command.label);
                return Err(TableError::DuplicateCommand);
            }
            entries
                .push(CommandHistoryEntry::new(command))
                .map_err(|_| TableError::TooManyCommands)?;
        }
        Ok(Self {
            entries,
            last_group_send_us: [None; MAX_GROUPS],
        })
    }

    /// Index of the entry for `label`.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.label == label)
    }

    #[must_use]
    pub fn entry(&self, label: &str) -> Option<&CommandHistoryEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[CommandHistoryEntry] {
        &self.entries
    }

    /// Record simulator-confirmed state. Pending requests are left alone.
    pub fn confirm(&mut self, label: &str, value: u16) -> bool {
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => {
                entry.last_value = value;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn confirmed_value(&self, label: &str) -> Option<u16> {
        self.entry(label).map(|e| e.last_value)
    }

    #[must_use]
    pub fn last_group_send_us(&self, group: u16) -> Option<u64> {
        self.last_group_send_us
            .get(usize::from(group))
            .copied()
            .flatten()
    }

    pub fn reset_group_timestamps(&mut self) {
        self.last_group_send_us = [None; MAX_GROUPS];
    }

    /// Handle a physical control change for entry `idx`.
    ///
    /// Ungrouped entries are throttled and sent now. Grouped entries are
    /// parked for arbitration unless `force` is set, in which case the whole
    /// group is cleared and every other nonzero member is driven to zero
    /// before this entry is sent.
    pub fn request_change(
        &mut self,
        idx: usize,
        value: u16,
        force: bool,
        now_ms: u64,
        config: &BridgeConfig,
        tx: &mut impl Transmitter,
    ) -> RequestOutcome {
        let Some(entry) = self.entries.get_mut(idx) else {
            return RequestOutcome::Unknown;
        };

        if entry.group == 0 {
            if !force {
                if let Some(last) = entry.last_send_ms {
                    let since = now_ms.saturating_sub(last);
                    if value == entry.last_value && since < config.value_throttle_ms {
                        entry.has_pending = false;
                        return RequestOutcome::Suppressed;
                    }
                    if value != entry.last_value && since < config.any_value_throttle_ms {
                        entry.set_pending(value, now_ms);
                        return RequestOutcome::Deferred;
                    }
                }
            }
            return self.send(idx, value, now_ms, tx);
        }

        if !force {
            entry.set_pending(value, now_ms);
            log::trace!("{} pending {}", entry.label, value);
            return RequestOutcome::Deferred;
        }

        let group = entry.group;
        for (i, member) in self.entries.iter_mut().enumerate() {
            if member.group != group {
                continue;
            }
            member.has_pending = false;
            if i != idx && member.last_value != 0 {
                if tx.transmit(member, 0) {
                    member.last_send_ms = Some(now_ms);
                }
                member.last_value = 0;
            }
        }
        self.send(idx, value, now_ms, tx)
    }

    /// Send `value` for entry `idx` and record it. Any pending value is
    /// cleared whether or not the send went out.
    pub(crate) fn send(
        &mut self,
        idx: usize,
        value: u16,
        now_ms: u64,
        tx: &mut impl Transmitter,
    ) -> RequestOutcome {
        let Some(entry) = self.entries.get_mut(idx) else {
            return RequestOutcome::Unknown;
        };
        entry.has_pending = false;
        if tx.transmit(entry, value) {
            entry.last_value = value;
            entry.last_send_ms = Some(now_ms);
            RequestOutcome::Sent
        } else {
            RequestOutcome::Dropped
        }
    }
}
