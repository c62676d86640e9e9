//! BridgeEngine: owns all bridge state and ties the pieces together.
//!
//! Bytes from the simulator go in through [`BridgeEngine::process_bytes`];
//! physical control changes through [`BridgeEngine::request_change`]. The
//! firmware main loop calls [`BridgeEngine::tick`] to run arbitration,
//! automatic panel sync and HID reporting.

use crate::clock::Clock;
use crate::config::{BridgeConfig, OutputMode};
use crate::dispatcher::{ControlEvent, Dispatcher, FrameEvent, MISSION_NAME_LEN};
use crate::flush::FlushReport;
use crate::health::{MissionTransition, StreamHealth};
use crate::hid::{HidBinding, HidState};
use crate::history::{CommandHistory, CommandHistoryEntry, RequestOutcome, Transmitter};
use crate::output::CommandSink;
use crate::panel::PanelSource;
use crate::resolver::AddressIndex;
use crate::subscription::{Listener, SelectorChange, SubscriptionRegistry};
use crate::tables::{AircraftTables, TableError};
use dcsbios_proto::{Command, StreamEvent, StreamParser, TelemetryWrite};

/// Running counters, mostly for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats {
    pub writes: u32,
    pub frames: u32,
    /// Output updates lost to a full frame queue.
    pub dropped_updates: u32,
    pub commands_sent: u32,
    /// Commands dropped because the simulator was not ready.
    pub commands_not_ready: u32,
    pub sink_errors: u32,
    pub unknown_labels: u32,
    pub hid_reports: u32,
}

/// The bridge core for one aircraft.
pub struct BridgeEngine<'a, C, S> {
    config: BridgeConfig,
    tables: AircraftTables,
    clock: C,
    sink: S,
    parser: StreamParser,
    index: AddressIndex,
    dispatcher: Dispatcher,
    subscriptions: SubscriptionRegistry<'a>,
    history: CommandHistory,
    health: StreamHealth,
    hid: HidState,
    stats: EngineStats,
}

impl<'a, C: Clock, S: CommandSink> BridgeEngine<'a, C, S> {
    /// Build all lookup structures for `tables`.
    ///
    /// # Errors
    ///
    /// Any [`TableError`] from the resolver, display or command tables.
    pub fn new(
        tables: AircraftTables,
        config: BridgeConfig,
        clock: C,
        sink: S,
    ) -> Result<Self, TableError> {
        let index = AddressIndex::build(tables.descriptors)?;
        let dispatcher = Dispatcher::new(tables.descriptors.len(), tables.displays)?;
        let history = CommandHistory::build(tables.commands)?;

        log::info!(
            "bridge for {}: {} controls at {} addresses, {} commands, {} displays",
            tables.aircraft_name,
            index.descriptor_count(),
            index.address_count(),
            history.entries().len(),
            tables.displays.len()
        );

        Ok(Self {
            config,
            tables,
            clock,
            sink,
            parser: StreamParser::new(),
            index,
            dispatcher,
            subscriptions: SubscriptionRegistry::new(),
            history,
            health: StreamHealth::new(),
            hid: HidState::new(),
            stats: EngineStats::default(),
        })
    }

    /// Register an output listener. `false` means the list is full.
    pub fn subscribe(&mut self, label: &'a str, listener: Listener<'a>) -> bool {
        self.subscriptions.subscribe(label, listener)
    }

    /// Consume one byte of the export stream.
    pub fn process_byte(&mut self, byte: u8) {
        match self.parser.push_byte(byte) {
            Some(StreamEvent::Write(write)) => self.on_write(write),
            Some(StreamEvent::FrameComplete) => self.on_frame_complete(),
            None => {}
        }
    }

    /// Consume a chunk of the export stream.
    pub fn process_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.process_byte(byte);
        }
    }

    fn on_write(&mut self, write: TelemetryWrite) {
        self.stats.writes = self.stats.writes.wrapping_add(1);
        self.health.record_write(self.clock.now_us());

        let Self {
            dispatcher,
            index,
            history,
            subscriptions,
            tables,
            ..
        } = self;
        dispatcher.on_write(write, index, |event| match event {
            ControlEvent::Selector { label, value } => {
                history.confirm(label, value);
                subscriptions.notify_selector(&SelectorChange {
                    label,
                    value,
                    position: tables.position_label(label, value),
                });
            }
            ControlEvent::Metadata { label, value } => {
                subscriptions.notify_metadata(label, value);
            }
        });
    }

    fn on_frame_complete(&mut self) {
        let now_us = self.clock.now_us();
        self.stats.frames = self.stats.frames.wrapping_add(1);
        self.health.evaluate(now_us, &self.config);

        let subscriptions = &self.subscriptions;
        let mission = self.dispatcher.commit_frame(|event| match event {
            FrameEvent::Display { label, text } => subscriptions.notify_display(label, text),
            FrameEvent::Output(update) => {
                subscriptions.notify_led(update.label, update.value, update.max_value);
            }
        });

        if let Some(name) = mission {
            self.on_mission_name(&name, now_us);
        }
    }

    fn on_mission_name(&mut self, name: &[u8; MISSION_NAME_LEN], now_us: u64) {
        match self
            .health
            .on_mission_name(name, self.tables.aircraft_name, now_us)
        {
            MissionTransition::Started => self.dispatcher.invalidate_caches(),
            MissionTransition::Stopped
            | MissionTransition::Ignored
            | MissionTransition::Unchanged => {}
        }
    }

    /// A physical control changed.
    ///
    /// `label` is a command label or a selector position label. A position
    /// is sent as its command with the position's value; releasing a
    /// position (`value == 0`) is ignored since the newly engaged position
    /// reports itself.
    pub fn request_change(&mut self, label: &str, value: u16, force: bool) -> RequestOutcome {
        let (idx, value) = match self.history.find(label) {
            Some(idx) => (idx, value),
            None => match self.tables.selector_position(label) {
                Some(_) if value == 0 => return RequestOutcome::Suppressed,
                Some(position) => match self.history.find(position.command) {
                    Some(idx) => (idx, position.value),
                    None => return self.unknown_label(label),
                },
                None => return self.unknown_label(label),
            },
        };

        let now_us = self.clock.now_us();
        let ready = self.health.sim_ready(now_us, &self.config);
        let Self {
            history,
            sink,
            hid,
            tables,
            stats,
            config,
            ..
        } = self;
        let mut link = Link {
            sink,
            mode: config.output_mode,
            ready,
            hid,
            bindings: tables.hid_bindings,
            now_ms: now_us / 1000,
            stats,
        };
        history.request_change(idx, value, force, now_us / 1000, config, &mut link)
    }

    fn unknown_label(&mut self, label: &str) -> RequestOutcome {
        self.stats.unknown_labels = self.stats.unknown_labels.wrapping_add(1);
        log::warn!("request for unknown label {}", label);
        RequestOutcome::Unknown
    }

    /// Run one arbitration pass now.
    pub fn flush(&mut self, forced: bool) -> FlushReport {
        let now_us = self.clock.now_us();
        let ready = self.health.sim_ready(now_us, &self.config);
        let Self {
            history,
            sink,
            hid,
            tables,
            stats,
            config,
            ..
        } = self;
        let mut link = Link {
            sink,
            mode: config.output_mode,
            ready,
            hid,
            bindings: tables.hid_bindings,
            now_ms: now_us / 1000,
            stats,
        };
        history.flush(now_us, forced, config, &mut link)
    }

    /// Periodic work: panel changes, stream health, automatic panel sync,
    /// arbitration and HID reporting.
    pub fn tick(&mut self, panels: &mut impl PanelSource) -> FlushReport {
        panels.poll_changes(&mut |label: &str, value: u16| {
            self.request_change(label, value, false);
        });

        let now_us = self.clock.now_us();
        self.health.evaluate(now_us, &self.config);

        if !self.health.panels_synced() {
            if let Some(start) = self.health.mission_start_us() {
                if now_us.saturating_sub(start) >= self.config.panel_sync_delay_ms * 1000 {
                    self.run_panel_sync(panels);
                }
            }
        }

        let report = self.flush(false);
        self.send_hid_report(false);
        report
    }

    /// Force the simulator to match the physical panels.
    ///
    /// Marks the panels synced first so the forced requests pass the ready
    /// gate, then clears group spacing and cached selector state, replays
    /// every panel position as a forced request and commits with a forced
    /// flush.
    pub fn run_panel_sync(&mut self, panels: &mut impl PanelSource) {
        log::info!("panel sync");
        self.health.set_panels_synced(true);
        self.history.reset_group_timestamps();
        self.dispatcher.invalidate_selectors(self.tables.descriptors);

        panels.resync(&mut |label: &str, value: u16| {
            self.request_change(label, value, true);
        });

        self.flush(true);
        self.send_hid_report(true);
    }

    fn send_hid_report(&mut self, forced: bool) {
        if self.config.output_mode != OutputMode::Hid {
            return;
        }
        let now_us = self.clock.now_us();
        if !self
            .hid
            .is_due(now_us, self.config.hid_min_interval_ms * 1000, forced)
        {
            return;
        }
        match self.sink.send_report(self.hid.report()) {
            Ok(()) => {
                self.hid.mark_sent(now_us);
                self.stats.hid_reports = self.stats.hid_reports.wrapping_add(1);
            }
            Err(e) => {
                self.stats.sink_errors = self.stats.sink_errors.wrapping_add(1);
                log::warn!("HID report: {}", e);
            }
        }
    }

    /// Drop the mission and make the next mission name update count as new.
    pub fn force_mission_stop(&mut self) {
        log::info!("forced mission stop");
        self.dispatcher.force_mission_stop();
        self.health.force_stop();
    }

    /// Mission running, panels synced and stream alive.
    #[must_use]
    pub fn sim_ready(&self) -> bool {
        self.health.sim_ready(self.clock.now_us(), &self.config)
    }

    #[must_use]
    pub fn is_stream_alive(&self) -> bool {
        self.health.is_stream_alive(self.clock.now_us(), &self.config)
    }

    #[must_use]
    pub fn confirmed_value(&self, label: &str) -> Option<u16> {
        self.history.confirmed_value(label)
    }

    #[must_use]
    pub fn metadata_value(&self, label: &str) -> Option<u16> {
        self.dispatcher.metadata(label)
    }

    #[must_use]
    pub fn display_text(&self, label: &str) -> Option<&str> {
        self.dispatcher.display_text(label)
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            dropped_updates: self.dispatcher.dropped(),
            ..self.stats
        }
    }

    #[inline]
    #[must_use]
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    #[inline]
    #[must_use]
    pub fn health(&self) -> &StreamHealth {
        &self.health
    }

    #[inline]
    #[must_use]
    pub fn hid(&self) -> &HidState {
        &self.hid
    }

    #[inline]
    #[must_use]
    pub fn parser(&self) -> &StreamParser {
        &self.parser
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn tables(&self) -> &AircraftTables {
        &self.tables
    }

    #[inline]
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

/// Transmit path for one request or flush: sink or HID report.
struct Link<'e, S> {
    sink: &'e mut S,
    mode: OutputMode,
    ready: bool,
    hid: &'e mut HidState,
    bindings: &'static [HidBinding],
    now_ms: u64,
    stats: &'e mut EngineStats,
}

impl<S: CommandSink> Transmitter for Link<'_, S> {
    fn transmit(&mut self, entry: &mut CommandHistoryEntry, value: u16) -> bool {
        match self.mode {
            OutputMode::Hid => match self.bindings.iter().find(|b| b.label == entry.label) {
                Some(binding) => {
                    self.hid.apply(binding.target, value);
                    entry.last_hid_send_ms = Some(self.now_ms);
                    true
                }
                None => {
                    log::warn!("no HID binding for {}", entry.label);
                    false
                }
            },
            OutputMode::DcsBios => {
                if !self.ready {
                    self.stats.commands_not_ready = self.stats.commands_not_ready.wrapping_add(1);
                    log::debug!("sim not ready, dropped {} {}", entry.label, value);
                    return false;
                }
                match self.sink.send_command(&Command::new(entry.label, value)) {
                    Ok(()) => {
                        self.stats.commands_sent = self.stats.commands_sent.wrapping_add(1);
                        log::trace!("sent {} {}", entry.label, value);
                        true
                    }
                    Err(e) => {
                        self.stats.sink_errors = self.stats.sink_errors.wrapping_add(1);
                        log::warn!("send {} {}: {}", entry.label, value, e);
                        false
                    }
                }
            }
        }
    }
}
