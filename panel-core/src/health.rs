//! Stream liveness and mission lifecycle.

use crate::config::BridgeConfig;

/// Debounced stream state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamTransition {
    Paused,
    Resumed,
}

/// Result of evaluating a new mission name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MissionTransition {
    /// A matching aircraft appeared; caches must be invalidated.
    Started,
    /// The name went blank or changed to another aircraft.
    Stopped,
    /// Non-blank name for another aircraft while not running.
    Ignored,
    Unchanged,
}

/// Liveness and mission state derived from the telemetry stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamHealth {
    last_write_us: Option<u64>,
    stream_up: bool,
    /// Start of the current disagreement between liveness and `stream_up`.
    pending_since_us: Option<u64>,
    mission_start_us: Option<u64>,
    panels_synced: bool,
}

impl StreamHealth {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_write_us: None,
            stream_up: false,
            pending_since_us: None,
            mission_start_us: None,
            panels_synced: false,
        }
    }

    #[inline]
    pub fn record_write(&mut self, now_us: u64) {
        self.last_write_us = Some(now_us);
    }

    /// Raw liveness: a write arrived within the stream timeout.
    #[must_use]
    pub fn is_stream_alive(&self, now_us: u64, config: &BridgeConfig) -> bool {
        self.last_write_us
            .is_some_and(|t| now_us.saturating_sub(t) < config.stream_timeout_ms * 1000)
    }

    /// Debounced liveness.
    #[inline]
    #[must_use]
    pub const fn is_stream_up(&self) -> bool {
        self.stream_up
    }

    /// Update the debounced stream state.
    ///
    /// Going down needs `stream_down_debounce_ms` of continuous silence past
    /// the timeout; coming back needs `stream_up_debounce_ms` of liveness.
    pub fn evaluate(&mut self, now_us: u64, config: &BridgeConfig) -> Option<StreamTransition> {
        let alive = self.is_stream_alive(now_us, config);
        if alive == self.stream_up {
            self.pending_since_us = None;
            return None;
        }

        let since = *self.pending_since_us.get_or_insert(now_us);
        let window_ms = if alive {
            config.stream_up_debounce_ms
        } else {
            config.stream_down_debounce_ms
        };
        if now_us.saturating_sub(since) < window_ms * 1000 {
            return None;
        }

        self.stream_up = alive;
        self.pending_since_us = None;
        if alive {
            log::info!("stream resumed");
            Some(StreamTransition::Resumed)
        } else {
            log::info!("stream paused");
            Some(StreamTransition::Paused)
        }
    }

    /// Evaluate a changed mission name field.
    ///
    /// Blank (spaces or NUL) stops a running mission. A name starting with
    /// `expected` starts one if none is running; any other name stops it.
    pub fn on_mission_name(&mut self, name: &[u8], expected: &str, now_us: u64) -> MissionTransition {
        let text = core::str::from_utf8(name).unwrap_or("?").trim_end_matches(|c: char| c == ' ' || c == '\0');

        if text.is_empty() {
            return self.stop();
        }

        if !name.starts_with(expected.as_bytes()) {
            log::warn!("aircraft {} does not match {}", text, expected);
            return match self.stop() {
                MissionTransition::Unchanged => MissionTransition::Ignored,
                other => other,
            };
        }

        if self.mission_start_us.is_some() {
            return MissionTransition::Unchanged;
        }
        self.mission_start_us = Some(now_us);
        self.panels_synced = false;
        log::info!("mission started: {}", text);
        MissionTransition::Started
    }

    fn stop(&mut self) -> MissionTransition {
        if self.mission_start_us.take().is_none() {
            return MissionTransition::Unchanged;
        }
        self.panels_synced = false;
        log::info!("mission stopped");
        MissionTransition::Stopped
    }

    /// Reset mission and sync flags regardless of the stream.
    pub fn force_stop(&mut self) {
        self.mission_start_us = None;
        self.panels_synced = false;
    }

    #[inline]
    #[must_use]
    pub const fn is_mission_running(&self) -> bool {
        self.mission_start_us.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn mission_start_us(&self) -> Option<u64> {
        self.mission_start_us
    }

    #[inline]
    #[must_use]
    pub const fn panels_synced(&self) -> bool {
        self.panels_synced
    }

    pub fn set_panels_synced(&mut self, synced: bool) {
        self.panels_synced = synced;
    }

    /// Mission running, panels synced and stream alive.
    #[must_use]
    pub fn sim_ready(&self, now_us: u64, config: &BridgeConfig) -> bool {
        self.is_mission_running() && self.panels_synced && self.is_stream_alive(now_us, config)
    }
}
