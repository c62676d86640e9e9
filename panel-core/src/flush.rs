//! Group arbitration: picks one winner per selector group and sends it.

use crate::config::BridgeConfig;
use crate::history::{CommandHistory, Transmitter, MAX_GROUPS};

/// Outcome counters for one flush pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushReport {
    /// Groups that had a winner this pass.
    pub winners: u16,
    /// Losing group members driven to zero.
    pub zeroed: u16,
    /// Groups skipped by the spacing gate.
    pub gated: u16,
    /// Ungrouped pending entries sent.
    pub ungrouped: u16,
}

impl CommandHistory {
    /// Run one arbitration pass.
    ///
    /// For each group, the dwell-eligible pending entry with the latest
    /// change wins (earlier table entry on a tie). Unless `forced`, a group
    /// sent less than `group_min_interval_us` ago is left for the next pass.
    /// Every other nonzero member of a winning group is driven to zero.
    /// Ungrouped pending entries are sent unconditionally.
    pub fn flush(
        &mut self,
        now_us: u64,
        forced: bool,
        config: &BridgeConfig,
        tx: &mut impl Transmitter,
    ) -> FlushReport {
        let now_ms = now_us / 1000;
        let mut report = FlushReport::default();
        let mut visited = [false; MAX_GROUPS];

        for i in 0..self.entries.len() {
            let group = self.entries[i].group;
            let g = usize::from(group);
            if group == 0 || visited[g] {
                continue;
            }
            visited[g] = true;

            let mut winner: Option<usize> = None;
            for (j, entry) in self.entries.iter().enumerate().skip(i) {
                let eligible = entry.has_pending
                    && entry.group == group
                    && (forced
                        || now_ms.saturating_sub(entry.last_change_ms) >= config.selector_dwell_ms);
                if !eligible {
                    continue;
                }
                match winner {
                    Some(w) if self.entries[w].last_change_ms >= entry.last_change_ms => {}
                    _ => winner = Some(j),
                }
            }
            let Some(w) = winner else {
                continue;
            };

            if !forced {
                if let Some(last) = self.last_group_send_us[g] {
                    if now_us.saturating_sub(last) < config.group_min_interval_us {
                        report.gated += 1;
                        continue;
                    }
                }
            }

            for (j, member) in self.entries.iter_mut().enumerate() {
                if member.group != group || j == w {
                    continue;
                }
                if member.last_value != 0 {
                    if tx.transmit(member, 0) {
                        member.last_send_ms = Some(now_ms);
                    }
                    member.last_value = 0;
                    report.zeroed += 1;
                }
                member.has_pending = false;
            }

            let winner = &mut self.entries[w];
            if winner.pending_value != winner.last_value {
                let value = winner.pending_value;
                if tx.transmit(winner, value) {
                    winner.last_value = value;
                    winner.last_send_ms = Some(now_ms);
                }
                log::debug!("group {} winner {} = {}", group, winner.label, value);
            }
            winner.has_pending = false;
            self.last_group_send_us[g] = Some(now_us);
            report.winners += 1;
        }

        for i in 0..self.entries.len() {
            let entry = &self.entries[i];
            if entry.group == 0 && entry.has_pending {
                let value = entry.pending_value;
                self.send(i, value, now_ms, tx);
                report.ungrouped += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::fixtures::COMMANDS;
    use crate::history::tests::RecordingTx;

    const MS: u64 = 1000;

    fn request(history: &mut CommandHistory, tx: &mut RecordingTx, label: &str, value: u16, now_ms: u64) {
        let idx = history.find(label).unwrap();
        history.request_change(idx, value, false, now_ms, &DEFAULT_CONFIG, tx);
    }

    fn nonzero_in_group(history: &CommandHistory, group: u16) -> usize {
        history
            .entries()
            .iter()
            .filter(|e| e.group == group && e.last_value != 0)
            .count()
    }

    #[test]
    fn test_dwell_holds_back_fresh_change() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        request(&mut history, &mut tx, "ECM_MODE_SW", 2, 1_000);

        let report = history.flush(1_100 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(report.winners, 0);
        assert!(tx.sent.is_empty());

        history.flush(1_250 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(tx.sent, [("ECM_MODE_SW", 2)]);
    }

    #[test]
    fn test_selector_flip_sends_once() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        history.confirm("ECM_MODE_SW", 1);
        request(&mut history, &mut tx, "ECM_MODE_SW", 2, 0);

        history.flush(300 * MS, false, &DEFAULT_CONFIG, &mut tx);
        history.flush(400 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(tx.sent, [("ECM_MODE_SW", 2)]);
    }

    #[test]
    fn test_most_recent_change_wins() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        // Later table entry changed first, earlier one last
        request(&mut history, &mut tx, "RADAR_SW_OPR", 1, 100);
        request(&mut history, &mut tx, "RADAR_SW_OFF", 1, 200);

        history.flush(1_000 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(tx.sent, [("RADAR_SW_OFF", 1)]);
        assert!(history.entries().iter().all(|e| !e.has_pending));
    }

    #[test]
    fn test_tie_keeps_earlier_entry() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        request(&mut history, &mut tx, "RADAR_SW_OPR", 1, 100);
        request(&mut history, &mut tx, "RADAR_SW_STBY", 1, 100);

        history.flush(1_000 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(tx.sent, [("RADAR_SW_STBY", 1)]);
    }

    #[test]
    fn test_losers_zeroed_and_exclusive() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        history.confirm("RADAR_SW_OFF", 1);
        history.confirm("RADAR_SW_STBY", 1);
        request(&mut history, &mut tx, "RADAR_SW_OPR", 1, 0);

        let report = history.flush(1_000 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(report.zeroed, 2);
        assert_eq!(
            tx.sent,
            [("RADAR_SW_OFF", 0), ("RADAR_SW_STBY", 0), ("RADAR_SW_OPR", 1)]
        );
        assert_eq!(nonzero_in_group(&history, 7), 1);
    }

    #[test]
    fn test_losers_zeroed_even_when_dropped() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        tx.ready = false;
        history.confirm("RADAR_SW_OFF", 1);
        request(&mut history, &mut tx, "RADAR_SW_STBY", 1, 0);

        history.flush(1_000 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(history.confirmed_value("RADAR_SW_OFF"), Some(0));
        assert_eq!(history.confirmed_value("RADAR_SW_STBY"), Some(0));
        assert!(nonzero_in_group(&history, 7) <= 1);
    }

    #[test]
    fn test_exclusion_over_many_cycles() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        let labels = ["RADAR_SW_OFF", "RADAR_SW_STBY", "RADAR_SW_OPR"];
        let mut now_ms = 0;
        for round in 0..30usize {
            // Telemetry sometimes disagrees with what we sent
            if round % 4 == 0 {
                history.confirm(labels[(round / 4) % 3], 1);
            }
            request(&mut history, &mut tx, labels[round % 3], 1, now_ms);
            request(&mut history, &mut tx, labels[(round + 1) % 3], 1, now_ms + 5);
            now_ms += 300;
            let report = history.flush(now_ms * MS, false, &DEFAULT_CONFIG, &mut tx);
            if report.winners > 0 {
                assert!(nonzero_in_group(&history, 7) <= 1);
            }
        }
    }

    #[test]
    fn test_spacing_gate() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        request(&mut history, &mut tx, "ECM_MODE_SW", 2, 0);
        history.flush(1_000 * MS, false, &DEFAULT_CONFIG, &mut tx);

        request(&mut history, &mut tx, "ECM_MODE_SW", 3, 0);
        let report = history.flush(1_000 * MS + 10_000, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(report.gated, 1);
        assert_eq!(tx.sent, [("ECM_MODE_SW", 2)]);
        assert!(history.entry("ECM_MODE_SW").unwrap().has_pending);

        // Forced pass ignores the gate
        history.flush(1_000 * MS + 10_000, true, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(tx.sent, [("ECM_MODE_SW", 2), ("ECM_MODE_SW", 3)]);
    }

    #[test]
    fn test_group_timestamp_updated_without_send() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        history.confirm("ECM_MODE_SW", 2);
        request(&mut history, &mut tx, "ECM_MODE_SW", 2, 0);

        let report = history.flush(500 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(report.winners, 1);
        assert!(tx.sent.is_empty());
        assert_eq!(history.last_group_send_us(3), Some(500 * MS));
    }

    #[test]
    fn test_forced_flush_skips_dwell() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        request(&mut history, &mut tx, "ECM_MODE_SW", 4, 1_000);
        history.flush(1_000 * MS, true, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(tx.sent, [("ECM_MODE_SW", 4)]);
    }

    #[test]
    fn test_ungrouped_pending_sent_without_gates() {
        let mut history = CommandHistory::build(COMMANDS).unwrap();
        let mut tx = RecordingTx::new();
        request(&mut history, &mut tx, "HMD_OFF_BRT", 100, 1_000);
        request(&mut history, &mut tx, "HMD_OFF_BRT", 200, 1_010);
        assert_eq!(tx.sent, [("HMD_OFF_BRT", 100)]);

        let report = history.flush(1_011 * MS, false, &DEFAULT_CONFIG, &mut tx);
        assert_eq!(report.ungrouped, 1);
        assert_eq!(tx.sent, [("HMD_OFF_BRT", 100), ("HMD_OFF_BRT", 200)]);
        assert_eq!(history.confirmed_value("HMD_OFF_BRT"), Some(200));
    }
}
