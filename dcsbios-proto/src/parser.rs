//! Byte-level parser for the DCS-BIOS export stream.
//!
//! The stream is a sequence of little-endian blocks:
//!
//! ```text
//! <address:u16> <count:u16> <data:u16>{count}
//! ```
//!
//! `count` is a word count; data word `i` belongs to `address + 2 * i`.
//! Four consecutive `0x55` bytes seen outside a data block mark a frame
//! boundary and resynchronize the parser. Bytes inside a data block are not
//! scanned, so a data word of `0x5555` cannot fake a marker.

use crate::types::{StreamEvent, TelemetryWrite};

/// Byte repeated to form the sync marker.
pub const SYNC_BYTE: u8 = 0x55;

/// Number of consecutive [`SYNC_BYTE`]s that form a sync marker.
pub const SYNC_LEN: u8 = 4;

/// Reserved block address. A header carrying it is discarded.
pub const SYNC_ADDRESS: u16 = 0x5555;

/// Parser state. Each byte advances exactly one transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Not synchronized; bytes are ignored until a sync marker.
    WaitSync,
    AddressLow,
    AddressHigh,
    CountLow,
    CountHigh,
    DataLow,
    DataHigh,
}

/// Streaming DCS-BIOS parser.
///
/// Feed it one byte at a time with [`push_byte`](Self::push_byte); chunks may
/// be split anywhere. Malformed input never produces an error: the parser
/// realigns on the next sync marker.
#[derive(Clone, Debug)]
pub struct StreamParser {
    state: ParserState,
    address: u16,
    count: u16,
    data: u16,
    sync_count: u8,
    in_data_block: bool,
    /// Set on the last data byte so the block flag drops one byte later.
    block_ended: bool,
    writes_since_sync: bool,
}

impl StreamParser {
    /// Create a parser waiting for the first sync marker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::WaitSync,
            address: 0,
            count: 0,
            data: 0,
            sync_count: 0,
            in_data_block: false,
            block_ended: false,
            writes_since_sync: false,
        }
    }

    /// Return to the power-on state (waiting for sync).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current state of the byte machine.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ParserState {
        self.state
    }

    /// Consecutive sync bytes seen so far.
    #[inline]
    #[must_use]
    pub const fn sync_count(&self) -> u8 {
        self.sync_count
    }

    /// Whether the parser is inside a data block (sync scan suspended).
    #[inline]
    #[must_use]
    pub const fn in_data_block(&self) -> bool {
        self.in_data_block
    }

    /// Feed one byte.
    ///
    /// Returns [`StreamEvent::Write`] when a data word completes and
    /// [`StreamEvent::FrameComplete`] when a sync marker closes a frame that
    /// carried writes. A single byte never yields both: data bytes are
    /// excluded from the sync scan.
    pub fn push_byte(&mut self, byte: u8) -> Option<StreamEvent> {
        if self.block_ended {
            self.in_data_block = false;
            self.block_ended = false;
        }

        let mut event = None;

        match self.state {
            ParserState::WaitSync => {}
            ParserState::AddressLow => {
                self.address = u16::from(byte);
                self.state = ParserState::AddressHigh;
            }
            ParserState::AddressHigh => {
                self.address |= u16::from(byte) << 8;
                self.state = if self.address == SYNC_ADDRESS {
                    ParserState::WaitSync
                } else {
                    ParserState::CountLow
                };
            }
            ParserState::CountLow => {
                self.count = u16::from(byte);
                self.state = ParserState::CountHigh;
            }
            ParserState::CountHigh => {
                self.count |= u16::from(byte) << 8;
                if self.count == 0 {
                    self.state = ParserState::AddressLow;
                } else {
                    self.in_data_block = true;
                    self.sync_count = 0;
                    self.state = ParserState::DataLow;
                }
            }
            ParserState::DataLow => {
                self.data = u16::from(byte);
                self.state = ParserState::DataHigh;
            }
            ParserState::DataHigh => {
                self.data |= u16::from(byte) << 8;
                self.count -= 1;
                event = Some(StreamEvent::Write(TelemetryWrite::new(self.address, self.data)));
                self.writes_since_sync = true;
                self.address = self.address.wrapping_add(2);
                if self.count == 0 {
                    self.state = ParserState::AddressLow;
                    self.block_ended = true;
                } else {
                    self.state = ParserState::DataLow;
                }
            }
        }

        if !self.in_data_block {
            if byte == SYNC_BYTE {
                self.sync_count += 1;
            } else {
                self.sync_count = 0;
            }

            if self.sync_count == SYNC_LEN {
                let frame_done = self.writes_since_sync;
                self.resync();
                if frame_done {
                    return Some(StreamEvent::FrameComplete);
                }
            }
        }

        event
    }

    /// Feed a chunk, invoking `on_event` for every event in arrival order.
    pub fn feed(&mut self, bytes: &[u8], mut on_event: impl FnMut(StreamEvent)) {
        for &b in bytes {
            if let Some(event) = self.push_byte(b) {
                on_event(event);
            }
        }
    }

    /// Unconditional realignment after a sync marker: expect an address next.
    fn resync(&mut self) {
        self.state = ParserState::AddressLow;
        self.sync_count = 0;
        self.in_data_block = false;
        self.block_ended = false;
        self.writes_since_sync = false;
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}
