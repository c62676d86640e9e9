//! DCS-BIOS wire protocol for cockpit panel controllers.
//!
//! This crate covers both directions of the simulator link:
//!
//! - **Export stream** (simulator to panel): a binary stream of
//!   `address/count/data` blocks separated by `0x55 0x55 0x55 0x55` sync
//!   markers. [`StreamParser`] decodes it byte by byte into
//!   [`TelemetryWrite`]s and frame boundaries.
//! - **Commands** (panel to simulator): ASCII lines `<LABEL> <VALUE>\n`,
//!   produced by [`Command::serialize`] and read back by [`parse_command`].
//!
//! # Example
//!
//! ```
//! use dcsbios_proto::{StreamEvent, StreamParser, TelemetryWrite};
//!
//! let mut parser = StreamParser::new();
//! let mut writes = 0;
//! parser.feed(
//!     &[0x55, 0x55, 0x55, 0x55, 0x14, 0x75, 0x01, 0x00, 0xFF, 0xFF],
//!     |event| {
//!         if let StreamEvent::Write(w) = event {
//!             assert_eq!(w, TelemetryWrite::new(0x7514, 0xFFFF));
//!             writes += 1;
//!         }
//!     },
//! );
//! assert_eq!(writes, 1);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable `serialize_to_vec()`
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod command;
pub mod fmt;
pub mod parser;
pub mod types;

pub use command::{
    parse_command, Command, LineEnding, ParseError, SerializeError, MAX_COMMAND_SIZE,
    MAX_LABEL_LEN,
};
pub use parser::{ParserState, StreamParser, SYNC_ADDRESS, SYNC_BYTE, SYNC_LEN};
pub use types::{StreamEvent, TelemetryWrite};
