//! Transport glue for the DCS-BIOS panel bridge.
//!
//! [`CockpitBridge`] pulls export stream chunks from a [`StreamSource`] and
//! control changes from a [`panel_core::PanelSource`], runs them through the
//! [`panel_core::BridgeEngine`] on every chunk or tick, and writes whatever
//! the engine queued to a [`CommandTransport`].
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt instead of `log`
//! - **`time`**: Drive the bridge loop with an `embassy_time::Ticker`
//! - **`json`**: Load aircraft tables from JSON at boot

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod fmt;

pub mod bridge;
pub mod input;
pub mod output;
pub mod panels;
pub mod tick;

pub use bridge::{BridgeError, CockpitBridge, OUTBOX_LEN};
pub use input::{ChannelSource, Chunk, InputError, StreamSource, MAX_CHUNK};
pub use output::{CommandTransport, OutputError};
pub use panels::{ChannelPanels, ControlChange, MAX_POSITIONS};
pub use tick::{TickSource, TICK_PERIOD_MS};

#[cfg(feature = "time")]
pub use tick::default_ticker;
