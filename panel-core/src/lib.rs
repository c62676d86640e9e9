//! DCS-BIOS panel bridge core.
//!
//! Everything between the raw export stream and the cockpit hardware drivers,
//! without any platform dependencies:
//!
//! - [`resolver`]: telemetry address to control descriptors ([`AddressIndex`])
//! - [`dispatcher`]: change detection and frame batching ([`Dispatcher`])
//! - [`subscription`]: output driver listeners ([`SubscriptionRegistry`])
//! - [`history`]: believed simulator state and outbound requests ([`CommandHistory`])
//! - [`flush`]: selector group arbitration
//! - [`health`]: stream liveness and mission lifecycle ([`StreamHealth`])
//! - [`engine`]: the owning aggregate ([`BridgeEngine`])
//!
//! # Example
//!
//! ```rust
//! use dcsbios_proto::LineEnding;
//! use panel_core::{
//!     AircraftTables, BridgeEngine, CommandQueue, ControlDescriptor, ControlType,
//!     ManualClock, TrackedCommand, DEFAULT_CONFIG,
//! };
//!
//! const TABLES: AircraftTables = AircraftTables {
//!     aircraft_name: "FA-18C_hornet",
//!     descriptors: &[ControlDescriptor::new(
//!         "MASTER_ARM_SW", 0x740C, 0x2000, 13, 1, ControlType::Selector,
//!     )],
//!     commands: &[TrackedCommand::new("MASTER_ARM_SW", 0, true)],
//!     ..AircraftTables::EMPTY
//! };
//!
//! let clock = ManualClock::new();
//! let sink: CommandQueue<16> = CommandQueue::new(LineEnding::Lf);
//! let mut engine = BridgeEngine::new(TABLES, DEFAULT_CONFIG, &clock, sink).unwrap();
//!
//! engine.process_bytes(&[0x55, 0x55, 0x55, 0x55, 0x0C, 0x74, 0x01, 0x00, 0x00, 0x20]);
//! assert_eq!(engine.confirmed_value("MASTER_ARM_SW"), Some(1));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`json`**: Load [`AircraftTables`] from a JSON document at boot
//!
//! # No-std Support
//!
//! Without `json` this crate is `#![no_std]` and never allocates; every table
//! has a fixed capacity.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod display;
pub mod engine;
pub mod flush;
pub mod health;
pub mod hid;
pub mod history;
pub mod output;
pub mod panel;
pub mod resolver;
pub mod subscription;
pub mod tables;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-export main types at crate root
pub use clock::{Clock, ManualClock};
pub use config::{BridgeConfig, OutputMode, DEFAULT_CONFIG};
pub use dispatcher::{ControlEvent, Dispatcher, FrameEvent, PendingUpdate};
pub use engine::{BridgeEngine, EngineStats};
pub use flush::FlushReport;
pub use health::{MissionTransition, StreamHealth, StreamTransition};
pub use hid::{HidBinding, HidReport, HidState, HidTarget};
pub use history::{CommandHistory, CommandHistoryEntry, RequestOutcome, Transmitter};
pub use output::{CommandQueue, CommandSink, Outbound, OutputError};
pub use panel::{NoPanels, PanelSource};
pub use resolver::AddressIndex;
pub use subscription::{Listener, SelectorChange, SubscriptionRegistry};
pub use tables::{AircraftTables, TableError};
pub use types::{ControlDescriptor, ControlType, DisplayField, SelectorPosition, TrackedCommand};
