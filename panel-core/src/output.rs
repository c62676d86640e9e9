//! Command sink trait and the bounded outbound queue.

use crate::hid::HidReport;
use dcsbios_proto::{Command, LineEnding, MAX_COMMAND_SIZE};
use heapless::Deque;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Transport I/O error.
    Io,
    /// Transport not ready (e.g., USB not enumerated).
    NotReady,
    /// Endpoint busy.
    Busy,
    /// Outbound queue full.
    Overflow,
    /// This sink cannot carry the item.
    NotSupported,
}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::NotReady => write!(f, "not ready"),
            Self::Busy => write!(f, "busy"),
            Self::Overflow => write!(f, "queue full"),
            Self::NotSupported => write!(f, "not supported"),
        }
    }
}

/// Where the engine hands outbound traffic.
///
/// Calls are synchronous and must not block; sinks that talk to slow
/// transports queue and let an async task drain them.
pub trait CommandSink {
    /// Accept one simulator command.
    ///
    /// # Errors
    ///
    /// Any [`OutputError`]; the engine logs and drops the command.
    fn send_command(&mut self, command: &Command<'_>) -> Result<(), OutputError>;

    /// Accept one HID report.
    ///
    /// # Errors
    ///
    /// [`OutputError::NotSupported`] unless the sink carries HID.
    fn send_report(&mut self, report: &HidReport) -> Result<(), OutputError> {
        let _ = report;
        Err(OutputError::NotSupported)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send_command(&mut self, command: &Command<'_>) -> Result<(), OutputError> {
        (**self).send_command(command)
    }

    fn send_report(&mut self, report: &HidReport) -> Result<(), OutputError> {
        (**self).send_report(report)
    }
}

/// One queued item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// A serialized command line, terminator included.
    Command(heapless::Vec<u8, MAX_COMMAND_SIZE>),
    Report(HidReport),
}

/// Bounded FIFO of outbound items.
#[derive(Debug)]
pub struct CommandQueue<const N: usize> {
    queue: Deque<Outbound, N>,
    ending: LineEnding,
}

impl<const N: usize> CommandQueue<N> {
    #[must_use]
    pub const fn new(ending: LineEnding) -> Self {
        Self {
            queue: Deque::new(),
            ending,
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Outbound> {
        self.queue.pop_front()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn push(&mut self, item: Outbound) -> Result<(), OutputError> {
        self.queue.push_back(item).map_err(|_| OutputError::Overflow)
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new(LineEnding::Lf)
    }
}

impl<const N: usize> CommandSink for CommandQueue<N> {
    fn send_command(&mut self, command: &Command<'_>) -> Result<(), OutputError> {
        let line = command.serialize_to_vec(self.ending).map_err(|e| {
            log::warn!("cannot serialize {}: {}", command.label, e);
            OutputError::NotSupported
        })?;
        self.push(Outbound::Command(line))
    }

    fn send_report(&mut self, report: &HidReport) -> Result<(), OutputError> {
        self.push(Outbound::Report(*report))
    }
}
