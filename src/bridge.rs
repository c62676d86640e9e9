//! CockpitBridge: connects a stream source, the panels and a command
//! transport to the panel core.

use crate::input::{InputError, StreamSource, MAX_CHUNK};
use crate::output::{CommandTransport, OutputError};
use crate::tick::TickSource;
use embassy_futures::select::{select, Either};
use panel_core::history::MAX_COMMANDS;
use panel_core::{BridgeEngine, Clock, CommandQueue, Outbound, PanelSource};

/// Capacity of the engine's outbound queue between two drains.
///
/// A forced panel sync may queue a zero and a value for every tracked
/// command before the next drain, plus one HID report.
pub const OUTBOX_LEN: usize = 2 * MAX_COMMANDS + 16;

/// A bridge that feeds received export stream chunks to the engine, ticks
/// it and forwards everything the engine queued to the transport.
///
/// Each step waits for whichever comes first: a stream chunk or the next
/// tick. Control changes are collected from the [`PanelSource`] on every
/// step.
///
/// # Error Handling
///
/// Input errors do not stop the engine: arbitration and panel sync still
/// tick and queued commands are still written before the error is returned.
/// Items queued while the transport is not ready are dropped, like commands
/// sent while the simulator is not ready.
pub struct CockpitBridge<'a, C, I, O, P, T> {
    engine: BridgeEngine<'a, C, CommandQueue<OUTBOX_LEN>>,
    input: I,
    output: O,
    panels: P,
    ticker: T,
    buf: [u8; MAX_CHUNK],
}

impl<'a, C, I, O, P, T> CockpitBridge<'a, C, I, O, P, T>
where
    C: Clock,
    I: StreamSource,
    O: CommandTransport,
    P: PanelSource,
    T: TickSource,
{
    /// Create a new bridge around an engine.
    pub fn new(
        engine: BridgeEngine<'a, C, CommandQueue<OUTBOX_LEN>>,
        input: I,
        output: O,
        panels: P,
        ticker: T,
    ) -> Self {
        Self {
            engine,
            input,
            output,
            panels,
            ticker,
            buf: [0; MAX_CHUNK],
        }
    }

    /// Run the bridge indefinitely.
    ///
    /// This method never returns under normal operation.
    pub async fn run(&mut self) -> ! {
        log_info!("bridge running");
        loop {
            if let Err(e) = self.process_one().await {
                log_warn!("bridge: {:?}", e);
            }
        }
    }

    /// Wait for a stream chunk or a tick, tick the engine and drain its
    /// queue.
    ///
    /// Returns the number of stream bytes consumed, zero when the tick came
    /// first.
    pub async fn process_one(&mut self) -> Result<usize, BridgeError> {
        let received = match select(self.input.receive(&mut self.buf), self.ticker.next()).await {
            Either::First(result) => result,
            Either::Second(()) => Ok(0),
        };
        if let Ok(n) = received {
            self.engine.process_bytes(&self.buf[..n]);
        }

        self.engine.tick(&mut self.panels);
        self.drain().await.map_err(BridgeError::Output)?;

        received.map_err(BridgeError::Input)
    }

    /// Write every queued item to the transport.
    ///
    /// Stops at the first transport error; that item is lost, the rest stay
    /// queued.
    pub async fn drain(&mut self) -> Result<usize, OutputError> {
        let mut sent = 0;
        while let Some(item) = self.engine.sink_mut().pop() {
            if !self.output.is_ready() {
                log_debug!("transport not ready, dropped queued item");
                continue;
            }
            match item {
                Outbound::Command(line) => self.output.send_line(&line).await?,
                Outbound::Report(report) => self.output.send_report(&report).await?,
            }
            sent += 1;
        }
        Ok(sent)
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &BridgeEngine<'a, C, CommandQueue<OUTBOX_LEN>> {
        &self.engine
    }

    /// Get a mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut BridgeEngine<'a, C, CommandQueue<OUTBOX_LEN>> {
        &mut self.engine
    }

    /// Get a reference to the stream source.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Get a reference to the panels.
    pub fn panels(&self) -> &P {
        &self.panels
    }

    /// Get a reference to the transport.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Get a mutable reference to the transport.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Decompose the bridge into its components.
    pub fn into_parts(self) -> (BridgeEngine<'a, C, CommandQueue<OUTBOX_LEN>>, I, O, P, T) {
        (self.engine, self.input, self.output, self.panels, self.ticker)
    }
}

/// Error type for bridge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Error from the stream source.
    Input(InputError),
    /// Error from the transport.
    Output(OutputError),
}
