//! Stream source fed by another task through an embassy channel.

use crate::input::traits::{InputError, StreamSource};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use heapless::Vec;

/// Largest chunk handed between tasks.
pub const MAX_CHUNK: usize = 64;

/// One received piece of the export stream.
pub type Chunk = Vec<u8, MAX_CHUNK>;

/// Receives chunks that a transport task (USB CDC, UDP) pushes into a
/// channel.
pub struct ChannelSource<'ch, M: RawMutex, const N: usize> {
    rx: Receiver<'ch, M, Chunk, N>,
}

impl<'ch, M: RawMutex, const N: usize> ChannelSource<'ch, M, N> {
    pub fn new(rx: Receiver<'ch, M, Chunk, N>) -> Self {
        Self { rx }
    }
}

impl<M: RawMutex, const N: usize> StreamSource for ChannelSource<'_, M, N> {
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, InputError> {
        let chunk = self.rx.receive().await;
        let dst = buf
            .get_mut(..chunk.len())
            .ok_or(InputError::BufferOverflow)?;
        dst.copy_from_slice(&chunk);
        Ok(chunk.len())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
