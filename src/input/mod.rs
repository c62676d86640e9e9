mod channel;
mod traits;

pub use channel::{ChannelSource, Chunk, MAX_CHUNK};
pub use traits::{InputError, StreamSource};
