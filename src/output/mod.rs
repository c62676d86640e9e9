mod traits;

pub use traits::{CommandTransport, OutputError};
