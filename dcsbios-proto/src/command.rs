//! Outbound control commands.
//!
//! The simulator accepts one ASCII line per command:
//!
//! ```text
//! <LABEL> <VALUE>\n
//! ```
//!
//! `LABEL` is the control identifier, `VALUE` a decimal integer. Some
//! transports expect `\r\n`; see [`LineEnding`].
//!
//! # Example
//!
//! ```
//! use dcsbios_proto::{Command, LineEnding};
//!
//! let mut buf = [0u8; 64];
//! let len = Command::new("ECM_MODE_SW", 2)
//!     .serialize(&mut buf, LineEnding::Lf)
//!     .unwrap();
//! assert_eq!(&buf[..len], b"ECM_MODE_SW 2\n");
//! ```

use crate::fmt::{parse_u16, write_u16, MAX_U16_DIGITS};

/// Longest control label accepted on the wire.
pub const MAX_LABEL_LEN: usize = 48;

/// Largest serialized command: label, space, value, `\r\n`.
pub const MAX_COMMAND_SIZE: usize = MAX_LABEL_LEN + 1 + MAX_U16_DIGITS + 2;

/// Line terminator used after each command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    #[inline]
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }
}

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the serialized command.
    BufferTooSmall,
    /// A write operation failed (for writer adapters).
    WriteError,
    /// Label is empty, too long, or contains whitespace/control bytes.
    InvalidLabel,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
            Self::InvalidLabel => write!(f, "invalid label"),
        }
    }
}

/// Error type for parsing command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line is not `<LABEL> <VALUE>`.
    Parse,
    /// Label is not a valid identifier.
    InvalidLabel,
    /// Value is not a decimal u16.
    Value,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse => write!(f, "malformed command line"),
            Self::InvalidLabel => write!(f, "invalid label"),
            Self::Value => write!(f, "invalid value"),
        }
    }
}

/// A single outbound command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command<'a> {
    pub label: &'a str,
    pub value: u16,
}

impl<'a> Command<'a> {
    #[must_use]
    pub const fn new(label: &'a str, value: u16) -> Self {
        Self { label, value }
    }

    /// Serialize to the provided buffer.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`SerializeError::InvalidLabel`] for a label that would corrupt the
    /// line, [`SerializeError::BufferTooSmall`] if `buf` cannot hold it.
    pub fn serialize(&self, buf: &mut [u8], ending: LineEnding) -> Result<usize, SerializeError> {
        if !is_valid_label(self.label.as_bytes()) {
            return Err(SerializeError::InvalidLabel);
        }

        let mut digits = [0u8; MAX_U16_DIGITS];
        let digits_len = write_u16(&mut digits, self.value);
        let ending = ending.as_bytes();
        let label = self.label.as_bytes();
        let total = label.len() + 1 + digits_len + ending.len();

        if buf.len() < total {
            return Err(SerializeError::BufferTooSmall);
        }

        let mut pos = 0;
        buf[pos..pos + label.len()].copy_from_slice(label);
        pos += label.len();
        buf[pos] = b' ';
        pos += 1;
        buf[pos..pos + digits_len].copy_from_slice(&digits[..digits_len]);
        pos += digits_len;
        buf[pos..pos + ending.len()].copy_from_slice(ending);
        pos += ending.len();

        Ok(pos)
    }

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Same as [`serialize`](Self::serialize); `N` must fit the line.
    #[cfg(feature = "heapless")]
    pub fn serialize_to_vec<const N: usize>(
        &self,
        ending: LineEnding,
    ) -> Result<heapless::Vec<u8, N>, SerializeError> {
        let mut vec = heapless::Vec::new();
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec, ending)?;
        vec.truncate(len);
        Ok(vec)
    }

    /// Serialize to a `core::fmt::Write` implementation.
    ///
    /// This can be used with types like `heapless::String`.
    ///
    /// # Errors
    ///
    /// [`SerializeError::WriteError`] if the writer fails.
    pub fn serialize_fmt<W: core::fmt::Write>(
        &self,
        writer: &mut W,
        ending: LineEnding,
    ) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_COMMAND_SIZE];
        let len = self.serialize(&mut buf, ending)?;
        // Only ASCII is ever written, so the slice is valid UTF-8
        let line = core::str::from_utf8(&buf[..len]).map_err(|_| SerializeError::WriteError)?;
        writer
            .write_str(line)
            .map_err(|_| SerializeError::WriteError)
    }
}

/// Parse one command line (`<LABEL> <VALUE>`, trailing CR/LF optional).
///
/// # Errors
///
/// See [`ParseError`].
pub fn parse_command(line: &[u8]) -> Result<Command<'_>, ParseError> {
    let line = strip_line_ending(line);

    let space = line
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ParseError::Parse)?;

    let label = &line[..space];
    let value = &line[space + 1..];

    if !is_valid_label(label) {
        return Err(ParseError::InvalidLabel);
    }
    let value = parse_u16(value).ok_or(ParseError::Value)?;
    let label = core::str::from_utf8(label).map_err(|_| ParseError::InvalidLabel)?;

    Ok(Command { label, value })
}

/// Labels are printable ASCII without spaces.
#[inline]
fn is_valid_label(label: &[u8]) -> bool {
    !label.is_empty() && label.len() <= MAX_LABEL_LEN && label.iter().all(u8::is_ascii_graphic)
}

/// Strip trailing CR and/or LF from a line.
#[inline]
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}
