//! Display string buffers with shadow copies.
//!
//! Telemetry fills a buffer two bytes per word. Changes are detected at frame
//! boundaries by comparing the live buffer against the last committed copy.

use crate::tables::TableError;
use crate::types::DisplayField;
use heapless::Vec;

/// Maximum number of display fields.
pub const MAX_DISPLAYS: usize = 32;

/// Longest display field in bytes.
pub const MAX_DISPLAY_LEN: usize = 32;

/// Shadow fill that never matches real text.
const POISON: u8 = 0xFF;

/// Fixed-capacity text buffer holding `len <= N` bytes.
#[derive(Clone, Debug)]
pub struct TextBuffer<const N: usize> {
    live: [u8; N],
    shadow: [u8; N],
    len: usize,
}

impl<const N: usize> TextBuffer<N> {
    /// Blank buffer of `len` bytes whose first commit reports a change.
    #[must_use]
    pub const fn new(len: usize) -> Self {
        let len = if len > N { N } else { len };
        Self {
            live: [b' '; N],
            shadow: [POISON; N],
            len,
        }
    }

    /// Store one telemetry word at byte `offset`: low byte, then high byte.
    ///
    /// Bytes past the end of the field are ignored.
    pub fn write_word(&mut self, offset: usize, value: u16) {
        let [low, high] = value.to_le_bytes();
        if offset < self.len {
            self.live[offset] = low;
        }
        if offset + 1 < self.len {
            self.live[offset + 1] = high;
        }
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.live[..self.len] != self.shadow[..self.len]
    }

    /// Copy live to shadow.
    pub fn commit(&mut self) {
        self.shadow = self.live;
    }

    /// Forget the committed copy so the next commit reports a change.
    pub fn invalidate(&mut self) {
        self.shadow = [POISON; N];
    }

    /// Blank the live contents.
    pub fn clear(&mut self) {
        self.live = [b' '; N];
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.live[..self.len]
    }

    /// Live contents as text, cut at the first invalid UTF-8 byte.
    #[must_use]
    pub fn text(&self) -> &str {
        match core::str::from_utf8(self.bytes()) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&self.bytes()[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

/// One registered display field and its buffer.
#[derive(Clone, Debug)]
pub struct DisplayEntry {
    pub field: DisplayField,
    pub buffer: TextBuffer<MAX_DISPLAY_LEN>,
}

impl DisplayEntry {
    /// Whether `address` falls in this field; returns the byte offset.
    #[inline]
    fn offset_of(&self, address: u16) -> Option<usize> {
        let offset = usize::from(address.checked_sub(self.field.address)?);
        (offset < usize::from(self.field.length)).then_some(offset)
    }
}

/// All display buffers of one aircraft.
#[derive(Debug, Default)]
pub struct DisplayBuffers {
    entries: Vec<DisplayEntry, MAX_DISPLAYS>,
}

impl DisplayBuffers {
    /// # Errors
    ///
    /// [`TableError::TooManyDisplays`] or [`TableError::DisplayTooLong`].
    pub fn build(fields: &[DisplayField]) -> Result<Self, TableError> {
        let mut entries = Vec::new();
        for field in fields {
            if usize::from(field.length) > MAX_DISPLAY_LEN {
                return Err(TableError::DisplayTooLong);
            }
            entries
                .push(DisplayEntry {
                    field: *field,
                    buffer: TextBuffer::new(usize::from(field.length)),
                })
                .map_err(|_| TableError::TooManyDisplays)?;
        }
        Ok(Self { entries })
    }

    /// Route a telemetry word into every field covering `address`.
    pub fn write(&mut self, address: u16, value: u16) {
        for entry in self.entries.iter_mut() {
            if let Some(offset) = entry.offset_of(address) {
                entry.buffer.write_word(offset, value);
            }
        }
    }

    /// Report each changed field and commit it.
    pub fn commit(&mut self, mut on_change: impl FnMut(&'static str, &str)) {
        for entry in self.entries.iter_mut() {
            if entry.buffer.is_dirty() {
                on_change(entry.field.label, entry.buffer.text());
                entry.buffer.commit();
            }
        }
    }

    pub fn invalidate(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.buffer.invalidate();
        }
    }

    #[must_use]
    pub fn text(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.field.label == label)
            .map(|e| e.buffer.text())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::String;
    use std::vec::Vec;

    #[test]
    fn test_write_word_low_then_high() {
        let mut buf: TextBuffer<8> = TextBuffer::new(4);
        buf.write_word(0, u16::from_le_bytes(*b"AB"));
        buf.write_word(2, u16::from_le_bytes(*b"CD"));
        assert_eq!(buf.text(), "ABCD");
    }

    #[test]
    fn test_write_past_end_ignored() {
        let mut buf: TextBuffer<8> = TextBuffer::new(3);
        buf.write_word(2, u16::from_le_bytes(*b"XY"));
        buf.write_word(4, u16::from_le_bytes(*b"ZZ"));
        assert_eq!(buf.text(), "  X");
    }

    #[test]
    fn test_dirty_and_commit() {
        let mut buf: TextBuffer<4> = TextBuffer::new(4);
        assert!(buf.is_dirty());
        buf.commit();
        assert!(!buf.is_dirty());

        buf.write_word(0, u16::from_le_bytes(*b"  "));
        assert!(!buf.is_dirty());

        buf.invalidate();
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_text_stops_at_invalid_utf8() {
        let mut buf: TextBuffer<4> = TextBuffer::new(4);
        buf.write_word(0, u16::from_le_bytes([b'O', 0xFF]));
        assert_eq!(buf.text(), "O");
    }

    #[test]
    fn test_buffers_route_and_commit() {
        let fields = [DisplayField::new("UFC_OPTION_DISPLAY_1", 0x7428, 4)];
        let mut displays = DisplayBuffers::build(&fields).unwrap();

        displays.write(0x7428, u16::from_le_bytes(*b"CH"));
        displays.write(0x742A, u16::from_le_bytes(*b"AN"));
        displays.write(0x742C, u16::from_le_bytes(*b"!!"));

        let mut seen: Vec<(&str, String)> = Vec::new();
        displays.commit(|label, text| seen.push((label, String::from(text))));
        assert_eq!(seen, [("UFC_OPTION_DISPLAY_1", String::from("CHAN"))]);

        seen.clear();
        displays.commit(|label, text| seen.push((label, String::from(text))));
        assert!(seen.is_empty());
        assert_eq!(displays.text("UFC_OPTION_DISPLAY_1"), Some("CHAN"));
    }

    #[test]
    fn test_build_rejects_long_field() {
        let fields = [DisplayField::new("LONG", 0x1000, 40)];
        assert_eq!(
            DisplayBuffers::build(&fields).unwrap_err(),
            TableError::DisplayTooLong
        );
    }
}
