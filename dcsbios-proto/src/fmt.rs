//! No-std number formatting for command serialization.
//!
//! Writes directly into byte buffers without heap allocation.

/// Longest decimal rendering of a `u16` ("65535").
pub const MAX_U16_DIGITS: usize = 5;

/// Write a u16 as an unsigned decimal string.
///
/// Returns the number of bytes written (1-5 bytes).
///
/// # Panics
///
/// Panics if `buf` is shorter than the rendered number.
#[inline]
pub fn write_u16(buf: &mut [u8], value: u16) -> usize {
    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    // Digits come out least significant first
    let mut temp = [0u8; MAX_U16_DIGITS];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    for i in 0..len {
        buf[i] = temp[len - 1 - i];
    }

    len
}

/// Parse an unsigned decimal string as u16.
#[inline]
pub fn parse_u16(s: &[u8]) -> Option<u16> {
    if s.is_empty() || s.len() > MAX_U16_DIGITS {
        return None;
    }

    let mut value: u32 = 0;
    for &b in s {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u32::from(b - b'0');
    }

    u16::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_u16() {
        let mut buf = [0u8; 5];

        let len = write_u16(&mut buf, 0);
        assert_eq!(&buf[..len], b"0");

        let len = write_u16(&mut buf, 7);
        assert_eq!(&buf[..len], b"7");

        let len = write_u16(&mut buf, 1000);
        assert_eq!(&buf[..len], b"1000");

        let len = write_u16(&mut buf, 65535);
        assert_eq!(&buf[..len], b"65535");
    }

    #[test]
    fn test_parse_u16() {
        assert_eq!(parse_u16(b"0"), Some(0));
        assert_eq!(parse_u16(b"65535"), Some(65535));
        assert_eq!(parse_u16(b"65536"), None);
        assert_eq!(parse_u16(b""), None);
        assert_eq!(parse_u16(b"-1"), None);
        assert_eq!(parse_u16(b"12a"), None);
    }
}
