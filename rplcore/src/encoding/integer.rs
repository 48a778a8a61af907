//! LEB128 helpers for the object encoding.
//!
//! Every tag, length and small magnitude in an encoded object is an unsigned
//! LEB128 value: 7-bit groups, least significant first, with the high bit set
//! on every byte except the last. Values are decoded from the front of a slice.

/// Encode `value` as unsigned LEB128 and hand the bytes to `encoder`.
///
/// Returns the number of bytes produced.
///
/// ```
/// use rplcore::encoding::{encode_u64, DynBuf};
/// let mut buf = DynBuf::new();
/// encode_u64(300, &mut |b| buf.extend_from_slice(b));
/// assert_eq!(&buf[..], &[0xAC, 0x02]);
/// ```
pub fn encode_u64<F: FnMut(&[u8])>(mut value: u64, encoder: &mut F) -> u64 {
    let mut size = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        size += 1;
        if value == 0 {
            encoder(&[byte]);
            break size;
        }
        encoder(&[byte | 0x80]);
    }
}

/// Decode one unsigned LEB128 value from the front of `buf`.
///
/// On success the slice is advanced past the value. Returns `None` when the
/// slice ends before a terminating byte or when the value does not fit in 64
/// bits.
pub fn decode_u64(buf: &mut &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;

    loop {
        let (&byte, rest) = buf.split_first()?;
        *buf = rest;

        let group = (byte & 0x7F) as u64;
        if shift > 63 || (shift == 63 && group > 1) {
            return None;
        }
        value |= group << shift;

        if byte & 0x80 == 0 {
            break Some(value);
        }
        shift += 7;
    }
}

/// Size in bytes of the LEB128 encoding of `value`.
pub fn encoded_size_u64(value: u64) -> u64 {
    if value == 0 {
        return 1;
    }
    let sig_bits = (64 - value.leading_zeros()) as u64;
    sig_bits.div_ceil(7)
}

/// Map a signed value onto an unsigned one so small magnitudes stay short.
pub fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        let written = encode_u64(value, &mut |b| out.extend_from_slice(b));
        assert_eq!(written, encoded_size_u64(value));
        assert_eq!(out.len() as u64, written);
        out
    }

    #[test]
    fn leb128_layout() {
        assert_eq!(bytes(0), [0x00]);
        assert_eq!(bytes(0x7F), [0x7F]);
        assert_eq!(bytes(300), [0xAC, 0x02]);
        assert_eq!(bytes(1 << 14), [0x80, 0x80, 0x01]);
        assert_eq!(bytes(u64::MAX).len(), 10);
    }

    #[test]
    fn reading_a_length_prefix_stops_at_the_payload() {
        // length 300 followed by the first payload byte
        let mut cursor: &[u8] = &[0xAC, 0x02, 0x07];
        assert_eq!(decode_u64(&mut cursor), Some(300));
        assert_eq!(cursor, [0x07]);

        let mut max: &[u8] = &bytes(u64::MAX);
        assert_eq!(decode_u64(&mut max), Some(u64::MAX));
    }

    #[test]
    fn truncated_and_oversized_input() {
        let mut truncated: &[u8] = &[0x80, 0x80];
        assert_eq!(decode_u64(&mut truncated), None);
        let mut oversized: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];
        assert_eq!(decode_u64(&mut oversized), None);
    }

    #[test]
    fn zigzag_keeps_small_negatives_short() {
        assert_eq!(zigzag(0), 0);
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
        assert_eq!(encoded_size_u64(zigzag(-64)), 1);
        for v in [i64::MIN, -300, 7, i64::MAX] {
            assert_eq!(unzigzag(zigzag(v)), v);
        }
    }
}
