//! Canonical binary encoding
//!
//! Little-endian fixed-width integers, variable-length unsigned integers
//! with a one-byte marker (0xFD / 0xFE / 0xFF), and length-prefixed byte
//! strings. Decoding is strict: every value has exactly one accepted
//! encoding, so equal values always produce identical bytes.

use bytes::{Buf, BufMut};
use thiserror::Error;

use crate::crypto::Address;

/// Upper bound on any length-prefixed field
pub const MAX_VAR_BYTES: usize = 1024 * 1024;

/// Errors raised while decoding canonical bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input: need {need} bytes, have {have}")]
    UnexpectedEof { need: usize, have: usize },
    #[error("length {0} exceeds the 1 MiB field limit")]
    TooLong(u64),
    #[error("non-canonical varuint encoding")]
    NonCanonicalVarUint,
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,
    #[error("{0} trailing bytes after end of value")]
    TrailingBytes(usize),
    #[error("{0}")]
    Invalid(String),
}

/// Types with a canonical binary form
pub trait Encode {
    fn encode<B: BufMut>(&self, buf: &mut B);

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

/// Types that can be read back from their canonical binary form
pub trait Decode: Sized {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError>;

    /// Decode a complete value, rejecting trailing bytes
    fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        let mut buf = data;
        let value = Self::decode(&mut buf)?;
        if buf.has_remaining() {
            return Err(CodecError::TrailingBytes(buf.remaining()));
        }
        Ok(value)
    }
}

// =============================================================================
// Writing
// =============================================================================

pub fn put_var_uint<B: BufMut>(buf: &mut B, value: u64) {
    if value < 0xFD {
        buf.put_u8(value as u8);
    } else if value <= 0xFFFF {
        buf.put_u8(0xFD);
        buf.put_u16_le(value as u16);
    } else if value <= 0xFFFF_FFFF {
        buf.put_u8(0xFE);
        buf.put_u32_le(value as u32);
    } else {
        buf.put_u8(0xFF);
        buf.put_u64_le(value);
    }
}

pub fn put_var_bytes<B: BufMut>(buf: &mut B, data: &[u8]) {
    put_var_uint(buf, data.len() as u64);
    buf.put_slice(data);
}

pub fn put_var_string<B: BufMut>(buf: &mut B, s: &str) {
    put_var_bytes(buf, s.as_bytes());
}

// =============================================================================
// Reading
// =============================================================================

fn ensure<B: Buf>(buf: &B, need: usize) -> Result<(), CodecError> {
    let have = buf.remaining();
    if have < need {
        return Err(CodecError::UnexpectedEof { need, have });
    }
    Ok(())
}

pub fn get_u8<B: Buf>(buf: &mut B) -> Result<u8, CodecError> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn get_u16<B: Buf>(buf: &mut B) -> Result<u16, CodecError> {
    ensure(buf, 2)?;
    Ok(buf.get_u16_le())
}

pub fn get_u32<B: Buf>(buf: &mut B) -> Result<u32, CodecError> {
    ensure(buf, 4)?;
    Ok(buf.get_u32_le())
}

pub fn get_u64<B: Buf>(buf: &mut B) -> Result<u64, CodecError> {
    ensure(buf, 8)?;
    Ok(buf.get_u64_le())
}

pub fn get_array<B: Buf, const N: usize>(buf: &mut B) -> Result<[u8; N], CodecError> {
    ensure(buf, N)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

pub fn get_var_uint<B: Buf>(buf: &mut B) -> Result<u64, CodecError> {
    let value = match get_u8(buf)? {
        0xFD => {
            let v = u64::from(get_u16(buf)?);
            if v < 0xFD {
                return Err(CodecError::NonCanonicalVarUint);
            }
            v
        }
        0xFE => {
            let v = u64::from(get_u32(buf)?);
            if v <= 0xFFFF {
                return Err(CodecError::NonCanonicalVarUint);
            }
            v
        }
        0xFF => {
            let v = get_u64(buf)?;
            if v <= 0xFFFF_FFFF {
                return Err(CodecError::NonCanonicalVarUint);
            }
            v
        }
        small => u64::from(small),
    };
    Ok(value)
}

/// Read a count or length prefix, bounded by `MAX_VAR_BYTES`
pub fn get_length<B: Buf>(buf: &mut B) -> Result<usize, CodecError> {
    let len = get_var_uint(buf)?;
    if len > MAX_VAR_BYTES as u64 {
        return Err(CodecError::TooLong(len));
    }
    Ok(len as usize)
}

pub fn get_var_bytes<B: Buf>(buf: &mut B) -> Result<Vec<u8>, CodecError> {
    let len = get_length(buf)?;
    ensure(buf, len)?;
    let mut out = vec![0u8; len];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

pub fn get_var_string<B: Buf>(buf: &mut B) -> Result<String, CodecError> {
    String::from_utf8(get_var_bytes(buf)?).map_err(|_| CodecError::InvalidUtf8)
}

impl Encode for Address {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.as_bytes());
    }
}

impl Decode for Address {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        Ok(Address(get_array(buf)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ADDRESS_LEN;

    fn var_uint_bytes(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        put_var_uint(&mut out, value);
        out
    }

    #[test]
    fn test_var_uint_widths() {
        assert_eq!(var_uint_bytes(0), vec![0x00]);
        assert_eq!(var_uint_bytes(0xFC), vec![0xFC]);
        assert_eq!(var_uint_bytes(0xFD), vec![0xFD, 0xFD, 0x00]);
        assert_eq!(var_uint_bytes(0x1_0000), vec![0xFE, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(var_uint_bytes(u64::MAX).len(), 9);
    }

    #[test]
    fn test_var_uint_read_back() {
        for value in [0u64, 1, 0xFC, 0xFD, 0xFFFF, 0x1_0000, 0xFFFF_FFFF, 1 << 40] {
            let bytes = var_uint_bytes(value);
            let mut buf = bytes.as_slice();
            assert_eq!(get_var_uint(&mut buf).unwrap(), value);
            assert!(!buf.has_remaining());
        }
    }

    #[test]
    fn test_non_canonical_var_uint_rejected() {
        // 5 encoded with the two-byte marker
        let mut buf: &[u8] = &[0xFD, 0x05, 0x00];
        assert_eq!(
            get_var_uint(&mut buf),
            Err(CodecError::NonCanonicalVarUint)
        );

        let mut buf: &[u8] = &[0xFE, 0xFF, 0x00, 0x00, 0x00];
        assert_eq!(
            get_var_uint(&mut buf),
            Err(CodecError::NonCanonicalVarUint)
        );
    }

    #[test]
    fn test_truncated_input() {
        let mut buf: &[u8] = &[0x01, 0x02];
        assert_eq!(
            get_u32(&mut buf),
            Err(CodecError::UnexpectedEof { need: 4, have: 2 })
        );

        // Length prefix promises 5 bytes, only 2 follow
        let mut buf: &[u8] = &[0x05, 0xAA, 0xBB];
        assert!(matches!(
            get_var_bytes(&mut buf),
            Err(CodecError::UnexpectedEof { need: 5, have: 2 })
        ));
    }

    #[test]
    fn test_over_length_rejected() {
        let mut bytes = Vec::new();
        put_var_uint(&mut bytes, MAX_VAR_BYTES as u64 + 1);
        let mut buf = bytes.as_slice();
        assert!(matches!(
            get_var_bytes(&mut buf),
            Err(CodecError::TooLong(_))
        ));
    }

    #[test]
    fn test_var_string() {
        let mut out = Vec::new();
        put_var_string(&mut out, "gasPrice");
        assert_eq!(out[0], 8);

        let mut buf = out.as_slice();
        assert_eq!(get_var_string(&mut buf).unwrap(), "gasPrice");

        let mut buf: &[u8] = &[0x02, 0xC3, 0x28];
        assert_eq!(get_var_string(&mut buf), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = Address([7u8; ADDRESS_LEN]).to_bytes();
        bytes.push(0);
        assert_eq!(
            Address::from_bytes(&bytes),
            Err(CodecError::TrailingBytes(1))
        );
    }
}
