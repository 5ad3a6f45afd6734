//! PTP data-type codes and typed values.
//!
//! Every property value on the wire is declared by a [`DataTypeCode`];
//! a decoded [`DataValue`] must occupy exactly the width that code
//! declares.

use bytes::{Buf, BufMut, BytesMut};

use crate::codec;
use crate::error::Error;

// ── DataTypeCode ─────────────────────────────────────────────────

/// A PTP data-type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataTypeCode(pub u16);

impl DataTypeCode {
    pub const UNDEF: DataTypeCode = DataTypeCode(0x0000);
    pub const INT8: DataTypeCode = DataTypeCode(0x0001);
    pub const UINT8: DataTypeCode = DataTypeCode(0x0002);
    pub const INT16: DataTypeCode = DataTypeCode(0x0003);
    pub const UINT16: DataTypeCode = DataTypeCode(0x0004);
    pub const INT32: DataTypeCode = DataTypeCode(0x0005);
    pub const UINT32: DataTypeCode = DataTypeCode(0x0006);
    pub const INT64: DataTypeCode = DataTypeCode(0x0007);
    pub const UINT64: DataTypeCode = DataTypeCode(0x0008);
    pub const INT128: DataTypeCode = DataTypeCode(0x0009);
    pub const UINT128: DataTypeCode = DataTypeCode(0x000A);
    pub const AINT8: DataTypeCode = DataTypeCode(0x4001);
    pub const AUINT8: DataTypeCode = DataTypeCode(0x4002);
    pub const AINT16: DataTypeCode = DataTypeCode(0x4003);
    pub const AUINT16: DataTypeCode = DataTypeCode(0x4004);
    pub const AINT32: DataTypeCode = DataTypeCode(0x4005);
    pub const AUINT32: DataTypeCode = DataTypeCode(0x4006);
    pub const AINT64: DataTypeCode = DataTypeCode(0x4007);
    pub const AUINT64: DataTypeCode = DataTypeCode(0x4008);
    pub const AINT128: DataTypeCode = DataTypeCode(0x4009);
    pub const AUINT128: DataTypeCode = DataTypeCode(0x400A);
    pub const STR: DataTypeCode = DataTypeCode(0xFFFF);

    /// Whether this code describes an array type.
    pub fn is_array(self) -> bool {
        self.0 & 0x4000 != 0 && self != DataTypeCode::STR
    }

    /// The scalar element type of an array code.
    pub fn element(self) -> DataTypeCode {
        if self.is_array() {
            DataTypeCode(self.0 & !0x4000)
        } else {
            self
        }
    }

    /// Byte width of one scalar of this type. `None` for strings,
    /// arrays and undefined.
    pub fn scalar_width(self) -> Option<usize> {
        match self {
            DataTypeCode::INT8 | DataTypeCode::UINT8 => Some(1),
            DataTypeCode::INT16 | DataTypeCode::UINT16 => Some(2),
            DataTypeCode::INT32 | DataTypeCode::UINT32 => Some(4),
            DataTypeCode::INT64 | DataTypeCode::UINT64 => Some(8),
            DataTypeCode::INT128 | DataTypeCode::UINT128 => Some(16),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataTypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

// ── DataValue ────────────────────────────────────────────────────

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    /// Array of scalars of the element type.
    Array(Vec<DataValue>),
    /// UTF-16 string.
    Str(String),
}

impl DataValue {
    /// Decode one value of the declared type.
    pub fn decode(dt: DataTypeCode, buf: &mut &[u8]) -> Result<Self, Error> {
        if dt == DataTypeCode::STR {
            return Ok(DataValue::Str(codec::get_dataset_string(buf)?));
        }
        if dt.is_array() {
            codec::ensure(buf, "value array", 4)?;
            let count = buf.get_u32_le() as usize;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(DataValue::decode_scalar(dt.element(), buf)?);
            }
            return Ok(DataValue::Array(items));
        }
        DataValue::decode_scalar(dt, buf)
    }

    fn decode_scalar(dt: DataTypeCode, buf: &mut &[u8]) -> Result<Self, Error> {
        let width = dt.scalar_width().ok_or(Error::UnknownDataType(dt.0))?;
        codec::ensure(buf, "scalar value", width)?;
        Ok(match dt {
            DataTypeCode::INT8 => DataValue::I8(buf.get_i8()),
            DataTypeCode::UINT8 => DataValue::U8(buf.get_u8()),
            DataTypeCode::INT16 => DataValue::I16(buf.get_i16_le()),
            DataTypeCode::UINT16 => DataValue::U16(buf.get_u16_le()),
            DataTypeCode::INT32 => DataValue::I32(buf.get_i32_le()),
            DataTypeCode::UINT32 => DataValue::U32(buf.get_u32_le()),
            DataTypeCode::INT64 => DataValue::I64(buf.get_i64_le()),
            DataTypeCode::UINT64 => DataValue::U64(buf.get_u64_le()),
            DataTypeCode::INT128 => DataValue::I128(buf.get_i128_le()),
            DataTypeCode::UINT128 => DataValue::U128(buf.get_u128_le()),
            _ => unreachable!("scalar_width filtered non-scalars"),
        })
    }

    /// Encode in the width the value itself carries.
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            DataValue::I8(v) => buf.put_i8(*v),
            DataValue::U8(v) => buf.put_u8(*v),
            DataValue::I16(v) => buf.put_i16_le(*v),
            DataValue::U16(v) => buf.put_u16_le(*v),
            DataValue::I32(v) => buf.put_i32_le(*v),
            DataValue::U32(v) => buf.put_u32_le(*v),
            DataValue::I64(v) => buf.put_i64_le(*v),
            DataValue::U64(v) => buf.put_u64_le(*v),
            DataValue::I128(v) => buf.put_i128_le(*v),
            DataValue::U128(v) => buf.put_u128_le(*v),
            DataValue::Array(items) => {
                buf.put_u32_le(items.len() as u32);
                for item in items {
                    item.encode(buf);
                }
            }
            DataValue::Str(s) => codec::put_dataset_string(buf, s),
        }
    }

    /// Byte width of the scalar this value holds. `None` for arrays
    /// and strings.
    pub fn scalar_width(&self) -> Option<usize> {
        match self {
            DataValue::I8(_) | DataValue::U8(_) => Some(1),
            DataValue::I16(_) | DataValue::U16(_) => Some(2),
            DataValue::I32(_) | DataValue::U32(_) => Some(4),
            DataValue::I64(_) | DataValue::U64(_) => Some(8),
            DataValue::I128(_) | DataValue::U128(_) => Some(16),
            _ => None,
        }
    }

    /// Whether this value matches the declared type, including the
    /// width of every element of an array.
    pub fn matches(&self, dt: DataTypeCode) -> bool {
        match self {
            DataValue::Str(_) => dt == DataTypeCode::STR,
            DataValue::Array(items) => {
                dt.is_array()
                    && items
                        .iter()
                        .all(|item| item.scalar_width() == dt.element().scalar_width())
            }
            scalar => scalar.scalar_width() == dt.scalar_width() && !dt.is_array(),
        }
    }

    /// Lossy widening to `i64`, for presentation. Arrays and strings
    /// yield `None`; 128-bit values are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::I8(v) => Some(*v as i64),
            DataValue::U8(v) => Some(*v as i64),
            DataValue::I16(v) => Some(*v as i64),
            DataValue::U16(v) => Some(*v as i64),
            DataValue::I32(v) => Some(*v as i64),
            DataValue::U32(v) => Some(*v as i64),
            DataValue::I64(v) => Some(*v),
            DataValue::U64(v) => Some(*v as i64),
            DataValue::I128(v) => Some(*v as i64),
            DataValue::U128(v) => Some(*v as i64),
            DataValue::Array(_) | DataValue::Str(_) => None,
        }
    }
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Str(s) => write!(f, "{s}"),
            DataValue::Array(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            other => match other.as_i64() {
                Some(v) => write!(f, "{v:#x}"),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_widths_match_declared_type() {
        let cases = [
            (DataTypeCode::UINT8, 1),
            (DataTypeCode::INT16, 2),
            (DataTypeCode::UINT32, 4),
            (DataTypeCode::INT64, 8),
            (DataTypeCode::UINT128, 16),
        ];
        for (dt, width) in cases {
            let mut buf = BytesMut::new();
            buf.resize(16, 0xAB);
            let mut rd = &buf[..];
            let value = DataValue::decode(dt, &mut rd).unwrap();
            assert_eq!(value.scalar_width(), Some(width));
            assert!(value.matches(dt));

            let mut out = BytesMut::new();
            value.encode(&mut out);
            assert_eq!(out.len(), width);
        }
    }

    #[test]
    fn array_roundtrip() {
        let value = DataValue::Array(vec![
            DataValue::U16(100),
            DataValue::U16(200),
            DataValue::U16(400),
        ]);
        let mut buf = BytesMut::new();
        value.encode(&mut buf);

        let mut rd = &buf[..];
        let back = DataValue::decode(DataTypeCode::AUINT16, &mut rd).unwrap();
        assert_eq!(back, value);
        assert!(back.matches(DataTypeCode::AUINT16));
        assert!(!back.matches(DataTypeCode::AUINT32));
    }

    #[test]
    fn string_roundtrip() {
        let value = DataValue::Str("800x600".to_string());
        let mut buf = BytesMut::new();
        value.encode(&mut buf);

        let mut rd = &buf[..];
        let back = DataValue::decode(DataTypeCode::STR, &mut rd).unwrap();
        assert_eq!(back, value);
        assert!(back.matches(DataTypeCode::STR));
    }

    #[test]
    fn element_of_array_code() {
        assert_eq!(DataTypeCode::AUINT16.element(), DataTypeCode::UINT16);
        assert!(DataTypeCode::AUINT16.is_array());
        assert!(!DataTypeCode::STR.is_array());
        assert!(!DataTypeCode::UINT16.is_array());
    }

    #[test]
    fn truncated_scalar_fails() {
        let raw = [0x01u8, 0x02];
        let mut rd = &raw[..];
        assert!(DataValue::decode(DataTypeCode::UINT32, &mut rd).is_err());
    }

    #[test]
    fn signed_decoding() {
        let mut buf = BytesMut::new();
        buf.put_i16_le(-1666);
        let mut rd = &buf[..];
        let value = DataValue::decode(DataTypeCode::INT16, &mut rd).unwrap();
        assert_eq!(value, DataValue::I16(-1666));
        assert_eq!(value.as_i64(), Some(-1666));
    }
}
