//! Wire primitives shared by every packet shape.
//!
//! All integers are little-endian. Strings travel as UTF-16LE with a
//! terminating `U+0000` code unit, in one of two forms:
//!
//! - **PTP/IP form** — bare code units up to and including the
//!   terminator (used by the init packets).
//! - **dataset form** — a `u8` count of code units *including* the
//!   terminator, then the code units (used inside DeviceInfo and
//!   DevicePropDesc payloads).
//!
//! GUIDs are 16 raw bytes transmitted verbatim; their canonical string
//! form is the RFC 4122 layout and round-trips through [`uuid::Uuid`].

use bytes::{Buf, BufMut, BytesMut};
use uuid::Uuid;

use crate::error::Error;

/// Fail with a typed error unless `buf` still holds `need` bytes.
pub fn ensure(buf: &impl Buf, what: &'static str, need: usize) -> Result<(), Error> {
    if buf.remaining() < need {
        return Err(Error::Truncated {
            what,
            need,
            have: buf.remaining(),
        });
    }
    Ok(())
}

// ── Strings ──────────────────────────────────────────────────────

/// Append a string in PTP/IP form: UTF-16LE code units plus terminator.
pub fn put_string(buf: &mut BytesMut, s: &str) {
    for unit in s.encode_utf16() {
        buf.put_u16_le(unit);
    }
    buf.put_u16_le(0);
}

/// Read a PTP/IP-form string, consuming up to and including the
/// terminator.
pub fn get_string(buf: &mut impl Buf) -> Result<String, Error> {
    let mut units = Vec::new();
    loop {
        ensure(buf, "UTF-16 string", 2)?;
        let unit = buf.get_u16_le();
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    String::from_utf16(&units).map_err(|_| Error::ProtocolViolation("invalid UTF-16 string"))
}

/// Append a string in dataset form: `u8` count (incl. terminator),
/// then the code units. An empty string is the single count byte `0`.
pub fn put_dataset_string(buf: &mut BytesMut, s: &str) {
    if s.is_empty() {
        buf.put_u8(0);
        return;
    }
    let units: Vec<u16> = s.encode_utf16().collect();
    buf.put_u8((units.len() + 1) as u8);
    for unit in units {
        buf.put_u16_le(unit);
    }
    buf.put_u16_le(0);
}

/// Read a dataset-form string.
pub fn get_dataset_string(buf: &mut impl Buf) -> Result<String, Error> {
    ensure(buf, "dataset string", 1)?;
    let count = buf.get_u8() as usize;
    if count == 0 {
        return Ok(String::new());
    }
    ensure(buf, "dataset string", count * 2)?;
    let mut units = Vec::with_capacity(count - 1);
    for _ in 0..count - 1 {
        units.push(buf.get_u16_le());
    }
    if buf.get_u16_le() != 0 {
        return Err(Error::UnterminatedString);
    }
    String::from_utf16(&units).map_err(|_| Error::ProtocolViolation("invalid UTF-16 string"))
}

// ── GUIDs ────────────────────────────────────────────────────────

/// Append a GUID as its 16 raw bytes.
pub fn put_guid(buf: &mut BytesMut, guid: &Uuid) {
    buf.put_slice(guid.as_bytes());
}

/// Read a 16-byte GUID.
pub fn get_guid(buf: &mut impl Buf) -> Result<Uuid, Error> {
    ensure(buf, "GUID", 16)?;
    let mut raw = [0u8; 16];
    buf.copy_to_slice(&mut raw);
    Ok(Uuid::from_bytes(raw))
}

// ── Code arrays ──────────────────────────────────────────────────

/// Read a PTP array of `u16` codes: `u32` element count, then the
/// elements.
pub fn get_u16_array(buf: &mut impl Buf) -> Result<Vec<u16>, Error> {
    ensure(buf, "u16 array", 4)?;
    let count = buf.get_u32_le() as usize;
    ensure(buf, "u16 array", count * 2)?;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(buf.get_u16_le());
    }
    Ok(out)
}

/// Append a PTP array of `u16` codes.
pub fn put_u16_array(buf: &mut BytesMut, items: &[u16]) {
    buf.put_u32_le(items.len() as u32);
    for item in items {
        buf.put_u16_le(*item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_roundtrip() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "Golang PTP/IP client");
        let mut rd = &buf[..];
        assert_eq!(get_string(&mut rd).unwrap(), "Golang PTP/IP client");
        assert!(rd.is_empty());
    }

    #[test]
    fn empty_string_is_terminator_only() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "");
        assert_eq!(&buf[..], &[0x00, 0x00]);
    }

    #[test]
    fn string_is_utf16le() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "X-T1");
        assert_eq!(
            &buf[..],
            &[0x58, 0x00, 0x2D, 0x00, 0x54, 0x00, 0x31, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn unterminated_string_fails() {
        let raw = [0x58u8, 0x00, 0x2D, 0x00];
        let mut rd = &raw[..];
        assert!(matches!(
            get_string(&mut rd),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn dataset_string_roundtrip() {
        let mut buf = BytesMut::new();
        put_dataset_string(&mut buf, "FUJIFILM");
        // count byte: 8 chars + terminator
        assert_eq!(buf[0], 9);
        let mut rd = &buf[..];
        assert_eq!(get_dataset_string(&mut rd).unwrap(), "FUJIFILM");
    }

    #[test]
    fn dataset_string_empty() {
        let mut buf = BytesMut::new();
        put_dataset_string(&mut buf, "");
        assert_eq!(&buf[..], &[0x00]);
        let mut rd = &buf[..];
        assert_eq!(get_dataset_string(&mut rd).unwrap(), "");
    }

    #[test]
    fn guid_bytes_are_verbatim() {
        let guid = Uuid::parse_str("ada5485d-87b2-7f0b-d3d5-ded00278a8c0").unwrap();
        let mut buf = BytesMut::new();
        put_guid(&mut buf, &guid);
        assert_eq!(
            &buf[..],
            &[
                0xAD, 0xA5, 0x48, 0x5D, 0x87, 0xB2, 0x7F, 0x0B, 0xD3, 0xD5, 0xDE, 0xD0, 0x02,
                0x78, 0xA8, 0xC0
            ]
        );
        let mut rd = &buf[..];
        let back = get_guid(&mut rd).unwrap();
        assert_eq!(back, guid);
        assert_eq!(back.to_string(), "ada5485d-87b2-7f0b-d3d5-ded00278a8c0");
    }

    #[test]
    fn u16_array_roundtrip() {
        let mut buf = BytesMut::new();
        put_u16_array(&mut buf, &[0x1001, 0x1002, 0x9022]);
        let mut rd = &buf[..];
        assert_eq!(get_u16_array(&mut rd).unwrap(), vec![0x1001, 0x1002, 0x9022]);
    }

    #[test]
    fn u16_array_truncated() {
        let raw = [0x03u8, 0x00, 0x00, 0x00, 0x01, 0x10];
        let mut rd = &raw[..];
        assert!(get_u16_array(&mut rd).is_err());
    }
}
