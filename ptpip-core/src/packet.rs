//! PTP/IP packet framing.
//!
//! Every standard packet travels with an 8-byte header:
//!
//! ```text
//! length:  u32  (4)   total bytes on the wire, header included
//! type:    u32  (4)   PacketType discriminant
//! payload: [u8] (variable)
//! ```
//!
//! The Fujifilm operation request/response shapes omit the type field
//! entirely — their frames are `length` followed by the payload, and
//! the receiver must already know what shape to expect. Such shapes
//! report [`None`] from [`Encode::packet_type`].

use bytes::{Buf, BufMut, BytesMut};

use crate::error::Error;

/// Bytes of the standard header: length plus type.
pub const HEADER_SIZE: usize = 8;

/// Bytes of the length prefix alone (untagged vendor frames).
pub const LENGTH_SIZE: usize = 4;

// ── PacketType ───────────────────────────────────────────────────

/// The closed set of PTP/IP packet type codes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Initiator opens the Command/Data connection.
    InitCommandRequest = 0x0000_0001,
    /// Responder acknowledges, assigning a connection number.
    InitCommandAck = 0x0000_0002,
    /// Initiator opens the Event connection with that number.
    InitEventRequest = 0x0000_0003,
    /// Responder acknowledges the Event connection.
    InitEventAck = 0x0000_0004,
    /// Responder refuses either init request.
    InitFail = 0x0000_0005,
    /// An operation request on the Command/Data connection.
    OperationRequest = 0x0000_0006,
    /// The terminating response of an operation.
    OperationResponse = 0x0000_0007,
    /// An asynchronous event on the Event connection.
    Event = 0x0000_0008,
    /// Announces a data phase and its total length.
    StartData = 0x0000_0009,
    /// An intermediate data payload.
    Data = 0x0000_000A,
    /// The final data payload of a data phase.
    EndData = 0x0000_000C,
    /// Liveness probe.
    ProbeRequest = 0x0000_000D,
    /// Liveness probe reply.
    ProbeResponse = 0x0000_000E,
}

impl TryFrom<u32> for PacketType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(PacketType::InitCommandRequest),
            0x02 => Ok(PacketType::InitCommandAck),
            0x03 => Ok(PacketType::InitEventRequest),
            0x04 => Ok(PacketType::InitEventAck),
            0x05 => Ok(PacketType::InitFail),
            0x06 => Ok(PacketType::OperationRequest),
            0x07 => Ok(PacketType::OperationResponse),
            0x08 => Ok(PacketType::Event),
            0x09 => Ok(PacketType::StartData),
            0x0A => Ok(PacketType::Data),
            0x0C => Ok(PacketType::EndData),
            0x0D => Ok(PacketType::ProbeRequest),
            0x0E => Ok(PacketType::ProbeResponse),
            other => Err(Error::UnknownPacketType(other)),
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// ── Encode / Decode ──────────────────────────────────────────────

/// An outgoing packet shape.
pub trait Encode {
    /// The header type code, or `None` for untagged vendor shapes.
    fn packet_type(&self) -> Option<PacketType>;

    /// Write the payload in declared field order.
    fn encode_payload(&self, buf: &mut BytesMut);

    /// Frame the packet for the wire: length prefix, type code when
    /// tagged, then the payload.
    fn to_bytes(&self) -> BytesMut {
        let mut payload = BytesMut::new();
        self.encode_payload(&mut payload);

        let header = match self.packet_type() {
            Some(_) => HEADER_SIZE,
            None => LENGTH_SIZE,
        };
        let mut frame = BytesMut::with_capacity(header + payload.len());
        frame.put_u32_le((header + payload.len()) as u32);
        if let Some(ty) = self.packet_type() {
            frame.put_u32_le(ty as u32);
        }
        frame.extend_from_slice(&payload);
        frame
    }
}

/// An incoming packet shape.
pub trait Decode: Sized {
    /// The expected header type code, or `None` for untagged vendor
    /// shapes where the caller supplies the variant.
    const PACKET_TYPE: Option<PacketType>;

    /// Byte length of the fixed-field prefix, before any variable
    /// tail (strings, arrays, parameter lists).
    const FIXED_FIELD_SIZE: usize;

    /// Human-readable shape name for error reporting.
    const NAME: &'static str;

    /// Decode from a frame body (header already stripped).
    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error>;

    /// Decode after validating the body against the fixed-field size.
    fn decode(mut body: &[u8]) -> Result<Self, Error> {
        if body.len() < Self::FIXED_FIELD_SIZE {
            return Err(Error::Truncated {
                what: Self::NAME,
                need: Self::FIXED_FIELD_SIZE,
                have: body.len(),
            });
        }
        Self::decode_payload(&mut body)
    }
}

/// Split a tagged frame into its type code and body.
pub fn split_header(frame: &[u8]) -> Result<(PacketType, &[u8]), Error> {
    if frame.len() < HEADER_SIZE {
        return Err(Error::Truncated {
            what: "packet header",
            need: HEADER_SIZE,
            have: frame.len(),
        });
    }
    let mut rd = frame;
    let length = rd.get_u32_le() as usize;
    let ty = PacketType::try_from(rd.get_u32_le())?;
    if length != frame.len() {
        return Err(Error::LengthMismatch {
            header: length,
            actual: frame.len(),
        });
    }
    Ok((ty, rd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_type_roundtrip() {
        let all = [
            PacketType::InitCommandRequest,
            PacketType::InitCommandAck,
            PacketType::InitEventRequest,
            PacketType::InitEventAck,
            PacketType::InitFail,
            PacketType::OperationRequest,
            PacketType::OperationResponse,
            PacketType::Event,
            PacketType::StartData,
            PacketType::Data,
            PacketType::EndData,
            PacketType::ProbeRequest,
            PacketType::ProbeResponse,
        ];
        for ty in all {
            assert_eq!(PacketType::try_from(ty as u32).unwrap(), ty);
        }
    }

    #[test]
    fn packet_type_invalid() {
        assert!(matches!(
            PacketType::try_from(0x0B),
            Err(Error::UnknownPacketType(0x0B))
        ));
        assert!(PacketType::try_from(0xFF).is_err());
    }

    #[test]
    fn split_header_checks_length() {
        // length field says 12 but only 10 bytes present
        let mut frame = BytesMut::new();
        frame.put_u32_le(12);
        frame.put_u32_le(PacketType::ProbeRequest as u32);
        frame.put_u16_le(0);
        assert!(matches!(
            split_header(&frame),
            Err(Error::LengthMismatch { header: 12, actual: 10 })
        ));
    }
}
