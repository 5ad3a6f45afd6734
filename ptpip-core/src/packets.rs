//! The standard PTP/IP packet variants.
//!
//! Field order in each `encode_payload`/`decode_payload` is the
//! declared wire order. Variable tails (strings, parameter lists) sit
//! after the fixed fields and are sized by the residual frame length.

use bytes::{Buf, BufMut, BytesMut};
use uuid::Uuid;

use crate::codec;
use crate::error::Error;
use crate::packet::{Decode, Encode, PacketType};
use crate::ptp::op::{EventCode, OperationCode, ResponseCode};

/// Protocol version offered by a standard initiator: 1.0.
pub const PROTOCOL_VERSION: u32 = 0x0001_0000;

/// Data-phase announcements carried in an operation request.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPhase {
    Unknown = 0x0000_0000,
    /// No data phase, or data flows responder → initiator.
    NoDataOrDataIn = 0x0000_0001,
    /// Data flows initiator → responder.
    DataOut = 0x0000_0002,
}

// ── Init packets ─────────────────────────────────────────────────

/// Opens the Command/Data connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitCommandRequest {
    pub guid: Uuid,
    pub friendly_name: String,
    pub protocol_version: u32,
}

impl InitCommandRequest {
    pub fn new(guid: Uuid, friendly_name: &str) -> Self {
        InitCommandRequest {
            guid,
            friendly_name: friendly_name.to_string(),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

impl Encode for InitCommandRequest {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::InitCommandRequest)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        codec::put_guid(buf, &self.guid);
        codec::put_string(buf, &self.friendly_name);
        buf.put_u32_le(self.protocol_version);
    }
}

/// Acknowledges the Command/Data connection, assigning the connection
/// number the Event connection must echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitCommandAck {
    pub connection_number: u32,
    pub guid: Uuid,
    pub friendly_name: String,
    pub protocol_version: u32,
}

impl Encode for InitCommandAck {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::InitCommandAck)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.connection_number);
        codec::put_guid(buf, &self.guid);
        codec::put_string(buf, &self.friendly_name);
        buf.put_u32_le(self.protocol_version);
    }
}

impl Decode for InitCommandAck {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::InitCommandAck);
    // connection number + GUID; the name and trailing version are the
    // variable tail.
    const FIXED_FIELD_SIZE: usize = 4 + 16;
    const NAME: &'static str = "InitCommandAck";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let connection_number = body.get_u32_le();
        let guid = codec::get_guid(body)?;
        let friendly_name = codec::get_string(body)?;
        codec::ensure(body, Self::NAME, 4)?;
        let protocol_version = body.get_u32_le();
        Ok(InitCommandAck {
            connection_number,
            guid,
            friendly_name,
            protocol_version,
        })
    }
}

/// Opens the Event connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitEventRequest {
    pub connection_number: u32,
}

impl Encode for InitEventRequest {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::InitEventRequest)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.connection_number);
    }
}

impl Decode for InitEventRequest {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::InitEventRequest);
    const FIXED_FIELD_SIZE: usize = 4;
    const NAME: &'static str = "InitEventRequest";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        Ok(InitEventRequest {
            connection_number: body.get_u32_le(),
        })
    }
}

/// Acknowledges the Event connection. Empty payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitEventAck;

impl Encode for InitEventAck {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::InitEventAck)
    }

    fn encode_payload(&self, _buf: &mut BytesMut) {}
}

impl Decode for InitEventAck {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::InitEventAck);
    const FIXED_FIELD_SIZE: usize = 0;
    const NAME: &'static str = "InitEventAck";

    fn decode_payload(_body: &mut &[u8]) -> Result<Self, Error> {
        Ok(InitEventAck)
    }
}

/// Refuses either init request, carrying a 32-bit fail reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitFail {
    pub reason: u32,
}

impl Encode for InitFail {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::InitFail)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.reason);
    }
}

impl Decode for InitFail {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::InitFail);
    const FIXED_FIELD_SIZE: usize = 4;
    const NAME: &'static str = "InitFail";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        Ok(InitFail {
            reason: body.get_u32_le(),
        })
    }
}

// ── Operation packets ────────────────────────────────────────────

/// A standard operation request: up to five 32-bit parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub data_phase_info: u32,
    pub operation_code: OperationCode,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl OperationRequest {
    pub fn new(
        phase: DataPhase,
        operation_code: OperationCode,
        transaction_id: u32,
        params: &[u32],
    ) -> Self {
        OperationRequest {
            data_phase_info: phase as u32,
            operation_code,
            transaction_id,
            params: params.to_vec(),
        }
    }
}

impl Encode for OperationRequest {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::OperationRequest)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.data_phase_info);
        buf.put_u16_le(self.operation_code.0);
        buf.put_u32_le(self.transaction_id);
        for p in &self.params {
            buf.put_u32_le(*p);
        }
    }
}

impl Decode for OperationRequest {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::OperationRequest);
    const FIXED_FIELD_SIZE: usize = 4 + 2 + 4;
    const NAME: &'static str = "OperationRequest";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let data_phase_info = body.get_u32_le();
        let operation_code = OperationCode(body.get_u16_le());
        let transaction_id = body.get_u32_le();
        let params = read_param_tail(body)?;
        Ok(OperationRequest {
            data_phase_info,
            operation_code,
            transaction_id,
            params,
        })
    }
}

/// The terminating response of an operation. The parameter tail is
/// sized by the residual frame length; its arity is
/// operation-dependent and known by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResponse {
    pub data_phase: u32,
    pub response_code: ResponseCode,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl OperationResponse {
    /// The accepted success set: OK, SessionAlreadyOpen, and the Fuji
    /// DevicePropValue reply.
    pub fn was_successful(&self) -> bool {
        self.response_code.is_success()
    }

    /// The failure as a typed error, naming the code.
    pub fn reason_as_error(&self) -> Error {
        Error::OperationFailed {
            code: self.response_code,
            name: self.response_code.name().to_string(),
        }
    }
}

impl Encode for OperationResponse {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::OperationResponse)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.data_phase);
        buf.put_u16_le(self.response_code.0);
        buf.put_u32_le(self.transaction_id);
        for p in &self.params {
            buf.put_u32_le(*p);
        }
    }
}

impl Decode for OperationResponse {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::OperationResponse);
    const FIXED_FIELD_SIZE: usize = 4 + 2 + 4;
    const NAME: &'static str = "OperationResponse";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let data_phase = body.get_u32_le();
        let response_code = ResponseCode(body.get_u16_le());
        let transaction_id = body.get_u32_le();
        let params = read_param_tail(body)?;
        Ok(OperationResponse {
            data_phase,
            response_code,
            transaction_id,
            params,
        })
    }
}

// ── Event packet ─────────────────────────────────────────────────

/// An asynchronous event: code, transaction id, up to three params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPacket {
    pub event_code: EventCode,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl Encode for EventPacket {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::Event)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.event_code.0);
        buf.put_u32_le(self.transaction_id);
        for p in &self.params {
            buf.put_u32_le(*p);
        }
    }
}

impl Decode for EventPacket {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::Event);
    const FIXED_FIELD_SIZE: usize = 2 + 4;
    const NAME: &'static str = "Event";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let event_code = EventCode(body.get_u16_le());
        let transaction_id = body.get_u32_le();
        let params = read_param_tail(body)?;
        Ok(EventPacket {
            event_code,
            transaction_id,
            params,
        })
    }
}

// ── Data phase packets ───────────────────────────────────────────

/// Announces a data phase and its total payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartData {
    pub transaction_id: u32,
    pub total_data_length: u64,
}

impl Encode for StartData {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::StartData)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.transaction_id);
        buf.put_u64_le(self.total_data_length);
    }
}

impl Decode for StartData {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::StartData);
    const FIXED_FIELD_SIZE: usize = 4 + 8;
    const NAME: &'static str = "StartData";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        Ok(StartData {
            transaction_id: body.get_u32_le(),
            total_data_length: body.get_u64_le(),
        })
    }
}

/// An intermediate data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub transaction_id: u32,
    pub payload: Vec<u8>,
}

impl Encode for DataPacket {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::Data)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.transaction_id);
        buf.put_slice(&self.payload);
    }
}

impl Decode for DataPacket {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::Data);
    const FIXED_FIELD_SIZE: usize = 4;
    const NAME: &'static str = "Data";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let transaction_id = body.get_u32_le();
        let payload = body.to_vec();
        body.advance(payload.len());
        Ok(DataPacket {
            transaction_id,
            payload,
        })
    }
}

/// The final data payload of a data phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndData {
    pub transaction_id: u32,
    pub payload: Vec<u8>,
}

impl Encode for EndData {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::EndData)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.transaction_id);
        buf.put_slice(&self.payload);
    }
}

impl Decode for EndData {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::EndData);
    const FIXED_FIELD_SIZE: usize = 4;
    const NAME: &'static str = "EndData";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let transaction_id = body.get_u32_le();
        let payload = body.to_vec();
        body.advance(payload.len());
        Ok(EndData {
            transaction_id,
            payload,
        })
    }
}

// ── Probes ───────────────────────────────────────────────────────

/// Liveness probe. Empty payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeRequest;

impl Encode for ProbeRequest {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::ProbeRequest)
    }

    fn encode_payload(&self, _buf: &mut BytesMut) {}
}

impl Decode for ProbeRequest {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::ProbeRequest);
    const FIXED_FIELD_SIZE: usize = 0;
    const NAME: &'static str = "ProbeRequest";

    fn decode_payload(_body: &mut &[u8]) -> Result<Self, Error> {
        Ok(ProbeRequest)
    }
}

/// Liveness probe reply. Empty payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeResponse;

impl Encode for ProbeResponse {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::ProbeResponse)
    }

    fn encode_payload(&self, _buf: &mut BytesMut) {}
}

impl Decode for ProbeResponse {
    const PACKET_TYPE: Option<PacketType> = Some(PacketType::ProbeResponse);
    const FIXED_FIELD_SIZE: usize = 0;
    const NAME: &'static str = "ProbeResponse";

    fn decode_payload(_body: &mut &[u8]) -> Result<Self, Error> {
        Ok(ProbeResponse)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Read the trailing 32-bit parameter list filling the residual body.
fn read_param_tail(body: &mut &[u8]) -> Result<Vec<u32>, Error> {
    if body.len() % 4 != 0 {
        return Err(Error::ProtocolViolation("parameter tail not 32-bit aligned"));
    }
    let mut params = Vec::with_capacity(body.len() / 4);
    while body.has_remaining() {
        params.push(body.get_u32_le());
    }
    Ok(params)
}
