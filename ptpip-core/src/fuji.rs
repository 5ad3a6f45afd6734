//! The Fujifilm PTP/IP dialect.
//!
//! Fuji firmware deviates from the standard in three load-bearing
//! ways:
//!
//! - The InitCommandRequest payload is reordered: ProtocolVersion
//!   first, then GUID, then FriendlyName, and the version must be
//!   `0x8F53E4F2` or the camera answers InitFail.
//! - Operation request/response packets carry **no packet type** in
//!   their header — only the length prefix — and shrink DataPhaseInfo
//!   from `u32` to `u16`.
//! - The standard PTP/IP initialisation is not enough: a post-init
//!   dialogue ([`init_sequence`]) must complete before the camera
//!   accepts normal operations or opens its event port.

use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{Client, CONFIRMATION_TIMEOUT, SESSION_ID};
use crate::codec;
use crate::error::Error;
use crate::packet::{Decode, Encode, PacketType};
use crate::packets::DataPhase;
use crate::ptp::op::{OperationCode, ResponseCode};
use crate::ptp::property::DevicePropCode;

// ── Protocol constants ───────────────────────────────────────────

/// The protocol version a Fuji InitCommandRequest must carry.
pub const PV_FUJI: u32 = 0x8F53_E4F2;

/// Default Command/Data port.
pub const CMD_PORT_FUJI: u16 = 55740;

/// Event port, opened by the camera only after [`init_sequence`].
pub const EVENT_PORT_FUJI: u16 = 55741;

/// Selects the initialisation sequence. `0x00000003` is accepted but
/// leaves the handshake incomplete; `0x00000004` is rejected;
/// `0x00000005` completes cleanly.
pub const PM_FUJI_INIT_SEQUENCE: u32 = 0x0000_0005;

/// The lowest application version the cameras are known to accept.
/// The runtime value is whatever the device reports via
/// [`DPC_FUJI_APP_VERSION`].
pub const PM_FUJI_APP_VERSION: u32 = 0x0002_0001;

/// Must be set during initialisation; its value selects the init
/// sequence the camera expects from then on.
pub const DPC_FUJI_USE_INIT_SEQUENCE: DevicePropCode = DevicePropCode(0xDF01);

/// Holds the minimum application version the camera will accept.
/// Echoing it back acknowledges the camera and persists the client's
/// friendly name for future connections.
pub const DPC_FUJI_APP_VERSION: DevicePropCode = DevicePropCode(0xDF24);

pub const DPC_FUJI_FILM_SIMULATION: DevicePropCode = DevicePropCode(0xD001);

/// ISO, with bit 31 flagging auto ("S") mode.
pub const DPC_FUJI_EXPOSURE_INDEX: DevicePropCode = DevicePropCode(0xD02A);

/// Returned when the stored friendly name does not match (set the
/// camera to 'change') or the camera timed out (set it to 'retry').
pub const FR_FUJI_DEVICE_BUSY: u32 = 0x0000_2019;

/// Returned when the InitCommandRequest carries the wrong protocol
/// version.
pub const FR_FUJI_INVALID_PARAMETER: u32 = 0x0000_201D;

// ── Battery ──────────────────────────────────────────────────────

/// The three-bar battery gauge reported by the X-T1 family.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FujiBatteryLevel {
    One = 1,
    Two = 2,
    Full = 3,
}

impl TryFrom<i64> for FujiBatteryLevel {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FujiBatteryLevel::One),
            2 => Ok(FujiBatteryLevel::Two),
            3 => Ok(FujiBatteryLevel::Full),
            _ => Err(Error::ProtocolViolation("battery level outside gauge")),
        }
    }
}

// ── Packets ──────────────────────────────────────────────────────

/// The Fuji InitCommandRequest: ProtocolVersion moved to the front.
///
/// On the wire, right after the (length, type) header:
///
/// ```text
/// protocol_version: u32      (must be 0x8F53E4F2)
/// guid:             [u8; 16] (verbatim)
/// friendly_name:    UTF-16LE, null-terminated
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FujiInitCommandRequest {
    pub protocol_version: u32,
    pub guid: Uuid,
    pub friendly_name: String,
}

impl FujiInitCommandRequest {
    pub fn new(guid: Uuid, friendly_name: &str) -> Self {
        FujiInitCommandRequest {
            protocol_version: PV_FUJI,
            guid,
            friendly_name: friendly_name.to_string(),
        }
    }
}

impl Encode for FujiInitCommandRequest {
    fn packet_type(&self) -> Option<PacketType> {
        Some(PacketType::InitCommandRequest)
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.protocol_version);
        codec::put_guid(buf, &self.guid);
        codec::put_string(buf, &self.friendly_name);
    }
}

/// A Fuji operation request: untagged, 16-bit DataPhaseInfo, and all
/// five parameter slots always present on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FujiOperationRequest {
    pub data_phase_info: u16,
    pub operation_code: OperationCode,
    pub transaction_id: u32,
    pub params: [u32; 5],
}

impl FujiOperationRequest {
    pub fn new(
        phase: DataPhase,
        operation_code: OperationCode,
        transaction_id: u32,
        params: &[u32],
    ) -> Self {
        let mut fixed = [0u32; 5];
        fixed[..params.len().min(5)].copy_from_slice(&params[..params.len().min(5)]);
        FujiOperationRequest {
            data_phase_info: phase as u32 as u16,
            operation_code,
            transaction_id,
            params: fixed,
        }
    }

    pub fn open_session(transaction_id: u32, session_id: u32) -> Self {
        FujiOperationRequest::new(
            DataPhase::NoDataOrDataIn,
            OperationCode::OPEN_SESSION,
            transaction_id,
            &[session_id],
        )
    }
}

impl Encode for FujiOperationRequest {
    fn packet_type(&self) -> Option<PacketType> {
        None
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.data_phase_info);
        buf.put_u16_le(self.operation_code.0);
        buf.put_u32_le(self.transaction_id);
        for p in self.params {
            buf.put_u32_le(p);
        }
    }
}

impl Decode for FujiOperationRequest {
    const PACKET_TYPE: Option<PacketType> = None;
    const FIXED_FIELD_SIZE: usize = 2 + 2 + 4 + 20;
    const NAME: &'static str = "FujiOperationRequest";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let data_phase_info = body.get_u16_le();
        let operation_code = OperationCode(body.get_u16_le());
        let transaction_id = body.get_u32_le();
        let mut params = [0u32; 5];
        for slot in &mut params {
            *slot = body.get_u32_le();
        }
        Ok(FujiOperationRequest {
            data_phase_info,
            operation_code,
            transaction_id,
            params,
        })
    }
}

/// A Fuji operation response: untagged, 16-bit DataPhase, and a
/// parameter tail sized by the residual frame length. The tail's
/// arity is operation-dependent and known by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FujiOperationResponse {
    pub data_phase: u16,
    pub response_code: ResponseCode,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl FujiOperationResponse {
    pub fn was_successful(&self) -> bool {
        self.response_code.is_success()
    }

    pub fn reason_as_error(&self) -> Error {
        match self.response_code {
            ResponseCode::DEVICE_BUSY => {
                Error::Vendor(crate::error::VendorError::FujiDeviceBusy {
                    code: FR_FUJI_DEVICE_BUSY,
                })
            }
            ResponseCode::INVALID_PARAMETER => {
                Error::Vendor(crate::error::VendorError::FujiInvalidParameter {
                    code: FR_FUJI_INVALID_PARAMETER,
                })
            }
            code => Error::OperationFailed {
                code,
                name: code.name().to_string(),
            },
        }
    }
}

impl Encode for FujiOperationResponse {
    fn packet_type(&self) -> Option<PacketType> {
        None
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.data_phase);
        buf.put_u16_le(self.response_code.0);
        buf.put_u32_le(self.transaction_id);
        for p in &self.params {
            buf.put_u32_le(*p);
        }
    }
}

impl Decode for FujiOperationResponse {
    const PACKET_TYPE: Option<PacketType> = None;
    const FIXED_FIELD_SIZE: usize = 2 + 2 + 4;
    const NAME: &'static str = "FujiOperationResponse";

    fn decode_payload(body: &mut &[u8]) -> Result<Self, Error> {
        let data_phase = body.get_u16_le();
        let response_code = ResponseCode(body.get_u16_le());
        let transaction_id = body.get_u32_le();
        if body.len() % 4 != 0 {
            return Err(Error::ProtocolViolation("parameter tail not 32-bit aligned"));
        }
        let mut params = Vec::with_capacity(body.len() / 4);
        while body.has_remaining() {
            params.push(body.get_u32_le());
        }
        Ok(FujiOperationResponse {
            data_phase,
            response_code,
            transaction_id,
            params,
        })
    }
}

// ── The init sequence ────────────────────────────────────────────

/// The ordered steps of the post-connection dialogue.
///
/// ```text
///  OpenSession ──► DeclareInitSequence ──► NegotiateAppVersion
///                                                  │
///                       Ready ◄── InitiateOpenCapture
/// ```
///
/// Any unexpected response is fatal: the state machine stops where it
/// is and the caller closes the sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    OpenSession,
    DeclareInitSequence,
    NegotiateAppVersion,
    InitiateOpenCapture,
    Ready,
}

impl std::fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Run the Fuji initialisation dialogue on an already-acknowledged
/// Command/Data connection.
///
/// The standard PTP/IP init is not enough for this firmware: the
/// camera expects a session, a declared init-sequence number, an
/// acknowledged application version and an InitiateOpenCapture before
/// it hands over control and opens its event port. The
/// [`DPC_FUJI_USE_INIT_SEQUENCE`] write is the moment the camera may
/// prompt its operator to accept the connection, so that single
/// response is awaited under [`CONFIRMATION_TIMEOUT`] and an elapsed
/// deadline is an operator timeout, not a dead transport.
///
/// [`CONFIRMATION_TIMEOUT`]: crate::client::CONFIRMATION_TIMEOUT
pub(crate) async fn init_sequence(client: &mut Client) -> Result<(), Error> {
    let mut phase = HandshakePhase::OpenSession;
    debug!(%phase, "starting vendor init sequence");

    // OpenSession, with the vendor 16-bit data-phase shape.
    info!("opening a session");
    client.reset_transaction_id();
    client
        .send_request(DataPhase::NoDataOrDataIn, OperationCode::OPEN_SESSION, &[SESSION_ID])
        .await?;
    let response = client.recv_response(None).await?;
    if !response.was_successful() {
        return Err(client.reason_as_error(&response));
    }
    client.mark_session_open();
    client.increment_transaction_id();
    phase = HandshakePhase::DeclareInitSequence;
    debug!(%phase, "session open");

    // Declare the init sequence we speak. Two-part write; the camera
    // may now prompt its operator, so the response wait is long.
    info!("declaring init sequence number");
    client
        .send_request(
            DataPhase::NoDataOrDataIn,
            OperationCode::SET_DEVICE_PROP_VALUE,
            &[DPC_FUJI_USE_INIT_SEQUENCE.0 as u32],
        )
        .await?;
    client
        .send_request(
            DataPhase::DataOut,
            OperationCode::SET_DEVICE_PROP_VALUE,
            &[PM_FUJI_INIT_SEQUENCE],
        )
        .await?;
    info!("please accept the new connection request on the camera");
    let response = client
        .recv_response(Some(CONFIRMATION_TIMEOUT))
        .await
        .map_err(|e| match e {
            Error::Timeout(_) => Error::UserTimeout,
            other => other,
        })?;
    if !response.was_successful() {
        return Err(client.reason_as_error(&response));
    }
    client.increment_transaction_id();
    phase = HandshakePhase::NegotiateAppVersion;
    debug!(%phase, "init sequence accepted");

    // Ask for the minimum application version, then echo it back.
    // Whatever the firmware reports is what we acknowledge, which
    // keeps this client compatible with future firmware without code
    // changes.
    info!("negotiating application version");
    client
        .send_request(
            DataPhase::NoDataOrDataIn,
            OperationCode::GET_DEVICE_PROP_VALUE,
            &[DPC_FUJI_APP_VERSION.0 as u32],
        )
        .await?;
    let value_reply = client.recv_response(None).await?;
    if !value_reply.was_successful() {
        return Err(client.reason_as_error(&value_reply));
    }
    let app_version = value_reply
        .params
        .first()
        .copied()
        .ok_or(Error::ProtocolViolation("app version reply carried no value"))?;
    let response = client.recv_response(None).await?;
    if !response.was_successful() {
        return Err(client.reason_as_error(&response));
    }
    client.increment_transaction_id();
    debug!(app_version = format_args!("{app_version:#010x}"), "camera minimum");

    client
        .send_request(
            DataPhase::NoDataOrDataIn,
            OperationCode::SET_DEVICE_PROP_VALUE,
            &[DPC_FUJI_APP_VERSION.0 as u32],
        )
        .await?;
    client
        .send_request(DataPhase::DataOut, OperationCode::SET_DEVICE_PROP_VALUE, &[app_version])
        .await?;
    let response = client.recv_response(None).await?;
    if !response.was_successful() {
        return Err(client.reason_as_error(&response));
    }
    client.increment_transaction_id();
    phase = HandshakePhase::InitiateOpenCapture;
    debug!(%phase, "application version acknowledged");

    // Hand-over: the camera transfers live-view control and opens the
    // event port for the connection that follows.
    info!("initiating open capture");
    client
        .send_request(DataPhase::NoDataOrDataIn, OperationCode::INITIATE_OPEN_CAPTURE, &[])
        .await?;
    let response = client.recv_response(None).await?;
    if !response.was_successful() {
        return Err(client.reason_as_error(&response));
    }
    phase = HandshakePhase::Ready;
    info!(%phase, transaction_id = client.transaction_id(), "handshake complete");
    Ok(())
}
