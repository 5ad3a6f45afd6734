//! The PTP/IP session owner.
//!
//! A [`Client`] holds both TCP connections, the responder identity,
//! the session id and the transaction counter. It is the
//! serialization point: every operation takes `&mut self`, so no two
//! operations can be in flight on the Command/Data connection at
//! once. The Event connection is receive-only and independent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Error;
use crate::fuji::{self, FujiOperationRequest, FujiOperationResponse};
use crate::net::Connection;
use crate::packet::{Decode, PacketType};
use crate::packets::{
    DataPhase, EventPacket, InitCommandAck, InitEventAck, InitEventRequest, OperationRequest,
    OperationResponse,
};
use crate::ptp::device::DeviceInfo;
use crate::ptp::op::{EventCode, OperationCode, ResponseCode};
use crate::ptp::property::{DevicePropCode, DevicePropDesc};
use crate::ptp::schema;
use crate::vendor::Vendor;

/// Value of the transaction counter when a session opens.
pub const INITIAL_TRANSACTION_ID: u32 = 0x0000_0001;

/// The session id this initiator opens.
pub const SESSION_ID: u32 = 0x0000_0001;

/// How long the camera is given to collect its operator's confirmation
/// during the vendor init sequence.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

// ── Session bookkeeping ──────────────────────────────────────────

/// Per-session state: ids and openness.
#[derive(Debug, Clone, Copy, Default)]
struct Session {
    session_id: u32,
    transaction_id: u32,
    open: bool,
}

/// What the responder told us about itself during init.
#[derive(Debug, Clone)]
pub struct ResponderIdentity {
    pub connection_number: u32,
    pub guid: Uuid,
    pub friendly_name: String,
    pub protocol_version: u32,
}

/// A cached property value with its observation time. Written by the
/// session on every get/set; read by any observer.
#[derive(Debug, Clone, Copy)]
pub struct CachedValue {
    pub value: u32,
    pub at: Instant,
}

/// A completed operation round-trip: raw data payloads, any parameters
/// carried by a value-bearing reply, and the terminating response.
#[derive(Debug)]
pub struct Exchange {
    pub data: Vec<Vec<u8>>,
    pub value_params: Vec<u32>,
    pub response: Response,
}

impl Exchange {
    /// All data payloads, concatenated in arrival order.
    pub fn data_concat(&self) -> Vec<u8> {
        self.data.concat()
    }
}

/// A vendor-normalized operation response.
#[derive(Debug, Clone)]
pub struct Response {
    pub code: ResponseCode,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl Response {
    pub fn was_successful(&self) -> bool {
        self.code.is_success()
    }
}

impl From<FujiOperationResponse> for Response {
    fn from(r: FujiOperationResponse) -> Self {
        Response {
            code: r.response_code,
            transaction_id: r.transaction_id,
            params: r.params,
        }
    }
}

impl From<OperationResponse> for Response {
    fn from(r: OperationResponse) -> Self {
        Response {
            code: r.response_code,
            transaction_id: r.transaction_id,
            params: r.params,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────

/// A PTP/IP initiator bound to one responder.
pub struct Client {
    vendor: Vendor,
    host: String,
    port: u16,
    event_port: u16,
    friendly_name: String,
    guid: Uuid,
    cmd: Option<Connection>,
    event: Option<Connection>,
    session: Session,
    responder: Option<ResponderIdentity>,
    cache: HashMap<DevicePropCode, CachedValue>,
}

impl Client {
    /// Bind a client to `host:port`. A missing GUID is replaced with a
    /// fresh random one; a missing port with the vendor default.
    pub fn new(
        vendor: Vendor,
        host: &str,
        port: Option<u16>,
        friendly_name: &str,
        guid: Option<&str>,
    ) -> Result<Self, Error> {
        if host.is_empty() {
            return Err(Error::InvalidHost("empty host".to_string()));
        }
        let guid = match guid {
            Some(s) => Uuid::parse_str(s).map_err(|_| Error::InvalidGuid(s.to_string()))?,
            None => Uuid::new_v4(),
        };
        let port = port.unwrap_or_else(|| vendor.default_cmd_port());
        Ok(Client {
            vendor,
            host: host.to_string(),
            port,
            event_port: vendor.default_event_port(port),
            friendly_name: friendly_name.to_string(),
            guid,
            cmd: None,
            event: None,
            session: Session::default(),
            responder: None,
            cache: HashMap::new(),
        })
    }

    /// Override the Event port (the vendor default is almost always
    /// right; tests and port-forwarded setups are the exception).
    pub fn set_event_port(&mut self, port: u16) {
        self.event_port = port;
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn initiator_friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn initiator_guid(&self) -> Uuid {
        self.guid
    }

    /// The responder identity, once dialled.
    pub fn responder(&self) -> Option<&ResponderIdentity> {
        self.responder.as_ref()
    }

    /// The transaction id the *next* operation will use.
    pub fn transaction_id(&self) -> u32 {
        self.session.transaction_id
    }

    pub fn session_is_open(&self) -> bool {
        self.session.open
    }

    /// The current session id; meaningful only while the session is
    /// open.
    pub fn session_id(&self) -> u32 {
        self.session.session_id
    }

    /// Property values observed by this session, by code.
    pub fn cached_properties(&self) -> &HashMap<DevicePropCode, CachedValue> {
        &self.cache
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Open both connections and run the vendor's initialisation.
    ///
    /// Command/Data first: InitCommandRequest (vendor layout) against
    /// the responder, whose ack assigns the connection number. The
    /// vendor post-init sequence runs next, and the Event connection
    /// is established once the vendor allows it — Fuji opens its event
    /// port only after InitiateOpenCapture.
    pub async fn dial(&mut self) -> Result<(), Error> {
        let mut cmd = Connection::open(&self.host, self.port, "command/data").await?;
        info!(host = %self.host, port = self.port, "initialising command/data connection");

        let request = self.vendor.init_command_request(self.guid, &self.friendly_name);
        cmd.send_frame(&request).await?;
        let ack: InitCommandAck = cmd.recv().await?;
        debug!(
            connection_number = ack.connection_number,
            responder = %ack.friendly_name,
            "command/data connection acknowledged"
        );
        self.responder = Some(ResponderIdentity {
            connection_number: ack.connection_number,
            guid: ack.guid,
            friendly_name: ack.friendly_name,
            protocol_version: ack.protocol_version,
        });
        self.cmd = Some(cmd);

        if self.vendor.event_after_post_init() {
            self.post_init().await?;
            self.init_event_connection().await?;
        } else {
            self.init_event_connection().await?;
            self.post_init().await?;
        }

        info!("responder ready");
        Ok(())
    }

    async fn post_init(&mut self) -> Result<(), Error> {
        match self.vendor {
            Vendor::Fuji => fuji::init_sequence(self).await,
            Vendor::Generic => self.open_session().await,
        }
    }

    async fn init_event_connection(&mut self) -> Result<(), Error> {
        let number = self
            .responder
            .as_ref()
            .map(|r| r.connection_number)
            .ok_or(Error::ProtocolViolation("no connection number before event init"))?;
        let mut event = Connection::open(&self.host, self.event_port, "event").await?;
        event
            .send(&InitEventRequest {
                connection_number: number,
            })
            .await?;
        let _ack: InitEventAck = event.recv().await?;
        debug!(port = self.event_port, "event connection acknowledged");
        self.event = Some(event);
        Ok(())
    }

    /// Open the session the standard way (the Fuji path does this
    /// inside its init sequence with the vendor packet shape).
    async fn open_session(&mut self) -> Result<(), Error> {
        self.session.transaction_id = INITIAL_TRANSACTION_ID;
        self.send_request(DataPhase::NoDataOrDataIn, OperationCode::OPEN_SESSION, &[SESSION_ID])
            .await?;
        let response = self.recv_response(None).await?;
        if !response.was_successful() {
            return Err(self.reason_as_error(&response));
        }
        self.session.session_id = SESSION_ID;
        self.session.open = true;
        self.increment_transaction_id();
        Ok(())
    }

    /// Close the session if one is open and tear down both sockets.
    /// Teardown is best-effort; the peer may already be gone.
    pub async fn close(&mut self) {
        if self.session.open && self.cmd.is_some() {
            let _ = self
                .transact(OperationCode::CLOSE_SESSION, &[], DataFlow::None, None)
                .await;
            self.session.open = false;
        }
        if let Some(mut cmd) = self.cmd.take() {
            cmd.shutdown().await;
        }
        if let Some(mut event) = self.event.take() {
            event.shutdown().await;
        }
    }

    // ── Session plumbing ─────────────────────────────────────────

    pub(crate) fn mark_session_open(&mut self) {
        self.session.session_id = SESSION_ID;
        self.session.open = true;
    }

    pub(crate) fn reset_transaction_id(&mut self) {
        self.session.transaction_id = INITIAL_TRANSACTION_ID;
    }

    /// Advance the counter; called exactly once per completed
    /// round-trip, after the terminating response is consumed.
    pub(crate) fn increment_transaction_id(&mut self) {
        self.session.transaction_id = self.session.transaction_id.wrapping_add(1);
    }

    fn cmd_mut(&mut self) -> Result<&mut Connection, Error> {
        self.cmd
            .as_mut()
            .ok_or(Error::ProtocolViolation("client is not connected"))
    }

    /// Send one operation request in the vendor's framing, using the
    /// current transaction id.
    pub(crate) async fn send_request(
        &mut self,
        phase: DataPhase,
        opcode: OperationCode,
        params: &[u32],
    ) -> Result<(), Error> {
        let tid = self.session.transaction_id;
        let untagged = self.vendor.untagged_operations();
        let cmd = self.cmd_mut()?;
        if untagged {
            cmd.send(&FujiOperationRequest::new(phase, opcode, tid, params))
                .await
        } else {
            cmd.send(&OperationRequest::new(phase, opcode, tid, params))
                .await
        }
    }

    /// Receive the next operation response in the vendor's framing.
    pub(crate) async fn recv_response(
        &mut self,
        deadline: Option<Duration>,
    ) -> Result<Response, Error> {
        let untagged = self.vendor.untagged_operations();
        let cmd = self.cmd_mut()?;
        let response = if untagged {
            match deadline {
                Some(d) => cmd.recv_within::<FujiOperationResponse>(d).await?.into(),
                None => cmd.recv::<FujiOperationResponse>().await?.into(),
            }
        } else {
            match deadline {
                Some(d) => cmd.recv_within::<OperationResponse>(d).await?.into(),
                None => cmd.recv::<OperationResponse>().await?.into(),
            }
        };
        Ok(response)
    }

    /// Map a failed response to its error, routing the vendor fail
    /// codes through the vendor taxonomy.
    pub(crate) fn reason_as_error(&self, response: &Response) -> Error {
        match (self.vendor, response.code) {
            (Vendor::Fuji, ResponseCode::DEVICE_BUSY) => {
                Error::Vendor(crate::error::VendorError::FujiDeviceBusy {
                    code: fuji::FR_FUJI_DEVICE_BUSY,
                })
            }
            (Vendor::Fuji, ResponseCode::INVALID_PARAMETER) => {
                Error::Vendor(crate::error::VendorError::FujiInvalidParameter {
                    code: fuji::FR_FUJI_INVALID_PARAMETER,
                })
            }
            (_, code) => Error::OperationFailed {
                code,
                name: code.name().to_string(),
            },
        }
    }

    // ── The operation driver ─────────────────────────────────────

    /// Run one complete operation: request, optional data-out packet,
    /// then consume incoming packets until the terminating response.
    /// Increments the transaction id exactly once, whatever the
    /// outcome, once the response has been consumed.
    async fn transact(
        &mut self,
        opcode: OperationCode,
        params: &[u32],
        flow: DataFlow,
        deadline: Option<Duration>,
    ) -> Result<Exchange, Error> {
        self.send_request(DataPhase::NoDataOrDataIn, opcode, params).await?;
        if let DataFlow::Out(value) = flow {
            // Two-part write: the value travels in a second request
            // packet flagged DataOut, same transaction id.
            self.send_request(DataPhase::DataOut, opcode, &[value]).await?;
        }

        let result = if self.vendor.untagged_operations() {
            self.collect_untagged(deadline).await
        } else {
            self.collect_tagged(deadline).await
        };
        self.increment_transaction_id();

        let exchange = result?;
        if !exchange.response.was_successful() {
            return Err(self.reason_as_error(&exchange.response));
        }
        Ok(exchange)
    }

    /// Fuji receive loop. Packets carry no type tag, so each frame is
    /// classified against the one shape a response can have *for the
    /// current transaction*: the known fixed prefix (phase, code, tid)
    /// with this transaction's id. A `0x1015` reply carries the
    /// requested value in its parameters and precedes the terminating
    /// response; anything that is not a response for this transaction
    /// is a raw data payload.
    async fn collect_untagged(&mut self, deadline: Option<Duration>) -> Result<Exchange, Error> {
        let tid = self.session.transaction_id;
        let mut data = Vec::new();
        let mut value_params = Vec::new();
        loop {
            let body = {
                let cmd = self.cmd_mut()?;
                match deadline {
                    Some(d) => cmd.recv_untagged_within(d).await?,
                    None => cmd.recv_untagged().await?,
                }
            };
            if is_response_shape(&body, tid) {
                let response = FujiOperationResponse::decode(&body)?;
                if response.response_code == ResponseCode::FUJI_DEVICE_PROP_VALUE {
                    value_params = response.params;
                    continue;
                }
                return Ok(Exchange {
                    data,
                    value_params,
                    response: response.into(),
                });
            }
            data.push(body);
        }
    }

    /// Standard receive loop: typed Data/EndData packets, then the
    /// OperationResponse.
    async fn collect_tagged(&mut self, deadline: Option<Duration>) -> Result<Exchange, Error> {
        let mut data = Vec::new();
        loop {
            let (ty, body) = {
                let cmd = self.cmd_mut()?;
                cmd.recv_tagged_within(deadline.unwrap_or(crate::net::DEFAULT_READ_TIMEOUT))
                    .await?
            };
            match ty {
                PacketType::StartData => {}
                PacketType::Data => {
                    data.push(crate::packets::DataPacket::decode(&body)?.payload);
                }
                PacketType::EndData => {
                    data.push(crate::packets::EndData::decode(&body)?.payload);
                }
                PacketType::OperationResponse => {
                    let response = OperationResponse::decode(&body)?;
                    return Ok(Exchange {
                        data,
                        value_params: response.params.clone(),
                        response: response.into(),
                    });
                }
                got => {
                    return Err(Error::UnexpectedPacket {
                        expected: PacketType::OperationResponse,
                        got,
                    })
                }
            }
        }
    }

    // ── Operations ───────────────────────────────────────────────

    /// The standard DeviceInfo dataset.
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo, Error> {
        let exchange = self
            .transact(OperationCode::GET_DEVICE_INFO, &[], DataFlow::In, None)
            .await?;
        DeviceInfo::decode(&exchange.data_concat())
    }

    /// The vendor device-state dataset: every property description the
    /// responder currently exposes. Freshly observed current values
    /// land in the property cache.
    pub async fn get_device_state(&mut self) -> Result<Vec<DevicePropDesc>, Error> {
        let exchange = self
            .transact(OperationCode::FUJI_GET_DEVICE_INFO, &[], DataFlow::In, None)
            .await?;
        let concat = exchange.data_concat();
        let mut body = concat.as_slice();
        crate::codec::ensure(&body, "device state", 4)?;
        let count = u32::from_le_bytes(body[..4].try_into().unwrap()) as usize;
        body = &body[4..];
        let mut descs = Vec::with_capacity(count);
        for _ in 0..count {
            descs.push(DevicePropDesc::decode(&mut body)?);
        }
        for desc in &descs {
            if let Some(v) = desc.current.as_i64() {
                self.cache_store(desc.code, v as u32);
            }
        }
        Ok(descs)
    }

    /// Read one property value.
    pub async fn get_device_property_value(
        &mut self,
        code: DevicePropCode,
    ) -> Result<u32, Error> {
        let exchange = self
            .transact(
                OperationCode::GET_DEVICE_PROP_VALUE,
                &[code.0 as u32],
                DataFlow::In,
                None,
            )
            .await?;
        let value = exchange
            .value_params
            .first()
            .copied()
            .or_else(|| {
                exchange
                    .data
                    .first()
                    .filter(|d| d.len() >= 4)
                    .map(|d| u32::from_le_bytes(d[..4].try_into().unwrap()))
            })
            .ok_or(Error::ProtocolViolation("response carried no property value"))?;
        self.cache_store(code, value);
        Ok(value)
    }

    /// Read one property description dataset.
    pub async fn get_device_property_desc(
        &mut self,
        code: DevicePropCode,
    ) -> Result<DevicePropDesc, Error> {
        let exchange = self
            .transact(
                OperationCode::GET_DEVICE_PROP_DESC,
                &[code.0 as u32],
                DataFlow::In,
                None,
            )
            .await?;
        let concat = exchange.data_concat();
        let mut body = concat.as_slice();
        let desc = DevicePropDesc::decode(&mut body)?;
        if let Some(v) = desc.current.as_i64() {
            self.cache_store(desc.code, v as u32);
        }
        Ok(desc)
    }

    /// Write one property value, after validating it against the
    /// static schema.
    pub async fn set_device_property(
        &mut self,
        code: DevicePropCode,
        value: u32,
    ) -> Result<(), Error> {
        schema::check_set(code, value)?;
        self.transact(
            OperationCode::SET_DEVICE_PROP_VALUE,
            &[code.0 as u32],
            DataFlow::Out(value),
            None,
        )
        .await?;
        self.cache_store(code, value);
        Ok(())
    }

    /// Fire a raw operation and hand back every data payload the
    /// responder sent before its response.
    pub async fn operation_request_raw(
        &mut self,
        opcode: OperationCode,
        params: &[u32],
    ) -> Result<Vec<Vec<u8>>, Error> {
        let exchange = self.transact(opcode, params, DataFlow::In, None).await?;
        debug!(
            %opcode,
            packets = exchange.data.len(),
            code = %exchange.response.code,
            "raw operation complete"
        );
        Ok(exchange.data)
    }

    /// Trigger a capture; returns the preview bytes the responder
    /// pushes on the Command/Data connection.
    pub async fn initiate_capture(&mut self) -> Result<Vec<u8>, Error> {
        let exchange = self
            .transact(OperationCode::INITIATE_CAPTURE, &[], DataFlow::In, None)
            .await?;
        Ok(exchange.data_concat())
    }

    // ── Events ───────────────────────────────────────────────────

    /// Receive the next packet from the Event connection. Unsolicited
    /// property-change events invalidate the cache for that code: the
    /// device's announcement is authoritative, the stale observation
    /// is not.
    pub async fn recv_event(&mut self) -> Result<EventPacket, Error> {
        let event = self
            .event
            .as_mut()
            .ok_or(Error::ProtocolViolation("event connection not established"))?;
        let packet: EventPacket = event.recv().await?;
        if packet.event_code == EventCode::DEVICE_PROP_CHANGED {
            if let Some(code) = packet.params.first() {
                self.cache.remove(&DevicePropCode(*code as u16));
            }
        }
        Ok(packet)
    }

    fn cache_store(&mut self, code: DevicePropCode, value: u32) {
        self.cache.insert(
            code,
            CachedValue {
                value,
                at: Instant::now(),
            },
        );
    }
}

impl std::fmt::Display for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Where an operation's data phase points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFlow {
    /// No data phase expected or offered.
    None,
    /// The responder may push data packets before its response.
    In,
    /// A single 32-bit value travels to the responder.
    Out(u32),
}

/// Whether an untagged frame is the response to transaction `tid`.
///
/// The fixed prefix of a Fuji response is (phase: u16, code: u16,
/// tid: u32); a frame counts as a response only when the phase is a
/// legal announcement, the code sits in the response space and the
/// transaction id is the current one. Data payloads (JPEG previews,
/// datasets) fail at least one of these checks.
fn is_response_shape(body: &[u8], tid: u32) -> bool {
    if body.len() < FujiOperationResponse::FIXED_FIELD_SIZE || body.len() % 4 != 0 {
        return false;
    }
    let phase = u16::from_le_bytes(body[0..2].try_into().unwrap());
    let code = u16::from_le_bytes(body[2..4].try_into().unwrap());
    let frame_tid = u32::from_le_bytes(body[4..8].try_into().unwrap());
    phase <= DataPhase::DataOut as u32 as u16
        && frame_tid == tid
        && (code == ResponseCode::FUJI_DEVICE_PROP_VALUE.0 || (0x2000..=0x2FFF).contains(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_defaults() {
        let c = Client::new(Vendor::Fuji, "192.168.0.1", None, "viewfinder", None).unwrap();
        assert_eq!(c.to_string(), "192.168.0.1:55740");
        assert_eq!(c.transaction_id(), 0);
        assert!(!c.session_is_open());
        assert_eq!(c.initiator_friendly_name(), "viewfinder");
    }

    #[test]
    fn new_client_parses_guid() {
        let c = Client::new(
            Vendor::Fuji,
            "camera.local",
            Some(55740),
            "",
            Some("ada5485d-87b2-7f0b-d3d5-ded00278a8c0"),
        )
        .unwrap();
        assert_eq!(
            c.initiator_guid().to_string(),
            "ada5485d-87b2-7f0b-d3d5-ded00278a8c0"
        );
    }

    #[test]
    fn new_client_rejects_bad_input() {
        assert!(matches!(
            Client::new(Vendor::Fuji, "", None, "", None),
            Err(Error::InvalidHost(_))
        ));
        assert!(matches!(
            Client::new(Vendor::Fuji, "h", None, "", Some("not-a-guid")),
            Err(Error::InvalidGuid(_))
        ));
    }

    #[test]
    fn random_guids_differ() {
        let a = Client::new(Vendor::Fuji, "h", None, "", None).unwrap();
        let b = Client::new(Vendor::Fuji, "h", None, "", None).unwrap();
        assert_ne!(a.initiator_guid(), b.initiator_guid());
    }

    #[test]
    fn response_shape_classification() {
        // A genuine OK response for tid 3.
        let ok = FujiOperationResponse {
            data_phase: 1,
            response_code: ResponseCode::OK,
            transaction_id: 3,
            params: vec![],
        };
        let frame = crate::packet::Encode::to_bytes(&ok);
        assert!(is_response_shape(&frame[4..], 3));
        // Same bytes, wrong transaction: not this exchange's response.
        assert!(!is_response_shape(&frame[4..], 4));

        // A value-bearing 0x1015 reply.
        let val = FujiOperationResponse {
            data_phase: 2,
            response_code: ResponseCode::FUJI_DEVICE_PROP_VALUE,
            transaction_id: 3,
            params: vec![0x0002_0001],
        };
        let frame = crate::packet::Encode::to_bytes(&val);
        assert!(is_response_shape(&frame[4..], 3));

        // JPEG-ish data payload: classified as data.
        let jpeg = [0xFFu8, 0xD8, 0xFF, 0xE1, 0x00, 0x10, 0x4A, 0x46];
        assert!(!is_response_shape(&jpeg, 3));
        // Short and misaligned frames are data too.
        assert!(!is_response_shape(&[0x01, 0x00], 3));
        assert!(!is_response_shape(&[0u8; 9], 3));
    }
}
