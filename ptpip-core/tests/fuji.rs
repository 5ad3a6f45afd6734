//! Integration tests — the full Fuji dial sequence and client
//! operations against a mock responder on localhost.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use ptpip_core::client::Client;
use ptpip_core::error::Error;
use ptpip_core::fuji::{FujiOperationRequest, FujiOperationResponse, PM_FUJI_INIT_SEQUENCE, PV_FUJI};
use ptpip_core::packet::{Decode, Encode, PacketType};
use ptpip_core::packets::{EventPacket, InitEventAck, InitFail};
use ptpip_core::ptp::op::{EventCode, OperationCode, ResponseCode};
use ptpip_core::ptp::property::DevicePropCode;
use ptpip_core::vendor::Vendor;

// ── Mock responder plumbing ──────────────────────────────────────

/// Read one frame: the 4-byte length prefix, then the rest.
async fn read_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut len = [0u8; 4];
    stream.read_exact(&mut len).await.unwrap();
    let total = u32::from_le_bytes(len) as usize;
    let mut body = vec![0u8; total - 4];
    stream.read_exact(&mut body).await.unwrap();
    body
}

/// Read one untagged Fuji operation request.
async fn read_request(stream: &mut TcpStream) -> FujiOperationRequest {
    let body = read_frame(stream).await;
    FujiOperationRequest::decode(&body).unwrap()
}

async fn send<P: Encode>(stream: &mut TcpStream, pkt: &P) {
    stream.write_all(&pkt.to_bytes()).await.unwrap();
}

fn response(code: ResponseCode, tid: u32, params: &[u32]) -> FujiOperationResponse {
    FujiOperationResponse {
        data_phase: 1,
        response_code: code,
        transaction_id: tid,
        params: params.to_vec(),
    }
}

/// Send a length-prefixed raw data frame (no type field).
async fn send_data(stream: &mut TcpStream, payload: &[u8]) {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(4 + payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    stream.write_all(&frame).await.unwrap();
}

/// Accept the Command/Data connection and answer the init command
/// request in the camera's tagged layout.
async fn accept_init_command(listener: &TcpListener) -> TcpStream {
    let (mut stream, _) = listener.accept().await.unwrap();
    let body = read_frame(&mut stream).await;
    // type field, then the Fuji payload: version first.
    assert_eq!(
        u32::from_le_bytes(body[0..4].try_into().unwrap()),
        PacketType::InitCommandRequest as u32
    );
    assert_eq!(u32::from_le_bytes(body[4..8].try_into().unwrap()), PV_FUJI);

    send(
        &mut stream,
        &ptpip_core::packets::InitCommandAck {
            connection_number: 1,
            guid: Uuid::nil(),
            friendly_name: "X-T1".to_string(),
            protocol_version: 0x0001_0000,
        },
    )
    .await;
    stream
}

/// Serve the four init-sequence steps, asserting the dialogue order
/// and transaction ids the firmware expects.
async fn serve_init_sequence(stream: &mut TcpStream) {
    // 1. OpenSession(sid = 1), tid 1.
    let req = read_request(stream).await;
    assert_eq!(req.operation_code, OperationCode::OPEN_SESSION);
    assert_eq!(req.transaction_id, 1);
    assert_eq!(req.params[0], 0x0000_0001);
    send(stream, &response(ResponseCode::OK, 1, &[])).await;

    // 2. SetDevicePropValue(0xDF01) + DataOut(0x00000005), tid 2.
    let req = read_request(stream).await;
    assert_eq!(req.operation_code, OperationCode::SET_DEVICE_PROP_VALUE);
    assert_eq!(req.transaction_id, 2);
    assert_eq!(req.params[0], 0xDF01);
    let data = read_request(stream).await;
    assert_eq!(data.data_phase_info, 2); // DataOut
    assert_eq!(data.params[0], PM_FUJI_INIT_SEQUENCE);
    send(stream, &response(ResponseCode::OK, 2, &[])).await;

    // 3. GetDevicePropValue(0xDF24): the 0x1015 value reply, then the
    // terminating OK; tid 3.
    let req = read_request(stream).await;
    assert_eq!(req.operation_code, OperationCode::GET_DEVICE_PROP_VALUE);
    assert_eq!(req.transaction_id, 3);
    assert_eq!(req.params[0], 0xDF24);
    send(
        stream,
        &response(ResponseCode::FUJI_DEVICE_PROP_VALUE, 3, &[0x0002_0001]),
    )
    .await;
    send(stream, &response(ResponseCode::OK, 3, &[])).await;

    // ...and its echo, tid 4.
    let req = read_request(stream).await;
    assert_eq!(req.operation_code, OperationCode::SET_DEVICE_PROP_VALUE);
    assert_eq!(req.transaction_id, 4);
    assert_eq!(req.params[0], 0xDF24);
    let data = read_request(stream).await;
    assert_eq!(data.data_phase_info, 2);
    assert_eq!(data.params[0], 0x0002_0001, "device minimum must be echoed back");
    send(stream, &response(ResponseCode::OK, 4, &[])).await;

    // 4. InitiateOpenCapture, tid 5, no increment afterwards.
    let req = read_request(stream).await;
    assert_eq!(req.operation_code, OperationCode::INITIATE_OPEN_CAPTURE);
    assert_eq!(req.transaction_id, 5);
    send(stream, &response(ResponseCode::OK, 5, &[])).await;
}

/// Accept the Event connection and acknowledge it.
async fn accept_init_event(listener: &TcpListener) -> TcpStream {
    let (mut stream, _) = listener.accept().await.unwrap();
    let body = read_frame(&mut stream).await;
    assert_eq!(
        u32::from_le_bytes(body[0..4].try_into().unwrap()),
        PacketType::InitEventRequest as u32
    );
    assert_eq!(u32::from_le_bytes(body[4..8].try_into().unwrap()), 1);
    send(&mut stream, &InitEventAck).await;
    stream
}

/// A client wired to ephemeral mock ports.
async fn mock_client() -> (Client, TcpListener, TcpListener) {
    let cmd_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let event_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cmd_port = cmd_listener.local_addr().unwrap().port();
    let event_port = event_listener.local_addr().unwrap().port();

    let mut client =
        Client::new(Vendor::Fuji, "127.0.0.1", Some(cmd_port), "viewfinder", None).unwrap();
    client.set_event_port(event_port);
    (client, cmd_listener, event_listener)
}

// ── Handshake ────────────────────────────────────────────────────

#[tokio::test]
async fn handshake_reaches_ready_with_transaction_id_5() {
    let (mut client, cmd_listener, event_listener) = mock_client().await;

    let camera = tokio::spawn(async move {
        let mut cmd = accept_init_command(&cmd_listener).await;
        serve_init_sequence(&mut cmd).await;
        let event = accept_init_event(&event_listener).await;
        (cmd, event)
    });

    client.dial().await.unwrap();
    assert_eq!(client.transaction_id(), 5);
    assert!(client.session_is_open());
    assert_eq!(client.responder().unwrap().friendly_name, "X-T1");
    assert_eq!(client.responder().unwrap().connection_number, 1);

    camera.await.unwrap();
}

#[tokio::test]
async fn friendly_name_mismatch_is_a_vendor_error() {
    let (mut client, cmd_listener, _event_listener) = mock_client().await;

    let camera = tokio::spawn(async move {
        let mut cmd = accept_init_command(&cmd_listener).await;

        // OpenSession goes through...
        let req = read_request(&mut cmd).await;
        assert_eq!(req.operation_code, OperationCode::OPEN_SESSION);
        send(&mut cmd, &response(ResponseCode::OK, 1, &[])).await;

        // ...but the init-sequence declaration is refused: the stored
        // friendly name does not match, or the camera timed out.
        let _ = read_request(&mut cmd).await;
        let _ = read_request(&mut cmd).await;
        send(&mut cmd, &response(ResponseCode::DEVICE_BUSY, 2, &[])).await;
        cmd
    });

    let err = client.dial().await.unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, Error::Vendor(_)), "got: {err:?}");
    assert!(msg.contains("change"), "guidance missing from: {msg}");
    assert!(msg.contains("retry"), "guidance missing from: {msg}");

    camera.await.unwrap();
}

#[tokio::test]
async fn wrong_protocol_version_yields_init_fail() {
    let cmd_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cmd_port = cmd_listener.local_addr().unwrap().port();

    let camera = tokio::spawn(async move {
        let (mut stream, _) = cmd_listener.accept().await.unwrap();
        let _ = read_frame(&mut stream).await;
        send(&mut stream, &InitFail { reason: 0x0000_201D }).await;
        stream
    });

    let mut client =
        Client::new(Vendor::Fuji, "127.0.0.1", Some(cmd_port), "viewfinder", None).unwrap();
    let err = client.dial().await.unwrap_err();
    assert!(matches!(err, Error::InitFail(_)), "got: {err:?}");
    assert!(err.to_string().contains("protocol version"));

    camera.await.unwrap();
}

#[tokio::test]
async fn session_already_open_counts_as_success() {
    let (mut client, cmd_listener, event_listener) = mock_client().await;

    let camera = tokio::spawn(async move {
        let mut cmd = accept_init_command(&cmd_listener).await;

        // A lingering session from a dropped client.
        let _ = read_request(&mut cmd).await;
        send(&mut cmd, &response(ResponseCode::SESSION_ALREADY_OPEN, 1, &[])).await;

        // The remaining steps proceed normally.
        let _ = read_request(&mut cmd).await;
        let _ = read_request(&mut cmd).await;
        send(&mut cmd, &response(ResponseCode::OK, 2, &[])).await;
        let _ = read_request(&mut cmd).await;
        send(
            &mut cmd,
            &response(ResponseCode::FUJI_DEVICE_PROP_VALUE, 3, &[0x0002_0001]),
        )
        .await;
        send(&mut cmd, &response(ResponseCode::OK, 3, &[])).await;
        let _ = read_request(&mut cmd).await;
        let _ = read_request(&mut cmd).await;
        send(&mut cmd, &response(ResponseCode::OK, 4, &[])).await;
        let _ = read_request(&mut cmd).await;
        send(&mut cmd, &response(ResponseCode::OK, 5, &[])).await;

        let event = accept_init_event(&event_listener).await;
        (cmd, event)
    });

    client.dial().await.unwrap();
    assert_eq!(client.transaction_id(), 5);
    camera.await.unwrap();
}

// ── Operations after the handshake ───────────────────────────────

/// Dial through a full mock handshake and return the live streams.
async fn dialled_client() -> (Client, TcpStream, TcpStream) {
    let (mut client, cmd_listener, event_listener) = mock_client().await;
    let camera = tokio::spawn(async move {
        let mut cmd = accept_init_command(&cmd_listener).await;
        serve_init_sequence(&mut cmd).await;
        let event = accept_init_event(&event_listener).await;
        (cmd, event)
    });
    client.dial().await.unwrap();
    let (cmd, event) = camera.await.unwrap();
    (client, cmd, event)
}

#[tokio::test]
async fn get_property_value_consumes_value_and_response() {
    let (mut client, mut cmd, _event) = dialled_client().await;

    let camera = tokio::spawn(async move {
        let req = read_request(&mut cmd).await;
        assert_eq!(req.operation_code, OperationCode::GET_DEVICE_PROP_VALUE);
        assert_eq!(req.transaction_id, 5);
        assert_eq!(req.params[0], 0x5007);
        send(
            &mut cmd,
            &response(ResponseCode::FUJI_DEVICE_PROP_VALUE, 5, &[560]),
        )
        .await;
        send(&mut cmd, &response(ResponseCode::OK, 5, &[])).await;
        cmd
    });

    let value = client
        .get_device_property_value(DevicePropCode::F_NUMBER)
        .await
        .unwrap();
    assert_eq!(value, 560);
    // One completed round-trip, one increment.
    assert_eq!(client.transaction_id(), 6);
    // The observation landed in the cache.
    assert_eq!(
        client.cached_properties()[&DevicePropCode::F_NUMBER].value,
        560
    );

    camera.await.unwrap();
}

#[tokio::test]
async fn set_property_value_two_part_write() {
    let (mut client, mut cmd, _event) = dialled_client().await;

    let camera = tokio::spawn(async move {
        let req = read_request(&mut cmd).await;
        assert_eq!(req.operation_code, OperationCode::SET_DEVICE_PROP_VALUE);
        assert_eq!(req.params[0], 0x5007);
        let data = read_request(&mut cmd).await;
        assert_eq!(data.data_phase_info, 2);
        assert_eq!(data.params[0], 800);
        send(&mut cmd, &response(ResponseCode::OK, 5, &[])).await;
        cmd
    });

    client
        .set_device_property(DevicePropCode::F_NUMBER, 800)
        .await
        .unwrap();
    assert_eq!(client.transaction_id(), 6);
    assert_eq!(
        client.cached_properties()[&DevicePropCode::F_NUMBER].value,
        800
    );

    camera.await.unwrap();
}

#[tokio::test]
async fn capture_collects_data_packets_before_response() {
    let (mut client, mut cmd, _event) = dialled_client().await;

    let camera = tokio::spawn(async move {
        let req = read_request(&mut cmd).await;
        assert_eq!(req.operation_code, OperationCode::INITIATE_CAPTURE);
        // Two chunks of preview, then the response.
        send_data(&mut cmd, &[0xFF, 0xD8, 0xFF, 0xE1, 0x10, 0x20, 0x30, 0x40]).await;
        send_data(&mut cmd, &[0x50, 0x60, 0xFF, 0xD9]).await;
        send(&mut cmd, &response(ResponseCode::OK, 5, &[])).await;
        cmd
    });

    let preview = client.initiate_capture().await.unwrap();
    assert_eq!(
        preview,
        vec![0xFF, 0xD8, 0xFF, 0xE1, 0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0xFF, 0xD9]
    );
    assert_eq!(client.transaction_id(), 6);

    camera.await.unwrap();
}

#[tokio::test]
async fn raw_operation_returns_data_packets() {
    let (mut client, mut cmd, _event) = dialled_client().await;

    let camera = tokio::spawn(async move {
        let req = read_request(&mut cmd).await;
        assert_eq!(req.operation_code, OperationCode(0x902B));
        assert_eq!(req.params[0], 0xDEAD);
        send_data(&mut cmd, &[0x01, 0x02, 0x03, 0x04]).await;
        send(&mut cmd, &response(ResponseCode::OK, 5, &[])).await;
        cmd
    });

    let packets = client
        .operation_request_raw(OperationCode(0x902B), &[0xDEAD])
        .await
        .unwrap();
    assert_eq!(packets, vec![vec![0x01, 0x02, 0x03, 0x04]]);

    camera.await.unwrap();
}

#[tokio::test]
async fn failed_operation_still_advances_transaction_id() {
    let (mut client, mut cmd, _event) = dialled_client().await;

    let camera = tokio::spawn(async move {
        let _ = read_request(&mut cmd).await;
        send(&mut cmd, &response(ResponseCode::DEVICE_PROP_NOT_SUPPORTED, 5, &[])).await;
        let _ = read_request(&mut cmd).await;
        send(
            &mut cmd,
            &response(ResponseCode::FUJI_DEVICE_PROP_VALUE, 6, &[280]),
        )
        .await;
        send(&mut cmd, &response(ResponseCode::OK, 6, &[])).await;
        cmd
    });

    let err = client
        .get_device_property_value(DevicePropCode(0xD123))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::OperationFailed { .. }));
    assert!(err.to_string().contains("DevicePropNotSupported"));
    // The id advanced despite the failure, and the next operation
    // uses the next id.
    assert_eq!(client.transaction_id(), 6);

    let value = client
        .get_device_property_value(DevicePropCode::F_NUMBER)
        .await
        .unwrap();
    assert_eq!(value, 280);
    assert_eq!(client.transaction_id(), 7);

    camera.await.unwrap();
}

#[tokio::test]
async fn device_state_parses_prop_descs_and_fills_cache() {
    let (mut client, mut cmd, _event) = dialled_client().await;

    let camera = tokio::spawn(async move {
        let req = read_request(&mut cmd).await;
        assert_eq!(req.operation_code, OperationCode::FUJI_GET_DEVICE_INFO);

        // count = 2, then two UINT16 descriptions with no form.
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u32.to_le_bytes());
        for (code, current) in [(0x5007u16, 560u16), (0x500Eu16, 1u16)] {
            payload.extend_from_slice(&code.to_le_bytes());
            payload.extend_from_slice(&0x0004u16.to_le_bytes());
            payload.push(0x01);
            payload.extend_from_slice(&current.to_le_bytes()); // factory default
            payload.extend_from_slice(&current.to_le_bytes()); // current
            payload.push(0x00);
        }
        send_data(&mut cmd, &payload).await;
        send(&mut cmd, &response(ResponseCode::OK, 5, &[])).await;
        cmd
    });

    let descs = client.get_device_state().await.unwrap();
    assert_eq!(descs.len(), 2);
    assert_eq!(descs[0].code, DevicePropCode::F_NUMBER);
    assert_eq!(
        client.cached_properties()[&DevicePropCode::F_NUMBER].value,
        560
    );
    assert_eq!(
        client.cached_properties()[&DevicePropCode::EXPOSURE_PROGRAM_MODE].value,
        1
    );

    camera.await.unwrap();
}

#[tokio::test]
async fn event_connection_delivers_property_changes() {
    let (mut client, _cmd, mut event) = dialled_client().await;

    // Seed the cache, then let the camera announce a change.
    assert!(client.cached_properties().is_empty());

    let camera = tokio::spawn(async move {
        send(
            &mut event,
            &EventPacket {
                event_code: EventCode::DEVICE_PROP_CHANGED,
                transaction_id: 0,
                params: vec![0x5007],
            },
        )
        .await;
        event
    });

    let packet = client.recv_event().await.unwrap();
    assert_eq!(packet.event_code, EventCode::DEVICE_PROP_CHANGED);
    assert_eq!(packet.params, vec![0x5007]);

    camera.await.unwrap();
}

#[tokio::test]
async fn close_sends_close_session_and_tears_down() {
    let (mut client, mut cmd, _event) = dialled_client().await;

    let camera = tokio::spawn(async move {
        let req = read_request(&mut cmd).await;
        assert_eq!(req.operation_code, OperationCode::CLOSE_SESSION);
        send(&mut cmd, &response(ResponseCode::OK, 5, &[])).await;
        // The client should now close both streams.
        let mut probe = [0u8; 1];
        assert_eq!(cmd.read(&mut probe).await.unwrap(), 0);
    });

    client.close().await;
    assert!(!client.session_is_open());

    camera.await.unwrap();
}
