//! A single framed TCP stream to the responder.
//!
//! Receives come in two modes:
//!
//! - **tagged** — read the 8-byte (length, type) header, check the
//!   type against the expected shape, then read the body.
//! - **untagged** — the Fuji deviation: only a 4-byte length prefix is
//!   present and the caller supplies the expected shape. No type
//!   sniffing happens here; the shape's fixed-field size bounds what
//!   must be present, the length prefix bounds the variable tail.
//!
//! Every read and write runs under a deadline. An elapsed deadline
//! surfaces as [`Error::Timeout`]; the caller decides whether that
//! means a dead transport or (during the Fuji confirmation step) an
//! operator who never pressed OK.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::error::{Error, VendorError};
use crate::packet::{Decode, Encode, PacketType, HEADER_SIZE, LENGTH_SIZE};
use crate::packets::InitFail;

/// Deadline for establishing a TCP connection.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for an ordinary framed read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on a single frame; preview payloads stay well below.
pub const MAX_FRAME_SIZE: usize = 32 * 1024 * 1024;

/// One of the two TCP streams to the responder.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    /// "command/data" or "event", for logging.
    label: &'static str,
    read_timeout: Duration,
}

impl Connection {
    /// Connect to `host:port`.
    pub async fn open(host: &str, port: u16, label: &'static str) -> Result<Self, Error> {
        let addr = format!("{host}:{port}");
        let stream = timeout(DEFAULT_DIAL_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::Timeout(DEFAULT_DIAL_TIMEOUT))??;
        let _ = stream.set_nodelay(true);
        trace!(%addr, label, "connection open");
        Ok(Connection {
            stream,
            label,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Send one framed packet, holding the stream for the duration of
    /// the write.
    pub async fn send<P: Encode>(&mut self, pkt: &P) -> Result<(), Error> {
        let frame = pkt.to_bytes();
        trace!(label = self.label, len = frame.len(), "tx");
        timeout(self.read_timeout, self.stream.write_all(&frame))
            .await
            .map_err(|_| Error::Timeout(self.read_timeout))??;
        Ok(())
    }

    /// Send an already-framed packet (vendor dispatch builds these).
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        trace!(label = self.label, len = frame.len(), "tx");
        timeout(self.read_timeout, self.stream.write_all(frame))
            .await
            .map_err(|_| Error::Timeout(self.read_timeout))??;
        Ok(())
    }

    /// Receive a packet of the expected shape under the default
    /// deadline.
    pub async fn recv<P: Decode>(&mut self) -> Result<P, Error> {
        self.recv_within(self.read_timeout).await
    }

    /// Receive a packet of the expected shape under `deadline`.
    ///
    /// For tagged shapes an incoming InitFail is decoded and surfaced
    /// as [`Error::InitFail`] so init handshakes fail with the
    /// responder's reason rather than a type mismatch.
    pub async fn recv_within<P: Decode>(&mut self, deadline: Duration) -> Result<P, Error> {
        match P::PACKET_TYPE {
            Some(expected) => {
                let (got, body) = self.read_tagged_frame(deadline).await?;
                if got == PacketType::InitFail && expected != PacketType::InitFail {
                    let fail = InitFail::decode(&body)?;
                    return Err(Error::InitFail(VendorError::from_fail_reason(fail.reason)));
                }
                if got != expected {
                    return Err(Error::UnexpectedPacket { expected, got });
                }
                P::decode(&body)
            }
            None => {
                let body = self.recv_untagged_within(deadline).await?;
                P::decode(&body)
            }
        }
    }

    /// Receive one untagged frame body (everything after the length
    /// prefix) under the default deadline.
    pub async fn recv_untagged(&mut self) -> Result<Vec<u8>, Error> {
        self.recv_untagged_within(self.read_timeout).await
    }

    /// Receive one untagged frame body under `deadline`.
    pub async fn recv_untagged_within(&mut self, deadline: Duration) -> Result<Vec<u8>, Error> {
        let length = self.read_length(deadline).await?;
        if length < LENGTH_SIZE {
            return Err(Error::LengthMismatch {
                header: length,
                actual: LENGTH_SIZE,
            });
        }
        let mut body = vec![0u8; length - LENGTH_SIZE];
        self.read_exact_within(&mut body, deadline).await?;
        trace!(label = self.label, len = length, "rx untagged");
        Ok(body)
    }

    /// Receive the next tagged frame whatever its type; used where a
    /// data phase interleaves Data packets with the final response.
    pub(crate) async fn recv_tagged_within(
        &mut self,
        deadline: Duration,
    ) -> Result<(PacketType, Vec<u8>), Error> {
        self.read_tagged_frame(deadline).await
    }

    async fn read_tagged_frame(
        &mut self,
        deadline: Duration,
    ) -> Result<(PacketType, Vec<u8>), Error> {
        let length = self.read_length(deadline).await?;
        if length < HEADER_SIZE {
            return Err(Error::LengthMismatch {
                header: length,
                actual: HEADER_SIZE,
            });
        }
        let mut ty = [0u8; 4];
        self.read_exact_within(&mut ty, deadline).await?;
        let ty = PacketType::try_from(u32::from_le_bytes(ty))?;

        let mut body = vec![0u8; length - HEADER_SIZE];
        self.read_exact_within(&mut body, deadline).await?;
        trace!(label = self.label, %ty, len = length, "rx");
        Ok((ty, body))
    }

    async fn read_length(&mut self, deadline: Duration) -> Result<usize, Error> {
        let mut len = [0u8; 4];
        self.read_exact_within(&mut len, deadline).await?;
        let length = u32::from_le_bytes(len) as usize;
        if length > MAX_FRAME_SIZE {
            return Err(Error::ProtocolViolation("frame exceeds maximum size"));
        }
        Ok(length)
    }

    async fn read_exact_within(&mut self, buf: &mut [u8], deadline: Duration) -> Result<(), Error> {
        match timeout(deadline, self.stream.read_exact(buf)).await {
            Err(_) => Err(Error::Timeout(deadline)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(Error::EofMidFrame)
            }
            Ok(Err(e)) => Err(Error::Transport(e)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Tear the stream down. Errors are ignored; the peer may already
    /// be gone.
    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
        trace!(label = self.label, "connection closed");
    }
}
