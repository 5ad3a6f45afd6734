//! Domain-specific error types for the PTP/IP initiator.
//!
//! All fallible operations return `Result<T, Error>`.
//! No panics on invalid input — every error is typed and recoverable.

use std::time::Duration;
use thiserror::Error;

use crate::packet::PacketType;
use crate::ptp::op::ResponseCode;

/// The canonical error type for the PTP/IP client.
#[derive(Debug, Error)]
pub enum Error {
    // ── Config Errors ────────────────────────────────────────────
    /// The host string could not be resolved to an address.
    #[error("invalid host: {0}")]
    InvalidHost(String),

    /// A GUID string did not parse as a canonical RFC 4122 identifier.
    #[error("invalid GUID: {0}")]
    InvalidGuid(String),

    /// An unusable configuration value.
    #[error("invalid config: {0}")]
    Config(String),

    // ── Transport Errors ─────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The peer closed the stream in the middle of a frame.
    #[error("connection closed mid-frame")]
    EofMidFrame,

    /// A socket read or write exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The 30-second wait for on-camera confirmation elapsed.
    #[error("timed out waiting for confirmation on the camera")]
    UserTimeout,

    // ── Protocol Errors ──────────────────────────────────────────
    /// The length prefix disagrees with the bytes on the wire.
    #[error("frame length mismatch: header says {header}, read {actual}")]
    LengthMismatch { header: usize, actual: usize },

    /// A frame was shorter than the fixed fields of the expected shape.
    #[error("truncated {what}: need {need} bytes, have {have}")]
    Truncated {
        what: &'static str,
        need: usize,
        have: usize,
    },

    /// A numeric value did not map to any known packet type.
    #[error("unknown packet type: {0:#010x}")]
    UnknownPacketType(u32),

    /// A packet of an unexpected type arrived.
    #[error("unexpected packet: expected {expected}, got {got}")]
    UnexpectedPacket {
        expected: PacketType,
        got: PacketType,
    },

    /// A string field was missing its UTF-16 null terminator.
    #[error("unterminated UTF-16 string")]
    UnterminatedString,

    /// A packet violated protocol rules.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    // ── Operation Errors ─────────────────────────────────────────
    /// The responder rejected an operation.
    #[error("operation failed: {name} ({code})")]
    OperationFailed { code: ResponseCode, name: String },

    /// The responder refused the init handshake.
    #[error("initialisation refused: {0}")]
    InitFail(#[source] VendorError),

    /// A vendor-specific failure with user-actionable guidance.
    #[error(transparent)]
    Vendor(#[from] VendorError),

    // ── Schema Errors ────────────────────────────────────────────
    /// The property is not in the schema and is not a bare hex code.
    #[error("unknown device property: {0}")]
    UnknownProperty(String),

    /// A value's width does not match the property's declared data type.
    #[error("value width mismatch for {property}: declared {declared} bytes, got {got}")]
    ValueWidthMismatch {
        property: &'static str,
        declared: usize,
        got: usize,
    },

    /// An attempt to write a read-only property.
    #[error("device property {0} is read-only")]
    ReadOnlyProperty(&'static str),

    /// A data-type code outside the PTP standard set.
    #[error("unknown data type code: {0:#06x}")]
    UnknownDataType(u16),
}

// ── VendorError ──────────────────────────────────────────────────

/// Vendor fail reasons, with the guidance the camera UI expects the
/// operator to follow.
#[derive(Debug, Error)]
pub enum VendorError {
    /// `FR_Fuji_DeviceBusy` — the stored friendly name does not match,
    /// or the camera timed out waiting for the connection.
    #[error(
        "device busy ({code:#010x}): set the camera to 'change' to accept a \
         new client name, or to 'retry' to wait for a new connection"
    )]
    FujiDeviceBusy { code: u32 },

    /// `FR_Fuji_InvalidParameter` — wrong protocol version in the
    /// InitCommandRequest.
    #[error("invalid parameter ({code:#010x}): the camera rejected the protocol version")]
    FujiInvalidParameter { code: u32 },

    /// A fail reason outside the known vendor set.
    #[error("vendor failure {code:#010x}")]
    Unknown { code: u32 },
}

impl VendorError {
    /// Classify a raw 32-bit fail reason.
    pub fn from_fail_reason(code: u32) -> Self {
        match code {
            crate::fuji::FR_FUJI_DEVICE_BUSY => VendorError::FujiDeviceBusy { code },
            crate::fuji::FR_FUJI_INVALID_PARAMETER => VendorError::FujiInvalidParameter { code },
            _ => VendorError::Unknown { code },
        }
    }

    /// The raw fail reason.
    pub fn code(&self) -> u32 {
        match self {
            VendorError::FujiDeviceBusy { code }
            | VendorError::FujiInvalidParameter { code }
            | VendorError::Unknown { code } => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_error_classification() {
        let e = VendorError::from_fail_reason(0x0000_2019);
        assert!(matches!(e, VendorError::FujiDeviceBusy { .. }));
        assert!(e.to_string().contains("change"));
        assert!(e.to_string().contains("retry"));

        let e = VendorError::from_fail_reason(0x0000_201D);
        assert!(matches!(e, VendorError::FujiInvalidParameter { .. }));

        let e = VendorError::from_fail_reason(0xDEAD_BEEF);
        assert!(matches!(e, VendorError::Unknown { .. }));
    }

    #[test]
    fn error_display_messages() {
        let e = Error::LengthMismatch {
            header: 32,
            actual: 30,
        };
        assert!(e.to_string().contains("32"));
        assert!(e.to_string().contains("30"));

        let e = Error::UserTimeout;
        assert!(e.to_string().contains("confirmation"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Transport(_)));
    }
}
