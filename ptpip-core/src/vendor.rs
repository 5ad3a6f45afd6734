//! Vendor dispatch.
//!
//! The responder's vendor decides which init-command layout to send,
//! whether operation packets carry a type field, which port the event
//! connection uses, and when that connection may be opened.

use bytes::BytesMut;
use uuid::Uuid;

use crate::error::Error;
use crate::fuji;
use crate::packet::Encode;
use crate::packets::InitCommandRequest;

/// Standard PTP/IP port.
const CMD_PORT_STANDARD: u16 = 15740;

/// The vendors this initiator can talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Vendor {
    /// Plain PTP/IP, no deviations.
    #[default]
    Generic,
    /// Fujifilm firmware, see [`crate::fuji`].
    Fuji,
}

impl Vendor {
    /// Parse a config string.
    pub fn parse(s: &str) -> Result<Vendor, Error> {
        match s.to_ascii_lowercase().as_str() {
            "" | "generic" => Ok(Vendor::Generic),
            "fuji" | "fujifilm" => Ok(Vendor::Fuji),
            other => Err(Error::Config(format!("unsupported vendor '{other}'"))),
        }
    }

    /// Default Command/Data port.
    pub fn default_cmd_port(self) -> u16 {
        match self {
            Vendor::Generic => CMD_PORT_STANDARD,
            Vendor::Fuji => fuji::CMD_PORT_FUJI,
        }
    }

    /// The Event connection port, given the configured Command/Data
    /// port. The standard runs both connections against one port;
    /// Fuji uses a dedicated one.
    pub fn default_event_port(self, cmd_port: u16) -> u16 {
        match self {
            Vendor::Generic => cmd_port,
            Vendor::Fuji => fuji::EVENT_PORT_FUJI,
        }
    }

    /// Whether operation request/response packets omit the packet
    /// type field.
    pub fn untagged_operations(self) -> bool {
        matches!(self, Vendor::Fuji)
    }

    /// Whether the Event connection can only be opened after the
    /// vendor post-init sequence has completed.
    pub fn event_after_post_init(self) -> bool {
        matches!(self, Vendor::Fuji)
    }

    /// The framed init-command request in this vendor's layout.
    pub fn init_command_request(self, guid: Uuid, friendly_name: &str) -> BytesMut {
        match self {
            Vendor::Generic => InitCommandRequest::new(guid, friendly_name).to_bytes(),
            Vendor::Fuji => fuji::FujiInitCommandRequest::new(guid, friendly_name).to_bytes(),
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::Generic => write!(f, "generic"),
            Vendor::Fuji => write!(f, "fuji"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_vendors() {
        assert_eq!(Vendor::parse("fuji").unwrap(), Vendor::Fuji);
        assert_eq!(Vendor::parse("FujiFilm").unwrap(), Vendor::Fuji);
        assert_eq!(Vendor::parse("generic").unwrap(), Vendor::Generic);
        assert_eq!(Vendor::parse("").unwrap(), Vendor::Generic);
        assert!(Vendor::parse("nikon").is_err());
    }

    #[test]
    fn ports() {
        assert_eq!(Vendor::Fuji.default_cmd_port(), 55740);
        assert_eq!(Vendor::Fuji.default_event_port(55740), 55741);
        assert_eq!(Vendor::Generic.default_cmd_port(), 15740);
        assert_eq!(Vendor::Generic.default_event_port(15740), 15740);
    }

    #[test]
    fn init_layouts_differ() {
        let guid = Uuid::nil();
        let generic = Vendor::Generic.init_command_request(guid, "x");
        let fuji = Vendor::Fuji.init_command_request(guid, "x");
        // Generic leads with the GUID; Fuji with the protocol version.
        assert_eq!(&generic[8..12], &[0, 0, 0, 0]);
        assert_eq!(&fuji[8..12], &[0xF2, 0xE4, 0x53, 0x8F]);
    }
}
