//! PTP/IP initiator for networked cameras, with the Fujifilm dialect.
//!
//! Layered bottom-up:
//!
//! - [`codec`] — little-endian primitives, UTF-16 strings, GUIDs.
//! - [`packet`] / [`packets`] — framing and the standard variant set.
//! - [`fuji`] — the vendor deviations: reordered init packet, untagged
//!   16-bit operation shapes, and the mandatory init sequence.
//! - [`net`] — the two TCP connections, with deadline-bounded reads.
//! - [`client`] — the session owner and its operations.
//! - [`ptp`] — the object model: codes, datasets, the property schema.
//! - [`fmt`] — scaled-integer values rendered for humans.

pub mod client;
pub mod codec;
pub mod error;
pub mod fmt;
pub mod fuji;
pub mod net;
pub mod packet;
pub mod packets;
pub mod ptp;
pub mod vendor;

pub use client::{CachedValue, Client, ResponderIdentity};
pub use error::{Error, VendorError};
pub use packet::PacketType;
pub use ptp::{DataValue, DeviceInfo, DevicePropCode, DevicePropDesc, OperationCode, ResponseCode};
pub use vendor::Vendor;
