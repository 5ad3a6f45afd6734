//! The DeviceInfo dataset.

use bytes::Buf;

use crate::codec;
use crate::error::Error;
use crate::ptp::op::{EventCode, OperationCode};
use crate::ptp::property::DevicePropCode;

/// Vendor extension id declaring the Fujifilm code space.
pub const VENDOR_EXTENSION_FUJI: u32 = 0x0000_000E;

/// Everything a responder declares about itself and its capabilities.
///
/// Obtainable without an open session; capabilities are static unless
/// the responder announces a FunctionalMode change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceInfo {
    /// Highest supported standard version, in hundredths (1.10 = 110).
    pub standard_version: u16,
    /// Context for vendor extension codes; zero when none are used.
    pub vendor_extension_id: u32,
    /// Vendor extension version, in hundredths.
    pub vendor_extension_version: u16,
    /// Informational description of the vendor extension.
    pub vendor_extension_desc: String,
    /// Alternate-capability mode; zero for single-mode devices.
    pub functional_mode: u16,
    pub operations_supported: Vec<OperationCode>,
    pub events_supported: Vec<EventCode>,
    pub device_properties_supported: Vec<DevicePropCode>,
    pub capture_formats: Vec<u16>,
    pub image_formats: Vec<u16>,
    pub manufacturer: String,
    pub model: String,
    pub device_version: String,
    pub serial_number: String,
}

impl DeviceInfo {
    /// Decode the dataset from an operation's data phase.
    pub fn decode(mut body: &[u8]) -> Result<Self, Error> {
        let buf = &mut body;
        codec::ensure(buf, "DeviceInfo", 8)?;
        let standard_version = buf.get_u16_le();
        let vendor_extension_id = buf.get_u32_le();
        let vendor_extension_version = buf.get_u16_le();
        let vendor_extension_desc = codec::get_dataset_string(buf)?;
        codec::ensure(buf, "DeviceInfo", 2)?;
        let functional_mode = buf.get_u16_le();
        let operations_supported = codec::get_u16_array(buf)?
            .into_iter()
            .map(OperationCode)
            .collect();
        let events_supported = codec::get_u16_array(buf)?
            .into_iter()
            .map(EventCode)
            .collect();
        let device_properties_supported = codec::get_u16_array(buf)?
            .into_iter()
            .map(DevicePropCode)
            .collect();
        let capture_formats = codec::get_u16_array(buf)?;
        let image_formats = codec::get_u16_array(buf)?;
        let manufacturer = codec::get_dataset_string(buf)?;
        let model = codec::get_dataset_string(buf)?;
        let device_version = codec::get_dataset_string(buf)?;
        let serial_number = codec::get_dataset_string(buf)?;

        Ok(DeviceInfo {
            standard_version,
            vendor_extension_id,
            vendor_extension_version,
            vendor_extension_desc,
            functional_mode,
            operations_supported,
            events_supported,
            device_properties_supported,
            capture_formats,
            image_formats,
            manufacturer,
            model,
            device_version,
            serial_number,
        })
    }

    /// Whether the responder declares the Fujifilm extension space.
    pub fn is_fuji(&self) -> bool {
        self.vendor_extension_id == VENDOR_EXTENSION_FUJI
    }
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "standard version: {}.{:02}",
            self.standard_version / 100,
            self.standard_version % 100
        )?;
        writeln!(
            f,
            "vendor extension: {:#010x} v{}.{:02} ({})",
            self.vendor_extension_id,
            self.vendor_extension_version / 100,
            self.vendor_extension_version % 100,
            self.vendor_extension_desc
        )?;
        writeln!(f, "manufacturer: {}", self.manufacturer)?;
        writeln!(f, "model: {}", self.model)?;
        writeln!(f, "device version: {}", self.device_version)?;
        writeln!(f, "serial number: {}", self.serial_number)?;
        writeln!(f, "operations: {} supported", self.operations_supported.len())?;
        writeln!(f, "events: {} supported", self.events_supported.len())?;
        write!(
            f,
            "properties: {} supported",
            self.device_properties_supported.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn sample_bytes() -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u16_le(110); // standard version 1.10
        buf.put_u32_le(VENDOR_EXTENSION_FUJI);
        buf.put_u16_le(100);
        codec::put_dataset_string(&mut buf, "fujifilm.co.jp: 1.0;");
        buf.put_u16_le(0);
        codec::put_u16_array(&mut buf, &[0x1001, 0x1002, 0x1016, 0x902B]);
        codec::put_u16_array(&mut buf, &[0x4006]);
        codec::put_u16_array(&mut buf, &[0x5001, 0x5007, 0x5010]);
        codec::put_u16_array(&mut buf, &[0x3801]); // EXIF/JPEG
        codec::put_u16_array(&mut buf, &[0x3801]);
        codec::put_dataset_string(&mut buf, "FUJIFILM");
        codec::put_dataset_string(&mut buf, "X-T1");
        codec::put_dataset_string(&mut buf, "4.30");
        codec::put_dataset_string(&mut buf, "59M51418");
        buf
    }

    #[test]
    fn decode_full_dataset() {
        let buf = sample_bytes();
        let info = DeviceInfo::decode(&buf).unwrap();

        assert_eq!(info.standard_version, 110);
        assert!(info.is_fuji());
        assert_eq!(info.vendor_extension_desc, "fujifilm.co.jp: 1.0;");
        assert_eq!(info.operations_supported.len(), 4);
        assert!(info
            .operations_supported
            .contains(&OperationCode::FUJI_GET_DEVICE_INFO));
        assert_eq!(
            info.device_properties_supported,
            vec![
                DevicePropCode::BATTERY_LEVEL,
                DevicePropCode::F_NUMBER,
                DevicePropCode::EXPOSURE_BIAS_COMPENSATION
            ]
        );
        assert_eq!(info.model, "X-T1");
        assert_eq!(info.serial_number, "59M51418");
    }

    #[test]
    fn truncated_dataset_fails() {
        let buf = sample_bytes();
        assert!(DeviceInfo::decode(&buf[..10]).is_err());
    }
}
