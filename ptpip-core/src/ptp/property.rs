//! Device property codes and the DevicePropDesc dataset.

use bytes::Buf;

use crate::codec;
use crate::error::Error;
use crate::ptp::datatype::{DataTypeCode, DataValue};

// ── DevicePropCode ───────────────────────────────────────────────

/// A 16-bit device property code. The standard set lives in
/// `0x5000..=0x501F`; vendor extensions sit above `0xD000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevicePropCode(pub u16);

impl DevicePropCode {
    pub const UNDEFINED: DevicePropCode = DevicePropCode(0x5000);
    pub const BATTERY_LEVEL: DevicePropCode = DevicePropCode(0x5001);
    pub const FUNCTIONAL_MODE: DevicePropCode = DevicePropCode(0x5002);
    pub const IMAGE_SIZE: DevicePropCode = DevicePropCode(0x5003);
    pub const COMPRESSION_SETTING: DevicePropCode = DevicePropCode(0x5004);
    pub const WHITE_BALANCE: DevicePropCode = DevicePropCode(0x5005);
    pub const RGB_GAIN: DevicePropCode = DevicePropCode(0x5006);
    pub const F_NUMBER: DevicePropCode = DevicePropCode(0x5007);
    pub const FOCAL_LENGTH: DevicePropCode = DevicePropCode(0x5008);
    pub const FOCUS_DISTANCE: DevicePropCode = DevicePropCode(0x5009);
    pub const FOCUS_MODE: DevicePropCode = DevicePropCode(0x500A);
    pub const EXPOSURE_METERING_MODE: DevicePropCode = DevicePropCode(0x500B);
    pub const FLASH_MODE: DevicePropCode = DevicePropCode(0x500C);
    pub const EXPOSURE_TIME: DevicePropCode = DevicePropCode(0x500D);
    pub const EXPOSURE_PROGRAM_MODE: DevicePropCode = DevicePropCode(0x500E);
    pub const EXPOSURE_INDEX: DevicePropCode = DevicePropCode(0x500F);
    pub const EXPOSURE_BIAS_COMPENSATION: DevicePropCode = DevicePropCode(0x5010);
    pub const DATE_TIME: DevicePropCode = DevicePropCode(0x5011);
    pub const CAPTURE_DELAY: DevicePropCode = DevicePropCode(0x5012);
    pub const STILL_CAPTURE_MODE: DevicePropCode = DevicePropCode(0x5013);
    pub const CONTRAST: DevicePropCode = DevicePropCode(0x5014);
    pub const SHARPNESS: DevicePropCode = DevicePropCode(0x5015);
    pub const DIGITAL_ZOOM: DevicePropCode = DevicePropCode(0x5016);
    pub const EFFECT_MODE: DevicePropCode = DevicePropCode(0x5017);
    pub const BURST_NUMBER: DevicePropCode = DevicePropCode(0x5018);
    pub const BURST_INTERVAL: DevicePropCode = DevicePropCode(0x5019);
    pub const TIMELAPSE_NUMBER: DevicePropCode = DevicePropCode(0x501A);
    pub const TIMELAPSE_INTERVAL: DevicePropCode = DevicePropCode(0x501B);
    pub const FOCUS_METERING_MODE: DevicePropCode = DevicePropCode(0x501C);
    pub const UPLOAD_URL: DevicePropCode = DevicePropCode(0x501D);
    pub const ARTIST: DevicePropCode = DevicePropCode(0x501E);
    pub const COPYRIGHT_INFO: DevicePropCode = DevicePropCode(0x501F);
}

impl std::fmt::Display for DevicePropCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

// ── Access and form flags ────────────────────────────────────────

/// Read-only vs. read-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Get only.
    ReadOnly,
    /// Get/Set.
    ReadWrite,
}

impl TryFrom<u8> for Access {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Access::ReadOnly),
            0x01 => Ok(Access::ReadWrite),
            _ => Err(Error::ProtocolViolation("invalid GetSet flag")),
        }
    }
}

/// The value-space descriptor attached to a property description.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// No constraint communicated.
    None,
    /// Linear range: min, max, step, all of the property's data type.
    Range {
        min: DataValue,
        max: DataValue,
        step: DataValue,
    },
    /// Ordered list of the supported values.
    Enum(Vec<DataValue>),
}

impl Form {
    /// Number of settable values in a range form, using 64-bit
    /// intermediates so `max - min` cannot overflow the value type.
    pub fn range_step_count(&self) -> Option<i64> {
        match self {
            Form::Range { min, max, step } => {
                let (min, max, step) = (min.as_i64()?, max.as_i64()?, step.as_i64()?);
                if step == 0 {
                    return None;
                }
                Some((max - min) / step + 1)
            }
            _ => None,
        }
    }
}

// ── DevicePropDesc ───────────────────────────────────────────────

/// The DevicePropDesc dataset: everything a responder declares about
/// one property.
#[derive(Debug, Clone, PartialEq)]
pub struct DevicePropDesc {
    pub code: DevicePropCode,
    pub data_type: DataTypeCode,
    pub access: Access,
    pub factory_default: DataValue,
    pub current: DataValue,
    pub form: Form,
}

impl DevicePropDesc {
    /// Decode one dataset, advancing `buf` past it.
    pub fn decode(buf: &mut &[u8]) -> Result<Self, Error> {
        codec::ensure(buf, "DevicePropDesc", 5)?;
        let code = DevicePropCode(buf.get_u16_le());
        let data_type = DataTypeCode(buf.get_u16_le());
        let access = Access::try_from(buf.get_u8())?;
        let factory_default = DataValue::decode(data_type, buf)?;
        let current = DataValue::decode(data_type, buf)?;

        codec::ensure(buf, "DevicePropDesc form", 1)?;
        let form = match buf.get_u8() {
            0x00 => Form::None,
            0x01 => Form::Range {
                min: DataValue::decode(data_type, buf)?,
                max: DataValue::decode(data_type, buf)?,
                step: DataValue::decode(data_type, buf)?,
            },
            0x02 => {
                codec::ensure(buf, "enumeration form", 2)?;
                let count = buf.get_u16_le() as usize;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(DataValue::decode(data_type, buf)?);
                }
                Form::Enum(values)
            }
            _ => return Err(Error::ProtocolViolation("invalid form flag")),
        };

        let desc = DevicePropDesc {
            code,
            data_type,
            access,
            factory_default,
            current,
            form,
        };
        desc.check_widths()?;
        Ok(desc)
    }

    /// A description is valid only if both value fields occupy exactly
    /// the width the declared data type dictates.
    fn check_widths(&self) -> Result<(), Error> {
        for value in [&self.factory_default, &self.current] {
            if !value.matches(self.data_type) {
                return Err(Error::ValueWidthMismatch {
                    property: "DevicePropDesc value",
                    declared: self.data_type.scalar_width().unwrap_or(0),
                    got: value.scalar_width().unwrap_or(0),
                });
            }
        }
        Ok(())
    }
}
