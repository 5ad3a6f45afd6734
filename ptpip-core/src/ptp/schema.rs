//! Static catalog of known device properties.
//!
//! The responder's DevicePropDesc datasets are authoritative at run
//! time; this table supplies what the client must know *before*
//! talking to the device: CLI-friendly names, expected data types and
//! writability, with the Fujifilm extensions layered over the
//! standard set.

use crate::error::Error;
use crate::fuji;
use crate::ptp::datatype::DataTypeCode;
use crate::ptp::property::{Access, DevicePropCode};

/// One catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct PropertyInfo {
    pub code: DevicePropCode,
    /// Lower-case name accepted by the CLI.
    pub name: &'static str,
    pub data_type: DataTypeCode,
    pub access: Access,
}

const STANDARD: &[PropertyInfo] = &[
    PropertyInfo {
        code: DevicePropCode::BATTERY_LEVEL,
        name: "batterylevel",
        data_type: DataTypeCode::UINT8,
        access: Access::ReadOnly,
    },
    PropertyInfo {
        code: DevicePropCode::IMAGE_SIZE,
        name: "imagesize",
        data_type: DataTypeCode::STR,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::WHITE_BALANCE,
        name: "whitebalance",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::F_NUMBER,
        name: "fnumber",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::FOCAL_LENGTH,
        name: "focallength",
        data_type: DataTypeCode::UINT32,
        access: Access::ReadOnly,
    },
    PropertyInfo {
        code: DevicePropCode::FOCUS_MODE,
        name: "focusmode",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::FLASH_MODE,
        name: "flashmode",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::EXPOSURE_TIME,
        name: "exposuretime",
        data_type: DataTypeCode::UINT32,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::EXPOSURE_PROGRAM_MODE,
        name: "exposureprogrammode",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::EXPOSURE_INDEX,
        name: "exposureindex",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::EXPOSURE_BIAS_COMPENSATION,
        name: "exposurebiascompensation",
        data_type: DataTypeCode::INT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::DATE_TIME,
        name: "datetime",
        data_type: DataTypeCode::STR,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: DevicePropCode::STILL_CAPTURE_MODE,
        name: "stillcapturemode",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
];

const FUJI: &[PropertyInfo] = &[
    PropertyInfo {
        code: fuji::DPC_FUJI_USE_INIT_SEQUENCE,
        name: "useinitsequence",
        data_type: DataTypeCode::UINT32,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: fuji::DPC_FUJI_APP_VERSION,
        name: "appversion",
        data_type: DataTypeCode::UINT32,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: fuji::DPC_FUJI_FILM_SIMULATION,
        name: "filmsimulation",
        data_type: DataTypeCode::UINT16,
        access: Access::ReadWrite,
    },
    PropertyInfo {
        code: fuji::DPC_FUJI_EXPOSURE_INDEX,
        name: "iso",
        data_type: DataTypeCode::UINT32,
        access: Access::ReadWrite,
    },
];

/// Look up a property by code, vendor extensions first.
pub fn lookup(code: DevicePropCode) -> Option<&'static PropertyInfo> {
    FUJI.iter()
        .chain(STANDARD.iter())
        .find(|info| info.code == code)
}

/// Resolve a CLI argument: a catalog name, or a bare hex code like
/// `0x5007` / `5007` for properties outside the catalog.
pub fn resolve(arg: &str) -> Result<DevicePropCode, Error> {
    let lowered = arg.to_ascii_lowercase();
    if let Some(info) = FUJI
        .iter()
        .chain(STANDARD.iter())
        .find(|info| info.name == lowered)
    {
        return Ok(info.code);
    }
    let digits = lowered.strip_prefix("0x").unwrap_or(&lowered);
    u16::from_str_radix(digits, 16)
        .map(DevicePropCode)
        .map_err(|_| Error::UnknownProperty(arg.to_string()))
}

/// Validate a 32-bit wire value against the catalog before a set.
/// Unknown codes pass through untouched — the responder is the final
/// authority on its own vendor space.
pub fn check_set(code: DevicePropCode, value: u32) -> Result<(), Error> {
    let Some(info) = lookup(code) else {
        return Ok(());
    };
    if info.access == Access::ReadOnly {
        return Err(Error::ReadOnlyProperty(info.name));
    }
    if let Some(width) = info.data_type.scalar_width() {
        if width < 4 && u64::from(value) >= 1u64 << (width * 8) {
            return Err(Error::ValueWidthMismatch {
                property: info.name,
                declared: width,
                got: 4,
            });
        }
    }
    Ok(())
}
