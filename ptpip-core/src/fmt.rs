//! Presentation of raw property values.
//!
//! Raw values are scaled integers (× 100, × 1000, × 10000); all
//! scaling here goes through 64-bit intermediates so range arithmetic
//! cannot overflow the value's own width.

use crate::error::Error;
use crate::fuji::{self, FujiBatteryLevel};
use crate::ptp::property::DevicePropCode;
use crate::vendor::Vendor;

/// F-number: `u16` scaled by 100. Trailing zero decimals are
/// stripped, so 800 renders as "F8", not "F8.0".
pub fn fnumber_as_string(raw: u16) -> String {
    let raw = raw as i64;
    let whole = raw / 100;
    let frac = raw % 100;
    if frac == 0 {
        format!("F{whole}")
    } else if frac % 10 == 0 {
        format!("F{whole}.{}", frac / 10)
    } else {
        format!("F{whole}.{frac:02}")
    }
}

/// Exposure time: `u32` in units of 1/10000 s. Sub-second values
/// render as the photographic fraction.
pub fn exposure_time_as_string(raw: u32) -> String {
    let raw = raw as u64;
    if raw == 0 {
        return "0s".to_string();
    }
    if raw < 10_000 {
        let denom = (10_000 + raw / 2) / raw;
        return format!("1/{denom}");
    }
    let whole = raw / 10_000;
    let frac = raw % 10_000;
    if frac == 0 {
        format!("{whole}s")
    } else {
        let tenths = (frac + 500) / 1_000;
        format!("{whole}.{tenths}s")
    }
}

/// Exposure bias: `i16` in thousandths of a stop. The integer part is
/// the whole stop; the fraction's magnitude decides the third-stop
/// (|f| ≤ 0.4 → 1/3, above → 2/3) and its sign follows the value.
pub fn exposure_bias_as_string(raw: i16) -> String {
    let raw = raw as i64;
    if raw == 0 {
        return "0".to_string();
    }
    let sign = if raw < 0 { "-" } else { "+" };
    let whole = (raw / 1000).abs();
    let frac = (raw % 1000).abs();
    let third = match frac {
        0 => None,
        f if f <= 400 => Some("1/3"),
        _ => Some("2/3"),
    };
    match (whole, third) {
        (0, Some(t)) => format!("{sign}{t}"),
        (w, None) => format!("{sign}{w}"),
        (w, Some(t)) => format!("{sign}{w} {t}"),
    }
}

/// Fuji exposure index: the high flag marks auto-ISO, rendered with a
/// leading "S"; the remaining bits are the numeric ISO.
pub fn fuji_exposure_index_as_string(raw: u32) -> String {
    if raw & 0x8000_0000 != 0 {
        format!("S{}", raw & 0x00FF_FFFF)
    } else {
        format!("{raw}")
    }
}

// ── Exposure program mode ────────────────────────────────────────

/// The standard exposure program modes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureProgramMode {
    Manual = 0x0001,
    Automatic = 0x0002,
    AperturePriority = 0x0003,
    ShutterPriority = 0x0004,
    ProgramCreative = 0x0005,
    ProgramAction = 0x0006,
    Portrait = 0x0007,
}

impl TryFrom<i64> for ExposureProgramMode {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(ExposureProgramMode::Manual),
            0x0002 => Ok(ExposureProgramMode::Automatic),
            0x0003 => Ok(ExposureProgramMode::AperturePriority),
            0x0004 => Ok(ExposureProgramMode::ShutterPriority),
            0x0005 => Ok(ExposureProgramMode::ProgramCreative),
            0x0006 => Ok(ExposureProgramMode::ProgramAction),
            0x0007 => Ok(ExposureProgramMode::Portrait),
            _ => Err(Error::ProtocolViolation("unknown exposure program mode")),
        }
    }
}

impl ExposureProgramMode {
    pub fn name(self) -> &'static str {
        match self {
            ExposureProgramMode::Manual => "Manual",
            ExposureProgramMode::Automatic => "Automatic",
            ExposureProgramMode::AperturePriority => "AperturePriority",
            ExposureProgramMode::ShutterPriority => "ShutterPriority",
            ExposureProgramMode::ProgramCreative => "ProgramCreative",
            ExposureProgramMode::ProgramAction => "ProgramAction",
            ExposureProgramMode::Portrait => "Portrait",
        }
    }

    /// The two-glyph icon pair the viewfinder font uses for this mode.
    pub fn icon(self) -> &'static str {
        match self {
            ExposureProgramMode::Manual => "Mm",
            ExposureProgramMode::Automatic => "Pp",
            ExposureProgramMode::AperturePriority => "Nn",
            ExposureProgramMode::ShutterPriority => "Ll",
            _ => " ",
        }
    }
}

/// Present one property value for the CLI, by code.
pub fn device_prop_value_as_string(vendor: Vendor, code: DevicePropCode, value: i64) -> String {
    match code {
        DevicePropCode::F_NUMBER => fnumber_as_string(value as u16),
        DevicePropCode::EXPOSURE_TIME => exposure_time_as_string(value as u32),
        DevicePropCode::EXPOSURE_BIAS_COMPENSATION => exposure_bias_as_string(value as i16),
        DevicePropCode::EXPOSURE_PROGRAM_MODE => ExposureProgramMode::try_from(value)
            .map(|m| m.name().to_string())
            .unwrap_or_else(|_| format!("{value:#x}")),
        DevicePropCode::BATTERY_LEVEL => match (vendor, FujiBatteryLevel::try_from(value)) {
            (Vendor::Fuji, Ok(level)) => format!("{}/3 bars", level as u8),
            _ => format!("{value}"),
        },
        code if code == fuji::DPC_FUJI_EXPOSURE_INDEX => {
            fuji_exposure_index_as_string(value as u32)
        }
        _ => format!("{value:#x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnumber_strips_trailing_zeroes() {
        assert_eq!(fnumber_as_string(560), "F5.6");
        assert_eq!(fnumber_as_string(800), "F8");
        assert_eq!(fnumber_as_string(140), "F1.4");
        assert_eq!(fnumber_as_string(1100), "F11");
        assert_eq!(fnumber_as_string(125), "F1.25");
    }

    #[test]
    fn exposure_time_fractions() {
        assert_eq!(exposure_time_as_string(40), "1/250");
        assert_eq!(exposure_time_as_string(2), "1/5000");
        assert_eq!(exposure_time_as_string(10_000), "1s");
        assert_eq!(exposure_time_as_string(15_000), "1.5s");
        assert_eq!(exposure_time_as_string(0), "0s");
    }

    #[test]
    fn exposure_bias_thirds() {
        assert_eq!(exposure_bias_as_string(0), "0");
        assert_eq!(exposure_bias_as_string(1000), "+1");
        assert_eq!(exposure_bias_as_string(-2000), "-2");
        assert_eq!(exposure_bias_as_string(333), "+1/3");
        assert_eq!(exposure_bias_as_string(-666), "-2/3");
        assert_eq!(exposure_bias_as_string(1333), "+1 1/3");
        assert_eq!(exposure_bias_as_string(-1666), "-1 2/3");
    }

    #[test]
    fn iso_auto_flag() {
        assert_eq!(fuji_exposure_index_as_string(0x8000_0640), "S1600");
        assert_eq!(fuji_exposure_index_as_string(200), "200");
        assert_eq!(fuji_exposure_index_as_string(0x8000_0C80), "S3200");
    }

    #[test]
    fn program_mode_icons() {
        assert_eq!(
            ExposureProgramMode::try_from(1).unwrap().icon(),
            "Mm"
        );
        assert_eq!(ExposureProgramMode::try_from(2).unwrap().icon(), "Pp");
        assert_eq!(ExposureProgramMode::try_from(3).unwrap().icon(), "Nn");
        assert_eq!(ExposureProgramMode::try_from(4).unwrap().icon(), "Ll");
        assert!(ExposureProgramMode::try_from(0x99).is_err());
    }

    #[test]
    fn prop_value_dispatch() {
        assert_eq!(
            device_prop_value_as_string(Vendor::Fuji, DevicePropCode::F_NUMBER, 560),
            "F5.6"
        );
        assert_eq!(
            device_prop_value_as_string(
                Vendor::Fuji,
                fuji::DPC_FUJI_EXPOSURE_INDEX,
                0x8000_0640
            ),
            "S1600"
        );
        assert_eq!(
            device_prop_value_as_string(Vendor::Fuji, DevicePropCode::BATTERY_LEVEL, 3),
            "3/3 bars"
        );
        assert_eq!(
            device_prop_value_as_string(Vendor::Fuji, DevicePropCode(0xD123), 0x42),
            "0x42"
        );
    }
}
