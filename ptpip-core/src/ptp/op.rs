//! Operation, response and event codes.
//!
//! These are open-ended code spaces — vendors extend them — so they
//! are newtypes over `u16` with named constants rather than closed
//! enums.

use std::fmt;

// ── OperationCode ────────────────────────────────────────────────

/// A PTP operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationCode(pub u16);

impl OperationCode {
    pub const GET_DEVICE_INFO: OperationCode = OperationCode(0x1001);
    pub const OPEN_SESSION: OperationCode = OperationCode(0x1002);
    pub const CLOSE_SESSION: OperationCode = OperationCode(0x1003);
    pub const INITIATE_CAPTURE: OperationCode = OperationCode(0x100E);
    pub const GET_DEVICE_PROP_DESC: OperationCode = OperationCode(0x1014);
    pub const GET_DEVICE_PROP_VALUE: OperationCode = OperationCode(0x1015);
    pub const SET_DEVICE_PROP_VALUE: OperationCode = OperationCode(0x1016);
    pub const INITIATE_OPEN_CAPTURE: OperationCode = OperationCode(0x101C);

    /// Fuji "current device state": a count followed by that many
    /// DevicePropDesc datasets.
    pub const FUJI_GET_DEVICE_INFO: OperationCode = OperationCode(0x902B);
}

impl fmt::Display for OperationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

// ── ResponseCode ─────────────────────────────────────────────────

/// A PTP operation response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseCode(pub u16);

impl ResponseCode {
    pub const UNDEFINED: ResponseCode = ResponseCode(0x2000);
    pub const OK: ResponseCode = ResponseCode(0x2001);
    pub const GENERAL_ERROR: ResponseCode = ResponseCode(0x2002);
    pub const SESSION_NOT_OPEN: ResponseCode = ResponseCode(0x2003);
    pub const INVALID_TRANSACTION_ID: ResponseCode = ResponseCode(0x2004);
    pub const OPERATION_NOT_SUPPORTED: ResponseCode = ResponseCode(0x2005);
    pub const PARAMETER_NOT_SUPPORTED: ResponseCode = ResponseCode(0x2006);
    pub const INCOMPLETE_TRANSFER: ResponseCode = ResponseCode(0x2007);
    pub const INVALID_STORAGE_ID: ResponseCode = ResponseCode(0x2008);
    pub const INVALID_OBJECT_HANDLE: ResponseCode = ResponseCode(0x2009);
    pub const DEVICE_PROP_NOT_SUPPORTED: ResponseCode = ResponseCode(0x200A);
    pub const INVALID_OBJECT_FORMAT_CODE: ResponseCode = ResponseCode(0x200B);
    pub const STORE_FULL: ResponseCode = ResponseCode(0x200C);
    pub const OBJECT_WRITE_PROTECTED: ResponseCode = ResponseCode(0x200D);
    pub const STORE_READ_ONLY: ResponseCode = ResponseCode(0x200E);
    pub const ACCESS_DENIED: ResponseCode = ResponseCode(0x200F);
    pub const NO_THUMBNAIL_PRESENT: ResponseCode = ResponseCode(0x2010);
    pub const SELF_TEST_FAILED: ResponseCode = ResponseCode(0x2011);
    pub const PARTIAL_DELETION: ResponseCode = ResponseCode(0x2012);
    pub const STORE_NOT_AVAILABLE: ResponseCode = ResponseCode(0x2013);
    pub const SPECIFICATION_BY_FORMAT_UNSUPPORTED: ResponseCode = ResponseCode(0x2014);
    pub const NO_VALID_OBJECT_INFO: ResponseCode = ResponseCode(0x2015);
    pub const INVALID_CODE_FORMAT: ResponseCode = ResponseCode(0x2016);
    pub const UNKNOWN_VENDOR_CODE: ResponseCode = ResponseCode(0x2017);
    pub const CAPTURE_ALREADY_TERMINATED: ResponseCode = ResponseCode(0x2018);
    pub const DEVICE_BUSY: ResponseCode = ResponseCode(0x2019);
    pub const INVALID_PARENT_OBJECT: ResponseCode = ResponseCode(0x201A);
    pub const INVALID_DEVICE_PROP_FORMAT: ResponseCode = ResponseCode(0x201B);
    pub const INVALID_DEVICE_PROP_VALUE: ResponseCode = ResponseCode(0x201C);
    pub const INVALID_PARAMETER: ResponseCode = ResponseCode(0x201D);
    pub const SESSION_ALREADY_OPEN: ResponseCode = ResponseCode(0x201E);
    pub const TRANSACTION_CANCELLED: ResponseCode = ResponseCode(0x201F);
    pub const SPECIFICATION_OF_DESTINATION_UNSUPPORTED: ResponseCode = ResponseCode(0x2020);

    /// Fuji reply to a GetDevicePropValue; the first parameter holds
    /// the property value.
    pub const FUJI_DEVICE_PROP_VALUE: ResponseCode = ResponseCode(0x1015);

    /// The response code set treated as success.
    pub fn is_success(self) -> bool {
        self == ResponseCode::OK
            || self == ResponseCode::SESSION_ALREADY_OPEN
            || self == ResponseCode::FUJI_DEVICE_PROP_VALUE
    }

    /// Canonical name of the code, for error messages.
    pub fn name(self) -> &'static str {
        match self {
            ResponseCode::UNDEFINED => "Undefined",
            ResponseCode::OK => "OK",
            ResponseCode::GENERAL_ERROR => "GeneralError",
            ResponseCode::SESSION_NOT_OPEN => "SessionNotOpen",
            ResponseCode::INVALID_TRANSACTION_ID => "InvalidTransactionID",
            ResponseCode::OPERATION_NOT_SUPPORTED => "OperationNotSupported",
            ResponseCode::PARAMETER_NOT_SUPPORTED => "ParameterNotSupported",
            ResponseCode::INCOMPLETE_TRANSFER => "IncompleteTransfer",
            ResponseCode::INVALID_STORAGE_ID => "InvalidStorageID",
            ResponseCode::INVALID_OBJECT_HANDLE => "InvalidObjectHandle",
            ResponseCode::DEVICE_PROP_NOT_SUPPORTED => "DevicePropNotSupported",
            ResponseCode::INVALID_OBJECT_FORMAT_CODE => "InvalidObjectFormatCode",
            ResponseCode::STORE_FULL => "StoreFull",
            ResponseCode::OBJECT_WRITE_PROTECTED => "ObjectWriteProtected",
            ResponseCode::STORE_READ_ONLY => "StoreReadOnly",
            ResponseCode::ACCESS_DENIED => "AccessDenied",
            ResponseCode::NO_THUMBNAIL_PRESENT => "NoThumbnailPresent",
            ResponseCode::SELF_TEST_FAILED => "SelfTestFailed",
            ResponseCode::PARTIAL_DELETION => "PartialDeletion",
            ResponseCode::STORE_NOT_AVAILABLE => "StoreNotAvailable",
            ResponseCode::SPECIFICATION_BY_FORMAT_UNSUPPORTED => {
                "SpecificationByFormatUnsupported"
            }
            ResponseCode::NO_VALID_OBJECT_INFO => "NoValidObjectInfo",
            ResponseCode::INVALID_CODE_FORMAT => "InvalidCodeFormat",
            ResponseCode::UNKNOWN_VENDOR_CODE => "UnknownVendorCode",
            ResponseCode::CAPTURE_ALREADY_TERMINATED => "CaptureAlreadyTerminated",
            ResponseCode::DEVICE_BUSY => "DeviceBusy",
            ResponseCode::INVALID_PARENT_OBJECT => "InvalidParentObject",
            ResponseCode::INVALID_DEVICE_PROP_FORMAT => "InvalidDevicePropFormat",
            ResponseCode::INVALID_DEVICE_PROP_VALUE => "InvalidDevicePropValue",
            ResponseCode::INVALID_PARAMETER => "InvalidParameter",
            ResponseCode::SESSION_ALREADY_OPEN => "SessionAlreadyOpen",
            ResponseCode::TRANSACTION_CANCELLED => "TransactionCancelled",
            ResponseCode::SPECIFICATION_OF_DESTINATION_UNSUPPORTED => {
                "SpecificationOfDestinationUnsupported"
            }
            ResponseCode::FUJI_DEVICE_PROP_VALUE => "FujiDevicePropValue",
            _ => "UnknownResponseCode",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

// ── EventCode ────────────────────────────────────────────────────

/// A PTP event code, delivered on the Event connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventCode(pub u16);

impl EventCode {
    pub const CANCEL_TRANSACTION: EventCode = EventCode(0x4001);
    pub const OBJECT_ADDED: EventCode = EventCode(0x4002);
    pub const OBJECT_REMOVED: EventCode = EventCode(0x4003);
    pub const STORE_ADDED: EventCode = EventCode(0x4004);
    pub const STORE_REMOVED: EventCode = EventCode(0x4005);
    pub const DEVICE_PROP_CHANGED: EventCode = EventCode(0x4006);
    pub const OBJECT_INFO_CHANGED: EventCode = EventCode(0x4007);
    pub const DEVICE_INFO_CHANGED: EventCode = EventCode(0x4008);
    pub const REQUEST_OBJECT_TRANSFER: EventCode = EventCode(0x4009);
    pub const STORE_FULL: EventCode = EventCode(0x400A);
    pub const DEVICE_RESET: EventCode = EventCode(0x400B);
    pub const STORAGE_INFO_CHANGED: EventCode = EventCode(0x400C);
    pub const CAPTURE_COMPLETE: EventCode = EventCode(0x400D);
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_set() {
        assert!(ResponseCode::OK.is_success());
        assert!(ResponseCode::SESSION_ALREADY_OPEN.is_success());
        assert!(ResponseCode::FUJI_DEVICE_PROP_VALUE.is_success());
        assert!(!ResponseCode::DEVICE_BUSY.is_success());
        assert!(!ResponseCode::GENERAL_ERROR.is_success());
    }

    #[test]
    fn names() {
        assert_eq!(ResponseCode::OK.name(), "OK");
        assert_eq!(ResponseCode::DEVICE_BUSY.name(), "DeviceBusy");
        assert_eq!(ResponseCode(0xEEEE).name(), "UnknownResponseCode");
    }
}
