//! The PTP object model: codes, data types, datasets and the static
//! property catalog.

pub mod datatype;
pub mod device;
pub mod op;
pub mod property;
pub mod schema;

pub use datatype::{DataTypeCode, DataValue};
pub use device::DeviceInfo;
pub use op::{EventCode, OperationCode, ResponseCode};
pub use property::{Access, DevicePropCode, DevicePropDesc, Form};
