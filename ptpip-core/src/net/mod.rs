//! TCP plumbing for the two PTP/IP connections.

mod connection;

pub use connection::{Connection, DEFAULT_DIAL_TIMEOUT, DEFAULT_READ_TIMEOUT, MAX_FRAME_SIZE};
