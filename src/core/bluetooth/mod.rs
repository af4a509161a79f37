//! Bluetooth functionality for the headphone link
//! This module handles all bluetooth operations including scanning,
//! connecting, the command protocol and recovering from disconnects.

pub mod commands;
pub mod constants;
pub mod manager;
pub mod notification;
pub mod response;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(feature = "ble")]
mod connection;
#[cfg(feature = "ble")]
mod scanner;

// Re-export types that should be publicly accessible
pub use commands::{HeadphoneCommand, checksum, encode_set_color, encode_with_checksum};
#[cfg(feature = "ble")]
pub use connection::BluestTransport;
pub use manager::LinkManager;
pub use notification::{PacketBuffer, PacketSink};
pub use response::{ParsedResponse, ResponseKind, UnknownFrame, classify, parse_responses};
pub use session::{CommandChannel, SessionHandles, WriteLock, WriteTicket};
pub use transport::{Transport, TransportError};
pub use types::{Advertisement, DeviceIdentity, LinkState, Rgb};
