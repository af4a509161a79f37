//! Constants used throughout the link layer
//! This module contains the fixed identity of the headphones, their command
//! framing bytes and the default timings of the connection lifecycle.

use uuid::Uuid;

/// The name the headphones advertise over BLE
pub const HEADPHONES_NAME: &str = "YOWU-SELKIRK-3G";

/// Standard Bluetooth Service UUIDs
pub const UUID_IMMEDIATE_ALERT_SERVICE: Uuid = Uuid::from_u128(0x00001802_0000_1000_8000_00805f9b34fb);

/// Standard Bluetooth Characteristic UUIDs
pub const UUID_ALERT_LEVEL: Uuid = Uuid::from_u128(0x00002a06_0000_1000_8000_00805f9b34fb);

/// Leading octets of the headphones' MAC address, most significant first
pub const HEADPHONES_ADDRESS_PREFIX: [u8; 3] = [0x78, 0x5e, 0xa2];

/// Command sent once after connecting; the headphones stay silent until they receive it
pub const INIT_BYTES: [u8; 11] = [0xfc, 0x04, 0x01, 0x06, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf1];

/// Leading bytes of the "set colour" command
pub const SET_COLOR_PREFIX: [u8; 5] = [0xfc, 0x04, 0x01, 0x06, 0x00];

/// Trailing bytes of the "set colour" command, before the checksum
pub const SET_COLOR_AFFIX: [u8; 2] = [0x00, 0x00];

/// Frame sent by the headphones once a session is established
pub const CONNECTED_MARKER: &[u8] = b"7";

/// Leading bytes of a colour report frame
pub const COLOR_REPORT_PREFIX: [u8; 5] = [0xfc, 0x03, 0x01, 0x05, 0x11];

/// Leading bytes of the frame that follows the init command
pub const INIT_CONFIRMATION_PREFIX: [u8; 4] = [0xfc, 0x06, 0x04, 0x02];

/// Number of queued notification packets kept per subscription
pub const PACKET_BUFFER_CAPACITY: usize = 1024;

/// Scan duration in milliseconds
pub const DEFAULT_SCAN_DURATION_MS: u64 = 3000;

/// Extra time the scan keeps running after the scan window, in milliseconds
pub const DEFAULT_SCAN_SETTLE_MS: u64 = 3000;

/// Timeout for a single connection attempt in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 4000;

/// Delay between connecting and sending the init command in milliseconds
pub const DEFAULT_POST_CONNECT_DELAY_MS: u64 = 1000;

/// Delay before a colour command is written in milliseconds
pub const DEFAULT_PRE_WRITE_DELAY_MS: u64 = 100;

/// Delay between writing a command and reading its response in milliseconds
pub const DEFAULT_WRITE_SETTLE_MS: u64 = 500;

/// Delay between two reads of the packet buffer in milliseconds
pub const DEFAULT_RESPONSE_POLL_MS: u64 = 500;

/// Maximum number of packet reads per write
pub const DEFAULT_MAX_RESPONSE_PACKETS: usize = 20;

/// Interval of the connection supervision loop in milliseconds
pub const DEFAULT_SUPERVISION_INTERVAL_MS: u64 = 10_000;
