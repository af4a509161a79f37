//! Defines shared data structures for the Bluetooth module.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::core::bluetooth::constants::{
    HEADPHONES_ADDRESS_PREFIX, HEADPHONES_NAME, INIT_BYTES, UUID_ALERT_LEVEL,
    UUID_IMMEDIATE_ALERT_SERVICE,
};

/// Represents an advertisement seen while scanning
#[derive(Debug, Clone, PartialEq)]
pub struct Advertisement<A> {
    /// Transport-specific address used to connect to the advertiser
    pub address: A,
    /// The complete local name, if the advertisement carried one
    pub name: Option<String>,
    /// Whether the advertiser accepts connections
    pub connectable: bool,
    /// The MAC address in `AA:BB:CC:DD:EE:FF` form, when the platform exposes it
    pub mac: Option<String>,
    /// The signal strength (RSSI) of the advertisement
    pub rssi: Option<i16>,
}

/// The fixed identity of the peripheral the link talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: &'static str,
    pub service_uuid: Uuid,
    pub characteristic_uuid: Uuid,
    pub address_prefix: [u8; 3],
    pub init_bytes: &'static [u8],
}

impl DeviceIdentity {
    /// The YOWU Selkirk 3G headphones.
    pub const HEADPHONES: DeviceIdentity = DeviceIdentity {
        name: HEADPHONES_NAME,
        service_uuid: UUID_IMMEDIATE_ALERT_SERVICE,
        characteristic_uuid: UUID_ALERT_LEVEL,
        address_prefix: HEADPHONES_ADDRESS_PREFIX,
        init_bytes: &INIT_BYTES,
    };

    /// Returns true if the advertisement comes from this device.
    ///
    /// The address prefix is only checked when `check_address` is set and the
    /// advertisement carries a MAC address; several platforms hide it.
    pub fn matches<A>(&self, adv: &Advertisement<A>, check_address: bool) -> bool {
        if !adv.connectable || adv.name.as_deref() != Some(self.name) {
            return false;
        }
        if !check_address {
            return true;
        }
        adv.mac
            .as_deref()
            .map(|mac| self.has_address_prefix(mac))
            .unwrap_or(true)
    }

    fn has_address_prefix(&self, mac: &str) -> bool {
        let prefix = self
            .address_prefix
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":");
        mac.to_uppercase().starts_with(&prefix)
    }
}

/// Lifecycle of the link to the headphones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkState {
    Disconnected,
    Scanning,
    Connecting,
    Initializing,
    /// Initialised; colour commands are accepted
    Ready,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Scanning => "scanning",
            LinkState::Connecting => "connecting",
            LinkState::Initializing => "initializing",
            LinkState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// A colour with every channel in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Rgb {
    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    /// Scales one channel into a byte. Out of range values are clamped, NaN becomes 0.
    pub fn channel_to_byte(value: f32) -> u8 {
        (value.clamp(0.0, 1.0) * 255.0) as u8
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        [
            Self::channel_to_byte(self.red),
            Self::channel_to_byte(self.green),
            Self::channel_to_byte(self.blue),
        ]
    }

    /// Colour packed as `0xRRGGBB`, the format addressable pixels take.
    pub fn packed(&self) -> u32 {
        let [r, g, b] = self.to_bytes();
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    pub fn from_bytes(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: f32::from(red) / 255.0,
            green: f32::from(green) / 255.0,
            blue: f32::from(blue) / 255.0,
        }
    }
}

/// Pulls a MAC address out of a platform device identifier.
///
/// Device ids look like `/org/bluez/hci0/dev_78_5E_A2_01_02_03` on Linux or
/// `BluetoothLE#BluetoothLEaa:bb:cc:dd:ee:ff-78:5e:a2:01:02:03` on Windows;
/// the last MAC-shaped group wins.
pub fn extract_mac_address(device_id: &str) -> Option<String> {
    static MAC: OnceLock<Regex> = OnceLock::new();
    let re = MAC.get_or_init(|| {
        Regex::new(r"([0-9A-Fa-f]{2}[:_-]){5}[0-9A-Fa-f]{2}").expect("MAC pattern is valid")
    });
    re.find_iter(device_id)
        .last()
        .map(|m| m.as_str().replace(['_', '-'], ":").to_uppercase())
}
