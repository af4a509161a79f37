use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::bluetooth::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_RESPONSE_PACKETS, DEFAULT_POST_CONNECT_DELAY_MS,
    DEFAULT_PRE_WRITE_DELAY_MS, DEFAULT_RESPONSE_POLL_MS, DEFAULT_SCAN_DURATION_MS,
    DEFAULT_SCAN_SETTLE_MS, DEFAULT_SUPERVISION_INTERVAL_MS, DEFAULT_WRITE_SETTLE_MS,
};

/// Timings and policies of the link to the headphones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// How long each scan listens for advertisements.
    pub scan_duration_ms: u64,
    /// How long the scan keeps running after the scan window before it is stopped.
    /// Connecting while the headphones are still mid advertising burst tends to fail.
    pub scan_settle_ms: u64,
    /// Timeout of a single connection attempt.
    pub connect_timeout_ms: u64,
    /// Delay between connecting and sending the init command.
    pub post_connect_delay_ms: u64,
    /// Delay before a colour command is written.
    pub pre_write_delay_ms: u64,
    /// Delay between writing a command and reading its response.
    pub write_settle_ms: u64,
    /// Delay between two reads of the packet buffer.
    pub response_poll_ms: u64,
    /// Maximum number of packet reads per write.
    pub max_response_packets: usize,
    /// Interval of the connection supervision loop.
    pub supervision_interval_ms: u64,
    /// Free the write lock when a write gets no response at all.
    /// Off by default: the lock then stays held until the link drops.
    pub release_write_lock_on_silence: bool,
    /// Only accept advertisers whose MAC starts with the headphones' OUI.
    pub match_address_prefix: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            scan_duration_ms: DEFAULT_SCAN_DURATION_MS,
            scan_settle_ms: DEFAULT_SCAN_SETTLE_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            post_connect_delay_ms: DEFAULT_POST_CONNECT_DELAY_MS,
            pre_write_delay_ms: DEFAULT_PRE_WRITE_DELAY_MS,
            write_settle_ms: DEFAULT_WRITE_SETTLE_MS,
            response_poll_ms: DEFAULT_RESPONSE_POLL_MS,
            max_response_packets: DEFAULT_MAX_RESPONSE_PACKETS,
            supervision_interval_ms: DEFAULT_SUPERVISION_INTERVAL_MS,
            release_write_lock_on_silence: false,
            match_address_prefix: false,
        }
    }
}

impl LinkConfig {
    pub fn scan_duration(&self) -> Duration {
        Duration::from_millis(self.scan_duration_ms)
    }

    pub fn scan_settle(&self) -> Duration {
        Duration::from_millis(self.scan_settle_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn post_connect_delay(&self) -> Duration {
        Duration::from_millis(self.post_connect_delay_ms)
    }

    pub fn pre_write_delay(&self) -> Duration {
        Duration::from_millis(self.pre_write_delay_ms)
    }

    pub fn write_settle(&self) -> Duration {
        Duration::from_millis(self.write_settle_ms)
    }

    pub fn response_poll(&self) -> Duration {
        Duration::from_millis(self.response_poll_ms)
    }

    pub fn supervision_interval(&self) -> Duration {
        Duration::from_millis(self.supervision_interval_ms)
    }
}
