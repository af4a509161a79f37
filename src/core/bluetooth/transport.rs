//! Radio capabilities the link layer needs from a BLE stack
//! The link manager only ever talks to the radio through [`Transport`], which
//! keeps the state machine independent of the platform backend.

use std::fmt;
use std::time::Duration;

use futures_util::stream::BoxStream;
use thiserror::Error;
use uuid::Uuid;

use crate::core::bluetooth::types::Advertisement;

/// Errors reported by a [`Transport`]. All of them are transient for the link.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("not connected")]
    NotConnected,
    #[error("device {0} was not seen during the last scan")]
    UnknownDevice(String),
    #[error("notifications rejected: {0}")]
    NotifyRejected(String),
    #[error("bluetooth error: {0}")]
    Bluetooth(String),
}

#[cfg(feature = "ble")]
impl From<bluest::Error> for TransportError {
    fn from(e: bluest::Error) -> Self {
        TransportError::Bluetooth(e.to_string())
    }
}

/// Capability interface of the BLE stack
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Address an advertisement is reachable at
    type Address: Clone + PartialEq + fmt::Display + fmt::Debug + Send + Sync;
    /// Handle to an established connection
    type Connection: Clone + Send + Sync;
    /// A discovered GATT service
    type Service: Clone + Send + Sync;
    /// A discovered GATT characteristic
    type Characteristic: Clone + Send + Sync;
    /// Queue of notification packets received on a subscribed characteristic
    type PacketBuffer: Send + Sync;

    /// Starts scanning. The stream ends once `timeout` has elapsed.
    async fn scan(
        &self,
        timeout: Duration,
    ) -> Result<BoxStream<'_, Advertisement<Self::Address>>, TransportError>;

    /// Ends an in-progress scan. Calling it without a scan running is a no-op.
    async fn stop_scan(&self);

    async fn connect(
        &self,
        address: &Self::Address,
        timeout: Duration,
    ) -> Result<Self::Connection, TransportError>;

    /// Whether the radio currently holds a connection
    async fn connected(&self) -> bool;

    async fn discover_services(
        &self,
        connection: &Self::Connection,
        service_uuid: Uuid,
    ) -> Result<Vec<Self::Service>, TransportError>;

    async fn discover_characteristics(
        &self,
        service: &Self::Service,
        characteristic_uuid: Uuid,
    ) -> Result<Vec<Self::Characteristic>, TransportError>;

    /// Subscribes to notifications/indications. Fails on characteristics
    /// without a client configuration descriptor.
    async fn enable_notify(
        &self,
        characteristic: &Self::Characteristic,
    ) -> Result<Self::PacketBuffer, TransportError>;

    async fn write(
        &self,
        characteristic: &Self::Characteristic,
        data: &[u8],
    ) -> Result<(), TransportError>;

    /// Pops the next queued packet, or returns an empty vector if none is waiting.
    async fn read_incoming_packet(&self, buffer: &Self::PacketBuffer) -> Vec<u8>;
}
