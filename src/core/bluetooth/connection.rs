//! bluest implementation of the link transport
//! This module handles connecting to the headphones, GATT discovery and
//! characteristic I/O on top of the platform Bluetooth stack.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use bluest::{Adapter, Characteristic, Device, Service, Uuid};
use futures_util::stream::BoxStream;
use log::{debug, info};

use crate::core::bluetooth::constants::PACKET_BUFFER_CAPACITY;
use crate::core::bluetooth::notification::{self, PacketBuffer};
use crate::core::bluetooth::scanner::{BluetoothScanner, DeviceRegistry};
use crate::core::bluetooth::transport::{Transport, TransportError};
use crate::core::bluetooth::types::Advertisement;

/// Link transport backed by the default Bluetooth adapter
pub struct BluestTransport {
    adapter: Adapter,
    devices: DeviceRegistry,
    scanner: BluetoothScanner,
    /// Device of the current (or last) connection
    connected_device: Mutex<Option<Device>>,
}

impl BluestTransport {
    /// Opens the default adapter and waits until it is powered.
    pub async fn new() -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");

        let devices: DeviceRegistry = Arc::new(Mutex::new(HashMap::new()));
        let scanner = BluetoothScanner::new(adapter.clone(), devices.clone());
        Ok(Self {
            adapter,
            devices,
            scanner,
            connected_device: Mutex::new(None),
        })
    }

    fn current_device(&self) -> Option<Device> {
        match self.connected_device.lock() {
            Ok(device) => device.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn known_device(&self, id: &str) -> Option<Device> {
        let devices = match self.devices.lock() {
            Ok(devices) => devices,
            Err(poisoned) => poisoned.into_inner(),
        };
        devices.get(id).cloned()
    }
}

#[async_trait::async_trait]
impl Transport for BluestTransport {
    type Address = String;
    type Connection = Device;
    type Service = Service;
    type Characteristic = Characteristic;
    type PacketBuffer = PacketBuffer;

    async fn scan(
        &self,
        timeout: Duration,
    ) -> Result<BoxStream<'_, Advertisement<String>>, TransportError> {
        self.scanner.scan(timeout).await
    }

    async fn stop_scan(&self) {
        // bluest stops scanning when the scan stream is dropped
        debug!("Bluetooth scan stopped.");
    }

    async fn connect(&self, address: &String, timeout: Duration) -> Result<Device, TransportError> {
        let device = self
            .known_device(address)
            .ok_or_else(|| TransportError::UnknownDevice(address.clone()))?;
        info!("Initiating connection to {}...", address);

        if !device.is_connected().await {
            tokio::time::timeout(timeout, self.adapter.connect_device(&device))
                .await
                .map_err(|_| TransportError::Timeout(timeout))??;
        }

        let mut current = match self.connected_device.lock() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = Some(device.clone());
        Ok(device)
    }

    async fn connected(&self) -> bool {
        match self.current_device() {
            Some(device) => device.is_connected().await,
            None => false,
        }
    }

    async fn discover_services(
        &self,
        connection: &Device,
        service_uuid: Uuid,
    ) -> Result<Vec<Service>, TransportError> {
        let services = connection.discover_services_with_uuid(service_uuid).await?;
        debug!("Found {} service(s) with UUID {}", services.len(), service_uuid);
        Ok(services)
    }

    async fn discover_characteristics(
        &self,
        service: &Service,
        characteristic_uuid: Uuid,
    ) -> Result<Vec<Characteristic>, TransportError> {
        let characteristics = service
            .discover_characteristics_with_uuid(characteristic_uuid)
            .await?;
        Ok(characteristics)
    }

    async fn enable_notify(
        &self,
        characteristic: &Characteristic,
    ) -> Result<PacketBuffer, TransportError> {
        notification::subscribe(characteristic.clone(), PACKET_BUFFER_CAPACITY).await
    }

    async fn write(&self, characteristic: &Characteristic, data: &[u8]) -> Result<(), TransportError> {
        if self.current_device().is_none() {
            return Err(TransportError::NotConnected);
        }
        characteristic.write(data).await?;
        Ok(())
    }

    async fn read_incoming_packet(&self, buffer: &PacketBuffer) -> Vec<u8> {
        buffer.read_packet()
    }
}
