//! Advertisement scanning with bluest

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bluest::{Adapter, AdvertisingDevice, Device};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use log::{debug, info};

use crate::core::bluetooth::transport::TransportError;
use crate::core::bluetooth::types::{Advertisement, extract_mac_address};

/// Devices seen while scanning, keyed by their platform id
pub type DeviceRegistry = Arc<Mutex<HashMap<String, Device>>>;

pub struct BluetoothScanner {
    adapter: Adapter,
    devices: DeviceRegistry,
}

impl BluetoothScanner {
    pub fn new(adapter: Adapter, devices: DeviceRegistry) -> Self {
        Self { adapter, devices }
    }

    /// Streams advertisements for `timeout`, remembering each advertiser so it
    /// can be connected to by id later.
    pub async fn scan(
        &self,
        timeout: Duration,
    ) -> Result<BoxStream<'_, Advertisement<String>>, TransportError> {
        info!("Starting bluetooth scan for {:?}", timeout);
        let scan_stream = self.adapter.scan(&[]).await?;
        let devices = self.devices.clone();

        let adverts = scan_stream
            .map(move |found| Self::register(&devices, found))
            .take_until(tokio::time::sleep(timeout));
        Ok(adverts.boxed())
    }

    fn register(devices: &DeviceRegistry, found: AdvertisingDevice) -> Advertisement<String> {
        let id = found.device.id().to_string();
        let name = found
            .adv_data
            .local_name
            .clone()
            .or_else(|| found.device.name().ok());
        debug!("Found device - ID: {}, Name: {:?}, RSSI: {:?}", id, name, found.rssi);

        let advert = Advertisement {
            address: id.clone(),
            name,
            connectable: found.adv_data.is_connectable,
            mac: extract_mac_address(&id),
            rssi: found.rssi,
        };

        let mut devices = match devices.lock() {
            Ok(devices) => devices,
            Err(poisoned) => poisoned.into_inner(),
        };
        devices.insert(id, found.device);
        advert
    }
}
