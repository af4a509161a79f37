//! Scripted in-memory radio for driving the link manager in tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use nekomimi_link::config::link_config::LinkConfig;
use nekomimi_link::core::bluetooth::constants::INIT_BYTES;
use nekomimi_link::core::bluetooth::{
    Advertisement, LinkManager, PacketBuffer, PacketSink, Transport, TransportError,
};
use nekomimi_link::core::indicator::Indicator;
use tokio::time::sleep;
use uuid::Uuid;

pub const HEADPHONES: &str = "YOWU-SELKIRK-3G";

/// A characteristic of the fake headphones
#[derive(Debug, Clone)]
pub struct FakeCharacteristic {
    pub id: u16,
    pub notifies: bool,
}

/// What the fake radio does and what it saw
#[derive(Default)]
pub struct FakeRadio {
    pub adverts: Vec<Advertisement<String>>,
    /// Each advertisement shows up this long after the previous one
    pub advert_delay: Duration,
    pub scan_fails: bool,
    pub unreachable: HashSet<String>,
    pub connected: bool,
    pub services_fail: bool,
    /// How long service discovery takes
    pub discovery_delay: Duration,
    /// Characteristics per service, in discovery order
    pub services: Vec<Vec<FakeCharacteristic>>,
    /// Frames the headphones answer every write with
    pub reply: Vec<Vec<u8>>,
    /// Stay silent on every connection until the init command arrives
    pub awaits_init: bool,
    initialized: bool,

    pub scans: usize,
    pub stop_scans: usize,
    pub connect_attempts: Vec<String>,
    pub notify_attempts: Vec<u16>,
    pub writes: Vec<(u16, Vec<u8>)>,
    pub reads: usize,
    sinks: HashMap<u16, PacketSink>,
    next_connection: u32,
}

impl FakeRadio {
    /// Headphones advertising at `HP-1`, with a decoy characteristic in front
    /// of the real one, answering every write with the connected marker.
    pub fn headphones() -> Self {
        FakeRadio {
            adverts: vec![
                advert("SPEAKER-9", "Some speaker", true),
                advert("HP-1", HEADPHONES, true),
            ],
            services: vec![
                vec![FakeCharacteristic { id: 1, notifies: false }],
                vec![FakeCharacteristic { id: 2, notifies: true }],
            ],
            reply: vec![b"7".to_vec()],
            ..Default::default()
        }
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.writes.iter().map(|(_, data)| data.clone()).collect()
    }
}

pub fn advert(address: &str, name: &str, connectable: bool) -> Advertisement<String> {
    Advertisement {
        address: address.to_string(),
        name: Some(name.to_string()),
        connectable,
        mac: None,
        rssi: Some(-55),
    }
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    radio: Arc<Mutex<FakeRadio>>,
}

impl FakeTransport {
    pub fn new(radio: FakeRadio) -> Self {
        Self {
            radio: Arc::new(Mutex::new(radio)),
        }
    }

    pub fn radio(&self) -> MutexGuard<'_, FakeRadio> {
        self.radio.lock().unwrap()
    }

    /// Simulates the headphones walking out of range
    pub fn drop_link(&self) {
        self.radio().connected = false;
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    type Address = String;
    type Connection = u32;
    type Service = usize;
    type Characteristic = u16;
    type PacketBuffer = PacketBuffer;

    async fn scan(
        &self,
        _timeout: Duration,
    ) -> Result<BoxStream<'_, Advertisement<String>>, TransportError> {
        let (adverts, delay) = {
            let mut radio = self.radio();
            radio.scans += 1;
            if radio.scan_fails {
                return Err(TransportError::Bluetooth("Unknown system firmware error: 30".into()));
            }
            (radio.adverts.clone(), radio.advert_delay)
        };
        Ok(stream::iter(adverts)
            .then(move |adv| async move {
                sleep(delay).await;
                adv
            })
            .boxed())
    }

    async fn stop_scan(&self) {
        self.radio().stop_scans += 1;
    }

    async fn connect(&self, address: &String, timeout: Duration) -> Result<u32, TransportError> {
        let mut radio = self.radio();
        radio.connect_attempts.push(address.clone());
        if radio.unreachable.contains(address) {
            return Err(TransportError::Timeout(timeout));
        }
        radio.connected = true;
        radio.initialized = false;
        radio.next_connection += 1;
        Ok(radio.next_connection)
    }

    async fn connected(&self) -> bool {
        self.radio().connected
    }

    async fn discover_services(
        &self,
        _connection: &u32,
        _service_uuid: Uuid,
    ) -> Result<Vec<usize>, TransportError> {
        let (services, delay) = {
            let radio = self.radio();
            let services = if radio.services_fail {
                Err(TransportError::Timeout(Duration::from_secs(10)))
            } else {
                Ok((0..radio.services.len()).collect())
            };
            (services, radio.discovery_delay)
        };
        sleep(delay).await;
        services
    }

    async fn discover_characteristics(
        &self,
        service: &usize,
        _characteristic_uuid: Uuid,
    ) -> Result<Vec<u16>, TransportError> {
        let radio = self.radio();
        Ok(radio.services[*service].iter().map(|c| c.id).collect())
    }

    async fn enable_notify(&self, characteristic: &u16) -> Result<PacketBuffer, TransportError> {
        let mut radio = self.radio();
        radio.notify_attempts.push(*characteristic);
        let notifies = radio
            .services
            .iter()
            .flatten()
            .any(|c| c.id == *characteristic && c.notifies);
        if !notifies {
            return Err(TransportError::NotifyRejected("no CCCD".into()));
        }
        let (sink, buffer) = PacketBuffer::new(64);
        radio.sinks.insert(*characteristic, sink);
        Ok(buffer)
    }

    async fn write(&self, characteristic: &u16, data: &[u8]) -> Result<(), TransportError> {
        let mut radio = self.radio();
        if !radio.connected {
            return Err(TransportError::NotConnected);
        }
        radio.writes.push((*characteristic, data.to_vec()));
        if data == INIT_BYTES.as_slice() {
            radio.initialized = true;
        }
        if radio.awaits_init && !radio.initialized {
            return Ok(());
        }
        if let Some(sink) = radio.sinks.get(characteristic) {
            for frame in &radio.reply {
                // The packet buffer hands out zero padded packets
                let mut packet = frame.clone();
                packet.extend_from_slice(&[0; 4]);
                sink.push(packet);
            }
        }
        Ok(())
    }

    async fn read_incoming_packet(&self, buffer: &PacketBuffer) -> Vec<u8> {
        self.radio().reads += 1;
        buffer.read_packet()
    }
}

/// Indicator that remembers every colour it was asked to show
#[derive(Default)]
pub struct RecordingIndicator {
    pub shown: Mutex<Vec<u32>>,
}

impl Indicator for RecordingIndicator {
    fn show(&self, color: u32) -> anyhow::Result<()> {
        self.shown.lock().unwrap().push(color);
        Ok(())
    }
}

pub fn link_with(radio: FakeRadio) -> (Arc<LinkManager<FakeTransport>>, FakeTransport) {
    link_with_config(radio, LinkConfig::default())
}

pub fn link_with_config(
    radio: FakeRadio,
    config: LinkConfig,
) -> (Arc<LinkManager<FakeTransport>>, FakeTransport) {
    let transport = FakeTransport::new(radio);
    let link = Arc::new(LinkManager::new(transport.clone(), config));
    (link, transport)
}
