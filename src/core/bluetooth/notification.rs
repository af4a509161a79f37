//! Notification buffering for the headphones
//! Notifications arrive on a stream; the link layer wants to poll them one
//! packet at a time after each write, so they are queued in a [`PacketBuffer`].

use std::sync::Mutex;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Producer half of a [`PacketBuffer`]
#[derive(Clone)]
pub struct PacketSink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl PacketSink {
    /// Queues a packet. Packets are dropped while the buffer is full.
    pub fn push(&self, packet: Vec<u8>) -> bool {
        match self.tx.try_send(packet) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(packet)) => {
                warn!("Packet buffer full, dropping {} byte packet", packet.len());
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Bounded queue of received notification packets
pub struct PacketBuffer {
    rx: Mutex<mpsc::Receiver<Vec<u8>>>,
    /// Task feeding the buffer; stopped when the buffer goes away
    pump: Option<JoinHandle<()>>,
}

impl PacketBuffer {
    /// Creates an empty buffer holding at most `capacity` packets.
    pub fn new(capacity: usize) -> (PacketSink, PacketBuffer) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            PacketSink { tx },
            PacketBuffer {
                rx: Mutex::new(rx),
                pump: None,
            },
        )
    }

    /// Ties the lifetime of the task that feeds this buffer to the buffer.
    pub fn attach(&mut self, pump: JoinHandle<()>) {
        if let Some(previous) = self.pump.replace(pump) {
            previous.abort();
        }
    }

    /// Pops the next packet, or an empty vector when nothing is queued.
    pub fn read_packet(&self) -> Vec<u8> {
        let mut rx = match self.rx.lock() {
            Ok(rx) => rx,
            Err(poisoned) => poisoned.into_inner(),
        };
        rx.try_recv().unwrap_or_default()
    }
}

impl Drop for PacketBuffer {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            debug!("Stopping notification pump");
            pump.abort();
        }
    }
}

/// Subscribes to `characteristic` and pumps its notifications into a new buffer.
///
/// Resolves once the subscription is confirmed, so characteristics without a
/// client configuration descriptor are rejected here.
#[cfg(feature = "ble")]
pub async fn subscribe(
    characteristic: bluest::Characteristic,
    capacity: usize,
) -> Result<PacketBuffer, crate::core::bluetooth::transport::TransportError> {
    use crate::core::bluetooth::transport::TransportError;
    use futures_util::StreamExt;
    use log::info;
    use tokio::sync::oneshot;

    let (sink, mut buffer) = PacketBuffer::new(capacity);
    let (ready_tx, ready_rx) = oneshot::channel();

    let pump = tokio::spawn(async move {
        let mut stream = match characteristic.notify().await {
            Ok(stream) => {
                let _ = ready_tx.send(Ok(()));
                stream
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };
        info!("Listening for headphone notifications on {}", characteristic.uuid());
        while let Some(result) = stream.next().await {
            match result {
                Ok(value) => {
                    debug!("Received packet: {:02x?}", value);
                    sink.push(value);
                }
                Err(e) => {
                    warn!("Error in notification stream: {}", e);
                    break;
                }
            }
        }
        info!("Notification stream ended");
    });

    match ready_rx.await {
        Ok(Ok(())) => {
            buffer.attach(pump);
            Ok(buffer)
        }
        Ok(Err(e)) => Err(TransportError::NotifyRejected(e.to_string())),
        Err(_) => Err(TransportError::NotifyRejected(
            "notification task ended before subscribing".to_string(),
        )),
    }
}
