//! Link manager for the headphones
//! This module owns the connection lifecycle: scanning, connecting,
//! initialising, the write/response cycle and recovery after the link drops.

use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::sync::{Mutex, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::link_config::LinkConfig;
use crate::core::bluetooth::commands::HeadphoneCommand;
use crate::core::bluetooth::response::{ParsedResponse, parse_responses};
use crate::core::bluetooth::session::{CommandChannel, SessionHandles, WriteLock};
use crate::core::bluetooth::transport::Transport;
use crate::core::bluetooth::types::{DeviceIdentity, LinkState, Rgb};
use crate::core::indicator::Indicator;

/// Manages the link to one pair of headphones
pub struct LinkManager<T: Transport> {
    transport: T,
    identity: DeviceIdentity,
    config: LinkConfig,
    /// Current lifecycle state, observable through [`LinkManager::subscribe`]
    state: watch::Sender<LinkState>,
    /// Addresses seen advertising, in discovery order
    discovered: Mutex<Vec<T::Address>>,
    /// Active connection; `None` while disconnected
    connection: Mutex<Option<T::Connection>>,
    session: Mutex<SessionHandles<T>>,
    write_lock: WriteLock,
    last_responses: Mutex<Vec<Vec<u8>>>,
    shutdown: CancellationToken,
}

impl<T: Transport> LinkManager<T> {
    /// Creates a new LinkManager for the YOWU headphones
    pub fn new(transport: T, config: LinkConfig) -> Self {
        Self::with_identity(transport, config, DeviceIdentity::HEADPHONES)
    }

    pub fn with_identity(transport: T, config: LinkConfig, identity: DeviceIdentity) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        Self {
            transport,
            identity,
            config,
            state,
            discovered: Mutex::new(Vec::new()),
            connection: Mutex::new(None),
            session: Mutex::new(SessionHandles::new()),
            write_lock: WriteLock::new(),
            last_responses: Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Receives every state transition
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    pub fn is_write_locked(&self) -> bool {
        self.write_lock.is_held()
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_cached()
    }

    pub async fn discovered_addresses(&self) -> Vec<T::Address> {
        self.discovered.lock().await.clone()
    }

    pub async fn clear_discovered(&self) {
        self.discovered.lock().await.clear();
    }

    /// Frames captured after the most recent write
    pub async fn last_responses(&self) -> Vec<Vec<u8>> {
        self.last_responses.lock().await.clone()
    }

    pub async fn last_response(&self) -> ParsedResponse {
        let frames = self.last_responses.lock().await;
        let parsed = parse_responses(frames.as_slice());
        if let Ok(json) = serde_json::to_string(&parsed) {
            debug!("Last response: {}", json);
        }
        parsed
    }

    /// Colour last reported by the headphones, if the last response carried one
    pub async fn last_color(&self) -> Option<Rgb> {
        self.last_response().await.last_color
    }

    /// Token cancelled by [`LinkManager::stop`]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Ends the supervision loop at its next suspension point.
    pub fn stop(&self) {
        info!("Stopping link supervision");
        self.shutdown.cancel();
    }

    /// Supervision loop: checks the link every `supervision_interval` and
    /// reconnects when it is gone. Returns once [`LinkManager::stop`] is called.
    pub async fn run(&self) {
        info!(
            "Link supervision started (every {:?})",
            self.config.supervision_interval()
        );
        while !self.shutdown.is_cancelled() {
            // A tick always runs to completion so no write is abandoned mid-flight
            self.supervise().await;
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = sleep(self.config.supervision_interval()) => {}
            }
        }
        info!("Link supervision stopped");
    }

    /// One supervision tick. Returns the state the link ends up in.
    pub async fn supervise(&self) -> LinkState {
        if !self.transport.connected().await {
            self.mark_disconnected().await;
            self.setup().await;
        } else if self.state() == LinkState::Initializing {
            // Connected but the init command went unanswered last time
            info!("Retrying headphone initialisation");
            self.initialize().await;
        }
        self.state()
    }

    /// Scan, connect and initialise. Returns true once the link is ready.
    pub async fn setup(&self) -> bool {
        if !self.scan().await {
            self.set_state(LinkState::Disconnected);
            return false;
        }
        if !self.connect().await {
            self.set_state(LinkState::Disconnected);
            return false;
        }
        self.set_state(LinkState::Initializing);
        sleep(self.config.post_connect_delay()).await;
        self.initialize().await
    }

    /// Sends the init command. Moves the link to `Ready` when it is answered.
    pub async fn initialize(&self) -> bool {
        if self.write(&HeadphoneCommand::Initialize.to_bytes()).await {
            self.set_state(LinkState::Ready);
            info!("Headphones initialised, link ready");
            true
        } else {
            warn!("Headphones did not acknowledge initialisation");
            false
        }
    }

    /// Sets the headphone colour, mirroring it on `indicator` first.
    ///
    /// Only a `Ready` link accepts colours; the indicator is updated either way.
    /// Returns false when nothing was written or the write failed. The
    /// supervision loop restores the link, so callers can simply try again later.
    pub async fn set_color(&self, color: Rgb, indicator: Option<&dyn Indicator>) -> bool {
        let command = HeadphoneCommand::SetColor(color).to_bytes();
        sleep(self.config.pre_write_delay()).await;
        if let Some(indicator) = indicator {
            if let Err(e) = indicator.show(color.packed()) {
                debug!("Indicator update failed: {}", e);
            }
        }
        if self.state() != LinkState::Ready {
            return false;
        }
        self.write(&command).await
    }

    /// Scans for the headphones and remembers every matching address.
    pub async fn scan(&self) -> bool {
        self.set_state(LinkState::Scanning);
        let mut adverts = match self.transport.scan(self.config.scan_duration()).await {
            Ok(adverts) => adverts,
            Err(e) => {
                warn!("Bluetooth scan failed: {}", e);
                return false;
            }
        };

        while let Some(adv) = adverts.next().await {
            if !self.identity.matches(&adv, self.config.match_address_prefix) {
                continue;
            }
            let mut discovered = self.discovered.lock().await;
            if !discovered.contains(&adv.address) {
                info!(
                    "Found headphones at {} (MAC: {:?}, RSSI: {:?})",
                    adv.address, adv.mac, adv.rssi
                );
                discovered.push(adv.address);
            }
        }

        // Let the advertising burst finish before the scan is torn down
        sleep(self.config.scan_settle()).await;
        drop(adverts);
        self.transport.stop_scan().await;
        true
    }

    /// Tries every discovered address in order until one connects.
    pub async fn connect(&self) -> bool {
        let addresses = self.discovered.lock().await.clone();
        if addresses.is_empty() {
            info!("No discovered addresses from previous scan.");
            return false;
        }

        self.set_state(LinkState::Connecting);
        let timeout = self.config.connect_timeout();
        for address in &addresses {
            match self.transport.connect(address, timeout).await {
                Ok(connection) => {
                    *self.connection.lock().await = Some(connection);
                    info!("Successfully connected to headphones at {}", address);
                    return true;
                }
                Err(e) => warn!("Failed to connect to {}: {}", address, e),
            }
        }

        // None of them answered; start over with a clean scan next time
        self.discovered.lock().await.clear();
        false
    }

    /// Writes `bytes` and waits for the headphones to answer.
    ///
    /// Fails immediately when the link is down, when another write is in
    /// flight or when no command characteristic is available.
    pub async fn write(&self, bytes: &[u8]) -> bool {
        if !self.transport.connected().await {
            // Setup owns the state until a connection exists
            if matches!(self.state(), LinkState::Initializing | LinkState::Ready) {
                self.mark_disconnected().await;
            }
            return false;
        }
        let Some(ticket) = self.write_lock.try_acquire() else {
            warn!("Attempted to write to headphones while write-locked.");
            return false;
        };
        let Some(channel) = self.command_channel().await else {
            self.write_lock.release(ticket);
            return false;
        };

        debug!("Writing {:02x?}", bytes);
        if let Err(e) = self.transport.write(&channel.characteristic, bytes).await {
            warn!("Write to headphones failed: {}", e);
            self.write_lock.release(ticket);
            return false;
        }
        sleep(self.config.write_settle()).await;

        let response = self.await_response(&channel).await;
        if !self.write_lock.holds(ticket) {
            debug!("Link was reset while waiting for the response, discarding it");
            return false;
        }
        let answered = !response.is_empty();
        *self.last_responses.lock().await = response;
        if answered {
            self.write_lock.release(ticket);
            return true;
        }

        if self.config.release_write_lock_on_silence {
            self.write_lock.release(ticket);
        }
        warn!("Headphones did not answer the write");
        false
    }

    /// Collects the burst of frames that follows a write.
    async fn await_response(&self, channel: &CommandChannel<T>) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        if self.transport.connected().await {
            let mut found_first = false;
            for _ in 0..self.config.max_response_packets {
                let packet = self.transport.read_incoming_packet(&channel.buffer).await;
                let frame = trim_padding(&packet);
                if frame.is_empty() {
                    if found_first {
                        break;
                    }
                } else {
                    debug!("Response frame {:02x?}", frame);
                    frames.push(frame.to_vec());
                    found_first = true;
                }
                sleep(self.config.response_poll()).await;
            }
        }
        frames
    }

    async fn command_channel(&self) -> Option<CommandChannel<T>> {
        let connection = self.connection.lock().await.clone()?;
        self.session
            .lock()
            .await
            .channel(&self.transport, &connection, &self.identity)
            .await
    }

    /// Moves to `Disconnected`, dropping the handles of the old connection
    /// once per transition.
    async fn mark_disconnected(&self) {
        let previous = self.state.send_replace(LinkState::Disconnected);
        if previous == LinkState::Disconnected {
            return;
        }
        info!("Link to headphones lost while {}", previous);
        self.connection.lock().await.take();
        self.invalidate_caches().await;
    }

    async fn invalidate_caches(&self) {
        self.session.lock().await.invalidate();
        self.write_lock.force_release();
    }

    fn set_state(&self, state: LinkState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Link state {} -> {}", previous, state);
        }
    }
}

/// Strips the zero padding the packet buffer leaves behind each frame.
fn trim_padding(packet: &[u8]) -> &[u8] {
    let end = packet.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &packet[..end]
}
