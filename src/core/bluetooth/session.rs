//! Per-connection GATT handles and the write lock
//! The headphones expose two services with UUID 0x1802 and two characteristics
//! with UUID 0x2a06; only the pair that accepts a notification subscription
//! carries the command channel, so discovery probes until one does.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error, info, warn};

use crate::core::bluetooth::transport::Transport;
use crate::core::bluetooth::types::DeviceIdentity;

/// The command characteristic together with the buffer its notifications land in
pub struct CommandChannel<T: Transport> {
    pub characteristic: T::Characteristic,
    pub buffer: Arc<T::PacketBuffer>,
}

impl<T: Transport> Clone for CommandChannel<T> {
    fn clone(&self) -> Self {
        Self {
            characteristic: self.characteristic.clone(),
            buffer: self.buffer.clone(),
        }
    }
}

/// Handles discovered on the current connection, filled lazily.
pub struct SessionHandles<T: Transport> {
    services: Option<Vec<T::Service>>,
    channel: Option<CommandChannel<T>>,
}

impl<T: Transport> Default for SessionHandles<T> {
    fn default() -> Self {
        Self {
            services: None,
            channel: None,
        }
    }
}

impl<T: Transport> SessionHandles<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the headphone services, discovering them on first use.
    pub async fn services(
        &mut self,
        transport: &T,
        connection: &T::Connection,
        identity: &DeviceIdentity,
    ) -> Option<Vec<T::Service>> {
        if self.services.is_none() {
            match transport
                .discover_services(connection, identity.service_uuid)
                .await
            {
                Ok(services) if !services.is_empty() => {
                    info!("Discovered {} candidate service(s)", services.len());
                    self.services = Some(services);
                }
                Ok(_) => warn!("Service {} not found on headphones", identity.service_uuid),
                Err(e) => warn!("Service discovery failed: {}", e),
            }
        }
        self.services.clone()
    }

    /// Returns the command channel, probing characteristics on first use.
    pub async fn channel(
        &mut self,
        transport: &T,
        connection: &T::Connection,
        identity: &DeviceIdentity,
    ) -> Option<CommandChannel<T>> {
        if self.channel.is_none() {
            let Some(services) = self.services(transport, connection, identity).await else {
                error!("Could not obtain headphone services");
                return None;
            };
            self.channel = Self::probe(transport, &services, identity).await;
        }
        self.channel.clone()
    }

    async fn probe(
        transport: &T,
        services: &[T::Service],
        identity: &DeviceIdentity,
    ) -> Option<CommandChannel<T>> {
        for service in services {
            let characteristics = match transport
                .discover_characteristics(service, identity.characteristic_uuid)
                .await
            {
                Ok(characteristics) => characteristics,
                Err(e) => {
                    debug!("Skipping service: {}", e);
                    continue;
                }
            };
            for characteristic in characteristics {
                match transport.enable_notify(&characteristic).await {
                    Ok(buffer) => {
                        info!("Found command characteristic");
                        return Some(CommandChannel {
                            characteristic,
                            buffer: Arc::new(buffer),
                        });
                    }
                    // No CCCD on this one, it's the wrong characteristic
                    Err(e) => debug!("Skipping characteristic: {}", e),
                }
            }
        }
        error!("No characteristic on the headphones accepted notifications");
        None
    }

    pub fn is_cached(&self) -> bool {
        self.services.is_some() || self.channel.is_some()
    }

    /// Forgets every handle of the previous connection.
    pub fn invalidate(&mut self) {
        self.services = None;
        self.channel = None;
    }
}

/// Proof of holding the [`WriteLock`]; only the holder can release it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteTicket(u64);

/// At most one write may be waiting for its response.
#[derive(Debug, Default)]
pub struct WriteLock {
    /// Ticket of the current holder, 0 while free
    holder: AtomicU64,
    issued: AtomicU64,
}

impl WriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock if it is free. Never waits.
    pub fn try_acquire(&self) -> Option<WriteTicket> {
        let ticket = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        self.holder
            .compare_exchange(0, ticket, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| WriteTicket(ticket))
    }

    /// Releases the lock if `ticket` still holds it.
    pub fn release(&self, ticket: WriteTicket) -> bool {
        self.holder
            .compare_exchange(ticket.0, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn holds(&self, ticket: WriteTicket) -> bool {
        self.holder.load(Ordering::Acquire) == ticket.0
    }

    /// Frees the lock whoever holds it. Used when the connection is gone.
    pub fn force_release(&self) {
        self.holder.store(0, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.holder.load(Ordering::Acquire) != 0
    }
}
