//! Bluetooth Low Energy transport built on `btleplug`.
//!
//! Scans for the peripheral matching the locomotive's address, connects,
//! discovers services, and forwards notifications from the vendor notify
//! characteristic into the session pipeline.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use btleplug::api::{
    BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::TransportError;
use crate::transport::{Transport, TransportResult};
use crate::types::LocomotiveAddress;

/// Default scan window when resolving the peripheral.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval for discovered peripherals during a scan.
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Configuration for the BLE transport.
#[derive(Debug, Clone)]
pub struct BleConfig {
    /// Address of the locomotive to resolve.
    pub address: LocomotiveAddress,
    /// How long to scan before giving up on discovery.
    pub scan_timeout: Duration,
}

impl BleConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub const fn new(address: LocomotiveAddress) -> Self {
        Self {
            address,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }

    /// Sets the scan timeout.
    #[must_use]
    pub const fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }
}

/// BLE transport for a LionChief locomotive.
pub struct BleTransport {
    config: BleConfig,
    adapter: Option<Adapter>,
    peripheral: Option<Peripheral>,
    notify_task: Option<JoinHandle<()>>,
}

impl BleTransport {
    /// Creates a new BLE transport for the given address.
    #[must_use]
    pub const fn new(address: LocomotiveAddress) -> Self {
        Self::with_config(BleConfig::new(address))
    }

    /// Creates a new BLE transport with explicit configuration.
    #[must_use]
    pub const fn with_config(config: BleConfig) -> Self {
        Self {
            config,
            adapter: None,
            peripheral: None,
            notify_task: None,
        }
    }

    /// Returns the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &BleConfig {
        &self.config
    }

    /// Scans until the peripheral with the target address shows up, or the
    /// scan window closes.
    async fn resolve_peripheral(
        adapter: &Adapter,
        address: &LocomotiveAddress,
        scan_timeout: Duration,
    ) -> TransportResult<Peripheral> {
        let target = BDAddr::from(address.octets());
        let filter = ScanFilter {
            services: vec![address.service_uuid()],
        };
        adapter.start_scan(filter).await?;

        let deadline = tokio::time::Instant::now() + scan_timeout;
        let mut found = None;
        loop {
            for peripheral in adapter.peripherals().await? {
                if peripheral.address() == target {
                    found = Some(peripheral);
                    break;
                }
            }
            if found.is_some() || tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(SCAN_POLL_INTERVAL).await;
        }

        if let Err(e) = adapter.stop_scan().await {
            tracing::debug!("failed to stop scan: {e}");
        }

        found.ok_or_else(|| TransportError::DeviceNotFound {
            address: address.to_string(),
        })
    }

    fn find_characteristic(
        peripheral: &Peripheral,
        uuid: Uuid,
    ) -> TransportResult<Characteristic> {
        peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(TransportError::CharacteristicNotFound { uuid })
    }
}

impl Transport for BleTransport {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if self.peripheral.is_some() {
                return Ok(());
            }

            tracing::info!("scanning for locomotive {}", self.config.address);
            let manager = Manager::new().await?;
            let adapter = manager
                .adapters()
                .await?
                .into_iter()
                .next()
                .ok_or(TransportError::NoAdapter)?;

            let peripheral =
                Self::resolve_peripheral(&adapter, &self.config.address, self.config.scan_timeout)
                    .await?;
            peripheral.connect().await?;
            peripheral.discover_services().await?;

            tracing::info!("connected to locomotive {}", self.config.address);
            self.adapter = Some(adapter);
            self.peripheral = Some(peripheral);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(task) = self.notify_task.take() {
                task.abort();
            }
            self.adapter = None;

            // Handles are cleared before releasing the link so the
            // transport reads as disconnected even if release fails.
            if let Some(peripheral) = self.peripheral.take() {
                tracing::info!("disconnecting from locomotive {}", self.config.address);
                peripheral.disconnect().await?;
            }
            Ok(())
        })
    }

    fn write(
        &mut self,
        characteristic: Uuid,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let peripheral = self
                .peripheral
                .as_ref()
                .ok_or(TransportError::NotConnected)?;
            let target = Self::find_characteristic(peripheral, characteristic)?;
            tracing::trace!("write {} -> {}", hex::encode(&data), characteristic);
            peripheral
                .write(&target, &data, WriteType::WithoutResponse)
                .await?;
            Ok(())
        })
    }

    fn subscribe(
        &mut self,
        characteristic: Uuid,
        frames: mpsc::Sender<Bytes>,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let peripheral = self
                .peripheral
                .clone()
                .ok_or(TransportError::NotConnected)?;
            let target = Self::find_characteristic(&peripheral, characteristic)?;
            peripheral.subscribe(&target).await?;
            let mut notifications = peripheral.notifications().await?;

            // The forwarder owns the sender; when the notification stream
            // ends the sender drops, closing the channel downstream.
            let task = tokio::spawn(async move {
                while let Some(notification) = notifications.next().await {
                    if notification.uuid != characteristic {
                        continue;
                    }
                    tracing::trace!("notify <- {}", hex::encode(&notification.value));
                    if frames.send(Bytes::from(notification.value)).await.is_err() {
                        break;
                    }
                }
                tracing::debug!("notification stream ended");
            });
            self.notify_task = Some(task);
            Ok(())
        })
    }

    fn read(
        &mut self,
        characteristic: Uuid,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Vec<u8>>> + Send + '_>> {
        Box::pin(async move {
            let peripheral = self
                .peripheral
                .as_ref()
                .ok_or(TransportError::NotConnected)?;
            let target = Self::find_characteristic(peripheral, characteristic)?;
            Ok(peripheral.read(&target).await?)
        })
    }

    fn is_connected(&self) -> bool {
        self.peripheral.is_some()
    }
}

impl Drop for BleTransport {
    fn drop(&mut self) {
        if let Some(task) = self.notify_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> LocomotiveAddress {
        "FC:1F:C3:9F:A5:4A".parse().unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = BleConfig::new(address());
        assert_eq!(config.scan_timeout, DEFAULT_SCAN_TIMEOUT);
    }

    #[test]
    fn test_config_builder() {
        let config = BleConfig::new(address()).scan_timeout(Duration::from_secs(3));
        assert_eq!(config.scan_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_new_transport_is_disconnected() {
        let transport = BleTransport::new(address());
        assert!(!transport.is_connected());
    }
}
