//! Port registry
//!
//! Owns the open port sessions of one service. Every port has exactly one
//! session task (the single writer) and any number of observers.

use super::events::PortEvent;
use super::port::{PortHandle, PortSession, SessionConfig};
use crate::communication::{Connector, SerialConnector};
use crate::firmware::{ControllerState, FirmwareKind};
use crate::streaming::Transition;
use gcodelink_core::{
    CommandSource, ConnectionError, EventBus, EventBusConfig, PortSnapshot, Result,
    SubscriptionId, WorkflowCommand,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Open ports by name
pub struct PortRegistry {
    connector: Arc<dyn Connector>,
    defaults: SessionConfig,
    ports: RwLock<HashMap<String, PortHandle>>,
}

impl PortRegistry {
    /// Create a registry opening ports through `connector`
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_config(connector, SessionConfig::default())
    }

    /// Create a registry with session defaults
    pub fn with_config(connector: impl Connector + 'static, defaults: SessionConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            defaults,
            ports: RwLock::new(HashMap::new()),
        }
    }

    /// Registry over real serial ports
    pub fn serial(defaults: SessionConfig) -> Self {
        Self::with_config(SerialConnector::new(), defaults)
    }

    /// Session defaults applied to every opened port
    pub fn defaults(&self) -> &SessionConfig {
        &self.defaults
    }

    /// Snapshots of every open port, sorted by name
    pub fn list_ports(&self) -> Vec<PortSnapshot> {
        self.prune();
        let mut ports: Vec<PortSnapshot> =
            self.ports.read().values().map(PortHandle::snapshot).collect();
        ports.sort_by(|a, b| a.port.cmp(&b.port));
        ports
    }

    /// Open a port and start its session
    ///
    /// Must be called from within a tokio runtime.
    pub fn open_port(
        &self,
        name: &str,
        baud_rate: u32,
        firmware: FirmwareKind,
    ) -> Result<PortHandle> {
        let mut ports = self.ports.write();
        if let Some(existing) = ports.get(name) {
            if !existing.is_closed() {
                tracing::warn!("Port {} is already open", name);
                return Err(ConnectionError::PortInUse {
                    port: name.to_string(),
                }
                .into());
            }
            ports.remove(name);
        }

        let pair = self.connector.open(name, baud_rate)?;
        let config = SessionConfig {
            baud_rate,
            firmware,
            ..self.defaults.clone()
        };
        let bus = Arc::new(EventBus::with_config(EventBusConfig {
            channel_capacity: config.event_channel_capacity,
            ..EventBusConfig::default()
        }));

        tracing::info!("Opening {} at {} baud for {}", name, baud_rate, firmware);
        let handle = PortSession::spawn(name, pair, config, bus);
        ports.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Close a port and discard everything queued on it
    pub async fn close_port(&self, name: &str) -> Result<()> {
        let handle = self
            .ports
            .write()
            .remove(name)
            .ok_or_else(|| ConnectionError::PortNotFound {
                port: name.to_string(),
            })?;
        match handle.close().await {
            Err(e) if handle.is_closed() => {
                tracing::debug!("Session for {} already ended: {}", name, e);
                Ok(())
            }
            other => other,
        }
    }

    /// Handle for an open port
    ///
    /// A port whose session has ended is removed here and reported closed.
    pub fn port(&self, name: &str) -> Result<PortHandle> {
        let handle = self
            .ports
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectionError::PortNotFound {
                port: name.to_string(),
            })?;

        if handle.is_closed() {
            self.ports.write().remove(name);
            return Err(ConnectionError::SessionClosed {
                port: name.to_string(),
            }
            .into());
        }
        Ok(handle)
    }

    /// Queue a line on a ready port; returns its sequence id
    pub async fn enqueue(&self, port: &str, text: &str, source: CommandSource) -> Result<u64> {
        self.port(port)?.enqueue(text, source).await
    }

    /// Write a realtime control byte
    pub async fn send_realtime(&self, port: &str, byte: u8) -> Result<()> {
        self.port(port)?.send_realtime(byte).await
    }

    /// Apply a workflow command
    pub async fn set_workflow_state(
        &self,
        port: &str,
        command: WorkflowCommand,
    ) -> Result<Transition> {
        self.port(port)?.set_workflow_state(command).await
    }

    /// Replace the queue with a program; returns the number of lines queued
    pub async fn load_program(&self, port: &str, name: &str, gcode: &str) -> Result<usize> {
        self.port(port)?.load_program(name, gcode).await
    }

    /// Drop the loaded program
    pub async fn unload_program(&self, port: &str) -> Result<()> {
        self.port(port)?.unload_program().await
    }

    /// Clear a latched alarm
    pub async fn unlock(&self, port: &str) -> Result<()> {
        self.port(port)?.unlock().await
    }

    /// Decoded firmware state of a port
    pub async fn controller_state(&self, port: &str) -> Result<ControllerState> {
        self.port(port)?.controller_state().await
    }

    /// Register a callback for a port's events
    pub fn subscribe<F>(&self, port: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(PortEvent) + Send + Sync + 'static,
    {
        Ok(self.port(port)?.subscribe(handler))
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&self, port: &str, id: SubscriptionId) -> Result<bool> {
        Ok(self.port(port)?.unsubscribe(id))
    }

    /// Async stream of a port's events
    pub fn receiver(&self, port: &str) -> Result<broadcast::Receiver<PortEvent>> {
        Ok(self.port(port)?.receiver())
    }

    fn prune(&self) {
        let mut ports = self.ports.write();
        ports.retain(|name, handle| {
            let open = !handle.is_closed();
            if !open {
                tracing::debug!("Removing ended session for {}", name);
            }
            open
        });
    }
}

impl std::fmt::Debug for PortRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortRegistry")
            .field("ports", &self.ports.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
