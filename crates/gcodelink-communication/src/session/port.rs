//! Port session
//!
//! One tokio task per open port owns the sender, feeder, workflow and
//! controller state. Requests arrive on an mpsc inbox and are answered on
//! oneshot channels; firmware lines arrive on the transport's event stream.
//! Nothing else touches the transport, so writes are never interleaved.
//!
//! The loop is biased: inbox requests (including close) are served before
//! transport events, and both before the periodic tick that polls status
//! and watches for stalls.

use super::events::PortEvent;
use crate::communication::{TransportEvent, TransportPair};
use crate::firmware::{
    Acknowledgment, ControllerState, FirmwareKind, Handshake, LineParser, ParsedEvent,
};
use crate::streaming::{
    program_lines, Feeder, FlowControl, Sender, StartConditions, Transition, Workflow,
};
use crate::streaming::realtime::RealtimeCommand;
use chrono::Utc;
use gcodelink_core::{
    ActiveProgram, CommandSource, ConnectionError, ControllerError, DisconnectReason, Error,
    EventBus, EventFilter, PortSnapshot, QueueCounters, QueuedCommand, Result, SubscriptionId,
    WorkflowCommand, WorkflowState,
};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;

/// Tick period used for stall detection when status polling is disabled
const IDLE_TICK: Duration = Duration::from_millis(250);

/// Session tuning
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Baud rate the port is opened at
    pub baud_rate: u32,
    /// Firmware family on the other end
    pub firmware: FirmwareKind,
    /// Flow control override; `None` uses the firmware default and adopts
    /// the receive buffer size the firmware advertises
    pub flow_control: Option<FlowControl>,
    /// Status query period; zero disables polling
    pub status_poll_interval: Duration,
    /// How long the oldest in-flight command may wait before a stall is reported
    pub stall_timeout: Duration,
    /// Broadcast channel capacity for async receivers
    pub event_channel_capacity: usize,
    /// Request inbox capacity
    pub inbox_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            firmware: FirmwareKind::default(),
            flow_control: None,
            status_poll_interval: Duration::from_millis(250),
            stall_timeout: Duration::from_secs(10),
            event_channel_capacity: 256,
            inbox_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Flow control the session starts with
    pub fn effective_flow_control(&self) -> FlowControl {
        self.flow_control
            .unwrap_or_else(|| self.firmware.default_flow_control())
    }
}

type Reply<T> = oneshot::Sender<Result<T>>;

/// Request handled by the session task
pub(crate) enum SessionCommand {
    Enqueue {
        text: String,
        source: CommandSource,
        reply: Reply<u64>,
    },
    Realtime {
        byte: u8,
        reply: Reply<()>,
    },
    Workflow {
        command: WorkflowCommand,
        reply: Reply<Transition>,
    },
    LoadProgram {
        name: String,
        gcode: String,
        reply: Reply<usize>,
    },
    UnloadProgram {
        reply: Reply<()>,
    },
    Unlock {
        reply: Reply<()>,
    },
    ControllerState {
        reply: Reply<ControllerState>,
    },
    Close {
        reply: Reply<()>,
    },
}

/// Cloneable handle to a running port session
#[derive(Clone)]
pub struct PortHandle {
    name: String,
    inbox: mpsc::Sender<SessionCommand>,
    bus: Arc<EventBus<PortEvent>>,
    snapshot: Arc<RwLock<PortSnapshot>>,
}

impl PortHandle {
    /// Port name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the session task has ended
    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    /// Current view of the port
    pub fn snapshot(&self) -> PortSnapshot {
        let mut snapshot = self.snapshot.read().clone();
        snapshot.connected = self.bus.subscriber_count() + self.bus.receiver_count();
        snapshot
    }

    /// Event bus the session publishes on
    pub fn bus(&self) -> &Arc<EventBus<PortEvent>> {
        &self.bus
    }

    /// Register a callback for every event
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(PortEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(EventFilter::All, handler)
    }

    /// Remove a callback
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Async stream of events
    pub fn receiver(&self) -> broadcast::Receiver<PortEvent> {
        self.bus.receiver()
    }

    /// Queue one line; returns its sequence id
    pub async fn enqueue(&self, text: impl Into<String>, source: CommandSource) -> Result<u64> {
        let text = text.into();
        self.request(|reply| SessionCommand::Enqueue {
            text,
            source,
            reply,
        })
        .await
    }

    /// Write a realtime control byte
    pub async fn send_realtime(&self, byte: u8) -> Result<()> {
        self.request(|reply| SessionCommand::Realtime { byte, reply })
            .await
    }

    /// Apply a workflow command
    pub async fn set_workflow_state(&self, command: WorkflowCommand) -> Result<Transition> {
        self.request(|reply| SessionCommand::Workflow { command, reply })
            .await
    }

    /// Replace the queue with a program; returns the number of lines queued
    pub async fn load_program(
        &self,
        name: impl Into<String>,
        gcode: impl Into<String>,
    ) -> Result<usize> {
        let (name, gcode) = (name.into(), gcode.into());
        self.request(|reply| SessionCommand::LoadProgram { name, gcode, reply })
            .await
    }

    /// Drop the loaded program and anything queued
    pub async fn unload_program(&self) -> Result<()> {
        self.request(|reply| SessionCommand::UnloadProgram { reply })
            .await
    }

    /// Clear a latched alarm and send the firmware's unlock line
    pub async fn unlock(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Unlock { reply }).await
    }

    /// Decoded firmware state
    pub async fn controller_state(&self) -> Result<ControllerState> {
        self.request(|reply| SessionCommand::ControllerState { reply })
            .await
    }

    /// Close the port and wait for the session to finish
    pub async fn close(&self) -> Result<()> {
        self.snapshot.write().pending = true;
        self.request(|reply| SessionCommand::Close { reply }).await
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> SessionCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(build(reply))
            .await
            .map_err(|_| self.closed())?;
        response.await.map_err(|_| self.closed())?
    }

    fn closed(&self) -> Error {
        ConnectionError::SessionClosed {
            port: self.name.clone(),
        }
        .into()
    }
}

impl std::fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortHandle")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// State owned by the session task
pub struct PortSession {
    name: String,
    config: SessionConfig,
    parser: LineParser,
    sender: Sender,
    feeder: Feeder,
    /// Lines that bypass the workflow gate (handshake, unlock)
    direct: VecDeque<QueuedCommand>,
    workflow: Workflow,
    controller: ControllerState,
    counters: QueueCounters,
    ready: bool,
    active_program: Option<ActiveProgram>,
    /// Marlin error waiting for the `ok` that follows it, keyed by the
    /// sequence id of the command it was reported against
    deferred_error: Option<(u64, String)>,
    /// First sequence id counted toward the loaded program's progress
    counted_from: u64,
    /// Sequence id of the command last reported as stalled
    stalled: Option<u64>,
    /// Transport failure seen while writing
    fault: Option<String>,
    bus: Arc<EventBus<PortEvent>>,
    snapshot: Arc<RwLock<PortSnapshot>>,
    inbox: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl PortSession {
    /// Start a session task over an opened transport
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        name: impl Into<String>,
        pair: TransportPair,
        config: SessionConfig,
        bus: Arc<EventBus<PortEvent>>,
    ) -> PortHandle {
        let name = name.into();
        let (inbox_tx, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let snapshot = Arc::new(RwLock::new(PortSnapshot {
            port: name.clone(),
            baud_rate: config.baud_rate,
            firmware: config.firmware.to_string(),
            connected: 0,
            ready: false,
            pending: true,
            queue_total: 0,
            queue_executed: 0,
            outstanding: 0,
            queued: 0,
            workflow: WorkflowState::Idle,
            active_program: None,
        }));

        let session = PortSession {
            name: name.clone(),
            parser: LineParser::new(config.firmware),
            sender: Sender::new(pair.transport, config.effective_flow_control()),
            feeder: Feeder::new(),
            direct: VecDeque::new(),
            workflow: Workflow::new(),
            controller: ControllerState::new(),
            counters: QueueCounters::default(),
            ready: false,
            active_program: None,
            deferred_error: None,
            counted_from: 0,
            stalled: None,
            fault: None,
            bus: Arc::clone(&bus),
            snapshot: Arc::clone(&snapshot),
            inbox,
            events: pair.events,
            config,
        };
        tokio::spawn(session.run());

        PortHandle {
            name,
            inbox: inbox_tx,
            bus,
            snapshot,
        }
    }

    async fn run(mut self) {
        tracing::info!(
            "Session for {} started ({}, {})",
            self.name,
            self.config.firmware,
            self.sender.flow_control()
        );

        if let Err(e) = self.handshake() {
            self.record_fault(&e);
        }
        self.publish_snapshot();

        let period = if self.config.status_poll_interval.is_zero() {
            IDLE_TICK
        } else {
            self.config.status_poll_interval
        };
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let reason = loop {
            if let Some(reason) = self.fault.take() {
                break DisconnectReason::Error(reason);
            }

            tokio::select! {
                biased;

                request = self.inbox.recv() => match request {
                    Some(SessionCommand::Close { reply }) => {
                        let _ = reply.send(self.sender.close());
                        break DisconnectReason::UserRequested;
                    }
                    Some(request) => self.handle_request(request),
                    None => break DisconnectReason::UserRequested,
                },

                event = self.events.recv() => match event {
                    Some(TransportEvent::Line(line)) => self.handle_line(&line),
                    Some(TransportEvent::Error(e)) => break DisconnectReason::Error(e),
                    Some(TransportEvent::Closed) | None => break DisconnectReason::ConnectionLost,
                },

                _ = ticker.tick() => self.on_tick(),
            }

            if let Err(e) = self.pump() {
                self.record_fault(&e);
            }
            self.publish_snapshot();
        };

        self.teardown(reason);
    }

    fn handshake(&mut self) -> Result<()> {
        match self.config.firmware.handshake() {
            Handshake::Realtime(byte) => self.sender.write_realtime(byte),
            Handshake::Line(text) => {
                self.send_direct(text);
                self.pump()
            }
        }
    }

    fn handle_request(&mut self, request: SessionCommand) {
        match request {
            SessionCommand::Enqueue {
                text,
                source,
                reply,
            } => {
                let _ = reply.send(self.enqueue(text, source));
            }
            SessionCommand::Realtime { byte, reply } => {
                let _ = reply.send(self.send_realtime(byte));
            }
            SessionCommand::Workflow { command, reply } => {
                let _ = reply.send(self.set_workflow_state(command));
            }
            SessionCommand::LoadProgram { name, gcode, reply } => {
                let _ = reply.send(self.load_program(name, &gcode));
            }
            SessionCommand::UnloadProgram { reply } => {
                self.unload_program();
                let _ = reply.send(Ok(()));
            }
            SessionCommand::Unlock { reply } => {
                let _ = reply.send(self.unlock());
            }
            SessionCommand::ControllerState { reply } => {
                let _ = reply.send(Ok(self.controller.clone()));
            }
            SessionCommand::Close { reply } => {
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn enqueue(&mut self, text: String, source: CommandSource) -> Result<u64> {
        if !self.ready {
            tracing::warn!("Rejected '{}' on {}: not ready", text, self.name);
            return Err(ControllerError::NotReady {
                port: self.name.clone(),
            }
            .into());
        }
        self.check_line(&text)?;

        let sequence_id = self.feeder.enqueue(text, source);
        self.counters.record_enqueued(1);
        self.publish_counters();
        Ok(sequence_id)
    }

    fn check_line(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() || text.contains(['\n', '\r']) {
            return Err(ControllerError::CommandRejected {
                reason: "a command must be a single non-empty line".to_string(),
            }
            .into());
        }
        let length = text.len() + 1;
        if !self.sender.fits(length) {
            return Err(ControllerError::CommandTooLong {
                length,
                capacity: self.sender.flow_control().capacity().unwrap_or(length),
            }
            .into());
        }
        Ok(())
    }

    fn send_realtime(&mut self, byte: u8) -> Result<()> {
        let firmware = self.config.firmware;
        if !firmware.accepts_realtime(byte) {
            return Err(ControllerError::Unsupported {
                firmware: firmware.to_string(),
                feature: format!("realtime byte 0x{:02X}", byte),
            }
            .into());
        }

        if let Err(e) = self.sender.write_realtime(byte) {
            self.record_fault(&e);
            return Err(e);
        }
        if byte == RealtimeCommand::SoftReset.byte() {
            tracing::info!("Soft reset on {}", self.name);
            self.discard_buffers();
        }
        Ok(())
    }

    fn set_workflow_state(&mut self, command: WorkflowCommand) -> Result<Transition> {
        if command == WorkflowCommand::Start && !self.ready {
            return Err(ControllerError::NotReady {
                port: self.name.clone(),
            }
            .into());
        }

        let conditions = StartConditions {
            queued: self.feeder.len(),
            ready: self.ready,
        };
        let transition = self.workflow.apply(command, conditions).map_err(|e| {
            tracing::warn!("Workflow {} rejected on {}: {}", command, self.name, e);
            e
        })?;

        if command == WorkflowCommand::Stop {
            let dropped = self.feeder.clear();
            tracing::info!("Stopped {}; dropped {} queued commands", self.name, dropped);
            self.publish_counters();
        }
        self.publish_transition(transition);
        Ok(transition)
    }

    fn load_program(&mut self, name: String, gcode: &str) -> Result<usize> {
        if self.workflow.state() != WorkflowState::Idle {
            return Err(ControllerError::InvalidStateTransition {
                current: self.workflow.state().to_string(),
                requested: "load program".to_string(),
            }
            .into());
        }

        let lines = program_lines(gcode);
        for line in &lines {
            self.check_line(line)?;
        }

        self.feeder.clear();
        self.counters.reset();
        self.counted_from = self.feeder.last_sequence_id() + 1;
        self.counters.record_enqueued(lines.len() as u64);
        let total_lines = self.feeder.enqueue_all(lines, CommandSource::Program);
        tracing::info!("Loaded '{}' on {}: {} lines", name, self.name, total_lines);
        self.active_program = Some(ActiveProgram {
            name,
            total_lines,
            loaded_at: Utc::now(),
        });
        self.publish_counters();
        Ok(total_lines)
    }

    fn unload_program(&mut self) {
        self.feeder.clear();
        if let Some(program) = self.active_program.take() {
            tracing::info!("Unloaded '{}' from {}", program.name, self.name);
        }
        self.publish_counters();
    }

    fn unlock(&mut self) -> Result<()> {
        if self.workflow.unlock() {
            tracing::info!("Alarm cleared on {}", self.name);
        }
        self.send_direct(self.config.firmware.unlock_command());
        Ok(())
    }

    /// Queue a line that goes out regardless of the workflow state
    fn send_direct(&mut self, text: &str) {
        let sequence_id = self.feeder.next_sequence_id();
        self.direct
            .push_back(QueuedCommand::new(sequence_id, text, CommandSource::System));
        self.counters.record_enqueued(1);
    }

    fn handle_line(&mut self, line: &str) {
        let event = self.parser.parse(line);
        match &event {
            ParsedEvent::Unrecognized { raw } => {
                tracing::debug!("Unrecognized line from {}: {}", self.name, raw)
            }
            _ => tracing::debug!("< {}", line),
        }

        self.controller.apply(&event);
        self.bus.publish(PortEvent::Parsed(event.clone()));

        match &event {
            ParsedEvent::Startup(banner) if banner.boot => {
                tracing::info!(
                    "{} {} booted on {}",
                    banner.firmware,
                    banner.version,
                    self.name
                );
                self.discard_buffers();
            }
            ParsedEvent::Option(options) => {
                if let Some(advertised) = options.rx_buffer {
                    if self.config.flow_control.is_none() {
                        self.sender.adopt_capacity(advertised);
                    }
                }
            }
            ParsedEvent::Alarm(alarm) => {
                tracing::warn!("Alarm on {}: {}", self.name, alarm);
                let dropped = self.feeder.clear();
                if dropped > 0 {
                    tracing::info!("Dropped {} queued commands after alarm", dropped);
                }
                if let Some(transition) = self.workflow.alarm(alarm.to_string()) {
                    self.publish_transition(transition);
                }
                self.publish_counters();
            }
            ParsedEvent::StatusReport(_) | ParsedEvent::ReceiveReport(_) => {
                if self.controller.machine_hold() {
                    if let Some(transition) = self.workflow.hold() {
                        tracing::info!("Firmware hold paused {}", self.name);
                        self.publish_transition(transition);
                    }
                }
            }
            ParsedEvent::Action { action } => self.host_action(action),
            _ => {}
        }

        if !self.ready && event.is_ready_signal() {
            self.ready = true;
            tracing::info!("Port {} is ready", self.name);
            self.bus.publish(PortEvent::Ready);
        }

        match event.acknowledgment() {
            Some(Acknowledgment::Ok) => {
                let deferred = self.take_deferred_error();
                self.settle(deferred);
            }
            Some(Acknowledgment::Error(message)) => {
                if self.config.firmware.error_precedes_ok() {
                    match self.sender.in_flight().next() {
                        Some(oldest) => {
                            self.deferred_error = Some((oldest.sequence_id, message));
                        }
                        None => tracing::debug!(
                            "Unpaired error on {} with nothing in flight: {}",
                            self.name,
                            message
                        ),
                    }
                } else {
                    self.settle(Some(message));
                }
            }
            None => {}
        }
    }

    /// Deferred error for the oldest in-flight command, if it is still the one
    /// the error was reported against
    fn take_deferred_error(&mut self) -> Option<String> {
        let (sequence_id, message) = self.deferred_error.take()?;
        let oldest = self.sender.in_flight().next().map(|c| c.sequence_id);
        if oldest == Some(sequence_id) {
            Some(message)
        } else {
            tracing::debug!(
                "Dropping stale error on {} for command #{}: {}",
                self.name,
                sequence_id,
                message
            );
            None
        }
    }

    fn host_action(&mut self, action: &str) {
        let transition = match action {
            "pause" => self.workflow.hold(),
            "resume" => self.workflow.resume().ok(),
            "cancel" => {
                self.feeder.clear();
                self.workflow.force_idle()
            }
            other => {
                tracing::debug!("Ignoring host action '{}' on {}", other, self.name);
                None
            }
        };
        if let Some(transition) = transition {
            tracing::info!("Host action '{}' on {}", action, self.name);
            self.publish_transition(transition);
        }
    }

    /// Settle the oldest in-flight command, failed when `error` is set
    fn settle(&mut self, error: Option<String>) {
        let Some(command) = self.sender.acknowledge() else {
            tracing::debug!("Acknowledgment on {} with nothing in flight", self.name);
            return;
        };
        if command.sequence_id >= self.counted_from {
            self.counters.record_executed();
        } else {
            tracing::debug!(
                "Acknowledged #{} on {} predates the loaded program",
                command.sequence_id,
                self.name
            );
        }

        match error {
            None => {
                self.bus.publish(PortEvent::CommandAcknowledged(command));
            }
            Some(message) => {
                tracing::warn!(
                    "Command '{}' failed on {}: {}",
                    command.text,
                    self.name,
                    message
                );
                self.bus
                    .publish(PortEvent::CommandFailed { command, message });
            }
        }
        self.publish_counters();
    }

    /// Forget everything the firmware discarded on reset
    fn discard_buffers(&mut self) {
        let flushed = self.sender.flush().len();
        let dropped = self.feeder.clear() + self.direct.len();
        self.direct.clear();
        self.deferred_error = None;
        self.stalled = None;
        if flushed + dropped > 0 {
            tracing::info!(
                "Discarded {} in-flight and {} queued commands on {}",
                flushed,
                dropped,
                self.name
            );
        }
        if let Some(transition) = self.workflow.force_idle() {
            self.publish_transition(transition);
        }
        self.publish_counters();
    }

    /// Move queued lines into the sender while flow control allows
    fn pump(&mut self) -> Result<()> {
        let mut sent = false;

        loop {
            let from_direct = !self.direct.is_empty();
            let length = if from_direct {
                self.direct.front().map(QueuedCommand::byte_length)
            } else if self.workflow.is_running() {
                self.feeder.peek().map(QueuedCommand::byte_length)
            } else {
                None
            };
            let Some(length) = length else { break };
            if !self.sender.can_send(length) {
                break;
            }

            let command = if from_direct {
                self.direct.pop_front()
            } else {
                self.feeder.pop()
            };
            let Some(command) = command else { break };
            let in_flight = self.sender.transmit(command)?.clone();
            self.bus.publish(PortEvent::CommandSent(in_flight));
            sent = true;
        }

        if sent {
            self.publish_counters();
        }

        if self.workflow.is_running()
            && self.feeder.is_empty()
            && self.direct.is_empty()
            && self.sender.outstanding() == 0
        {
            if let Some(transition) = self.workflow.complete() {
                tracing::info!("Queue complete on {}", self.name);
                self.publish_transition(transition);
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if self.ready && !self.config.status_poll_interval.is_zero() {
            if let Some(byte) = self.config.firmware.status_poll_byte() {
                if let Err(e) = self.sender.write_realtime(byte) {
                    self.record_fault(&e);
                    return;
                }
            }
        }
        self.check_stall();
    }

    fn check_stall(&mut self) {
        let Some(oldest) = self.sender.in_flight().next().cloned() else {
            self.stalled = None;
            return;
        };
        let waited = (Utc::now() - oldest.sent_at).to_std().unwrap_or_default();
        if waited < self.config.stall_timeout {
            return;
        }

        if self.stalled != Some(oldest.sequence_id) {
            self.stalled = Some(oldest.sequence_id);
            let waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(
                "Queue on {} stalled: '{}' unacknowledged for {} ms",
                self.name,
                oldest.text,
                waited_ms
            );
            self.bus.publish(PortEvent::QueueStalled {
                command: oldest,
                waited_ms,
            });
        }

        if self.workflow.state() == WorkflowState::Idle {
            let flushed = self.sender.flush().len();
            tracing::info!(
                "Flushed {} stale in-flight commands on idle {}",
                flushed,
                self.name
            );
            self.stalled = None;
            self.deferred_error = None;
            self.publish_counters();
        }
    }

    fn record_fault(&mut self, error: &Error) {
        if error.is_connection_error() {
            tracing::error!("Transport failure on {}: {}", self.name, error);
            self.fault.get_or_insert_with(|| error.to_string());
        }
    }

    fn teardown(mut self, reason: DisconnectReason) {
        self.inbox.close();
        let in_flight = self.sender.flush().len();
        let queued = self.feeder.clear() + self.direct.len();
        if let Err(e) = self.sender.close() {
            tracing::debug!("Closing {} failed: {}", self.name, e);
        }

        match &reason {
            DisconnectReason::UserRequested => tracing::info!("Closed {}", self.name),
            other => tracing::warn!("Lost {}: {}", self.name, other),
        }
        if in_flight + queued > 0 {
            tracing::info!(
                "Discarded {} in-flight and {} queued commands on {}",
                in_flight,
                queued,
                self.name
            );
        }

        {
            let mut snapshot = self.snapshot.write();
            snapshot.ready = false;
            snapshot.pending = false;
            snapshot.outstanding = 0;
            snapshot.queued = 0;
            snapshot.workflow = WorkflowState::Idle;
        }
        self.bus.publish(PortEvent::Disconnected { reason });
    }

    fn publish_transition(&self, transition: Transition) {
        self.bus.publish(PortEvent::WorkflowChanged {
            from: transition.from,
            to: transition.to,
        });
    }

    fn publish_counters(&self) {
        self.bus.publish(PortEvent::QueueCounters {
            total: self.counters.total,
            executed: self.counters.executed,
            outstanding: self.sender.outstanding(),
            pending: self.feeder.len() + self.direct.len(),
        });
    }

    fn publish_snapshot(&self) {
        let mut snapshot = self.snapshot.write();
        snapshot.ready = self.ready;
        snapshot.pending = false;
        snapshot.queue_total = self.counters.total;
        snapshot.queue_executed = self.counters.executed;
        snapshot.outstanding = self.sender.outstanding();
        snapshot.queued = self.feeder.len() + self.direct.len();
        snapshot.workflow = self.workflow.state();
        snapshot.active_program = self.active_program.clone();
    }
}
