//! Hub worker.
//!
//! A single task owns the [`HubDriver`] and processes [`HubCommand`]s one at
//! a time, which is what keeps presence updates mutually exclusive. Sends
//! never block the worker: every connection has an unbounded outbox drained
//! by its own writer task, so a slow socket only delays itself.
//!
//! A send into a dropped outbox means the connection is already gone. The
//! frame is discarded and the driver is told via
//! [`HubEvent::DeliveryFailed`] so later broadcasts skip it.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use axum::extract::ws::Message;
use parley_core::{
    ConnectionId, HubAction, HubDriver, HubError, HubEvent, IdentityResolver, LogLevel, Payload,
    Presence, RenameRequest,
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{error::ServerError, wire};

/// Queue of frames waiting to be written to one connection.
pub type Outbox = mpsc::UnboundedSender<Message>;

/// Commands accepted by the hub worker.
#[derive(Debug)]
pub enum HubCommand {
    /// A transport connection opened
    Connect {
        /// Handle from [`HubHandle::next_connection_id`]
        connection_id: ConnectionId,
        /// Remote address as reported by the transport
        remote_addr: String,
        /// Requested path
        path: String,
        /// Where frames for this connection go
        outbox: Outbox,
    },

    /// A frame arrived
    Message {
        /// Sender
        connection_id: ConnectionId,
        /// Frame contents
        payload: Payload,
    },

    /// A transport connection closed
    Disconnect {
        /// Connection that closed
        connection_id: ConnectionId,
    },

    /// Control-plane rename/join
    Rename {
        /// Validated request
        request: RenameRequest,
        /// Completion signal for the HTTP handler
        reply: oneshot::Sender<Result<(), HubError>>,
    },
}

/// Cloneable handle for submitting commands to the hub worker.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
    next_id: Arc<AtomicU64>,
}

impl HubHandle {
    /// Allocate a fresh connection handle.
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Report a newly opened connection.
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        remote_addr: String,
        path: String,
        outbox: Outbox,
    ) -> Result<(), ServerError> {
        self.submit(HubCommand::Connect { connection_id, remote_addr, path, outbox }).await
    }

    /// Report an inbound frame.
    pub async fn message(
        &self,
        connection_id: ConnectionId,
        payload: Payload,
    ) -> Result<(), ServerError> {
        self.submit(HubCommand::Message { connection_id, payload }).await
    }

    /// Report a closed connection.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), ServerError> {
        self.submit(HubCommand::Disconnect { connection_id }).await
    }

    /// Apply a rename/join and wait until its notices are queued.
    pub async fn rename(&self, request: RenameRequest) -> Result<(), ServerError> {
        let (reply, done) = oneshot::channel();
        self.submit(HubCommand::Rename { request, reply }).await?;

        done.await.map_err(|_| ServerError::Shutdown)?.map_err(ServerError::from)
    }

    async fn submit(&self, command: HubCommand) -> Result<(), ServerError> {
        self.commands.send(command).await.map_err(|_| ServerError::Shutdown)
    }
}

/// The hub worker state.
pub struct Hub<R>
where
    R: IdentityResolver,
{
    /// Presence and routing rules
    driver: HubDriver<R>,
    /// Connection ID → outbound queue
    outboxes: HashMap<ConnectionId, Outbox>,
}

impl<R> Hub<R>
where
    R: IdentityResolver,
{
    /// Wrap a driver.
    pub fn new(driver: HubDriver<R>) -> Self {
        Self { driver, outboxes: HashMap::new() }
    }

    /// Start the worker task.
    ///
    /// `capacity` bounds the command queue; submitters wait when it is full.
    /// The worker stops once every [`HubHandle`] is dropped.
    pub fn spawn(self, capacity: usize) -> (HubHandle, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(capacity.max(1));
        let handle = HubHandle { commands, next_id: Arc::new(AtomicU64::new(1)) };

        (handle, tokio::spawn(self.run(receiver)))
    }

    /// Presence state, for inspection.
    pub fn presence(&self) -> &Presence {
        self.driver.presence()
    }

    async fn run(mut self, mut commands: mpsc::Receiver<HubCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }

        tracing::info!("hub worker stopped");
    }

    /// Process one command to completion.
    pub fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { connection_id, remote_addr, path, outbox } => {
                self.outboxes.entry(connection_id).or_insert(outbox);
                self.dispatch(HubEvent::Connected { connection_id, remote_addr, path });
            },
            HubCommand::Message { connection_id, payload } => {
                self.dispatch(HubEvent::MessageReceived { connection_id, payload });
            },
            HubCommand::Disconnect { connection_id } => {
                self.dispatch(HubEvent::Disconnected { connection_id });
                self.outboxes.remove(&connection_id);
            },
            HubCommand::Rename { request, reply } => {
                let result = self.process(HubEvent::RenameRequested(request));
                if reply.send(result).is_err() {
                    tracing::debug!("rename requester went away before completion");
                }
            },
        }
    }

    fn dispatch(&mut self, event: HubEvent) {
        if let Err(e) = self.process(event) {
            tracing::warn!("hub event rejected: {}", e);
        }
    }

    fn process(&mut self, event: HubEvent) -> Result<(), HubError> {
        let actions = self.driver.process_event(event)?;

        for connection_id in self.execute(actions) {
            let actions = self.driver.process_event(HubEvent::DeliveryFailed { connection_id })?;
            self.execute(actions);
        }

        Ok(())
    }

    /// Execute actions, returning connections whose outbox was gone.
    fn execute(&mut self, actions: Vec<HubAction>) -> Vec<ConnectionId> {
        let mut unreachable = Vec::new();

        for action in actions {
            match action {
                HubAction::Send { connection_id, message } => {
                    let frame = match wire::encode(&message) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::error!("failed to encode message for {}: {}", connection_id, e);
                            continue;
                        },
                    };

                    let delivered = self
                        .outboxes
                        .get(&connection_id)
                        .is_some_and(|outbox| outbox.send(frame).is_ok());

                    if !delivered && !unreachable.contains(&connection_id) {
                        tracing::debug!("dropping delivery to closed connection {}", connection_id);
                        unreachable.push(connection_id);
                    }
                },

                HubAction::Close { connection_id, code, reason } => {
                    tracing::info!("closing connection {} ({}): {}", connection_id, code.code(), reason);
                    if let Some(outbox) = self.outboxes.remove(&connection_id) {
                        // Writer may already be gone; nothing left to close then.
                        let _ = outbox.send(wire::close(code, &reason));
                    }
                },

                HubAction::Log { level, message } => match level {
                    LogLevel::Debug => tracing::debug!("{}", message),
                    LogLevel::Info => tracing::info!("{}", message),
                    LogLevel::Warn => tracing::warn!("{}", message),
                    LogLevel::Error => tracing::error!("{}", message),
                },
            }
        }

        unreachable
    }
}
