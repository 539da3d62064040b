//! Async driver for the [`QueryOrchestrator`].
//!
//! One task owns the orchestrator. Triggers arrive from any number of
//! [`OrchestratorHandle`]s; each query runs as its own spawned task and sends
//! its [`Completion`] back to the owner, so the owner never waits on the
//! feature service before accepting the next trigger. Superseded queries are
//! not aborted: their completions are discarded by the generation check.

use abutters_core::error::{AbuttersError, Result};
use abutters_core::models::LngLat;
use abutters_service::SpatialQueryClient;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use crate::machine::QueryOrchestrator;
use crate::models::{Completion, QueryRequest, QueryResponse, Trigger};
use crate::publisher::{PublishedState, ResultPublisher};

/// Capacity of the trigger channel
const TRIGGER_BUFFER: usize = 64;

struct Command {
    trigger: Trigger,
    /// Receives the revision published after the trigger was handled
    ack: oneshot::Sender<u64>,
}

/// Owner task state
pub struct OrchestratorRuntime {
    machine: QueryOrchestrator,
    client: Arc<dyn SpatialQueryClient>,
    publisher: ResultPublisher,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl OrchestratorRuntime {
    /// Create a runtime and its associated handle
    pub fn new(
        client: Arc<dyn SpatialQueryClient>,
        pid_field: impl Into<String>,
    ) -> (Self, OrchestratorHandle) {
        let (command_tx, commands) = mpsc::channel(TRIGGER_BUFFER);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let publisher = ResultPublisher::new();

        let handle = OrchestratorHandle { commands: command_tx, state: publisher.subscribe() };
        let runtime = Self {
            machine: QueryOrchestrator::new(pid_field),
            client,
            publisher,
            commands,
            completions_tx,
            completions_rx,
        };

        (runtime, handle)
    }

    /// Spawn the runtime on the current tokio runtime
    pub fn spawn(
        client: Arc<dyn SpatialQueryClient>,
        pid_field: impl Into<String>,
    ) -> OrchestratorHandle {
        let (runtime, handle) = Self::new(client, pid_field);
        tokio::spawn(runtime.run());
        handle
    }

    /// Run until every handle is dropped (consumes self)
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                // Completions first, so a trigger never overtakes a result
                // that already arrived
                biased;

                Some(completion) = self.completions_rx.recv() => {
                    self.on_completion(completion);
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }
        tracing::debug!("Orchestrator stopped");
    }

    fn on_command(&mut self, command: Command) {
        let Command { trigger, ack } = command;

        // Rejections are already recorded in last_error
        if let Ok(Some(request)) = self.machine.handle_trigger(trigger) {
            self.dispatch(request);
        }

        let revision = self.publisher.publish(self.machine.snapshot());
        let _ = ack.send(revision);
    }

    fn on_completion(&mut self, completion: Completion) {
        match self.machine.handle_completion(completion) {
            Ok(()) => {
                self.publisher.publish(self.machine.snapshot());
            }
            Err(AbuttersError::StaleResult { .. }) => {
                // A buffer discarded for a replaced selection still settles
                // its query
                if self.machine.phase() != self.publisher.current().phase {
                    self.publisher.publish(self.machine.snapshot());
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to apply completion"),
        }
    }

    fn dispatch(&self, request: QueryRequest) {
        let client = Arc::clone(&self.client);
        let completions = self.completions_tx.clone();

        tracing::debug!(
            query = %request.kind(),
            generation = %request.generation(),
            "Issuing query"
        );

        tokio::spawn(async move {
            let result = execute(client.as_ref(), &request).await;
            // Fails only once the runtime has stopped
            let _ = completions.send(Completion::new(request, result));
        });
    }
}

async fn execute(client: &dyn SpatialQueryClient, request: &QueryRequest) -> Result<QueryResponse> {
    match request {
        QueryRequest::Contains { point, .. } => {
            client.query_contains(*point).await.map(QueryResponse::Selection)
        }
        QueryRequest::Attribute { predicate, .. } => {
            client.query_attribute(predicate).await.map(QueryResponse::Selection)
        }
        QueryRequest::Intersects { polygon, .. } => {
            client.query_intersects(polygon).await.map(QueryResponse::Buffer)
        }
    }
}

/// Cloneable handle for feeding triggers and observing state
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<PublishedState>,
}

impl OrchestratorHandle {
    /// Send a trigger, returning the revision published once it was handled.
    ///
    /// Queries the trigger issued may still be in flight; see
    /// [`OrchestratorHandle::settled`].
    pub async fn send(&self, trigger: Trigger) -> Result<u64> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command { trigger, ack })
            .await
            .map_err(|_| AbuttersError::OrchestratorClosed)?;
        done.await.map_err(|_| AbuttersError::OrchestratorClosed)
    }

    pub async fn locate(&self, point: LngLat) -> Result<u64> {
        self.send(Trigger::Locate(point)).await
    }

    pub async fn search_pid(&self, pid: impl Into<String>) -> Result<u64> {
        self.send(Trigger::SearchPid(pid.into())).await
    }

    pub async fn apply_buffer(&self, feet: f64) -> Result<u64> {
        self.send(Trigger::ApplyBuffer(feet)).await
    }

    pub async fn clear(&self) -> Result<u64> {
        self.send(Trigger::Clear).await
    }

    pub fn subscribe(&self) -> watch::Receiver<PublishedState> {
        self.state.clone()
    }

    /// Latest published snapshot
    pub fn current(&self) -> PublishedState {
        self.state.borrow().clone()
    }

    /// Wait for the first snapshot at or after `revision` with no query
    /// outstanding
    pub async fn settled(&self, revision: u64) -> Result<PublishedState> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| s.revision >= revision && !s.phase.is_resolving())
            .await
            .map_err(|_| AbuttersError::OrchestratorClosed)?
            .clone();
        Ok(state)
    }

    /// Send a trigger and wait until everything it issued has resolved
    pub async fn submit(&self, trigger: Trigger) -> Result<PublishedState> {
        let revision = self.send(trigger).await?;
        self.settled(revision).await
    }
}
