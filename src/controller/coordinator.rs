//! Fetch coordination and the mutation gateway
//!
//! [`Controller`] dispatches every resolved descriptor as its own task and
//! funnels all outcomes through one settlement channel. Settlements re-enter
//! shared state at a single point ([`Controller::absorb`]), where the epoch
//! check decides whether they still matter.

use super::descriptor::ResourceDescriptor;
use super::store::{
    AggregateStatus, ErrorInfo, FetchState, FetchStatus, ResultStore, SEALED_EPOCH,
};
use crate::api::{ApiError, ApiRequest, ApiResponse, Method, Transport};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A write operation against one declared resource.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub method: Method,
    /// Extra query parameters, e.g. `id=<file id>` for a scoped delete.
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl MutationRequest {
    pub fn delete_by_id(id_param: &str, id: &str) -> Self {
        Self {
            method: Method::Delete,
            query: vec![(id_param.to_string(), id.to_string())],
            body: None,
        }
    }
}

/// Synchronous rejection of a mutation intent.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MutateError {
    #[error("unknown resource `{0}`")]
    UnknownResource(String),
    #[error("controller is closed")]
    Closed,
}

/// What the view learns when it drains the controller.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// A fetch settled and the store changed; re-render.
    ResourceSettled { name: String, status: FetchStatus },
    /// A mutation succeeded; the scoped refetch is already in flight.
    MutationSucceeded { name: String },
    /// A mutation failed; existing data for the resource is untouched.
    MutationFailed { name: String, error: ErrorInfo },
}

/// One settled request re-entering the controller.
enum Settlement {
    Fetch {
        name: String,
        epoch: u64,
        outcome: Result<ApiResponse, ApiError>,
    },
    Mutation {
        name: String,
        outcome: Result<ApiResponse, ApiError>,
    },
}

/// Asynchronous multi-resource controller; one instance per mounted view.
pub struct Controller<T: Transport> {
    transport: Arc<T>,
    descriptors: Vec<ResourceDescriptor>,
    store: ResultStore,
    epoch_counter: u64,
    closed: bool,
    tx: UnboundedSender<Settlement>,
    rx: UnboundedReceiver<Settlement>,
}

impl<T: Transport> Controller<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            transport,
            descriptors: Vec::new(),
            store: ResultStore::new(),
            epoch_counter: 0,
            closed: false,
            tx,
            rx,
        }
    }

    /// Dispatch every descriptor concurrently under a fresh epoch. An empty
    /// list is a no-op whose aggregate is immediately `Ready`.
    pub fn run_all(&mut self, descriptors: Vec<ResourceDescriptor>) {
        if self.closed {
            return;
        }

        let epoch = self.next_epoch();
        let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
        self.store.begin(&names, epoch);
        self.descriptors = descriptors;

        for descriptor in self.descriptors.clone() {
            self.spawn_fetch(descriptor, epoch);
        }
    }

    /// Refetch one declared resource under a fresh epoch, leaving every other
    /// slot and its epoch untouched. Returns false for unknown names.
    pub fn refetch(&mut self, name: &str) -> bool {
        if self.closed {
            return false;
        }
        let Some(descriptor) = self
            .descriptors
            .iter()
            .find(|d| d.name == name)
            .cloned()
        else {
            return false;
        };

        let epoch = self.next_epoch();
        self.store.begin_one(name, epoch);
        self.spawn_fetch(descriptor, epoch);
        true
    }

    /// Execute a write against a declared resource's path. Fire-and-forget:
    /// the outcome arrives later as a `MutationSucceeded`/`MutationFailed`
    /// event, and a success schedules the scoped refetch itself.
    pub fn mutate(&mut self, name: &str, request: MutationRequest) -> Result<(), MutateError> {
        if self.closed {
            return Err(MutateError::Closed);
        }
        let Some(descriptor) = self
            .descriptors
            .iter()
            .find(|d| d.name == name)
            .cloned()
        else {
            return Err(MutateError::UnknownResource(name.to_string()));
        };

        tracing::info!("mutate: {} {}", request.method, descriptor.path);

        let api_request = ApiRequest::new(request.method, descriptor.path)
            .with_query(request.query);
        let api_request = match request.body {
            Some(body) => api_request.with_body(body),
            None => api_request,
        };

        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            let outcome = transport.request(api_request).await;
            let _ = tx.send(Settlement::Mutation { name, outcome });
        });

        Ok(())
    }

    /// Invalidate the current epochs and stop absorbing settlements. The
    /// network layer may still complete in-flight requests; their arrival is
    /// a no-op. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
        self.store.seal();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn aggregate(&self) -> AggregateStatus {
        self.store.aggregate()
    }

    pub fn read(&self, name: &str) -> Option<&FetchState> {
        self.store.read(name)
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Absorb at most one meaningful settlement without blocking. Stale
    /// settlements are consumed and dropped along the way. `None` means
    /// nothing renderable happened.
    pub fn poll_settlement(&mut self) -> Option<ControllerEvent> {
        loop {
            let settlement = self.rx.try_recv().ok()?;
            if let Some(event) = self.absorb(settlement) {
                return Some(event);
            }
        }
    }

    /// Await the next meaningful settlement. Callers should check
    /// [`Controller::aggregate`] first; with nothing in flight this pends
    /// indefinitely.
    pub async fn next_settlement(&mut self) -> Option<ControllerEvent> {
        loop {
            let settlement = self.rx.recv().await?;
            if let Some(event) = self.absorb(settlement) {
                return Some(event);
            }
        }
    }

    /// The single point where settled requests re-enter shared state.
    fn absorb(&mut self, settlement: Settlement) -> Option<ControllerEvent> {
        if self.closed {
            return None;
        }

        match settlement {
            Settlement::Fetch {
                name,
                epoch,
                outcome,
            } => {
                if !self.store.apply(&name, epoch, outcome) {
                    tracing::debug!("discarding stale response for `{}`", name);
                    return None;
                }
                let status = self.store.read(&name)?.status;
                Some(ControllerEvent::ResourceSettled { name, status })
            }
            Settlement::Mutation { name, outcome } => match outcome {
                Ok(_) => {
                    self.refetch(&name);
                    Some(ControllerEvent::MutationSucceeded { name })
                }
                Err(error) => Some(ControllerEvent::MutationFailed {
                    error: ErrorInfo::from(&error),
                    name,
                }),
            },
        }
    }

    fn spawn_fetch(&self, descriptor: ResourceDescriptor, epoch: u64) {
        let request = ApiRequest::get(descriptor.path).with_query(descriptor.query);
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let name = descriptor.name;

        tokio::spawn(async move {
            let outcome = transport.request(request).await;
            // The receiver is gone only if the controller was dropped;
            // nothing to deliver to in that case.
            let _ = tx.send(Settlement::Fetch {
                name,
                epoch,
                outcome,
            });
        });
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch_counter += 1;
        debug_assert!(self.epoch_counter < SEALED_EPOCH);
        self.epoch_counter
    }
}
