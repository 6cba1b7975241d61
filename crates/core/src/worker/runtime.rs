//! Task-per-event runtime.
//!
//! Lifecycle events reach the worker over an mpsc queue; each one is
//! dispatched on its own tokio task and answered through a oneshot channel.
//! Independent fetches proceed concurrently; activation serializes itself
//! through the worker's activation lock.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use super::{ActivationReport, CacheStatus, FetchDisposition, LifecycleSignal, Message, MessageOutcome, ServiceWorker};
use crate::Error;
use crate::cache::CacheStorage;
use crate::http::Request;
use crate::network::Network;

const EVENT_QUEUE_DEPTH: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, Error>>;

enum Event {
    Install(Reply<usize>),
    Activate(Reply<ActivationReport>),
    Fetch(Request, Reply<FetchDisposition>),
    Message(Message, Reply<MessageOutcome>),
    Status(Reply<CacheStatus>),
}

/// Cloneable sender side of a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    events: mpsc::Sender<Event>,
    signals: broadcast::Sender<LifecycleSignal>,
}

/// Start the event loop for `worker` on the current tokio runtime.
pub fn spawn<S, N>(worker: Arc<ServiceWorker<S, N>>) -> WorkerHandle
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    let (events, mut queue) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let signals = worker.signals.clone();

    tokio::spawn(async move {
        while let Some(event) = queue.recv().await {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.dispatch(event).await });
        }
        tracing::debug!("worker event loop stopped");
    });

    WorkerHandle { events, signals }
}

impl<S: CacheStorage, N: Network> ServiceWorker<S, N> {
    async fn dispatch(&self, event: Event) {
        // A dropped reply receiver means the caller gave up; nothing to do.
        match event {
            Event::Install(reply) => {
                let _ = reply.send(self.install().await);
            }
            Event::Activate(reply) => {
                let _ = reply.send(self.activate().await);
            }
            Event::Fetch(request, reply) => {
                let _ = reply.send(self.handle_fetch(&request).await);
            }
            Event::Message(message, reply) => {
                let _ = reply.send(self.handle_message(message).await);
            }
            Event::Status(reply) => {
                let _ = reply.send(self.status().await);
            }
        }
    }
}

impl WorkerHandle {
    pub async fn install(&self) -> Result<usize, Error> {
        self.call(Event::Install).await
    }

    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.call(Event::Activate).await
    }

    pub async fn fetch(&self, request: Request) -> Result<FetchDisposition, Error> {
        self.call(|reply| Event::Fetch(request, reply)).await
    }

    pub async fn message(&self, message: Message) -> Result<MessageOutcome, Error> {
        self.call(|reply| Event::Message(message, reply)).await
    }

    pub async fn status(&self) -> Result<CacheStatus, Error> {
        self.call(Event::Status).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleSignal> {
        self.signals.subscribe()
    }

    async fn call<T>(&self, event: impl FnOnce(Reply<T>) -> Event) -> Result<T, Error> {
        let (reply, response) = oneshot::channel();
        self.events.send(event(reply)).await.map_err(|_| Error::WorkerClosed)?;
        response.await.map_err(|_| Error::WorkerClosed)?
    }
}
