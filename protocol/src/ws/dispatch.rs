//! Message dispatch: from a classified frame to handler invocations.
//!
//! The reader classifies each frame and queues one [`Job`] per matching
//! handler on its connection's job queue. It never waits on handlers: a
//! separate dispatcher task drains the queue, takes a slot on the
//! client-wide semaphore for each job and spawns a task that runs the
//! handler body on the blocking pool. Jobs are therefore spawned in arrival
//! order, and with a single slot they also run in arrival order.
//!
//! A handler returning `false` is removed from the registry. When that
//! empties its subscription, an `unsubscribe` frame follows if the
//! configured [`UnsubscribePolicy`] covers the channel. Unsubscribing never
//! cancels invocations already in flight.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, trace, warn};

use super::config::UnsubscribePolicy;
use super::error::{ClientError, DispatchError};
use super::event::{parse_frame, Event, SubscriptionKey};
use super::registry::{Handler, HandlerId, SubscriptionRegistry};

/// State shared by every connection of one client.
pub(crate) struct DispatchContext {
    pub registry: Arc<SubscriptionRegistry>,
    pub policy: UnsubscribePolicy,
    pub permits: Arc<Semaphore>,
    pub errors: mpsc::UnboundedSender<DispatchError>,
}

impl DispatchContext {
    /// Logs `error` and forwards it to the error channel. A dropped
    /// receiver only silences the channel.
    pub fn report(&self, error: DispatchError) {
        warn!(error = %error, "dispatch error");
        let _ = self.errors.send(error);
    }
}

#[derive(Serialize)]
struct ControlFrame<'a> {
    uid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscribe: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unsubscribe: Option<&'a str>,
}

/// Queues subscribe/unsubscribe frames on one connection's writer task.
#[derive(Debug, Clone)]
pub(crate) struct FrameWriter {
    uid: Arc<str>,
    outbound: mpsc::UnboundedSender<String>,
}

impl FrameWriter {
    pub fn new(uid: &str, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            uid: Arc::from(uid),
            outbound,
        }
    }

    pub fn subscribe(&self, key: &SubscriptionKey) -> Result<(), ClientError> {
        let path = key.path();
        self.send(&ControlFrame {
            uid: &self.uid,
            subscribe: Some(&path),
            unsubscribe: None,
        })
    }

    pub fn unsubscribe(&self, key: &SubscriptionKey) -> Result<(), ClientError> {
        let path = key.path();
        self.send(&ControlFrame {
            uid: &self.uid,
            subscribe: None,
            unsubscribe: Some(&path),
        })
    }

    fn send(&self, frame: &ControlFrame<'_>) -> Result<(), ClientError> {
        let text = serde_json::to_string(frame).map_err(|e| ClientError::Transport(e.to_string()))?;
        trace!(uid = %self.uid, frame = %text, "queue frame");
        self.outbound
            .send(text)
            .map_err(|_| ClientError::ConnectionClosed)
    }
}

/// One handler invocation waiting for a slot.
pub(crate) struct Job {
    key: SubscriptionKey,
    id: HandlerId,
    handler: Handler,
    event: Arc<Event>,
}

/// Starts the dispatcher task of one connection and returns its job queue.
///
/// The task ends when every queue sender is gone or the semaphore is
/// closed.
pub(crate) fn spawn_dispatcher(
    ctx: Arc<DispatchContext>,
    writer: FrameWriter,
) -> (mpsc::UnboundedSender<Job>, JoinHandle<()>) {
    let (jobs, mut queued) = mpsc::unbounded_channel::<Job>();
    let task = tokio::spawn(async move {
        while let Some(job) = queued.recv().await {
            let Ok(permit) = Arc::clone(&ctx.permits).acquire_owned().await else {
                // Closed semaphore: the client is shutting down.
                break;
            };
            tokio::spawn(run_job(Arc::clone(&ctx), writer.clone(), job, permit));
        }
        trace!("dispatcher stopped");
    });
    (jobs, task)
}

/// Classifies `text` and queues one job per handler of its subscription.
pub(crate) fn dispatch_frame(ctx: &DispatchContext, jobs: &mpsc::UnboundedSender<Job>, text: &str) {
    let (key, event) = match parse_frame(text) {
        Ok(parsed) => parsed,
        Err(error) => {
            ctx.report(error);
            return;
        }
    };

    let handlers = ctx.registry.handlers(&key);
    if handlers.is_empty() {
        trace!(path = %key, "no handlers for frame");
        return;
    }

    let event = Arc::new(event);
    for (id, handler) in handlers {
        let job = Job {
            key,
            id,
            handler,
            event: Arc::clone(&event),
        };
        if jobs.send(job).is_err() {
            // Dispatcher gone: the connection is closing.
            return;
        }
    }
}

async fn run_job(ctx: Arc<DispatchContext>, writer: FrameWriter, job: Job, permit: OwnedSemaphorePermit) {
    let _permit = permit;
    let Job {
        key,
        id,
        handler,
        event,
    } = job;
    match tokio::task::spawn_blocking(move || handler(event.as_ref())).await {
        Ok(true) => {}
        Ok(false) => retire(&ctx, &writer, key, id),
        Err(error) => ctx.report(DispatchError::HandlerPanicked {
            path: key.path(),
            handler: id,
            message: panic_message(error),
        }),
    }
}

fn retire(ctx: &DispatchContext, writer: &FrameWriter, key: SubscriptionKey, id: HandlerId) {
    let removed = ctx.registry.remove_handlers(&key, &[id], |key| {
        if !ctx.policy.applies_to(key.kind) {
            return;
        }
        if let Err(error) = writer.unsubscribe(key) {
            debug!(path = %key, error = %error, "unsubscribe not sent");
        }
    });
    match removed {
        Ok(true) => debug!(path = %key, handler = %id, "last handler retired"),
        Ok(false) => trace!(path = %key, handler = %id, "handler retired"),
        // Already unsubscribed by the caller.
        Err(_) => {}
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload: Box<dyn Any + Send> = error.into_panic();
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let writer = FrameWriter::new("abc", tx);
        writer.subscribe(&SubscriptionKey::block()).unwrap();
        writer.unsubscribe(&SubscriptionKey::block()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), r#"{"uid":"abc","subscribe":"block"}"#);
        assert_eq!(rx.try_recv().unwrap(), r#"{"uid":"abc","unsubscribe":"block"}"#);
    }

    #[test]
    fn closed_writer_reports_closed_connection() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let writer = FrameWriter::new("abc", tx);
        assert_eq!(
            writer.subscribe(&SubscriptionKey::block()).unwrap_err(),
            ClientError::ConnectionClosed
        );
    }
}
