//! One physical socket to the node.
//!
//! Opening a connection waits for the node's `{"uid": ..}` greeting, then
//! starts three tasks: a writer draining queued control frames into the
//! socket, a reader classifying inbound frames, and a dispatcher feeding
//! their jobs to handlers. The writer stops with the reader, so once the
//! node closes the socket every further frame fails with
//! [`ClientError::ConnectionClosed`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::dispatch::{dispatch_frame, spawn_dispatcher, DispatchContext, FrameWriter};
use super::error::{ClientError, DispatchError};
use super::event::SubscriptionKey;
use super::transport::Connector;

#[derive(Deserialize)]
struct Greeting {
    uid: String,
}

pub struct Connection {
    uid: String,
    writer: FrameWriter,
    open: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
    dispatch_task: JoinHandle<()>,
}

impl Connection {
    pub(crate) async fn open(
        connector: &dyn Connector,
        url: &str,
        handshake_timeout: Duration,
        ctx: Arc<DispatchContext>,
    ) -> Result<Self, ClientError> {
        let (mut sink, mut stream) = connector.connect(url).await?;

        let greeting = match tokio::time::timeout(handshake_timeout, stream.next()).await {
            Err(_) => return Err(ClientError::HandshakeTimeout(handshake_timeout)),
            Ok(None) => return Err(ClientError::ConnectionClosed),
            Ok(Some(frame)) => frame?,
        };
        let Greeting { uid } =
            serde_json::from_str(&greeting).map_err(|e| ClientError::Handshake(e.to_string()))?;
        info!(uid = %uid, url, "connection established");

        let (outbound, mut queued) = mpsc::unbounded_channel::<String>();
        let writer = FrameWriter::new(&uid, outbound);
        let open = Arc::new(AtomicBool::new(true));
        // Dropped by the reader when it stops, for whatever reason.
        let (reader_alive, mut reader_gone) = oneshot::channel::<()>();

        let writer_task = {
            let ctx = Arc::clone(&ctx);
            let uid = uid.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = &mut reader_gone => break,
                        frame = queued.recv() => {
                            let Some(frame) = frame else { break };
                            if let Err(error) = sink.send(frame).await {
                                ctx.report(DispatchError::Transport {
                                    uid: uid.clone(),
                                    reason: error.to_string(),
                                });
                                break;
                            }
                        }
                    }
                }
                drop(queued);
                let _ = sink.close().await;
                debug!(uid = %uid, "writer stopped");
            })
        };

        let (jobs, dispatch_task) = spawn_dispatcher(Arc::clone(&ctx), writer.clone());

        let reader_task = {
            let open = Arc::clone(&open);
            let uid = uid.clone();
            tokio::spawn(async move {
                let _reader_alive = reader_alive;
                let reason = loop {
                    match stream.next().await {
                        Some(Ok(text)) => dispatch_frame(&ctx, &jobs, &text),
                        Some(Err(error)) => break error.to_string(),
                        None => break "closed by node".to_string(),
                    }
                };
                open.store(false, Ordering::Release);
                ctx.report(DispatchError::Transport {
                    uid: uid.clone(),
                    reason,
                });
                debug!(uid = %uid, "reader stopped");
            })
        };

        Ok(Self {
            uid,
            writer,
            open,
            reader_task,
            writer_task,
            dispatch_task,
        })
    }

    /// Identifier the node assigned to this socket.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn subscribe(&self, key: &SubscriptionKey) -> Result<(), ClientError> {
        debug!(uid = %self.uid, path = %key, "subscribe");
        self.writer.subscribe(key)
    }

    pub fn unsubscribe(&self, key: &SubscriptionKey) -> Result<(), ClientError> {
        debug!(uid = %self.uid, path = %key, "unsubscribe");
        self.writer.unsubscribe(key)
    }

    /// Whether the reader has stopped, either because the node closed the
    /// socket or because [`Self::close`] ran.
    pub fn is_closed(&self) -> bool {
        !self.open.load(Ordering::Acquire) || self.reader_task.is_finished()
    }

    /// Stops all tasks. Handler invocations already spawned keep running.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.reader_task.abort();
        self.writer_task.abort();
        self.dispatch_task.abort();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("uid", &self.uid)
            .field("closed", &self.is_closed())
            .finish()
    }
}
