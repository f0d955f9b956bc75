//! The event client: subscription bookkeeping on top of routed connections.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

use super::config::ClientConfig;
use super::connection::Connection;
use super::dispatch::DispatchContext;
use super::error::{ClientError, DispatchError};
use super::event::{BlockEvent, CosignatureEvent, Event, EventKind, StatusEvent, SubscriptionKey};
use super::registry::{Handler, HandlerId, SubscriptionRegistry};
use super::router::ConnectionRouter;
use super::transport::{Connector, WebSocketConnector};
use crate::model::{Address, Hash256};
use crate::transaction::Transaction;

/// Subscribes handlers to node event channels and keeps them fed.
///
/// ```no_run
/// # async fn run() -> Result<(), catena_protocol::ws::ClientError> {
/// use catena_protocol::ws::{ClientConfig, EventClient};
///
/// let client = EventClient::new(ClientConfig::new("ws://localhost:3000/ws"));
/// client
///     .on_block(|block| {
///         println!("height {}", block.block.height);
///         true
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct EventClient {
    config: ClientConfig,
    registry: Arc<SubscriptionRegistry>,
    router: ConnectionRouter,
    ctx: Arc<DispatchContext>,
    errors: Mutex<Option<mpsc::UnboundedReceiver<DispatchError>>>,
    closed: AtomicBool,
}

impl EventClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, Arc::new(WebSocketConnector))
    }

    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(DispatchContext {
            registry: Arc::clone(&registry),
            policy: config.unsubscribe_policy.clone(),
            permits: Arc::new(Semaphore::new(config.max_in_flight_handlers.max(1))),
            errors: errors_tx,
        });
        let router = ConnectionRouter::new(
            connector,
            config.url.clone(),
            config.handshake_timeout,
            Arc::clone(&ctx),
        );
        Self {
            config,
            registry,
            router,
            ctx,
            errors: Mutex::new(Some(errors_rx)),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Takes the receiving end of the dispatch error channel. Only the first
    /// call gets it.
    pub fn errors(&self) -> Option<mpsc::UnboundedReceiver<DispatchError>> {
        self.errors.lock().take()
    }

    /// Registers `handlers` on `kind`, scoped to `address` for every channel
    /// except `block`.
    ///
    /// The first handler on a (channel, address) pair opens or reuses the
    /// routed connection and sends one `subscribe` frame. Later handlers on
    /// the same pair only join the handler set.
    pub async fn subscribe(
        &self,
        kind: EventKind,
        address: Option<Address>,
        handlers: Vec<Handler>,
    ) -> Result<Vec<HandlerId>, ClientError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::ConnectionClosed);
        }
        let key = subscription_key(kind, address)?;
        if handlers.is_empty() {
            return Ok(Vec::new());
        }

        let connection = self.route(&key).await?;
        let (ids, created) = self
            .registry
            .add_handlers(key, handlers, |key| connection.subscribe(key))?;
        if created {
            info!(path = %key, uid = connection.uid(), "subscribed");
        } else {
            debug!(path = %key, added = ids.len(), "joined existing subscription");
        }
        Ok(ids)
    }

    /// Removes the handlers `ids` from `kind`/`address`.
    ///
    /// When the handler set becomes empty the subscription is destroyed and,
    /// if the unsubscribe policy covers `kind`, an `unsubscribe` frame is
    /// sent. Invocations already running are left to finish. If the frame
    /// cannot be sent the handlers are still gone and the send error is
    /// returned.
    pub async fn unsubscribe(
        &self,
        kind: EventKind,
        address: Option<Address>,
        ids: &[HandlerId],
    ) -> Result<(), ClientError> {
        let key = subscription_key(kind, address)?;
        let connection = match key.address {
            Some(address) => self.router.routed(&address).await,
            None => self.router.routed_primary().await,
        };

        let mut sent = Ok(());
        let destroyed = self.registry.remove_handlers(&key, ids, |key| {
            if !self.ctx.policy.applies_to(key.kind) {
                return;
            }
            match &connection {
                Some(connection) => sent = connection.unsubscribe(key),
                None => debug!(path = %key, "no connection to unsubscribe on"),
            }
        })?;
        sent?;
        if destroyed {
            info!(path = %key, "unsubscribed");
        }
        Ok(())
    }

    pub async fn on_block<F>(&self, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&BlockEvent) -> bool + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &Event| match event {
            Event::Block(block) => handler(block),
            _ => true,
        });
        self.subscribe_one(EventKind::Block, None, handler).await
    }

    pub async fn on_confirmed_added<F>(&self, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&Transaction) -> bool + Send + Sync + 'static,
    {
        self.on_transaction(EventKind::ConfirmedAdded, address, handler).await
    }

    pub async fn on_unconfirmed_added<F>(&self, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&Transaction) -> bool + Send + Sync + 'static,
    {
        self.on_transaction(EventKind::UnconfirmedAdded, address, handler).await
    }

    pub async fn on_partial_added<F>(&self, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&Transaction) -> bool + Send + Sync + 'static,
    {
        self.on_transaction(EventKind::PartialAdded, address, handler).await
    }

    pub async fn on_unconfirmed_removed<F>(&self, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&Hash256) -> bool + Send + Sync + 'static,
    {
        self.on_removed(EventKind::UnconfirmedRemoved, address, handler).await
    }

    pub async fn on_partial_removed<F>(&self, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&Hash256) -> bool + Send + Sync + 'static,
    {
        self.on_removed(EventKind::PartialRemoved, address, handler).await
    }

    pub async fn on_status<F>(&self, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&StatusEvent) -> bool + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &Event| match event {
            Event::Status(status) => handler(status),
            _ => true,
        });
        self.subscribe_one(EventKind::Status, Some(address), handler).await
    }

    pub async fn on_cosignature<F>(&self, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&CosignatureEvent) -> bool + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &Event| match event {
            Event::Cosignature(cosignature) => handler(cosignature),
            _ => true,
        });
        self.subscribe_one(EventKind::Cosignature, Some(address), handler).await
    }

    /// Whether `kind`/`address` currently has at least one handler.
    pub fn is_subscribed(&self, kind: EventKind, address: Option<Address>) -> bool {
        subscription_key(kind, address)
            .map(|key| self.registry.is_subscribed(&key))
            .unwrap_or(false)
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionKey> {
        self.registry.keys()
    }

    pub async fn connection_count(&self) -> usize {
        self.router.connection_count().await
    }

    /// Drops every subscription and closes all connections. Frames already
    /// being dispatched stop at the next handler; later subscribes fail with
    /// [`ClientError::ConnectionClosed`].
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.ctx.permits.close();
        self.router.close().await;
        self.registry.clear();
        info!(url = %self.config.url, "event client closed");
    }

    async fn route(&self, key: &SubscriptionKey) -> Result<Arc<Connection>, ClientError> {
        match key.address {
            Some(address) => self.router.connection_for(address).await,
            None => self.router.primary().await,
        }
    }

    async fn on_transaction<F>(&self, kind: EventKind, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&Transaction) -> bool + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &Event| match event.transaction() {
            Some(tx) => handler(tx),
            None => true,
        });
        self.subscribe_one(kind, Some(address), handler).await
    }

    async fn on_removed<F>(&self, kind: EventKind, address: Address, handler: F) -> Result<HandlerId, ClientError>
    where
        F: Fn(&Hash256) -> bool + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &Event| match event {
            Event::UnconfirmedRemoved(hash) | Event::PartialRemoved(hash) => handler(hash),
            _ => true,
        });
        self.subscribe_one(kind, Some(address), handler).await
    }

    async fn subscribe_one(
        &self,
        kind: EventKind,
        address: Option<Address>,
        handler: Handler,
    ) -> Result<HandlerId, ClientError> {
        let mut ids = self.subscribe(kind, address, vec![handler]).await?;
        ids.pop()
            .ok_or_else(|| ClientError::InvalidSubscription(format!("{kind}: handler was not registered")))
    }
}

impl std::fmt::Debug for EventClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventClient")
            .field("url", &self.config.url)
            .field("registry", &self.registry)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

fn subscription_key(kind: EventKind, address: Option<Address>) -> Result<SubscriptionKey, ClientError> {
    match (kind.is_address_scoped(), address) {
        (true, Some(address)) => Ok(SubscriptionKey::for_address(kind, address)),
        (false, None) => Ok(SubscriptionKey::block()),
        (true, None) => Err(ClientError::InvalidSubscription(format!(
            "{kind} subscriptions need an address"
        ))),
        (false, Some(_)) => Err(ClientError::InvalidSubscription(format!(
            "{kind} subscriptions take no address"
        ))),
    }
}
