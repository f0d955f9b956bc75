//! Connection router: which socket serves which address.
//!
//! The first address subscribed adopts the primary connection; each later
//! address gets a connection of its own. Block subscriptions always ride
//! the primary. Connections are opened lazily and never migrate. Opens are
//! serialised by an async mutex, so two concurrent subscribes for a new
//! address cannot open two sockets.
//!
//! A connection the node has closed is never handed out again. The call
//! that finds it fails with [`ClientError::ConnectionClosed`], and its
//! routes and the subscriptions it served are forgotten, so the next call
//! opens a fresh socket and subscribes from scratch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::connection::Connection;
use super::dispatch::DispatchContext;
use super::error::ClientError;
use super::transport::Connector;
use crate::model::Address;

#[derive(Default)]
struct Routes {
    primary: Option<Arc<Connection>>,
    by_address: HashMap<Address, Arc<Connection>>,
}

pub struct ConnectionRouter {
    connector: Arc<dyn Connector>,
    url: String,
    handshake_timeout: Duration,
    ctx: Arc<DispatchContext>,
    routes: Mutex<Routes>,
}

impl ConnectionRouter {
    pub(crate) fn new(
        connector: Arc<dyn Connector>,
        url: String,
        handshake_timeout: Duration,
        ctx: Arc<DispatchContext>,
    ) -> Self {
        Self {
            connector,
            url,
            handshake_timeout,
            ctx,
            routes: Mutex::new(Routes::default()),
        }
    }

    async fn open(&self) -> Result<Arc<Connection>, ClientError> {
        let connection = Connection::open(
            self.connector.as_ref(),
            &self.url,
            self.handshake_timeout,
            Arc::clone(&self.ctx),
        )
        .await?;
        Ok(Arc::new(connection))
    }

    async fn primary_locked(&self, routes: &mut Routes) -> Result<Arc<Connection>, ClientError> {
        if let Some(primary) = routes.primary.clone() {
            return self.live_locked(routes, primary);
        }
        let primary = self.open().await?;
        routes.primary = Some(Arc::clone(&primary));
        Ok(primary)
    }

    /// The shared connection, opened on first use.
    pub async fn primary(&self) -> Result<Arc<Connection>, ClientError> {
        let mut routes = self.routes.lock().await;
        self.primary_locked(&mut routes).await
    }

    /// The connection serving `address`.
    pub async fn connection_for(&self, address: Address) -> Result<Arc<Connection>, ClientError> {
        let mut routes = self.routes.lock().await;
        if let Some(connection) = routes.by_address.get(&address).cloned() {
            return self.live_locked(&mut routes, connection);
        }

        let connection = if routes.by_address.is_empty() {
            self.primary_locked(&mut routes).await?
        } else {
            self.open().await?
        };
        debug!(address = %address, uid = connection.uid(), "address routed");
        routes.by_address.insert(address, Arc::clone(&connection));
        Ok(connection)
    }

    fn live_locked(&self, routes: &mut Routes, connection: Arc<Connection>) -> Result<Arc<Connection>, ClientError> {
        if !connection.is_closed() {
            return Ok(connection);
        }
        self.prune_locked(routes, &connection);
        Err(ClientError::ConnectionClosed)
    }

    /// Forgets `dead`, the addresses routed to it and their subscriptions.
    fn prune_locked(&self, routes: &mut Routes, dead: &Arc<Connection>) {
        let was_primary = routes
            .primary
            .as_ref()
            .is_some_and(|primary| Arc::ptr_eq(primary, dead));
        if was_primary {
            routes.primary = None;
        }

        let mut addresses = Vec::new();
        routes.by_address.retain(|address, connection| {
            if Arc::ptr_eq(connection, dead) {
                addresses.push(*address);
                return false;
            }
            true
        });
        let dropped = self.ctx.registry.remove_matching(|key| match key.address {
            Some(address) => addresses.contains(&address),
            None => was_primary,
        });
        dead.close();
        warn!(
            uid = dead.uid(),
            addresses = addresses.len(),
            subscriptions = dropped.len(),
            "dropped connection closed by node"
        );
    }

    /// Existing connection for `address`, without opening one.
    pub async fn routed(&self, address: &Address) -> Option<Arc<Connection>> {
        self.routes.lock().await.by_address.get(address).cloned()
    }

    /// Existing primary connection, without opening one.
    pub async fn routed_primary(&self) -> Option<Arc<Connection>> {
        self.routes.lock().await.primary.clone()
    }

    /// Number of distinct sockets currently held.
    pub async fn connection_count(&self) -> usize {
        let routes = self.routes.lock().await;
        let mut uids: Vec<&str> = routes
            .primary
            .iter()
            .chain(routes.by_address.values())
            .map(|connection| connection.uid())
            .collect();
        uids.sort_unstable();
        uids.dedup();
        uids.len()
    }

    /// Closes every connection and forgets all routes.
    pub async fn close(&self) {
        let mut routes = self.routes.lock().await;
        for connection in routes.primary.iter().chain(routes.by_address.values()) {
            connection.close();
        }
        routes.primary = None;
        routes.by_address.clear();
    }
}
