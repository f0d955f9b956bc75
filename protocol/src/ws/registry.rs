//! Subscription registry: live handlers per (channel, address).
//!
//! A key is either absent (unsubscribed) or maps to a non-empty handler set
//! (subscribed). Adding the first handler creates the subscription and
//! removing the last destroys it. Both transitions take a callback that runs
//! while the key's shard is write-locked, so the subscribe and unsubscribe
//! frames a caller queues there go out in the same order as the transitions
//! themselves. Exactly one subscribe and at most one unsubscribe frame go
//! out per cycle.
//!
//! The map is a `DashMap`: readers on the dispatch path and writers from
//! subscribe calls and retiring handlers only contend per shard. Callbacks
//! must not touch the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use super::error::ClientError;
use super::event::{Event, SubscriptionKey};

/// An event callback. Returning `false` retires the handler.
pub type Handler = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Stable handle for one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: DashMap<SubscriptionKey, BTreeMap<HandlerId, Handler>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handlers` under `key`.
    ///
    /// Returns the new handler ids, in order, and whether this call moved
    /// `key` from unsubscribed to subscribed. On that transition `on_create`
    /// runs first; if it fails nothing is registered and its error is
    /// returned. An empty `handlers` list changes nothing.
    pub fn add_handlers<F>(
        &self,
        key: SubscriptionKey,
        handlers: impl IntoIterator<Item = Handler>,
        on_create: F,
    ) -> Result<(Vec<HandlerId>, bool), ClientError>
    where
        F: FnOnce(&SubscriptionKey) -> Result<(), ClientError>,
    {
        let handlers: Vec<Handler> = handlers.into_iter().collect();
        if handlers.is_empty() {
            return Ok((Vec::new(), false));
        }

        let (mut set, created) = match self.subscriptions.entry(key) {
            Entry::Occupied(entry) => (entry.into_ref(), false),
            Entry::Vacant(entry) => {
                on_create(&key)?;
                (entry.insert(BTreeMap::new()), true)
            }
        };
        let ids = handlers
            .into_iter()
            .map(|handler| {
                let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
                set.insert(id, handler);
                id
            })
            .collect();
        Ok((ids, created))
    }

    /// Removes `ids` from `key`. Unknown ids are ignored.
    ///
    /// Returns `true` when the set became empty and the subscription was
    /// destroyed, in which case `on_destroy` ran just before the key was
    /// dropped. Fails with [`ClientError::SubscriptionState`] when `key` has
    /// no active handlers.
    pub fn remove_handlers<F>(
        &self,
        key: &SubscriptionKey,
        ids: &[HandlerId],
        on_destroy: F,
    ) -> Result<bool, ClientError>
    where
        F: FnOnce(&SubscriptionKey),
    {
        let mut found = false;
        let destroyed = self.subscriptions.remove_if_mut(key, |key, set| {
            found = true;
            for id in ids {
                set.remove(id);
            }
            if set.is_empty() {
                on_destroy(key);
                return true;
            }
            false
        });
        if !found {
            return Err(ClientError::SubscriptionState(key.path()));
        }
        Ok(destroyed.is_some())
    }

    /// Drops every subscription whose key matches `predicate`, returning the
    /// keys dropped.
    pub fn remove_matching(&self, predicate: impl Fn(&SubscriptionKey) -> bool) -> Vec<SubscriptionKey> {
        let mut dropped = Vec::new();
        self.subscriptions.retain(|key, _| {
            if predicate(key) {
                dropped.push(*key);
                return false;
            }
            true
        });
        dropped
    }

    /// Snapshot of the handlers currently registered for `key`, in
    /// registration order.
    pub fn handlers(&self, key: &SubscriptionKey) -> Vec<(HandlerId, Handler)> {
        self.subscriptions
            .get(key)
            .map(|set| set.iter().map(|(id, h)| (*id, Arc::clone(h))).collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, key: &SubscriptionKey) -> bool {
        self.subscriptions.contains_key(key)
    }

    pub fn handler_count(&self, key: &SubscriptionKey) -> usize {
        self.subscriptions.get(key).map(|set| set.len()).unwrap_or(0)
    }

    pub fn keys(&self) -> Vec<SubscriptionKey> {
        self.subscriptions.iter().map(|entry| *entry.key()).collect()
    }

    pub fn clear(&self) {
        self.subscriptions.clear();
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::model::Address;
    use crate::ws::event::EventKind;

    fn key() -> SubscriptionKey {
        SubscriptionKey::for_address(EventKind::ConfirmedAdded, Address::from_bytes([1; 25]))
    }

    fn noop() -> Handler {
        Arc::new(|_: &Event| true)
    }

    fn add(registry: &SubscriptionRegistry, handlers: Vec<Handler>) -> (Vec<HandlerId>, bool) {
        registry.add_handlers(key(), handlers, |_| Ok(())).unwrap()
    }

    #[test]
    fn first_add_creates_subscription() {
        let registry = SubscriptionRegistry::new();
        let (first, created) = add(&registry, vec![noop()]);
        assert!(created);
        assert_eq!(first.len(), 1);

        let (second, created) = add(&registry, vec![noop(), noop()]);
        assert!(!created);
        assert_eq!(second.len(), 2);
        assert_eq!(registry.handler_count(&key()), 3);
        assert!(first[0] < second[0] && second[0] < second[1]);
    }

    #[test]
    fn empty_add_is_a_no_op() {
        let registry = SubscriptionRegistry::new();
        let result = registry.add_handlers(key(), Vec::new(), |_| panic!("no transition"));
        assert_eq!(result.unwrap(), (vec![], false));
        assert!(!registry.is_subscribed(&key()));
    }

    #[test]
    fn failed_create_registers_nothing() {
        let registry = SubscriptionRegistry::new();
        let err = registry
            .add_handlers(key(), [noop()], |_| Err(ClientError::ConnectionClosed))
            .unwrap_err();
        assert_eq!(err, ClientError::ConnectionClosed);
        assert!(!registry.is_subscribed(&key()));
    }

    #[test]
    fn last_removal_destroys_subscription() {
        let registry = SubscriptionRegistry::new();
        let (ids, _) = add(&registry, vec![noop(), noop()]);
        let mut destroyed = 0;
        assert!(!registry.remove_handlers(&key(), &ids[..1], |_| destroyed += 1).unwrap());
        assert!(registry.remove_handlers(&key(), &ids[1..], |_| destroyed += 1).unwrap());
        assert_eq!(destroyed, 1);
        assert!(!registry.is_subscribed(&key()));

        let (_, created) = add(&registry, vec![noop()]);
        assert!(created);
    }

    #[test]
    fn removing_from_unsubscribed_key_fails() {
        let registry = SubscriptionRegistry::new();
        assert_eq!(
            registry.remove_handlers(&key(), &[HandlerId(0)], |_| {}).unwrap_err(),
            ClientError::SubscriptionState(key().path())
        );
    }

    #[test]
    fn resubscribe_waits_for_the_destroy_callback() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let (ids, _) = add(&registry, vec![noop()]);
        let (entered_tx, entered_rx) = mpsc::channel();

        let adder = {
            let registry = Arc::clone(&registry);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                entered_rx.recv().unwrap();
                registry
                    .add_handlers(key(), [noop()], |_| {
                        log.lock().push("subscribe");
                        Ok(())
                    })
                    .unwrap()
            })
        };

        registry
            .remove_handlers(&key(), &ids, |_| {
                entered_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                log.lock().push("unsubscribe");
            })
            .unwrap();

        let (_, created) = adder.join().unwrap();
        assert!(created);
        assert_eq!(*log.lock(), ["unsubscribe", "subscribe"]);
    }

    #[test]
    fn remove_matching_reports_dropped_keys() {
        let registry = SubscriptionRegistry::new();
        add(&registry, vec![noop()]);
        registry
            .add_handlers(SubscriptionKey::block(), [noop()], |_| Ok(()))
            .unwrap();

        let dropped = registry.remove_matching(|key| key.address.is_none());
        assert_eq!(dropped, vec![SubscriptionKey::block()]);
        assert_eq!(registry.keys(), vec![key()]);
    }

    #[test]
    fn handlers_snapshot_keeps_registration_order() {
        let registry = SubscriptionRegistry::new();
        let (ids, _) = add(&registry, vec![noop(), noop(), noop()]);
        let snapshot: Vec<HandlerId> = registry.handlers(&key()).into_iter().map(|(id, _)| id).collect();
        assert_eq!(snapshot, ids);
    }
}
