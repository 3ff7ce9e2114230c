//! src/eventbus/mod.rs
//!
//! Live change feed for ledger collections. Each collection has one watch
//! channel carrying its latest full snapshot, so a slow subscriber never
//! blocks a committing writer and always converges on the newest state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use workshop_common::models::{Collection, CollectionSnapshot, Subscription};

#[derive(Clone)]
pub struct ChangeFeed {
    channels: Arc<HashMap<Collection, watch::Sender<CollectionSnapshot>>>,
    closed: Arc<watch::Sender<bool>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let channels = Collection::ALL
            .iter()
            .map(|c| (*c, watch::channel(CollectionSnapshot::empty(*c)).0))
            .collect();
        let (closed, _) = watch::channel(false);
        Self {
            channels: Arc::new(channels),
            closed: Arc::new(closed),
        }
    }

    /// Ends every open subscription. Later subscriptions end immediately.
    pub fn close(&self) {
        self.closed.send_replace(true);
        debug!("change feed closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Registers a subscriber. `current` is the snapshot the caller just read;
    /// it replaces the cached one if it is newer.
    pub fn subscribe(&self, current: CollectionSnapshot) -> Subscription {
        let collection = current.collection;
        let sender = &self.channels[&collection];
        self.offer(sender, current);
        Subscription::new(collection, sender.subscribe(), self.closed.subscribe())
    }

    /// Publishes a snapshot. Older snapshots than the one already held are
    /// dropped, so racing committers cannot move subscribers backwards.
    pub fn publish(&self, snapshot: CollectionSnapshot) {
        let sender = &self.channels[&snapshot.collection];
        if self.offer(sender, snapshot) {
            trace!("published snapshot to {} subscriber(s)", sender.receiver_count());
        }
    }

    pub fn subscriber_count(&self, collection: Collection) -> usize {
        self.channels[&collection].receiver_count()
    }

    fn offer(&self, sender: &watch::Sender<CollectionSnapshot>, snapshot: CollectionSnapshot) -> bool {
        sender.send_if_modified(|held| {
            if snapshot.version > held.version {
                *held = snapshot;
                true
            } else {
                false
            }
        })
    }
}
