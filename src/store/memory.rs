use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::errors::Error;
use crate::store::{DocPath, Document, DocumentStore, FeedSender, Subscription};
use crate::utils::state::State;
use crate::utils::task::CancelFlag;

/// Volatile in-memory store.
///
/// Documents live in a shared map; [`MemoryStore::set`] replaces a document
/// payload and pushes the new snapshot to every live subscription. Clones
/// share the same data, which makes this the test and demo transport.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<DocPath, State>>>,
    feeds: Arc<RwLock<HashMap<DocPath, Vec<FeedSender>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the payload of a document and notifies live subscriptions.
    pub fn set(&self, path: &DocPath, payload: State) {
        self.documents.write().insert(path.clone(), payload.clone());

        let mut feeds = self.feeds.write();
        if let Some(senders) = feeds.get_mut(path) {
            // Closed feeds are dropped on the way.
            senders.retain(|sender| {
                sender
                    .send(Document::new(path.clone(), payload.clone()))
                    .is_ok()
            });
        }
    }

    /// Returns the current payload of a document, if any.
    pub fn get(&self, path: &DocPath) -> Option<State> {
        self.documents.read().get(path).cloned()
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(&self, path: &DocPath) -> Result<Subscription, Error> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Deliver the current snapshot first, then register for changes.
        if let Some(payload) = self.documents.read().get(path) {
            let _ = tx.send(Document::new(path.clone(), payload.clone()));
        }
        self.feeds
            .write()
            .entry(path.clone())
            .or_default()
            .push(tx);

        Ok(Subscription::new(path.clone(), rx, CancelFlag::new()))
    }
}
