pub use crate::store::document::{DocPath, Document};
pub use crate::store::file::FileStore;
pub use crate::store::memory::MemoryStore;
pub use crate::store::watcher::FlagWatcher;

use std::fmt::Debug;

use dyn_clone::DynClone;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::errors::Error;
use crate::utils::task::CancelFlag;

mod document;
mod file;
mod memory;
mod watcher;

/// Seam over a remote document store.
///
/// A store delivers the current snapshot of a document on subscribe, then one
/// snapshot per observed change. The transport may deliver duplicates;
/// consumers deduplicate.
pub trait DocumentStore: DynClone + Send + Sync + Debug {
    /// Opens a subscription on the given document.
    ///
    /// # Errors
    /// Returns a `StoreError` if the subscription cannot be opened.
    fn subscribe(&self, path: &DocPath) -> Result<Subscription, Error>;
}

dyn_clone::clone_trait_object!(DocumentStore);

/// Live feed of snapshots for one document.
///
/// Dropping the subscription (or cancelling it) terminates the feed; the
/// store notices the closed channel and stops pushing.
#[derive(Debug)]
pub struct Subscription {
    path: DocPath,
    rx: UnboundedReceiver<Document>,
    cancel: CancelFlag,
}

impl Subscription {
    pub fn new(path: DocPath, rx: UnboundedReceiver<Document>, cancel: CancelFlag) -> Self {
        Self { path, rx, cancel }
    }

    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Waits for the next snapshot. Resolves None once the subscription is
    /// cancelled or the store side closed the feed.
    pub async fn next(&mut self) -> Option<Document> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            document = self.rx.recv() => document,
        }
    }

    /// Requests termination of the feed. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a token that cancels this subscription from another context.
    pub fn get_canceller(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

pub(crate) type FeedSender = UnboundedSender<Document>;
