use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::errors::Error;
use crate::store::{DocPath, Document, DocumentStore, Subscription};
use crate::utils::state::State;
use crate::utils::task;
use crate::utils::task::CancelFlag;

/// Default delay between two polls of a subscribed document file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Persistent store backed by JSON files.
///
/// A document `C/id` lives at `<root>/C/id.json`. Subscriptions poll the file
/// and push a snapshot whenever its content changes. A missing or malformed
/// file is logged and skipped; polling continues, so the feed heals itself
/// once the file is back in shape.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
    poll_interval: Duration,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn document_file(&self, path: &DocPath) -> PathBuf {
        self.root
            .join(path.collection())
            .join(format!("{}.json", path.id()))
    }

    /// Persists a document payload, creating the collection directory on the
    /// way. Live subscriptions pick the change up at their next poll.
    ///
    /// # Errors
    /// Returns a `StoreError` if the payload cannot be serialized or written.
    pub fn write(&self, path: &DocPath, payload: &State) -> Result<(), Error> {
        let file = self.document_file(path);
        if let Some(collection_dir) = file.parent() {
            std::fs::create_dir_all(collection_dir)?;
        }
        let content = serde_json::to_string_pretty(payload)?;
        std::fs::write(&file, content)?;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn subscribe(&self, path: &DocPath) -> Result<Subscription, Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelFlag::new();

        let token = cancel.clone();
        let file = self.document_file(path);
        let doc_path = path.clone();
        let poll_interval = self.poll_interval;

        let _poller = task::spawn(async move {
            let mut last_content: Option<String> = None;
            while !token.is_cancelled() {
                match std::fs::read_to_string(&file) {
                    Ok(content) => {
                        if last_content.as_deref() != Some(content.as_str()) {
                            match serde_json::from_str::<serde_json::Value>(&content) {
                                Ok(value) => {
                                    let document =
                                        Document::new(doc_path.clone(), State::from(value));
                                    if tx.send(document).is_err() {
                                        // Consumer is gone, stop polling.
                                        break;
                                    }
                                }
                                Err(err) => {
                                    warn!("Malformed document '{}': {}", doc_path, err);
                                }
                            }
                            last_content = Some(content);
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        debug!("Document '{}' not found, waiting for it", doc_path);
                        last_content = None;
                    }
                    Err(err) => {
                        warn!("Document '{}' could not be read: {}", doc_path, err);
                    }
                }

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        });

        Ok(Subscription::new(path.clone(), rx, cancel))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn enabled_payload(value: bool) -> State {
        State::Object(HashMap::from([(
            String::from("isEnabled"),
            State::Boolean(value),
        )]))
    }

    fn fast_store(root: &std::path::Path) -> FileStore {
        FileStore::new(root).with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_document_file_layout() {
        let store = FileStore::new("/var/lib/ledmirror");
        let file = store.document_file(&DocPath::new("LED", "status"));
        assert_eq!(file, PathBuf::from("/var/lib/ledmirror/LED/status.json"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_delivers_existing_document() {
        let dir = tempfile::tempdir().expect("Temp dir is available");
        let store = fast_store(dir.path());
        let path = DocPath::new("LED", "status");
        store
            .write(&path, &enabled_payload(true))
            .expect("Document persists");

        let mut subscription = store.subscribe(&path).expect("Subscription opens");
        let snapshot = subscription.next().await.expect("Initial snapshot");
        assert!(snapshot.get_bool("isEnabled").expect("Field decodes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_content_change_is_pushed() {
        let dir = tempfile::tempdir().expect("Temp dir is available");
        let store = fast_store(dir.path());
        let path = DocPath::new("LED", "status");
        store
            .write(&path, &enabled_payload(true))
            .expect("Document persists");

        let mut subscription = store.subscribe(&path).expect("Subscription opens");
        let first = subscription.next().await.expect("Initial snapshot");
        assert!(first.get_bool("isEnabled").expect("Field decodes"));

        store
            .write(&path, &enabled_payload(false))
            .expect("Document persists");
        let second = subscription.next().await.expect("Changed snapshot");
        assert!(!second.get_bool("isEnabled").expect("Field decodes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_file_is_skipped() {
        let dir = tempfile::tempdir().expect("Temp dir is available");
        let store = fast_store(dir.path());
        let path = DocPath::new("LED", "status");

        std::fs::create_dir_all(dir.path().join("LED")).expect("Collection dir");
        std::fs::write(dir.path().join("LED/status.json"), "{oops").expect("File writes");

        let mut subscription = store.subscribe(&path).expect("Subscription opens");

        // The malformed payload never reaches the feed; the next valid
        // content does.
        store
            .write(&path, &enabled_payload(true))
            .expect("Document persists");
        let snapshot = subscription.next().await.expect("Valid snapshot");
        assert!(snapshot.get_bool("isEnabled").expect("Field decodes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_file_heals_on_creation() {
        let dir = tempfile::tempdir().expect("Temp dir is available");
        let store = fast_store(dir.path());
        let path = DocPath::new("LED", "status");

        let mut subscription = store.subscribe(&path).expect("Subscription opens");

        store
            .write(&path, &enabled_payload(true))
            .expect("Document persists");
        let snapshot = subscription.next().await.expect("Snapshot after creation");
        assert!(snapshot.get_bool("isEnabled").expect("Field decodes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let dir = tempfile::tempdir().expect("Temp dir is available");
        let store = fast_store(dir.path());
        let path = DocPath::new("LED", "status");

        let mut subscription = store.subscribe(&path).expect("Subscription opens");
        subscription.cancel();
        assert!(subscription.next().await.is_none());
    }
}
