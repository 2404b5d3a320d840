use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{error, trace};
use parking_lot::RwLock;

use crate::errors::Error;
use crate::store::{DocPath, DocumentStore};
use crate::utils::task;
use crate::utils::task::CancelFlag;

type FlagCallback = Box<dyn FnMut(bool) -> BoxFuture<'static, ()> + Send>;

/// Watches one boolean field of one document.
///
/// The watcher drains the store subscription on its own task, strictly
/// decodes the field, deduplicates identical consecutive values and awaits
/// the registered callback once per observed transition. Decode failures are
/// logged and the update skipped; the previously observed value is retained.
#[derive(Debug)]
pub struct FlagWatcher {
    path: DocPath,
    cancel: CancelFlag,
    last_seen: Arc<RwLock<Option<bool>>>,
}

impl FlagWatcher {
    /// Subscribes to `field` of the document at `path` on the given store.
    ///
    /// The callback fires on the first observed value, then once per distinct
    /// transition. Invocations are awaited one at a time.
    ///
    /// # Errors
    /// Returns a `StoreError` if the store subscription cannot be opened.
    pub fn subscribe<F, Fut>(
        store: &dyn DocumentStore,
        path: DocPath,
        field: &str,
        callback: F,
    ) -> Result<Self, Error>
    where
        F: FnMut(bool) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut subscription = store.subscribe(&path)?;
        // Cancelling the watcher cancels the subscription, which unblocks the
        // drain loop immediately.
        let cancel = subscription.get_canceller();
        let last_seen = Arc::new(RwLock::new(None));

        let mut callback: FlagCallback = {
            let mut callback = callback;
            Box::new(move |value| callback(value).boxed())
        };
        let field = field.to_string();
        let doc_path = path.clone();
        let seen = last_seen.clone();

        let _drainer = task::spawn(async move {
            while let Some(document) = subscription.next().await {
                let value = match document.get_bool(&field) {
                    Ok(value) => value,
                    Err(err) => {
                        error!("Update on '{}' ignored: {}", doc_path, err);
                        continue;
                    }
                };

                // Scope the guard so it is released before the await below.
                let transition = {
                    let mut last = seen.write();
                    match *last {
                        Some(previous) if previous == value => false,
                        _ => {
                            *last = Some(value);
                            true
                        }
                    }
                };

                if transition {
                    trace!("Document '{}': {} is now {}", doc_path, field, value);
                    callback(value).await;
                } else {
                    trace!("Document '{}': duplicate {} delivery", doc_path, field);
                }
            }
        });

        Ok(Self {
            path,
            cancel,
            last_seen,
        })
    }

    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Last value observed (and accepted) by the watcher, if any.
    pub fn last_seen(&self) -> Option<bool> {
        *self.last_seen.read()
    }

    /// Terminates the watcher. Idempotent, callable from any context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use crate::pause;
    use crate::store::MemoryStore;
    use crate::utils::state::State;

    use super::*;

    fn enabled_payload(value: bool) -> State {
        State::Object(HashMap::from([(
            String::from("isEnabled"),
            State::Boolean(value),
        )]))
    }

    fn recording_watcher(
        store: &MemoryStore,
    ) -> (FlagWatcher, Arc<Mutex<Vec<bool>>>) {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let recorder = observed.clone();
        let watcher = FlagWatcher::subscribe(
            store,
            DocPath::new("LED", "status"),
            "isEnabled",
            move |value| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().push(value);
                }
            },
        )
        .expect("Watcher subscribes");
        (watcher, observed)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_observation_fires() {
        let store = MemoryStore::new();
        let (watcher, observed) = recording_watcher(&store);

        store.set(&DocPath::new("LED", "status"), enabled_payload(false));
        pause!(10);

        assert_eq!(*observed.lock(), vec![false]);
        assert_eq!(watcher.last_seen(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_are_deduplicated() {
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let (_watcher, observed) = recording_watcher(&store);

        store.set(&path, enabled_payload(true));
        store.set(&path, enabled_payload(true));
        store.set(&path, enabled_payload(false));
        store.set(&path, enabled_payload(false));
        store.set(&path, enabled_payload(true));
        pause!(10);

        assert_eq!(
            *observed.lock(),
            vec![true, false, true],
            "Callback fires once per transition"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_retains_state() {
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let (watcher, observed) = recording_watcher(&store);

        store.set(&path, enabled_payload(true));
        pause!(10);

        // Missing field, wrong type, non-object: all skipped.
        store.set(&path, State::Object(HashMap::new()));
        store.set(
            &path,
            State::Object(HashMap::from([(
                String::from("isEnabled"),
                State::String("yes".into()),
            )])),
        );
        store.set(&path, State::Boolean(true));
        pause!(10);

        assert_eq!(*observed.lock(), vec![true], "Bad payloads never fire");
        assert_eq!(watcher.last_seen(), Some(true), "Prior state is retained");

        // A dedup-relevant transition after the bad payloads still lands.
        store.set(&path, enabled_payload(false));
        pause!(10);
        assert_eq!(*observed.lock(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_delivery() {
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let (watcher, observed) = recording_watcher(&store);

        store.set(&path, enabled_payload(true));
        pause!(10);

        watcher.cancel();
        watcher.cancel();
        assert!(watcher.is_cancelled());

        store.set(&path, enabled_payload(false));
        pause!(10);
        assert_eq!(
            *observed.lock(),
            vec![true],
            "No delivery after cancellation"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_callbacks_run_sequentially() {
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");

        let observed = Arc::new(Mutex::new(Vec::new()));
        let recorder = observed.clone();
        let _watcher = FlagWatcher::subscribe(
            &store,
            path.clone(),
            "isEnabled",
            move |value| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().push((value, "start"));
                    pause!(50);
                    recorder.lock().push((value, "end"));
                }
            },
        )
        .expect("Watcher subscribes");

        store.set(&path, enabled_payload(true));
        store.set(&path, enabled_payload(false));
        pause!(200);

        assert_eq!(
            *observed.lock(),
            vec![
                (true, "start"),
                (true, "end"),
                (false, "start"),
                (false, "end"),
            ],
            "Invocations never overlap"
        );
    }
}
