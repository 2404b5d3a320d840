//! Task runner and cooperative cancellation primitives.
use std::future::Future;
use std::sync::Arc;

use log::error;
use tokio::sync::watch;
use tokio::task;
use tokio::task::JoinHandle;

use crate::errors::Error;

/// Handle to a spawned background task.
pub type TaskHandler = JoinHandle<Result<(), Error>>;

/// Represents the result of a spawned task.
/// A task may return either () or Result<(), Error> for flexibility, both
/// converted to a TaskResult before the outcome is inspected.
pub enum TaskResult {
    Ok,
    Err(Error),
}

impl From<Result<(), Error>> for TaskResult {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(_) => TaskResult::Ok,
            Err(e) => TaskResult::Err(e),
        }
    }
}

impl From<()> for TaskResult {
    fn from(_: ()) -> Self {
        TaskResult::Ok
    }
}

/// Runs a given future as a Tokio task.
///
/// A failing task logs its error and resolves Ok: background work degrades
/// and logs, it never takes the application down.
///
/// # Parameters
/// * `future`: A future that implements `Future<Output = ()>` or
///   `Future<Output = Result<(), Error>>`, `Send`, and has a `'static` lifetime.
pub fn spawn<F, T>(future: F) -> TaskHandler
where
    F: Future<Output = T> + Send + 'static,
    T: Into<TaskResult> + Send + 'static,
{
    task::spawn(async move {
        if let TaskResult::Err(err) = future.await.into() {
            error!("Background task failed: {}", err);
        }
        Ok(())
    })
}

/// Cooperative cancellation token.
///
/// Cloned freely across contexts; `cancel()` is idempotent and callable from
/// sync or async code. Loops either poll [`CancelFlag::is_cancelled`] between
/// steps or await [`CancelFlag::cancelled`] inside a `select!`.
#[derive(Clone, Debug)]
pub struct CancelFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once cancellation has been requested, immediately if it
    /// already was.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // wait_for checks the current value first, so a flag cancelled before
        // this call resolves without waiting.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[macro_export]
macro_rules! pause {
    ($ms:expr) => {
        tokio::time::sleep(tokio::time::Duration::from_millis($ms as u64)).await
    };
}

#[macro_export]
macro_rules! pause_sync {
    ($ms:expr) => {
        std::thread::sleep(std::time::Duration::from_millis($ms as u64))
    };
}
