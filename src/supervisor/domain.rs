//! The single-threaded execution context shared by every process of one run

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::SupervisorError;

struct PendingUnit {
    tag: String,
    task: JoinHandle<Result<i32, SupervisorError>>,
}

/// A cloneable reference to the runtime of the active run plus the set of
/// units of work scheduled on it.
#[derive(Clone)]
pub(crate) struct Domain {
    handle: Handle,
    pending: Arc<Mutex<Vec<PendingUnit>>>,
}

impl Domain {
    /// Build the current-thread runtime backing a new domain.
    pub(crate) fn create() -> Result<(Runtime, Self), SupervisorError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SupervisorError::Domain)?;
        let domain = Self::with_handle(runtime.handle().clone());
        Ok((runtime, domain))
    }

    pub(crate) fn with_handle(handle: Handle) -> Self {
        Self {
            handle,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Schedule `unit` without waiting for it. It stays tracked until
    /// [`Domain::wait_all`] collects it.
    pub(crate) fn schedule<F>(&self, tag: &str, unit: F)
    where
        F: Future<Output = Result<i32, SupervisorError>> + Send + 'static,
    {
        let task = self.handle.spawn(unit);
        self.lock().push(PendingUnit {
            tag: tag.to_string(),
            task,
        });
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Wait until no scheduled unit is left, including units scheduled while
    /// waiting. Returns the failures of the units that did not succeed.
    ///
    /// Every batch is taken out of the pending set before it is awaited, so
    /// a unit that already finished is simply collected.
    pub(crate) async fn wait_all(&self) -> Vec<SupervisorError> {
        let mut failures = Vec::new();
        loop {
            let batch = std::mem::take(&mut *self.lock());
            if batch.is_empty() {
                break;
            }
            tracing::debug!(
                "{} task(s) are still pending after the main process has exited",
                batch.len()
            );

            for unit in batch {
                match unit.task.await {
                    Ok(Ok(status)) => {
                        tracing::trace!("Chained unit '{}' finished with {}", unit.tag, status)
                    }
                    Ok(Err(source)) => failures.push(SupervisorError::Detached {
                        tag: unit.tag,
                        source: Box::new(source),
                    }),
                    Err(source) => failures.push(SupervisorError::Panicked {
                        tag: unit.tag,
                        source,
                    }),
                }
            }
        }
        tracing::debug!("All the pending tasks have finished");
        failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PendingUnit>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
