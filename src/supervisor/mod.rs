//! Launches tagged processes, streams their output into an [`OutputPolicy`]
//! and waits for everything they transitively started.

mod domain;
pub mod registry;

pub use registry::{LaunchState, ProcessRecord, Registry};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SupervisorError;
use crate::policy::OutputPolicy;
use crate::subprocess::streaming::{ExitSlot, LineHandler, StreamPump, StreamSource};
use crate::subprocess::{ProcessCommand, ProcessHandle};
use domain::Domain;

/// Tag used by [`Supervisor::run_default`].
pub const DEFAULT_TAG: &str = "default";

/// Owns the process registry and the concurrency domain of the active run.
///
/// Cloning is cheap and every clone refers to the same registry, which is how
/// a scheduled unit of work keeps the supervisor alive.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

struct Inner {
    policy: Arc<dyn OutputPolicy>,
    registry: Mutex<Registry>,
    domain: Mutex<Option<Domain>>,
    detached: Mutex<Vec<SupervisorError>>,
}

/// Clears the active domain when a run ends, including by unwinding.
struct ActiveDomain<'a>(&'a Mutex<Option<Domain>>);

impl Drop for ActiveDomain<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

impl Supervisor {
    pub fn new(policy: impl OutputPolicy + 'static) -> Self {
        Self::from_arc(Arc::new(policy))
    }

    pub fn from_arc(policy: Arc<dyn OutputPolicy>) -> Self {
        Self {
            inner: Arc::new(Inner {
                policy,
                registry: Mutex::new(Registry::new()),
                domain: Mutex::new(None),
                detached: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn policy(&self) -> &dyn OutputPolicy {
        self.inner.policy.as_ref()
    }

    /// Run `command_line` as `tag` and wait for every process it leads to.
    ///
    /// Outside a run this creates the concurrency domain, drives the process
    /// to completion, then keeps waiting until every unit of work scheduled on
    /// the domain (including ones scheduled while waiting) has finished. It
    /// returns the status of this process. Failures of chained processes do
    /// not change that status; they are logged and kept for
    /// [`Supervisor::take_detached_failures`].
    ///
    /// Inside a run, typically from an output callback, the launch is
    /// scheduled on the existing domain and `Ok(None)` is returned at once.
    /// Tag and command-line errors are still reported synchronously.
    pub fn run(&self, command_line: &str, tag: &str) -> Result<Option<i32>, SupervisorError> {
        let mut current = lock(&self.inner.domain);
        if let Some(domain) = current.as_ref() {
            let domain = domain.clone();
            drop(current);
            self.schedule(&domain, command_line, tag)?;
            return Ok(None);
        }

        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(SupervisorError::ForeignRuntime);
        }

        let (runtime, domain) = Domain::create()?;
        *current = Some(domain.clone());
        drop(current);
        let _active = ActiveDomain(&self.inner.domain);

        tracing::debug!("Starting run of '{}' as '{}'", command_line, tag);
        let result = runtime.block_on(self.run_main(command_line, tag, &domain));
        result.map(Some)
    }

    pub fn run_default(&self, command_line: &str) -> Result<Option<i32>, SupervisorError> {
        self.run(command_line, DEFAULT_TAG)
    }

    /// Launch one process and stream it to completion.
    ///
    /// Fails with [`SupervisorError::DuplicateTag`] before anything is
    /// spawned if `tag` was used before by this supervisor.
    pub async fn launch_and_stream(
        &self,
        command_line: &str,
        tag: &str,
    ) -> Result<i32, SupervisorError> {
        let (command, slot) = self.prepare(command_line, tag)?;
        self.launch_prepared(command, slot, tag).await
    }

    /// Like [`Supervisor::launch_and_stream`] for an already tokenized command.
    pub async fn launch_command(
        &self,
        command: ProcessCommand,
        tag: &str,
    ) -> Result<i32, SupervisorError> {
        let slot = self.with_registry(|r| r.register(tag, &command.command_line()))?;
        self.launch_prepared(command, slot, tag).await
    }

    /// Whether a run is currently active on this supervisor.
    pub fn in_run(&self) -> bool {
        lock(&self.inner.domain).is_some()
    }

    /// Remove and return the failures of chained processes collected by
    /// previous runs, oldest first.
    pub fn take_detached_failures(&self) -> Vec<SupervisorError> {
        std::mem::take(&mut *lock(&self.inner.detached))
    }

    pub fn total_process_count(&self) -> usize {
        self.with_registry(|r| r.len())
    }

    pub fn running_process_count(&self) -> usize {
        self.with_registry(|r| r.running_count())
    }

    /// Status of the first process ever registered.
    pub fn main_process_status(&self) -> Option<i32> {
        self.with_registry(|r| r.first().and_then(ProcessRecord::status))
    }

    pub fn status(&self, tag: &str) -> Option<i32> {
        self.with_registry(|r| r.get(tag).and_then(ProcessRecord::status))
    }

    pub fn pid(&self, tag: &str) -> Option<u32> {
        self.with_registry(|r| r.get(tag).and_then(ProcessRecord::pid))
    }

    pub fn state(&self, tag: &str) -> Option<LaunchState> {
        self.with_registry(|r| r.get(tag).map(ProcessRecord::state))
    }

    /// Registered tags in launch order.
    pub fn tags(&self) -> Vec<String> {
        self.with_registry(|r| r.iter().map(|p| p.tag().to_string()).collect())
    }

    /// A snapshot of every record in launch order.
    pub fn records(&self) -> Vec<ProcessRecord> {
        self.with_registry(|r| r.iter().cloned().collect())
    }

    async fn run_main(
        &self,
        command_line: &str,
        tag: &str,
        domain: &Domain,
    ) -> Result<i32, SupervisorError> {
        let main = self.launch_and_stream(command_line, tag).await;
        let pending = domain.pending_count();
        if pending > 0 {
            tracing::debug!("Waiting for {} chained unit(s) of '{}'", pending, tag);
        }
        let failures = domain.wait_all().await;

        for failure in &failures {
            tracing::warn!("{}", failure);
        }
        lock(&self.inner.detached).extend(failures);
        main
    }

    fn schedule(&self, domain: &Domain, command_line: &str, tag: &str) -> Result<(), SupervisorError> {
        let (command, slot) = self.prepare(command_line, tag)?;
        let supervisor = self.clone();
        let owned_tag = tag.to_string();
        domain.schedule(tag, async move {
            supervisor.launch_prepared(command, slot, &owned_tag).await
        });
        tracing::debug!("Scheduled '{}' on the running domain", tag);
        Ok(())
    }

    /// Register `tag` and tokenize the command line; no process exists yet.
    fn prepare(
        &self,
        command_line: &str,
        tag: &str,
    ) -> Result<(ProcessCommand, ExitSlot), SupervisorError> {
        let slot = self.with_registry(|r| r.register(tag, command_line))?;
        match ProcessCommand::parse(command_line) {
            Ok(command) => Ok((command, slot)),
            Err(source) => {
                self.with_registry(|r| r.release(tag));
                Err(SupervisorError::Spawn {
                    tag: tag.to_string(),
                    source,
                })
            }
        }
    }

    async fn launch_prepared(
        &self,
        command: ProcessCommand,
        slot: ExitSlot,
        tag: &str,
    ) -> Result<i32, SupervisorError> {
        let mut handle = match ProcessHandle::spawn(&command) {
            Ok(handle) => handle,
            Err(source) => {
                self.with_registry(|r| r.release(tag));
                return Err(SupervisorError::Spawn {
                    tag: tag.to_string(),
                    source,
                });
            }
        };

        self.with_registry(|r| r.mark_spawned(tag, handle.pid()));
        self.inner.policy.on_process_started(self, tag);

        self.with_registry(|r| r.mark_streaming(tag));
        let binding = PolicyBinding {
            supervisor: self,
            tag,
        };
        let summary = match StreamPump::new(tag, &binding).run(&mut handle, &slot).await {
            Ok(summary) => summary,
            Err(e) => {
                self.with_registry(|r| r.mark_aborted(tag));
                return Err(SupervisorError::from_pump(tag, e));
            }
        };

        self.inner.policy.on_process_ended(self, tag);
        Ok(summary.status)
    }

    fn with_registry<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        f(&mut lock(&self.inner.registry))
    }
}

/// Routes pump lines of one process to the supervisor's policy.
struct PolicyBinding<'a> {
    supervisor: &'a Supervisor,
    tag: &'a str,
}

impl LineHandler for PolicyBinding<'_> {
    fn on_line(&self, source: StreamSource, line: &[u8]) -> anyhow::Result<()> {
        let policy = self.supervisor.policy();
        match source {
            StreamSource::Stdout => policy.on_stdout_line(self.supervisor, self.tag, line),
            StreamSource::Stderr => policy.on_stderr_line(self.supervisor, self.tag, line),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
