use std::sync::atomic::{AtomicBool, Ordering};

use super::format::decode_line;
use super::OutputPolicy;
use crate::subprocess::streaming::StreamSource;
use crate::supervisor::Supervisor;

/// Launch `command_line` as `chained_tag` the first time `trigger` shows up
/// on `source` of the process tagged `watch_tag`.
#[derive(Debug)]
pub struct ChainRule {
    pub watch_tag: String,
    pub source: StreamSource,
    pub trigger: String,
    pub command_line: String,
    pub chained_tag: String,
    fired: AtomicBool,
}

impl ChainRule {
    pub fn new(
        watch_tag: impl Into<String>,
        source: StreamSource,
        trigger: impl Into<String>,
        command_line: impl Into<String>,
        chained_tag: impl Into<String>,
    ) -> Self {
        Self {
            watch_tag: watch_tag.into(),
            source,
            trigger: trigger.into(),
            command_line: command_line.into(),
            chained_tag: chained_tag.into(),
            fired: AtomicBool::new(false),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    fn matches(&self, tag: &str, source: StreamSource, line: &[u8]) -> bool {
        tag == self.watch_tag && source == self.source && contains(line, self.trigger.as_bytes())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Wraps another policy: prefixes every line with `[tag] ` before passing it
/// on, and launches chained processes according to its rules.
pub struct ChainingPolicy<P> {
    inner: P,
    rules: Vec<ChainRule>,
}

impl<P> ChainingPolicy<P>
where
    P: OutputPolicy,
{
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ChainRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ChainRule] {
        &self.rules
    }

    fn prefixed(tag: &str, line: &[u8]) -> Vec<u8> {
        format!("[{}] {}", tag, decode_line(line)).into_bytes()
    }

    fn chain(
        &self,
        supervisor: &Supervisor,
        tag: &str,
        source: StreamSource,
        line: &[u8],
    ) -> anyhow::Result<()> {
        for rule in &self.rules {
            if !rule.matches(tag, source, line) {
                continue;
            }
            if rule.fired.swap(true, Ordering::SeqCst) {
                continue;
            }
            tracing::debug!(
                "'{}' seen on {} of '{}', launching '{}'",
                rule.trigger,
                source,
                tag,
                rule.chained_tag
            );
            supervisor.run(&rule.command_line, &rule.chained_tag)?;
        }
        Ok(())
    }
}

impl<P> OutputPolicy for ChainingPolicy<P>
where
    P: OutputPolicy,
{
    fn on_stdout_line(&self, supervisor: &Supervisor, tag: &str, line: &[u8]) -> anyhow::Result<()> {
        self.inner
            .on_stdout_line(supervisor, tag, &Self::prefixed(tag, line))?;
        self.chain(supervisor, tag, StreamSource::Stdout, line)
    }

    fn on_stderr_line(&self, supervisor: &Supervisor, tag: &str, line: &[u8]) -> anyhow::Result<()> {
        self.inner
            .on_stderr_line(supervisor, tag, &Self::prefixed(tag, line))?;
        self.chain(supervisor, tag, StreamSource::Stderr, line)
    }

    fn on_process_started(&self, supervisor: &Supervisor, tag: &str) {
        self.inner.on_process_started(supervisor, tag);
    }

    fn on_process_ended(&self, supervisor: &Supervisor, tag: &str) {
        self.inner.on_process_ended(supervisor, tag);
    }
}
