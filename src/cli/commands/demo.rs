//! Built-in demonstrations of output policies

use anyhow::{anyhow, Result};

use crate::cli::args::DemoCommands;
use crate::policy::{ChainRule, ChainingPolicy, FormattingPolicy, OutputSpec};
use crate::subprocess::streaming::StreamSource;
use crate::supervisor::Supervisor;

pub const SIMPLE_COMMAND: &str =
    "bash -c 'echo stdout && sleep 1 && echo stderr 1>&2 && sleep 1 && echo done && exit 1'";

pub const CHAINED_INITIAL_COMMAND: &str = "bash -c 'echo stdout && sleep 1 && echo trigger chained 1>&2 && sleep 1 && echo more output && sleep 1 && echo done && exit 3'";

pub const CHAINED_COMMAND: &str =
    "bash -c 'echo chained stdout && sleep 2 && echo stderr chained 1>&2 && sleep 1 && echo done chained'";

fn demo_formatting() -> Result<FormattingPolicy> {
    Ok(FormattingPolicy::new(
        OutputSpec::stdout("STDOUT: {}")?,
        OutputSpec::stderr("STDERR: {}")?,
    ))
}

/// Build the policy of the chained demo: "trigger" on stderr of `main`
/// launches [`CHAINED_COMMAND`] as `chained`.
pub fn chained_policy<P>(inner: P) -> ChainingPolicy<P>
where
    P: crate::policy::OutputPolicy,
{
    ChainingPolicy::new(inner).with_rule(ChainRule::new(
        "main",
        StreamSource::Stderr,
        "trigger",
        CHAINED_COMMAND,
        "chained",
    ))
}

pub fn run_demo(demo: DemoCommands) -> Result<i32> {
    match demo {
        DemoCommands::Simple => {
            let supervisor = Supervisor::new(demo_formatting()?);
            let status = supervisor
                .run_default(SIMPLE_COMMAND)?
                .ok_or_else(|| anyhow!("Demo finished without a status"))?;
            println!("Finished with status: {}.", status);
            Ok(status)
        }
        DemoCommands::Chained => {
            let supervisor = Supervisor::new(chained_policy(demo_formatting()?));
            let status = supervisor
                .run(CHAINED_INITIAL_COMMAND, "main")?
                .ok_or_else(|| anyhow!("Demo finished without a status"))?;
            println!("Initial finished with status: {}.", status);
            Ok(status)
        }
    }
}
