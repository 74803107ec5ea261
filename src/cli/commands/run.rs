//! Run command implementation

use anyhow::{anyhow, Context, Result};

use crate::config::Config;
use crate::supervisor::Supervisor;

/// Arguments of `procstream run`
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub tag: Option<String>,
    pub stdout_format: Option<String>,
    pub stderr_format: Option<String>,
    pub command: Vec<String>,
}

/// A single argument is taken as a full command line; several are re-quoted.
pub fn command_line_from_args(args: &[String]) -> String {
    match args {
        [single] => single.clone(),
        many => shell_words::join(many),
    }
}

/// Stream one command through the configured formatting policy
pub fn run_command(config: &Config, params: RunParams) -> Result<i32> {
    let mut config = config.clone();
    if let Some(format) = params.stdout_format {
        config.stdout.format = format;
    }
    if let Some(format) = params.stderr_format {
        config.stderr.format = format;
    }

    let policy = config
        .formatting_policy()
        .context("Invalid output format")?;
    let tag = params.tag.unwrap_or_else(|| config.default_tag.clone());
    let command_line = command_line_from_args(&params.command);

    let supervisor = Supervisor::new(policy);
    let status = supervisor
        .run(&command_line, &tag)?
        .ok_or_else(|| anyhow!("Run of '{}' finished without a status", tag))?;

    println!("Finished with status: {}.", status);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_argument_is_used_verbatim() {
        let args = vec!["bash -c 'echo hi'".to_string()];
        assert_eq!(command_line_from_args(&args), "bash -c 'echo hi'");
    }

    #[test]
    fn test_multiple_arguments_are_requoted() {
        let args = vec!["sh".to_string(), "-c".to_string(), "echo a b".to_string()];
        assert_eq!(command_line_from_args(&args), "sh -c 'echo a b'");
    }

    #[test]
    fn test_bad_format_is_rejected_before_spawning() {
        let params = RunParams {
            stdout_format: Some("missing placeholder".to_string()),
            command: vec!["true".to_string()],
            ..Default::default()
        };
        let err = run_command(&Config::default(), params).unwrap_err();
        assert!(err.to_string().contains("Invalid output format"));
    }
}
