use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::ProcessError;

/// A tokenized command ready to be handed to process creation.
///
/// No shell is involved: `program` is executed directly with `args`, so
/// metacharacters such as `&&`, `|` or `>` reach the program verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessCommand {
    /// Split a shell-style command line into program and arguments.
    ///
    /// Quoting follows POSIX shell word splitting; nothing is expanded.
    pub fn parse(command_line: &str) -> Result<Self, ProcessError> {
        let mut parts =
            shell_words::split(command_line).map_err(|source| ProcessError::Parse {
                command_line: command_line.to_string(),
                source,
            })?;

        if parts.is_empty() {
            return Err(ProcessError::EmptyCommand);
        }

        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
            env: HashMap::new(),
            working_dir: None,
        })
    }

    /// Render the command back into a single quoted command line.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(self.args.iter()))
    }
}

pub struct ProcessCommandBuilder {
    command: ProcessCommand,
}

impl ProcessCommandBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            command: ProcessCommand {
                program: program.to_string(),
                args: Vec::new(),
                env: HashMap::new(),
                working_dir: None,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.command.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command
            .args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.command.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.command.working_dir = Some(dir.to_path_buf());
        self
    }

    pub fn build(self) -> ProcessCommand {
        self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_words() {
        let command = ProcessCommand::parse("printf 'a\\nb\\n'").unwrap();
        assert_eq!(command.program, "printf");
        assert_eq!(command.args, vec!["a\\nb\\n".to_string()]);
    }

    #[test]
    fn test_parse_respects_quotes() {
        let command =
            ProcessCommand::parse(r#"bash -c 'echo stdout && sleep 1' "two words""#).unwrap();
        assert_eq!(command.program, "bash");
        assert_eq!(
            command.args,
            vec![
                "-c".to_string(),
                "echo stdout && sleep 1".to_string(),
                "two words".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_does_not_expand_metacharacters() {
        let command = ProcessCommand::parse("echo a && echo b").unwrap();
        assert_eq!(command.program, "echo");
        assert_eq!(command.args, vec!["a", "&&", "echo", "b"]);
    }

    #[test]
    fn test_parse_empty_command_line() {
        assert!(matches!(
            ProcessCommand::parse("   "),
            Err(ProcessError::EmptyCommand)
        ));
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let err = ProcessCommand::parse("echo 'oops").unwrap_err();
        match err {
            ProcessError::Parse { command_line, .. } => assert_eq!(command_line, "echo 'oops"),
            other => panic!("Expected Parse error, got {other:?}"),
        }
        assert!(ProcessCommand::parse("echo 'oops").unwrap_err().is_spawn_error());
    }

    #[test]
    fn test_builder_round_trips_through_command_line() {
        let command = ProcessCommandBuilder::new("sh")
            .arg("-c")
            .args(["echo 'hi there'"])
            .env("GREETING", "hello")
            .build();

        assert_eq!(command.env.get("GREETING").map(String::as_str), Some("hello"));

        let reparsed = ProcessCommand::parse(&command.command_line()).unwrap();
        assert_eq!(reparsed.program, command.program);
        assert_eq!(reparsed.args, command.args);
    }
}
