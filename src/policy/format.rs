use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use super::OutputPolicy;
use crate::supervisor::Supervisor;

pub const PLACEHOLDER: &str = "{}";

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("format template {template:?} must contain exactly one `{{}}` placeholder, found {found}")]
    Placeholder { template: String, found: usize },
}

/// Check that `template` has exactly one `{}` placeholder.
pub fn validate_template(template: &str) -> Result<(), FormatError> {
    let found = template.matches(PLACEHOLDER).count();
    if found != 1 {
        return Err(FormatError::Placeholder {
            template: template.to_string(),
            found,
        });
    }
    Ok(())
}

/// Decode a raw line as UTF-8, falling back to an escaped `b'...'` literal.
pub fn decode_line(line: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(line) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(format!("b'{}'", line.escape_ascii())),
    }
}

/// A format template paired with the sink it writes to.
pub struct OutputSpec {
    template: String,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl OutputSpec {
    pub fn new(
        template: impl Into<String>,
        sink: impl Write + Send + 'static,
    ) -> Result<Self, FormatError> {
        let template = template.into();
        validate_template(&template)?;
        Ok(Self {
            template,
            sink: Mutex::new(Box::new(sink)),
        })
    }

    pub fn stdout(template: impl Into<String>) -> Result<Self, FormatError> {
        Self::new(template, io::stdout())
    }

    pub fn stderr(template: impl Into<String>) -> Result<Self, FormatError> {
        Self::new(template, io::stderr())
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, line: &[u8]) -> String {
        self.template.replacen(PLACEHOLDER, &decode_line(line), 1)
    }

    /// Render `line` and write it to the sink in a single call.
    pub fn write(&self, line: &[u8]) -> io::Result<()> {
        let rendered = self.render(line);
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(rendered.as_bytes())?;
        sink.flush()
    }
}

impl std::fmt::Debug for OutputSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSpec")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Writes every stdout line through one [`OutputSpec`] and every stderr line
/// through another.
#[derive(Debug)]
pub struct FormattingPolicy {
    stdout: OutputSpec,
    stderr: OutputSpec,
}

impl FormattingPolicy {
    pub fn new(stdout: OutputSpec, stderr: OutputSpec) -> Self {
        Self { stdout, stderr }
    }
}

impl Default for FormattingPolicy {
    fn default() -> Self {
        Self::new(
            OutputSpec {
                template: PLACEHOLDER.to_string(),
                sink: Mutex::new(Box::new(io::stdout())),
            },
            OutputSpec {
                template: PLACEHOLDER.to_string(),
                sink: Mutex::new(Box::new(io::stderr())),
            },
        )
    }
}

impl OutputPolicy for FormattingPolicy {
    fn on_stdout_line(&self, _: &Supervisor, _: &str, line: &[u8]) -> anyhow::Result<()> {
        self.stdout.write(line)?;
        Ok(())
    }

    fn on_stderr_line(&self, _: &Supervisor, _: &str, line: &[u8]) -> anyhow::Result<()> {
        self.stderr.write(line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CaptureSink;

    #[test]
    fn test_template_needs_exactly_one_placeholder() {
        assert!(validate_template("OUT: {}").is_ok());
        assert!(matches!(
            validate_template("no placeholder"),
            Err(FormatError::Placeholder { found: 0, .. })
        ));
        assert!(matches!(
            validate_template("{} and {}"),
            Err(FormatError::Placeholder { found: 2, .. })
        ));
        assert!(OutputSpec::new("{}{}", CaptureSink::new()).is_err());
    }

    #[test]
    fn test_decode_line_valid_utf8() {
        assert_eq!(decode_line(b"caf\xc3\xa9\n"), "café\n");
    }

    #[test]
    fn test_decode_line_falls_back_to_byte_literal() {
        assert_eq!(decode_line(b"bad \xff\n"), "b'bad \\xff\\n'");
    }

    #[test]
    fn test_output_spec_writes_once_per_line() {
        let sink = CaptureSink::new();
        let spec = OutputSpec::new("OUT: {}", sink.clone()).unwrap();

        spec.write(b"a\n").unwrap();
        spec.write(b"b\n").unwrap();

        assert_eq!(sink.writes(), vec!["OUT: a\n", "OUT: b\n"]);
    }

    #[test]
    fn test_render_only_substitutes_placeholder() {
        let spec = OutputSpec::new("[{}]", CaptureSink::new()).unwrap();
        assert_eq!(spec.render(b"x {} y"), "[x {} y]");
    }
}
