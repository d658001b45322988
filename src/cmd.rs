use std::{
    borrow::Cow,
    fmt, io,
    process::{Command, Stdio},
};

use crate::{error::LaptopError, ui, ui::LogSink};

// ── Command lines ─────────────────────────────────────────────────────────────

/// A program and its argument vector, executed without a host shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Renders the command the way a POSIX shell would need it typed.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Single-quotes `word` for a POSIX shell unless it is made only of safe characters.
pub fn quote(word: &str) -> Cow<'_, str> {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));

    if safe {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
    }
}

// ── Runners ───────────────────────────────────────────────────────────────────

/// Executes command lines synchronously; success means exit status 0.
pub trait Runner {
    fn run(&mut self, cmd: &CommandLine) -> Result<(), LaptopError>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
    fn run(&mut self, cmd: &CommandLine) -> Result<(), LaptopError> {
        (**self).run(cmd)
    }
}

fn not_found_or_io(program: &str, err: io::Error) -> LaptopError {
    if err.kind() == io::ErrorKind::NotFound {
        LaptopError::CommandNotFound(program.to_string())
    } else {
        LaptopError::Io(err)
    }
}

fn captured_output(stdout: &[u8], stderr: &[u8]) -> String {
    let out = String::from_utf8_lossy(stdout);
    let err = String::from_utf8_lossy(stderr);
    [out.trim(), err.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs commands on the host while a spinner is shown, then hands the
/// captured output to the log sink.
pub struct SystemRunner<L> {
    log: L,
}

impl<L: LogSink> SystemRunner<L> {
    pub fn new(log: L) -> Self {
        Self { log }
    }
}

impl<L: LogSink> Runner for SystemRunner<L> {
    fn run(&mut self, cmd: &CommandLine) -> Result<(), LaptopError> {
        let line = cmd.to_string();
        self.log.command(&line);

        let pb = ui::spinner(format!("Running {}…", cmd.program));
        let result = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| not_found_or_io(&cmd.program, e));
        pb.finish_and_clear();

        let output = result?;
        let text = captured_output(&output.stdout, &output.stderr);
        if !text.is_empty() {
            self.log.output(&text);
        }

        if !output.status.success() {
            return Err(LaptopError::CommandFailed(
                line,
                output.status.code().unwrap_or(-1),
            ));
        }
        Ok(())
    }
}

/// Logs every command and pretends it succeeded.
pub struct DryRunRunner<L> {
    log: L,
}

impl<L: LogSink> DryRunRunner<L> {
    pub fn new(log: L) -> Self {
        Self { log }
    }
}

impl<L: LogSink> Runner for DryRunRunner<L> {
    fn run(&mut self, cmd: &CommandLine) -> Result<(), LaptopError> {
        self.log.command(&format!("{}  (dry-run)", cmd));
        Ok(())
    }
}
