//! Invocation of the external audio tools.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::{Result, StemMixError};

/// A program and its arguments, ready to be spawned.
///
/// Arguments are kept as OS strings so paths reach the tool byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Executes external commands on behalf of the pipeline.
///
/// Implementations must be shareable across worker threads.
pub trait ToolRunner: Send + Sync {
    /// Runs the command to completion. Only success or failure matters.
    fn run(&self, command: &ExternalCommand) -> Result<()>;

    /// Runs the command and returns everything it wrote to stdout.
    fn capture(&self, command: &ExternalCommand) -> Result<Vec<u8>>;
}

/// Spawns real child processes. Stderr is inherited so tool diagnostics
/// reach the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn command(command: &ExternalCommand) -> Command {
        let mut process = Command::new(OsStr::new(&command.program));
        process.args(&command.args).stderr(Stdio::inherit());
        process
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ExternalCommand) -> Result<()> {
        let status = Self::command(command)
            .stdout(Stdio::null())
            .status()
            .map_err(|err| spawn_error(command, err))?;

        if status.success() {
            Ok(())
        } else {
            Err(StemMixError::tool(&command.program, status.to_string()))
        }
    }

    fn capture(&self, command: &ExternalCommand) -> Result<Vec<u8>> {
        let output = Self::command(command)
            .output()
            .map_err(|err| spawn_error(command, err))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(StemMixError::tool(&command.program, output.status.to_string()))
        }
    }
}

fn spawn_error(command: &ExternalCommand, err: std::io::Error) -> StemMixError {
    StemMixError::tool(&command.program, format!("failed to start: {err}"))
}

/// Logs commands instead of running them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl ToolRunner for DryRunRunner {
    fn run(&self, command: &ExternalCommand) -> Result<()> {
        tracing::info!(%command, "dry run");
        Ok(())
    }

    fn capture(&self, command: &ExternalCommand) -> Result<Vec<u8>> {
        Err(StemMixError::tool(
            &command.program,
            "output cannot be captured during a dry run",
        ))
    }
}
