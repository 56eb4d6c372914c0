//! Shell command execution
//!
//! Every interaction with bitbake and the host package tools goes through a
//! [`CommandRunner`], so callers can be exercised against scripted output
//! instead of a real build host.

use crate::error::{BitbakeError, BitbakeResult};
use std::process::Command;
use tracing::debug;

/// Runs a shell command line and returns its combined output
pub trait CommandRunner {
    /// Run `command` and return everything it wrote to stdout and stderr.
    ///
    /// A non-zero exit is reported as [`BitbakeError::CommandFailed`] carrying
    /// the captured output.
    fn run(&self, command: &str) -> BitbakeResult<String>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &str) -> BitbakeResult<String> {
        (**self).run(command)
    }
}

/// Runs commands through `bash -c`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::with_shell("bash")
    }

    /// Use a different shell binary (it must understand `-c` and `source`)
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> BitbakeResult<String> {
        debug!("::: {} :::", command);

        // stderr joins stdout inside the shell so both keep their relative order
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(format!("exec 2>&1\n{command}"))
            .output()
            .map_err(|e| BitbakeError::Spawn(command.to_string(), e))?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            debug!("command failed:: {} :: {}\nOutput: {}", command, output.status, text);
            return Err(BitbakeError::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
                output: text,
            });
        }

        Ok(text)
    }
}
