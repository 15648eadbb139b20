// src/exec/command.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::errors::{Result, WatchRunError};

/// The command run on every trigger: executable plus ordered arguments, run
/// directly (no shell). Immutable once the loop has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Build the process description.
    ///
    /// - stdout/stderr are piped so the supervisor can forward them.
    /// - stdin is closed; the command must not wait for input.
    /// - On unix the child leads its own process group, so termination
    ///   reaches the processes it spawns (e.g. test binaries under `cargo`)
    ///   and a terminal Ctrl-C reaches only us.
    /// - `kill_on_drop` makes sure a dropped handle never leaves it running.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    pub fn spawn(&self) -> Result<Child> {
        self.to_command()
            .spawn()
            .map_err(|source| WatchRunError::SpawnError {
                program: self.program.clone(),
                source,
            })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        format!("{s:?}")
    } else {
        s.to_string()
    }
}
