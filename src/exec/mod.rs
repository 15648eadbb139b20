// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the command, using
//! `tokio::process::Command`, and reporting back to the runtime.
//!
//! - [`command`] holds the immutable [`CommandSpec`] and how it is spawned.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `RealExecutorBackend`, which guarantees at most one live child.
//! - [`runner`] supervises one child: output forwarding, exit, termination.
//! - [`signal`] sends SIGTERM/SIGKILL to the child's process group.
//! - [`sink`] is where output and run reports end up.

use std::time::Duration;

use crate::types::TerminatedOutput;

pub mod backend;
pub mod command;
pub mod runner;
pub mod signal;
pub mod sink;

pub use backend::{ExecutorBackend, RealExecutorBackend, StartResult};
pub use command::CommandSpec;
pub use sink::{OutputSink, RunReport, StdioSink, describe_outcome};

/// How superseded runs are torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Grace period between SIGTERM and SIGKILL.
    pub kill_timeout: Duration,
    pub terminated_output: TerminatedOutput,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            kill_timeout: Duration::from_millis(2000),
            terminated_output: TerminatedOutput::Flush,
        }
    }
}
