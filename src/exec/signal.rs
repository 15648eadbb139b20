// src/exec/signal.rs

//! Termination signals for a supervised child.
//!
//! On unix the child runs in its own process group (see
//! [`CommandSpec::to_command`](crate::exec::CommandSpec::to_command)), so
//! signals go to the whole group. Elsewhere the only tool is a hard kill.

use std::io;

use tokio::process::Child;
use tracing::debug;

/// Politely ask the child to exit (SIGTERM to its process group).
///
/// A child that is already gone is not an error.
#[cfg(unix)]
pub fn request_termination(child: &mut Child) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};

    let Some(pgid) = group_id(child) else {
        return Ok(());
    };
    match killpg(pgid, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(errno.into()),
    }
}

#[cfg(not(unix))]
pub fn request_termination(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

/// Kill the child (and on unix its process group) and reap it.
pub async fn force_kill(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        if let Some(pgid) = group_id(child) {
            if let Err(errno) = killpg(pgid, Signal::SIGKILL) {
                debug!(%errno, "SIGKILL to process group failed");
            }
        }
    }

    if let Err(err) = child.kill().await {
        debug!(error = %err, "kill/reap of child failed");
    }
}

#[cfg(unix)]
fn group_id(child: &Child) -> Option<nix::unistd::Pid> {
    let pid = child.id()?;
    i32::try_from(pid).ok().map(nix::unistd::Pid::from_raw)
}
