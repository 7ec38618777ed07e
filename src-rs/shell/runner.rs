use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::result::{CommandResult, ErrorKind};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to wait for pipes to drain after the shell itself has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Spawns a shell command and waits for it under a wall-clock budget.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> CommandResult;
}

/// Runs commands through `sh -c` in their own process group so a timeout can
/// take down everything the command started.
pub struct SystemRunner {
    shell: PathBuf,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> CommandResult {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(shell = %self.shell.display(), error = %err, "failed to spawn shell");
                return CommandResult::failure(
                    ErrorKind::ExecutionError,
                    format!("failed to start {}: {}", self.shell.display(), err),
                );
            }
        };
        debug!(pid = child.id(), "command started");

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let started = Instant::now();

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(err) => {
                    terminate(&mut child);
                    return CommandResult::failure(ErrorKind::ExecutionError, err.to_string());
                }
            }
            if started.elapsed() >= timeout {
                terminate(&mut child);
                warn!(?timeout, "command timed out");
                return CommandResult::failure(
                    ErrorKind::Timeout,
                    format!("command timed out after {:?}", timeout),
                );
            }
            thread::sleep(POLL_INTERVAL);
        };

        // Background jobs may still hold the pipes open; bound the wait and
        // clean up whatever is left in the group.
        let deadline = Instant::now() + DRAIN_GRACE;
        let out = stdout.recv_timeout(deadline.saturating_duration_since(Instant::now()));
        let err = stderr.recv_timeout(deadline.saturating_duration_since(Instant::now()));
        if out.is_err() || err.is_err() {
            kill_group(&child);
        }
        let out = out.unwrap_or_default();
        let err = err.unwrap_or_default();

        let payload = if out.trim().is_empty() { err } else { out };
        if status.success() {
            CommandResult::success(payload)
        } else {
            debug!(code = ?status.code(), "command exited non-zero");
            CommandResult::failure(ErrorKind::ExecutionError, payload)
        }
    }
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

fn kill_group(child: &Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        let _ = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL);
    }
    #[cfg(not(unix))]
    let _ = child;
}

fn terminate(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}
