use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::guard::blocked_pattern;
use super::runner::{ProcessRunner, SystemRunner};
use crate::result::{CommandResult, ErrorKind};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs operator-supplied text as a shell command with the host process's own
/// permissions. The deny-list is checked before anything is spawned; beyond
/// that and the wall-clock timeout there is no isolation.
pub struct ShellGateway {
    runner: Arc<dyn ProcessRunner>,
    workdir: PathBuf,
    timeout: Duration,
}

impl ShellGateway {
    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self::with_runner(Arc::new(SystemRunner::new()), workdir, timeout)
    }

    pub fn with_runner(
        runner: Arc<dyn ProcessRunner>,
        workdir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
            timeout,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn run(&self, command: &str) -> CommandResult {
        self.run_with_timeout(command, self.timeout)
    }

    pub fn run_with_timeout(&self, command: &str, timeout: Duration) -> CommandResult {
        if let Some(pattern) = blocked_pattern(command) {
            warn!(pattern, "refused blocked command");
            return CommandResult::failure(
                ErrorKind::Blocked,
                format!("blocked: command matches deny-list entry {:?}", pattern),
            );
        }
        info!(command = %truncate_for_log(command), "running shell command");
        self.runner.run(command, &self.workdir, timeout)
    }
}

fn truncate_for_log(command: &str) -> String {
    command.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingRunner {
        calls: Mutex<Vec<(String, PathBuf, Duration)>>,
    }

    impl RecordingRunner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, PathBuf, Duration)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> CommandResult {
            self.calls
                .lock()
                .unwrap()
                .push((command.to_string(), cwd.to_path_buf(), timeout));
            CommandResult::success("ran")
        }
    }

    #[test]
    fn blocked_command_never_spawns() {
        let runner = RecordingRunner::new();
        let gateway = ShellGateway::with_runner(runner.clone(), "/home/ops", DEFAULT_TIMEOUT);

        for command in ["rm -rf /", "sudo mkfs.ext4 /dev/sdb", ":(){:|:&};:"] {
            let result = gateway.run(command);
            assert!(!result.ok);
            assert_eq!(result.error_kind, Some(ErrorKind::Blocked));
        }
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn allowed_command_reaches_runner_with_workdir_and_timeout() {
        let runner = RecordingRunner::new();
        let gateway =
            ShellGateway::with_runner(runner.clone(), "/home/ops", Duration::from_secs(7));

        let result = gateway.run("uptime");
        assert!(result.ok);
        assert_eq!(result.payload, "ran");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "uptime");
        assert_eq!(calls[0].1, PathBuf::from("/home/ops"));
        assert_eq!(calls[0].2, Duration::from_secs(7));
    }

    #[cfg(unix)]
    #[test]
    fn sleeping_past_the_budget_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = ShellGateway::new(dir.path(), Duration::from_secs(1));

        let started = std::time::Instant::now();
        let result = gateway.run("sleep 10");
        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
