use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::command::{parse, Command, ShellCommand};
use super::heuristics::{match_rules, Action, Folder, ListTarget};
use super::render;
use crate::config::RelayConfig;
use crate::helpers::expand_home;
use crate::llm::{ChatClient, IntentKind};
use crate::result::{CommandResult, ErrorKind};
use crate::shell::ShellGateway;
use crate::task::{TaskError, TaskStatus, TaskStore};
use crate::telemetry::{SysinfoProbe, SystemProbe};
use crate::tools::{analyze_directory, list_directory, read_file, write_file, READ_LIMIT};

/// Processes shown for `$ps` and the process heuristic.
pub const PROCESS_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchOptions {
    pub heuristics: bool,
    pub llm_intent: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            heuristics: true,
            llm_intent: false,
        }
    }
}

/// Turns one inbound message into one reply. Every branch renders text; no
/// error leaves `handle`.
pub struct Dispatcher {
    store: TaskStore,
    shell: ShellGateway,
    probe: Arc<dyn SystemProbe>,
    chat: Option<Arc<dyn ChatClient>>,
    home: PathBuf,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(cfg: &RelayConfig, chat: Option<Arc<dyn ChatClient>>) -> Result<Self, TaskError> {
        let store = TaskStore::open(&cfg.tasks_dir, cfg.strict_transitions)?;
        let shell = ShellGateway::new(&cfg.home_dir, Duration::from_secs(cfg.shell_timeout_secs));
        Ok(Self::from_parts(
            store,
            shell,
            Arc::new(SysinfoProbe::new()),
            chat,
            cfg.home_dir.clone(),
            DispatchOptions {
                heuristics: cfg.heuristics,
                llm_intent: cfg.llm_intent,
            },
        ))
    }

    pub fn from_parts(
        store: TaskStore,
        shell: ShellGateway,
        probe: Arc<dyn SystemProbe>,
        chat: Option<Arc<dyn ChatClient>>,
        home: PathBuf,
        options: DispatchOptions,
    ) -> Self {
        Self {
            store,
            shell,
            probe,
            chat,
            home,
            options,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn handle(&self, text: &str) -> String {
        match parse(text) {
            Command::CreateTask(description) => self.create_task(&description),
            Command::TaskUsage => render::TASK_USAGE.to_string(),
            Command::TaskStatus(id) => self.task_status(&id),
            Command::StatusUsage => render::STATUS_USAGE.to_string(),
            Command::ListTasks(filter) => self.list_tasks(filter.as_deref()),
            Command::Shell(command) => self.shell_command(command),
            Command::Help => render::HELP_TEXT.to_string(),
            Command::Text(text) => self.free_text(&text),
        }
    }

    fn create_task(&self, description: &str) -> String {
        match self.store.create(description) {
            Ok(task) => render::task_created(&task, &self.store.task_path(&task.id)),
            Err(err) => task_failure(err),
        }
    }

    fn task_status(&self, id: &str) -> String {
        match self.store.get(id) {
            Ok(task) => render::task_status(&task),
            Err(err) => task_failure(err),
        }
    }

    fn list_tasks(&self, filter: Option<&str>) -> String {
        let status = match filter {
            Some(raw) => match raw.parse::<TaskStatus>() {
                Ok(status) => Some(status),
                Err(_) => return render::list_filter_usage(raw),
            },
            None => None,
        };
        match self.store.list(status) {
            Ok(tasks) => render::task_list(&tasks),
            Err(err) => task_failure(err),
        }
    }

    fn shell_command(&self, command: ShellCommand) -> String {
        match command {
            ShellCommand::SystemInfo => render::reply(self.snapshot(false)),
            ShellCommand::ProcessList => render::reply(self.processes()),
            ShellCommand::ReadFile(path) => {
                let path = self.resolve(&path);
                render::reply(
                    read_file(&path, READ_LIMIT)
                        .map(|read| CommandResult::success(render::file_read(&read)))
                        .unwrap_or_else(|err| CommandResult::failure(err.kind(), err.to_string())),
                )
            }
            ShellCommand::WriteFile { path, content } => {
                let path = self.resolve(&path);
                render::reply(
                    write_file(&path, &content)
                        .map(|written| CommandResult::success(render::file_written(&written)))
                        .unwrap_or_else(|err| CommandResult::failure(ErrorKind::ExecutionError, err)),
                )
            }
            ShellCommand::Raw(command) => render::shell_output(&self.shell.run(&command)),
            ShellCommand::Usage => render::SHELL_USAGE.to_string(),
            ShellCommand::ReadUsage => render::READ_USAGE.to_string(),
            ShellCommand::WriteUsage => render::WRITE_USAGE.to_string(),
        }
    }

    fn free_text(&self, text: &str) -> String {
        if self.options.heuristics {
            if let Some(action) = match_rules(text) {
                debug!(?action, "heuristic matched");
                return render::reply(self.perform(action));
            }
        }
        if self.options.llm_intent {
            if let Some(reply) = self.classified(text) {
                return reply;
            }
        }
        self.converse(text)
    }

    fn perform(&self, action: Action) -> CommandResult {
        match action {
            Action::SystemStatus => self.snapshot(true),
            Action::AnalyzeDirectory(folder) => self.analyze(folder),
            Action::ListDirectory(target) => self.listing(&self.list_target(target)),
            Action::Processes => self.processes(),
            Action::Execute(command) => {
                CommandResult::success(render::execute_report(&self.shell.run(&command)))
            }
        }
    }

    /// Asks the chat model what the message wants. `None` means fall through
    /// to conversation.
    fn classified(&self, text: &str) -> Option<String> {
        let chat = self.chat.as_ref()?;
        let intent = match chat.classify(text) {
            Ok(intent) => intent,
            Err(err) => {
                warn!(error = %err, "intent classification failed");
                return None;
            }
        };
        debug!(kind = ?intent.kind, confidence = intent.confidence, "intent classified");
        let result = match (intent.kind, intent.path, intent.command) {
            (IntentKind::System, _, _) => self.snapshot(true),
            (IntentKind::File, Some(path), _) => self.listing(&self.resolve(&path)),
            (IntentKind::Command, _, Some(command)) => {
                CommandResult::success(render::execute_report(&self.shell.run(&command)))
            }
            _ => return None,
        };
        Some(render::reply(result))
    }

    fn converse(&self, text: &str) -> String {
        let chat = match &self.chat {
            Some(chat) => chat,
            None => return render::CHAT_NOT_CONFIGURED.to_string(),
        };
        match chat.chat(text) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(code = %err.code, error = %err.message, "chat request failed");
                render::upstream_error(&err.to_string())
            }
        }
    }

    fn snapshot(&self, with_header: bool) -> CommandResult {
        match self.probe.snapshot() {
            Ok(snapshot) if with_header => CommandResult::success(render::snapshot_report(&snapshot)),
            Ok(snapshot) => CommandResult::success(render::snapshot_plain(&snapshot)),
            Err(err) => CommandResult::failure(ErrorKind::ExecutionError, err),
        }
    }

    fn processes(&self) -> CommandResult {
        match self.probe.top_processes(PROCESS_LIMIT) {
            Ok(processes) => CommandResult::success(render::process_table(&processes)),
            Err(err) => CommandResult::failure(ErrorKind::ExecutionError, err),
        }
    }

    fn analyze(&self, folder: Folder) -> CommandResult {
        let path = self.home.join(folder.dir_name());
        match analyze_directory(&path) {
            Ok(report) => CommandResult::success(render::directory_report(&report)),
            Err(err) => CommandResult::failure(ErrorKind::NotFound, err),
        }
    }

    fn listing(&self, path: &Path) -> CommandResult {
        match list_directory(path) {
            Ok(entries) => CommandResult::success(render::directory_listing(path, &entries)),
            Err(err) => CommandResult::failure(ErrorKind::NotFound, err),
        }
    }

    fn list_target(&self, target: ListTarget) -> PathBuf {
        match target {
            ListTarget::Downloads => self.home.join(Folder::Downloads.dir_name()),
            ListTarget::Current => self.shell.workdir().to_path_buf(),
            ListTarget::Home => self.home.clone(),
        }
    }

    /// `~` expands to the home directory; other relative paths resolve
    /// against it too.
    fn resolve(&self, raw: &str) -> PathBuf {
        let path = expand_home(raw, &self.home);
        if path.is_absolute() {
            path
        } else {
            self.home.join(path)
        }
    }
}

fn task_failure(err: TaskError) -> String {
    if matches!(err, TaskError::Persistence(_)) {
        warn!(error = %err, "task store error");
    }
    render::failure(&CommandResult::failure(err.kind(), err.to_string()))
}
