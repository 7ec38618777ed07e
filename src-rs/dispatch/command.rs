/// What an inbound message asks for, decided from its syntax alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    CreateTask(String),
    TaskUsage,
    TaskStatus(String),
    StatusUsage,
    ListTasks(Option<String>),
    Shell(ShellCommand),
    Help,
    /// No explicit syntax matched; left to the heuristics and the chat model.
    Text(String),
}

/// Sub-commands behind the `$` sigil.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    SystemInfo,
    ProcessList,
    ReadFile(String),
    WriteFile { path: String, content: String },
    Raw(String),
    Usage,
    ReadUsage,
    WriteUsage,
}

pub const SHELL_SIGIL: char = '$';
pub const HELP_LITERALS: [&str; 3] = ["/help", "help", "帮助"];

type Guard = fn(&str) -> Option<Command>;

/// Evaluated in order; the first guard that recognises the text wins.
const GUARDS: [Guard; 3] = [task_guard, shell_guard, help_guard];

pub fn parse(text: &str) -> Command {
    let text = text.trim();
    GUARDS
        .iter()
        .find_map(|guard| guard(text))
        .unwrap_or_else(|| Command::Text(text.to_string()))
}

fn split_head(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    }
}

fn first_word(text: &str) -> Option<String> {
    text.split_whitespace().next().map(|word| word.to_string())
}

pub fn task_guard(text: &str) -> Option<Command> {
    let (head, rest) = split_head(text);
    match head {
        "/task" if rest.is_empty() => Some(Command::TaskUsage),
        "/task" => Some(Command::CreateTask(rest.to_string())),
        "/status" => Some(match first_word(rest) {
            Some(id) => Command::TaskStatus(id),
            None => Command::StatusUsage,
        }),
        "/tasks" => Some(Command::ListTasks(first_word(rest))),
        _ => None,
    }
}

pub fn shell_guard(text: &str) -> Option<Command> {
    let body = text.strip_prefix(SHELL_SIGIL)?.trim();
    if body.is_empty() {
        return Some(Command::Shell(ShellCommand::Usage));
    }
    let (name, rest) = split_head(body);
    let command = match name {
        "sys" | "system-info" => ShellCommand::SystemInfo,
        "ps" | "top" | "process-list" => ShellCommand::ProcessList,
        "cat" | "read-file" => match first_word(rest) {
            Some(path) => ShellCommand::ReadFile(path),
            None => ShellCommand::ReadUsage,
        },
        "write" | "write-file" => match split_head(rest) {
            (path, content) if !path.is_empty() && !content.is_empty() => ShellCommand::WriteFile {
                path: path.to_string(),
                content: content.to_string(),
            },
            _ => ShellCommand::WriteUsage,
        },
        _ => ShellCommand::Raw(body.to_string()),
    };
    Some(Command::Shell(command))
}

pub fn help_guard(text: &str) -> Option<Command> {
    if HELP_LITERALS.contains(&text.to_lowercase().as_str()) {
        Some(Command::Help)
    } else {
        None
    }
}
