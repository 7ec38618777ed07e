use std::path::Path;

use crate::result::{CommandResult, ErrorKind};
use crate::task::{Task, TaskStatus};
use crate::telemetry::{ProcessInfo, SystemSnapshot};
use crate::tools::{format_size, DirEntry, DirectoryReport, FileRead};

/// Description length shown per entry in `/tasks`.
pub const LIST_DESCRIPTION_CHARS: usize = 50;
/// Directory entries shown before summarising the rest.
pub const LISTING_LIMIT: usize = 20;
/// Largest files shown in a directory analysis.
pub const REPORT_TOP: usize = 5;
/// Shell output kept when a heuristic runs a command.
pub const EXECUTE_OUTPUT_CHARS: usize = 1000;

pub const HELP_TEXT: &str = "🤖 Remote operations relay

📋 Tasks (picked up by an external agent):
  /task <description>   create a task
  /status <id>          show a task
  /tasks [status]       list recent tasks

💻 Shell:
  $sys                  system information
  $ps                   top processes
  $cat <path>           read a file
  $write <path> <text>  write a file
  $ <command>           run a shell command

💬 Plain language:
  \"show system status\", \"analyze my downloads folder\",
  \"list files\", \"show processes\", \"execute uptime\"
Anything else goes to the chat model.";

pub const TASK_USAGE: &str = "usage: /task <description>";
pub const STATUS_USAGE: &str = "usage: /status <task id>\nexample: /status ab12cd34";
pub const SHELL_USAGE: &str = "usage: $ <command>";
pub const READ_USAGE: &str = "usage: $cat <path>";
pub const WRITE_USAGE: &str = "usage: $write <path> <content>";
pub const NO_OUTPUT: &str = "command finished with no output";
pub const CHAT_NOT_CONFIGURED: &str = "⚠️ The chat model is not configured. Set GLM_API_KEY to enable conversation.

System commands still work, for example:
  \"show system status\"
  \"analyze my downloads folder\"
  \"list files\"";

pub fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "⏳",
        TaskStatus::Processing => "🔄",
        TaskStatus::Completed => "✅",
        TaskStatus::Failed => "❌",
    }
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

pub fn task_created(task: &Task, task_file: &Path) -> String {
    format!(
        "✅ Task created

ID: {id}
Description: {description}
Status: {status}

Next steps:
  agent: cat {file}
  check: /status {id}
  all:   /tasks",
        id = task.id,
        description = task.description,
        status = task.status,
        file = task_file.display(),
    )
}

pub fn task_status(task: &Task) -> String {
    let mut out = format!(
        "{icon} Task {id}

Type: {kind}
Description: {description}
Status: {status}
Created: {created}",
        icon = status_icon(task.status),
        id = task.id,
        kind = task.kind.as_str(),
        description = task.description,
        status = task.status,
        created = task.created_at.to_rfc3339(),
    );
    if let Some(result) = &task.result {
        out.push_str(&format!("\n\n📤 Result:\n{}", result));
    }
    if let Some(error) = &task.error {
        out.push_str(&format!("\n\n❌ Error: {}", error));
    }
    out
}

pub fn task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "📝 No tasks".to_string();
    }
    let mut out = format!("📋 Tasks ({})\n", tasks.len());
    for task in tasks {
        out.push_str(&format!(
            "\n{} [{}] {}\n   {} | {}\n",
            status_icon(task.status),
            task.id,
            truncate_chars(&task.description, LIST_DESCRIPTION_CHARS),
            task.status,
            task.created_at.to_rfc3339(),
        ));
    }
    out
}

pub fn list_filter_usage(raw: &str) -> String {
    format!(
        "unknown status {:?}\nusage: /tasks [pending|processing|completed|failed]",
        raw
    )
}

pub fn snapshot_plain(snapshot: &SystemSnapshot) -> String {
    snapshot
        .fields()
        .into_iter()
        .map(|(label, value)| format!("{}: {}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn snapshot_report(snapshot: &SystemSnapshot) -> String {
    format!("📊 System status\n\n{}", snapshot_plain(snapshot))
}

pub fn process_table(processes: &[ProcessInfo]) -> String {
    let mut out = "Processes by CPU:".to_string();
    for p in processes {
        out.push_str(&format!(
            "\nPID: {:<8} NAME: {:<20} CPU: {:<8} MEM: {:.1}%",
            p.pid,
            p.name,
            format!("{:.1}%", p.cpu_percent),
            p.memory_percent
        ));
    }
    out
}

pub fn file_read(read: &FileRead) -> String {
    let mut out = format!("📄 {}\n\n{}", read.path.display(), read.content);
    if read.truncated {
        match (read.total_chars, read.size) {
            (Some(total), _) => {
                out.push_str(&format!("\n... (truncated, {} characters in total)", total))
            }
            (None, Some(size)) => {
                out.push_str(&format!("\n... (truncated, file is {})", format_size(size)))
            }
            (None, None) => out.push_str("\n... (truncated)"),
        }
    }
    out
}

pub fn file_written(path: &Path) -> String {
    format!("✅ File saved: {}", path.display())
}

pub fn directory_listing(path: &Path, entries: &[DirEntry]) -> String {
    let mut out = format!("📁 {}\n", path.display());
    for entry in entries.iter().take(LISTING_LIMIT) {
        if entry.is_dir {
            out.push_str(&format!("\n📁 {}/", entry.name));
        } else {
            out.push_str(&format!("\n📄 {} ({})", entry.name, format_size(entry.size)));
        }
    }
    if entries.len() > LISTING_LIMIT {
        out.push_str(&format!("\n\n... and {} more", entries.len() - LISTING_LIMIT));
    }
    out
}

pub fn directory_report(report: &DirectoryReport) -> String {
    let mut out = format!(
        "📁 Directory analysis - {}

Files: {}
Directories: {}
Total size: {}",
        report.path.display(),
        report.file_count,
        report.dir_count,
        format_size(report.total_bytes),
    );
    if !report.largest.is_empty() {
        out.push_str("\n\n📦 Largest files");
        for (path, size) in report.largest.iter().take(REPORT_TOP) {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            out.push_str(&format!("\n- {}: {}", name, format_size(*size)));
        }
    }
    out
}

/// `$` commands show the output as-is, or the failure reason.
pub fn shell_output(result: &CommandResult) -> String {
    match result.error_kind {
        Some(ErrorKind::Blocked) | Some(ErrorKind::Timeout) => format!("❌ {}", result.payload),
        _ if result.payload.trim().is_empty() && result.ok => NO_OUTPUT.to_string(),
        _ if result.payload.trim().is_empty() => format!(
            "❌ {}",
            result
                .error_kind
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "failed".to_string())
        ),
        _ => result.payload.clone(),
    }
}

/// Heuristic command runs wrap the output in a code block.
pub fn execute_report(result: &CommandResult) -> String {
    if result.ok {
        format!(
            "✅ Command succeeded\n\n```\n{}\n```",
            truncate_chars(&result.payload, EXECUTE_OUTPUT_CHARS)
        )
    } else {
        let reason = if result.payload.trim().is_empty() {
            result
                .error_kind
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "unknown error".to_string())
        } else {
            truncate_chars(&result.payload, EXECUTE_OUTPUT_CHARS)
        };
        format!("❌ Command failed\n\n{}", reason)
    }
}

pub fn failure(result: &CommandResult) -> String {
    match result.error_kind {
        Some(kind) => format!("❌ {}: {}", kind, result.payload),
        None => format!("❌ {}", result.payload),
    }
}

pub fn upstream_error(message: &str) -> String {
    format!("⚠️ Chat model request failed: {}\n\n💡 Check the API key or use the system commands.", message)
}

/// Successful results carry their rendered reply as the payload.
pub fn reply(result: CommandResult) -> String {
    if result.ok {
        result.payload
    } else {
        failure(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_chars("备份配置文件", 2), "备份...");
    }

    #[test]
    fn shell_output_variants() {
        assert_eq!(shell_output(&CommandResult::success("hi\n")), "hi\n");
        assert_eq!(shell_output(&CommandResult::success("")), NO_OUTPUT);
        assert_eq!(
            shell_output(&CommandResult::failure(ErrorKind::Blocked, "blocked: x")),
            "❌ blocked: x"
        );
        assert_eq!(
            shell_output(&CommandResult::failure(ErrorKind::ExecutionError, "")),
            "❌ execution error"
        );
        assert_eq!(
            shell_output(&CommandResult::failure(ErrorKind::ExecutionError, "no such file")),
            "no such file"
        );
    }

    #[test]
    fn reply_prefixes_failures() {
        assert_eq!(reply(CommandResult::success("ok")), "ok");
        assert_eq!(
            reply(CommandResult::failure(ErrorKind::NotFound, "task not found: x")),
            "❌ not found: task not found: x"
        );
    }
}
