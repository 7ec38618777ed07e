use std::sync::OnceLock;

use regex::Regex;

/// Operational request recognised from free text without asking the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SystemStatus,
    AnalyzeDirectory(Folder),
    ListDirectory(ListTarget),
    Processes,
    Execute(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Folder {
    Downloads,
    Documents,
    Desktop,
}

impl Folder {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Folder::Downloads => "Downloads",
            Folder::Documents => "Documents",
            Folder::Desktop => "Desktop",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListTarget {
    Downloads,
    Current,
    Home,
}

const SYSTEM_KEYWORDS: &[&str] = &["system", "status", "cpu", "memory", "disk", "系统", "状态", "内存", "磁盘"];
const ANALYZE_KEYWORDS: &[&str] = &["analyze", "analyse", "分析"];
const FOLDER_KEYWORDS: &[&str] = &[
    "directory", "folder", "download", "downloads", "documents", "desktop", "目录", "文件夹", "下载",
];
const LIST_KEYWORDS: &[&str] = &["list", "files", "列表", "列出", "文件"];
const PROCESS_KEYWORDS: &[&str] = &["process", "processes", "进程"];

/// Lower-cased message plus its ASCII word tokens. English keywords match
/// whole words; CJK keywords match as substrings since there are no spaces.
struct Probe {
    lowered: String,
    words: Vec<String>,
}

impl Probe {
    fn new(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let words = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(|word| word.to_string())
            .collect();
        Self { lowered, words }
    }

    fn has(&self, keyword: &str) -> bool {
        if keyword.is_ascii() {
            self.words.iter().any(|word| word == keyword)
        } else {
            self.lowered.contains(keyword)
        }
    }

    fn has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.has(keyword))
    }
}

type Rule = fn(&Probe, &str) -> Option<Action>;

const RULES: [Rule; 5] = [system_rule, analyze_rule, list_rule, process_rule, execute_rule];

/// First matching rule wins.
pub fn match_rules(text: &str) -> Option<Action> {
    let probe = Probe::new(text);
    RULES.iter().find_map(|rule| rule(&probe, text.trim()))
}

fn system_rule(probe: &Probe, _text: &str) -> Option<Action> {
    probe.has_any(SYSTEM_KEYWORDS).then_some(Action::SystemStatus)
}

fn analyze_rule(probe: &Probe, _text: &str) -> Option<Action> {
    if !(probe.has_any(ANALYZE_KEYWORDS) && probe.has_any(FOLDER_KEYWORDS)) {
        return None;
    }
    let folder = if probe.has_any(&["download", "downloads", "下载"]) {
        Folder::Downloads
    } else if probe.has_any(&["document", "documents", "文档"]) {
        Folder::Documents
    } else if probe.has_any(&["desktop", "桌面"]) {
        Folder::Desktop
    } else {
        Folder::Downloads
    };
    Some(Action::AnalyzeDirectory(folder))
}

fn list_rule(probe: &Probe, _text: &str) -> Option<Action> {
    if !probe.has_any(LIST_KEYWORDS) {
        return None;
    }
    let target = if probe.has_any(&["download", "downloads", "下载"]) {
        ListTarget::Downloads
    } else if probe.has_any(&["current", "当前"]) {
        ListTarget::Current
    } else {
        ListTarget::Home
    };
    Some(Action::ListDirectory(target))
}

fn process_rule(probe: &Probe, _text: &str) -> Option<Action> {
    probe.has_any(PROCESS_KEYWORDS).then_some(Action::Processes)
}

fn execute_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?is)^(?:execute|run|执行|运行)\s+(.+)$").ok())
        .as_ref()
}

fn execute_rule(_probe: &Probe, text: &str) -> Option<Action> {
    let captures = execute_pattern()?.captures(text)?;
    let command = captures.get(1)?.as_str().trim();
    if command.is_empty() {
        return None;
    }
    Some(Action::Execute(command.to_string()))
}
