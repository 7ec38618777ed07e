/// Substrings that refuse a command outright. This is a tripwire for
/// obviously catastrophic input, not a sandbox: it over-blocks anything that
/// merely contains a pattern and misses anything phrased differently.
pub const DENY_LIST: [&str; 6] = [
    "rm -rf /",
    "rm -rf /*",
    "mkfs",
    "format",
    ":(){:|:&};:",
    ":(){ :|:& };:",
];

/// Returns the first deny-list entry found in the lower-cased command.
pub fn blocked_pattern(command: &str) -> Option<&'static str> {
    let lowered = command.to_lowercase();
    DENY_LIST
        .iter()
        .copied()
        .find(|pattern| lowered.contains(pattern))
}
