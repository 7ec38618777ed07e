use serde::{Deserialize, Serialize};

use crate::tools::format_gb;

/// Used/total pair in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageFigure {
    pub used: u64,
    pub total: u64,
}

impl UsageFigure {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f64 / self.total as f64 * 100.0
    }

    pub fn describe(&self) -> String {
        format!(
            "{:.1}% ({} / {})",
            self.percent(),
            format_gb(self.used),
            format_gb(self.total)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_percent: f32,
    pub memory: UsageFigure,
    pub disk: UsageFigure,
}

impl SystemSnapshot {
    /// Label/value pairs in display order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CPU", format!("{:.1}%", self.cpu_percent)),
            ("Memory", self.memory.describe()),
            ("Disk", self.disk.describe()),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: String,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_empty_totals() {
        let figure = UsageFigure { used: 5, total: 0 };
        assert_eq!(figure.percent(), 0.0);
    }

    #[test]
    fn snapshot_fields_are_labelled() {
        let gb = 1024 * 1024 * 1024;
        let snapshot = SystemSnapshot {
            cpu_percent: 12.5,
            memory: UsageFigure { used: 2 * gb, total: 8 * gb },
            disk: UsageFigure { used: 50 * gb, total: 100 * gb },
        };
        let fields = snapshot.fields();
        assert_eq!(fields[0], ("CPU", "12.5%".to_string()));
        assert_eq!(fields[1], ("Memory", "25.0% (2.0GB / 8.0GB)".to_string()));
        assert_eq!(fields[2], ("Disk", "50.0% (50.0GB / 100.0GB)".to_string()));
    }
}
