use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Number of largest files kept by [`analyze_directory`].
pub const TOP_FILES: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct DirectoryReport {
    pub path: PathBuf,
    pub total_bytes: u64,
    pub file_count: u64,
    pub dir_count: u64,
    /// Largest first.
    pub largest: Vec<(PathBuf, u64)>,
}

/// Walks `root` recursively. Unreadable entries are skipped; symlinks are not
/// followed.
pub fn analyze_directory(root: &Path) -> Result<DirectoryReport, String> {
    if !root.exists() {
        return Err(format!("path not found: {}", root.display()));
    }
    let mut report = DirectoryReport {
        path: root.to_path_buf(),
        total_bytes: 0,
        file_count: 0,
        dir_count: 0,
        largest: Vec::new(),
    };
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(path = %dir.display(), error = %err, "skipping unreadable directory");
                continue;
            }
        };
        for entry in entries.flatten() {
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => continue,
            };
            if file_type.is_dir() {
                report.dir_count += 1;
                pending.push(entry.path());
            } else if file_type.is_file() {
                if let Ok(meta) = entry.metadata() {
                    report.total_bytes += meta.len();
                    report.file_count += 1;
                    files.push((entry.path(), meta.len()));
                }
            }
        }
    }

    files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    files.truncate(TOP_FILES);
    report.largest = files;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn accumulates_sizes_and_counts() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("small"), vec![0u8; 10]).unwrap();
        fs::write(nested.join("big"), vec![0u8; 1000]).unwrap();
        fs::write(dir.path().join("a").join("mid"), vec![0u8; 100]).unwrap();

        let report = analyze_directory(dir.path()).unwrap();
        assert_eq!(report.file_count, 3);
        assert_eq!(report.dir_count, 2);
        assert_eq!(report.total_bytes, 1110);
        assert_eq!(report.largest[0], (nested.join("big"), 1000));
        assert_eq!(report.largest[2].1, 10);
    }

    #[test]
    fn keeps_only_top_files() {
        let dir = tempdir().unwrap();
        for i in 0..15 {
            fs::write(dir.path().join(format!("f{}", i)), vec![0u8; i + 1]).unwrap();
        }
        let report = analyze_directory(dir.path()).unwrap();
        assert_eq!(report.file_count, 15);
        assert_eq!(report.largest.len(), TOP_FILES);
        assert_eq!(report.largest[0].1, 15);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(analyze_directory(&dir.path().join("gone")).is_err());
    }
}
