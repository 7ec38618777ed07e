use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::result::ErrorKind;

/// Characters returned by [`read_file`] before truncating.
pub const READ_LIMIT: usize = 2000;

#[derive(Clone, Debug, PartialEq)]
pub struct FileRead {
    pub path: PathBuf,
    pub content: String,
    /// Known only when the whole file fit under the byte cap.
    pub total_chars: Option<usize>,
    /// Size on disk for regular files.
    pub size: Option<u64>,
    pub truncated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{}: not valid UTF-8 text", .0.display())]
    InvalidUtf8(PathBuf),

    #[error("{}: {}", path.display(), source)]
    Io { path: PathBuf, source: io::Error },
}

impl FileError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_path_buf()),
            _ => FileError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::ExecutionError,
        }
    }
}

/// Reads at most `limit` characters. No more than `limit * 4 + 4` bytes are
/// ever pulled from the file, so devices and huge logs stay cheap.
pub fn read_file(path: &Path, limit: usize) -> Result<FileRead, FileError> {
    let file = File::open(path).map_err(|err| FileError::from_io(path, err))?;
    let size = file
        .metadata()
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len());

    let cap = (limit as u64).saturating_mul(4).saturating_add(4);
    let mut buf = Vec::new();
    file.take(cap)
        .read_to_end(&mut buf)
        .map_err(|err| FileError::from_io(path, err))?;
    let capped = buf.len() as u64 >= cap;

    // A multi-byte character may straddle the cap; drop its partial tail.
    let valid = match std::str::from_utf8(&buf) {
        Ok(_) => buf.len(),
        Err(err) if capped && err.error_len().is_none() => err.valid_up_to(),
        Err(_) => return Err(FileError::InvalidUtf8(path.to_path_buf())),
    };
    let text = String::from_utf8_lossy(&buf[..valid]);
    let seen = text.chars().count();

    Ok(FileRead {
        path: path.to_path_buf(),
        content: text.chars().take(limit).collect(),
        total_chars: if capped { None } else { Some(seen) },
        size,
        truncated: capped || seen > limit,
    })
}

/// Writes `content`, creating missing parent directories first.
pub fn write_file(path: &Path, content: &str) -> Result<PathBuf, String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| format!("{}: {}", parent.display(), err))?;
        }
    }
    fs::write(path, content).map_err(|err| format!("{}: {}", path.display(), err))?;
    info!(path = %path.display(), bytes = content.len(), "file written");
    Ok(path.to_path_buf())
}

/// Entries sorted by name.
pub fn list_directory(path: &Path) -> Result<Vec<DirEntry>, String> {
    if !path.exists() {
        return Err(format!("path not found: {}", path.display()));
    }
    if !path.is_dir() {
        return Err(format!("not a directory: {}", path.display()));
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| format!("{}: {}", path.display(), err))? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir: meta.is_dir(),
            size: if meta.is_dir() { 0 } else { meta.len() },
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
