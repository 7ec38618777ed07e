pub mod files;
pub mod format;
pub mod scan;

pub use files::{list_directory, read_file, write_file, DirEntry, FileError, FileRead, READ_LIMIT};
pub use format::{format_gb, format_size};
pub use scan::{analyze_directory, DirectoryReport, TOP_FILES};
