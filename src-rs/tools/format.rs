const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Fixed-point size in the largest unit that keeps the value at or above one.
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2}GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

pub fn format_gb(bytes: u64) -> String {
    format!("{:.1}GB", bytes as f64 / GB as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_largest_convenient_unit() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(5 * MB), "5.0MB");
        assert_eq!(format_size(3 * GB + GB / 4), "3.25GB");
    }

    #[test]
    fn gb_is_always_gb() {
        assert_eq!(format_gb(GB / 2), "0.5GB");
    }
}
