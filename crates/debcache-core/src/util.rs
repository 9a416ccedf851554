//! Size formatting helpers

use std::fmt;

/// Disk space needed or freed by a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskSpace {
    Require(u64),
    Free(u64),
}

impl DiskSpace {
    pub fn from_delta(delta: i64) -> Self {
        if delta >= 0 {
            DiskSpace::Require(delta as u64)
        } else {
            DiskSpace::Free(delta.unsigned_abs())
        }
    }
}

impl fmt::Display for DiskSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskSpace::Require(bytes) => write!(
                f,
                "After this operation, {} of additional disk space will be used.",
                unit_str(*bytes)
            ),
            DiskSpace::Free(bytes) => write!(f, "After this operation, {} disk space will be freed.", unit_str(*bytes)),
        }
    }
}

/// Format a byte count with SI prefixes the way apt does (`950 B`, `12.3 kB`, `1234 kB`)
pub fn unit_str(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["", "k", "M", "G", "T", "P", "E", "Z", "Y"];

    let mut size = bytes as f64;
    for (i, unit) in UNITS.iter().enumerate() {
        if size < 100.0 && i != 0 {
            return format!("{:.1} {}B", size, unit);
        }
        if size < 10000.0 {
            return format!("{:.0} {}B", size, unit);
        }
        size /= 1000.0;
    }
    format!("{:.0} YB", size * 1000.0)
}

/// Format a byte count with binary prefixes
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_str() {
        assert_eq!(unit_str(0), "0 B");
        assert_eq!(unit_str(9999), "9999 B");
        assert_eq!(unit_str(10_000), "10.0 kB");
        assert_eq!(unit_str(123_456), "123 kB");
        assert_eq!(unit_str(5_000_000), "5000 kB");
        assert_eq!(unit_str(50_000_000), "50.0 MB");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
    }

    #[test]
    fn test_disk_space() {
        assert_eq!(DiskSpace::from_delta(0), DiskSpace::Require(0));
        assert_eq!(DiskSpace::from_delta(-2048), DiskSpace::Free(2048));
        assert_eq!(
            DiskSpace::from_delta(20_000).to_string(),
            "After this operation, 20.0 kB of additional disk space will be used."
        );
        assert_eq!(
            DiskSpace::Free(500).to_string(),
            "After this operation, 500 B disk space will be freed."
        );
    }
}
