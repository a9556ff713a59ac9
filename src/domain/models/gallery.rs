use crate::domain::models::file::StoredFile;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size, base 1024, at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

#[derive(Debug, Clone, PartialEq)]
pub struct GallerySummary {
    pub file_count: usize,
    pub total_size: u64,
}

impl GallerySummary {
    pub fn of(files: &[StoredFile]) -> Self {
        Self {
            file_count: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
        }
    }

    pub fn total_size_display(&self) -> String {
        format_bytes(self.total_size)
    }
}
