//! Formatting helpers for the run summary.

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Human-readable size, e.g. `"512 B"` or `"1.5 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.1} {}", size, SIZE_UNITS[unit])
    }
}

/// Percentage saved by compression. Negative when the output grew.
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
}
