//! Byte size rendering for line-oriented reports.

/// Binary unit ladder, one step per factor of 1024.
pub const SIZE_UNITS: [&str; 9] = ["bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Minimum width of the name column in a size report.
pub const MIN_NAME_COLUMN: usize = 50;

/// Width of the numeric part of the size column.
const SIZE_NUMBER_WIDTH: usize = 10;

/// Width of the whole size column.
const SIZE_COLUMN_WIDTH: usize = 20;

/// Scale `bytes` to the largest unit whose rounded value stays below 1000.
///
/// Returns the scaled value and the index into [`SIZE_UNITS`].
pub fn scale_size(bytes: u64, decimal_places: u32) -> (f64, usize) {
    let factor = 10f64.powi(decimal_places as i32);
    let mut value = bytes as f64;
    let mut unit = 0;
    while (value * factor).round() / factor >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    (value, unit)
}

/// Format a size with one decimal place, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    format_size_with(bytes, 1, 0)
}

/// Format a size with a custom precision, left-aligning the number in
/// `number_width` columns before the unit.
pub fn format_size_with(bytes: u64, decimal_places: u32, number_width: usize) -> String {
    let (value, unit) = scale_size(bytes, decimal_places);
    let number = format!("{value:.prec$}", prec = decimal_places as usize);
    format!("{number:<number_width$} {}", SIZE_UNITS[unit])
}

/// Name column width for a report whose longest name is `max_name_len`.
pub fn name_column_width(max_name_len: usize) -> usize {
    (max_name_len + 20).max(MIN_NAME_COLUMN)
}

/// Render one `<name> | <size>` report line.
pub fn size_line(name: &str, bytes: u64, name_width: usize) -> String {
    let size = format_size_with(bytes, 1, SIZE_NUMBER_WIDTH);
    format!("{name:<name_width$} | {size:<SIZE_COLUMN_WIDTH$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_small_sizes() {
        assert_eq!(format_size(0), "0.0 bytes");
        assert_eq!(format_size(999), "999.0 bytes");
    }

    #[test]
    fn test_unit_switch_below_1000() {
        // 1000 bytes already rounds to >= 1000, so it moves up a unit.
        assert_eq!(format_size(1000), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn test_rounding_boundary() {
        // 999.96 KB rounds to 1000.0, so it is shown in MB instead.
        let bytes = (999.96 * 1024.0) as u64;
        let (_, unit) = scale_size(bytes, 1);
        assert_eq!(SIZE_UNITS[unit], "MB");
    }

    #[test]
    fn test_large_threshold_rendering() {
        assert_eq!(format_size(500_000_000), "476.8 MB");
        assert_eq!(format_size(u64::MAX), "16.0 EB");
    }

    #[test]
    fn test_size_line_layout() {
        let line = size_line("total", 2048, name_column_width(5));
        assert!(line.starts_with("total"));
        assert_eq!(line.find('|'), Some(51));
        assert!(line.contains("| 2.0        KB"));
    }
}
