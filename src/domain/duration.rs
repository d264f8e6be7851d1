// Human-readable maintenance durations, in the same "X jam Y menit" form the backend emits

/// Format a duration given in minutes.
pub fn format_duration(minutes: f64) -> String {
    let minutes = if minutes.is_finite() && minutes > 0.0 {
        minutes
    } else {
        0.0
    };

    let hours = (minutes / 60.0).floor() as u64;
    let remaining = (minutes % 60.0).floor() as u64;

    if hours > 0 {
        format!("{} jam {} menit", hours, remaining)
    } else {
        format!("{} menit", remaining)
    }
}

/// Format a whole number of hours.
pub fn format_hours(hours: u64) -> String {
    format_duration(hours as f64 * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(150.0), "2 jam 30 menit");
        assert_eq!(format_duration(150.0), format_duration(150.0));
        assert_eq!(format_duration(45.0), "45 menit");
        assert_eq!(format_duration(60.0), "1 jam 0 menit");
        assert_eq!(format_duration(89.9), "1 jam 29 menit");
    }

    #[test]
    fn test_format_duration_degenerate_input() {
        assert_eq!(format_duration(-5.0), "0 menit");
        assert_eq!(format_duration(f64::NAN), "0 menit");
        assert_eq!(format_duration(f64::INFINITY), "0 menit");
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(7), "7 jam 0 menit");
        assert_eq!(format_hours(0), "0 menit");
    }
}
