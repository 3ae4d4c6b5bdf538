//! Text formatting for display fields.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `62.8568°N`, `58.7332°E` style coordinates.
pub fn format_coordinates(lat: f64, lon: f64) -> (String, String) {
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lon_dir = if lon >= 0.0 { 'E' } else { 'W' };
    (
        format!("{:.4}°{lat_dir}", lat.abs()),
        format!("{:.4}°{lon_dir}", lon.abs()),
    )
}

/// Speed in knots with one decimal.
pub fn format_speed(speed: f64) -> String {
    format!("{speed:.1}")
}

/// Course in degrees with one decimal.
pub fn format_course(course: f64) -> String {
    format!("{course:.1}°")
}

/// Parses an ISO-8601 or `YYYY-MM-DD HH:MM:SS UTC` timestamp.
///
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let timestamp = timestamp.trim();
    if timestamp.contains('T') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
            return Some(dt.with_timezone(&Utc));
        }
        return NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc());
    }

    let bare = timestamp.strip_suffix(" UTC").unwrap_or(timestamp);
    NaiveDateTime::parse_from_str(bare, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD HH:MM UTC`; unparseable input is returned unchanged.
pub fn format_timestamp(timestamp: &str) -> String {
    parse_timestamp(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Groups a 9-digit MMSI as `235 103 357`. Non-digits are ignored;
/// anything other than nine digits yields `None`.
pub fn format_mmsi(mmsi: &str) -> Option<String> {
    let digits: String = mmsi.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 9 {
        return None;
    }
    Some(format!("{} {} {}", &digits[..3], &digits[3..6], &digits[6..]))
}

/// `UNDER_WAY_USING_ENGINE` → `Under way using engine`.
pub fn format_nav_status(status: &str) -> String {
    let status = status.trim();
    if status.is_empty() {
        return "Unknown".to_string();
    }
    let lower = status.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_with_hemispheres() {
        assert_eq!(
            format_coordinates(62.8568, 58.7332),
            ("62.8568°N".to_string(), "58.7332°E".to_string())
        );
        assert_eq!(
            format_coordinates(-33.85, -151.2),
            ("33.8500°S".to_string(), "151.2000°W".to_string())
        );
    }

    #[test]
    fn test_speed_and_course() {
        assert_eq!(format_speed(13.25), "13.2");
        assert_eq!(format_speed(0.0), "0.0");
        assert_eq!(format_course(226.8), "226.8°");
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(format_timestamp("2024-03-01T12:34:56Z"), "2024-03-01 12:34 UTC");
        assert_eq!(format_timestamp("2024-03-01T14:34:56+02:00"), "2024-03-01 12:34 UTC");
        assert_eq!(format_timestamp("2024-03-01T12:34:56"), "2024-03-01 12:34 UTC");
        assert_eq!(format_timestamp("2024-03-01 12:34:56 UTC"), "2024-03-01 12:34 UTC");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_mmsi_grouping() {
        assert_eq!(format_mmsi("235103357").as_deref(), Some("235 103 357"));
        assert_eq!(format_mmsi("235-103-357").as_deref(), Some("235 103 357"));
        assert_eq!(format_mmsi("12345"), None);
    }

    #[test]
    fn test_nav_status() {
        assert_eq!(format_nav_status("UNDER_WAY_USING_ENGINE"), "Under way using engine");
        assert_eq!(format_nav_status("moored"), "Moored");
        assert_eq!(format_nav_status(""), "Unknown");
    }
}
