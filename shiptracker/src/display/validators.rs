//! Plausibility checks for vessel reports.

use std::sync::OnceLock;

use regex::Regex;

use super::formatters::parse_timestamp;
use super::DisplayError;
use crate::vessel::VesselData;

/// Default maximum length of sanitised text.
pub const MAX_TEXT_LEN: usize = 100;

/// Fastest speed considered plausible for a ship, in knots.
const MAX_SPEED_KNOTS: f64 = 50.0;

/// Nine digits with a ship-station MID (200–799).
pub fn validate_mmsi(mmsi: &str) -> bool {
    let digits: String = mmsi.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 9 {
        return false;
    }
    digits[..3]
        .parse::<u16>()
        .is_ok_and(|mid| (200..=799).contains(&mid))
}

pub fn validate_coordinates(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

pub fn validate_speed(speed: f64) -> bool {
    (0.0..=MAX_SPEED_KNOTS).contains(&speed)
}

pub fn validate_course(course: f64) -> bool {
    (0.0..=360.0).contains(&course)
}

pub fn validate_timestamp(timestamp: &str) -> bool {
    parse_timestamp(timestamp).is_some()
}

/// Checks every displayed field of a report.
pub fn validate_vessel_data(data: &VesselData) -> Result<(), DisplayError> {
    let invalid = |field: &'static str| Err(DisplayError::InvalidField(field));

    if !validate_mmsi(&data.mmsi) {
        return invalid("mmsi");
    }
    if !validate_coordinates(data.latitude, data.longitude) {
        return invalid("position");
    }
    if !validate_speed(data.speed) {
        return invalid("speed");
    }
    if !validate_course(data.course) {
        return invalid("course");
    }
    match data.timestamp.as_deref() {
        Some(ts) if validate_timestamp(ts) => Ok(()),
        _ => invalid("timestamp"),
    }
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Strips control characters and markup tags, then truncates to
/// `max_len` characters.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let printable: String = input.chars().filter(|c| !c.is_control()).collect();
    tag_pattern()
        .replace_all(&printable, "")
        .chars()
        .take(max_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel() -> VesselData {
        VesselData {
            name: "SAPPHIRE PRINCESS".into(),
            mmsi: "235103357".into(),
            imo: "9228186".into(),
            latitude: 62.8568,
            longitude: 58.7332,
            speed: 13.3,
            course: 226.8,
            heading: None,
            destination: "SYDNEY".into(),
            eta: "Unknown".into(),
            draught: "8.5".into(),
            zone: "Unknown".into(),
            timestamp: Some("2024-03-01 12:34:56 UTC".into()),
            source: "SAT".into(),
        }
    }

    #[test]
    fn test_mmsi() {
        assert!(validate_mmsi("235103357"));
        assert!(validate_mmsi("235 103 357"));
        assert!(!validate_mmsi("123456789"));
        assert!(!validate_mmsi("800000000"));
        assert!(!validate_mmsi("23510335"));
    }

    #[test]
    fn test_ranges() {
        assert!(validate_coordinates(-90.0, 180.0));
        assert!(!validate_coordinates(90.1, 0.0));
        assert!(validate_speed(50.0));
        assert!(!validate_speed(-0.1));
        assert!(!validate_speed(f64::NAN));
        assert!(validate_course(360.0));
        assert!(!validate_course(361.0));
    }

    #[test]
    fn test_timestamp() {
        assert!(validate_timestamp("2024-03-01T12:34:56Z"));
        assert!(validate_timestamp("2024-03-01 12:34:56 UTC"));
        assert!(!validate_timestamp("2024-13-01 12:34:56"));
    }

    #[test]
    fn test_vessel_data() {
        assert!(validate_vessel_data(&vessel()).is_ok());

        let mut bad = vessel();
        bad.speed = 70.0;
        assert_eq!(
            validate_vessel_data(&bad).unwrap_err(),
            DisplayError::InvalidField("speed")
        );

        let mut bad = vessel();
        bad.timestamp = None;
        assert_eq!(
            validate_vessel_data(&bad).unwrap_err(),
            DisplayError::InvalidField("timestamp")
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_text("<b>SAPPHIRE</b>\u{7} PRINCESS", 100), "SAPPHIRE PRINCESS");
        assert_eq!(sanitize_text("abcdef", 3), "abc");
        assert_eq!(sanitize_text("", 10), "");
    }
}
