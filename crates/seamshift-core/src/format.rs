//! Numeric formatting for generated G-code words

/// Format `value` as fixed-point with `precision` decimals, then strip
/// trailing zeros and a dangling decimal point.
///
/// At least one digit is kept before the point and negative zero prints
/// as `0`:
///
/// ```
/// use seamshift_core::format_coordinate;
///
/// assert_eq!(format_coordinate(10.5, 3), "10.5");
/// assert_eq!(format_coordinate(0.25, 3), "0.25");
/// assert_eq!(format_coordinate(100.0, 3), "100");
/// assert_eq!(format_coordinate(-0.00001, 3), "0");
/// ```
pub fn format_coordinate(value: f64, precision: usize) -> String {
    let mut text = format!("{:.*}", precision, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}
