//! Clock-style time formatting for lyric timestamps and clip ranges
//!
//! Every time value shown to the user or sent to the render service uses
//! the `M:SS` shape: whole minutes without padding or width limit, then
//! whole seconds padded to two digits.

/// Format seconds as `M:SS`.
///
/// Fractional seconds are truncated, not rounded. Negative and non-finite
/// input is clamped to zero.
///
/// # Examples
///
/// ```
/// use bratgen_common::time_format::format_clock;
///
/// assert_eq!(format_clock(75.0), "1:15");
/// assert_eq!(format_clock(5.0), "0:05");
/// assert_eq!(format_clock(3600.0), "60:00");
/// ```
pub fn format_clock(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}
