//! Time-synchronized lyrics model
//!
//! Parses LRC-style text (`[mm:ss.xx] line text`) into an ordered timeline
//! and derives clip time ranges from line-index intervals.
//!
//! Parsing is lenient: rows without a timestamp tag (blank lines, metadata
//! tags such as `[ar:Artist]`, malformed rows) are dropped rather than
//! reported. File order is kept as-is; timestamps are never re-sorted.

use crate::time_format::format_clock;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tail added after the last selected line when no following line bounds it
pub const LAST_LINE_TAIL_SECS: f64 = 5.0;

/// Glyph shown in place of an instrumental (empty) line
pub const INSTRUMENTAL_GLYPH: &str = "♫";

/// One timed lyric line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedLine {
    /// Start time in seconds from the beginning of the track
    pub time: f64,
    /// Line text, trimmed. Empty for an instrumental gap.
    pub text: String,
}

impl TimedLine {
    /// True when the line carries no words
    pub fn is_instrumental(&self) -> bool {
        self.text.is_empty()
    }

    /// Text for display, with the instrumental glyph standing in for empty lines
    pub fn display_text(&self) -> &str {
        if self.is_instrumental() {
            INSTRUMENTAL_GLYPH
        } else {
            &self.text
        }
    }
}

/// Clip window in `M:SS` strings, as sent to the render service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for TimeRange {
    /// Range shown before the user has selected any line
    fn default() -> Self {
        Self::new("0:00", "0:15")
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Ordered sequence of timed lines, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LyricsTimeline {
    lines: Vec<TimedLine>,
}

impl LyricsTimeline {
    /// Parse raw synchronized lyrics.
    ///
    /// Each physical line is searched for its first `[minutes:seconds]` tag,
    /// where minutes are digits and seconds are digits with an optional
    /// fractional part. The text after the tag, trimmed, becomes the line
    /// text. Lines without a tag are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use bratgen_common::lyrics::LyricsTimeline;
    ///
    /// let timeline = LyricsTimeline::parse("[00:12.50]Hello\ngarbage\n[01:00]World");
    /// assert_eq!(timeline.len(), 2);
    /// assert_eq!(timeline.lines()[0].time, 12.5);
    /// assert_eq!(timeline.lines()[1].text, "World");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut lines = Vec::new();

        for (row, raw_line) in raw.lines().enumerate() {
            match find_timestamp_tag(raw_line) {
                Some((time, rest)) => lines.push(TimedLine {
                    time,
                    text: rest.trim().to_string(),
                }),
                None => {
                    if !raw_line.trim().is_empty() {
                        debug!(row = row, line = %raw_line, "Skipping lyric row without timestamp");
                    }
                }
            }
        }

        Self { lines }
    }

    pub fn from_lines(lines: Vec<TimedLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[TimedLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&TimedLine> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Derive the clip range covering lines `start_index..=end_index`.
    ///
    /// The range starts at the first selected line and ends where the line
    /// after the block begins. When the block runs to the last line, the end
    /// is the last line's time plus [`LAST_LINE_TAIL_SECS`].
    ///
    /// Requires `start_index <= end_index < len()`; anything else is a caller
    /// bug and returns [`Error::InvalidInput`].
    pub fn range_for(&self, start_index: usize, end_index: usize) -> Result<TimeRange> {
        if start_index > end_index || end_index >= self.lines.len() {
            return Err(Error::InvalidInput(format!(
                "line range {}..={} outside timeline of {} lines",
                start_index,
                end_index,
                self.lines.len()
            )));
        }

        let start = self.lines[start_index].time;
        let end = match self.lines.get(end_index + 1) {
            Some(next) => next.time,
            None => self.lines[end_index].time + LAST_LINE_TAIL_SECS,
        };

        Ok(TimeRange::new(format_clock(start), format_clock(end)))
    }
}

/// Locate the first `[digits:digits(.digits)]` tag in a line.
///
/// Returns the tag's time in seconds and the text following it.
fn find_timestamp_tag(line: &str) -> Option<(f64, &str)> {
    let bytes = line.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = line[search_from..].find('[') {
        let open = search_from + offset;
        if let Some((time, close)) = parse_tag_at(bytes, open) {
            return Some((time, &line[close + 1..]));
        }
        search_from = open + 1;
    }

    None
}

/// Parse a tag starting at `bytes[open] == b'['`; returns (seconds, index of `]`)
fn parse_tag_at(bytes: &[u8], open: usize) -> Option<(f64, usize)> {
    let digits_end = |from: usize| {
        let mut i = from;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let minutes_start = open + 1;
    let minutes_end = digits_end(minutes_start);
    if minutes_end == minutes_start || bytes.get(minutes_end) != Some(&b':') {
        return None;
    }

    let seconds_start = minutes_end + 1;
    let mut seconds_end = digits_end(seconds_start);
    if seconds_end == seconds_start {
        return None;
    }
    if bytes.get(seconds_end) == Some(&b'.') {
        seconds_end = digits_end(seconds_end + 1);
    }
    if bytes.get(seconds_end) != Some(&b']') {
        return None;
    }

    // Both slices are ASCII digits (plus at most one '.'), so UTF-8 boundaries hold
    let minutes: f64 = std::str::from_utf8(&bytes[minutes_start..minutes_end])
        .ok()?
        .parse()
        .ok()?;
    let seconds: f64 = std::str::from_utf8(&bytes[seconds_start..seconds_end])
        .ok()?
        .parse()
        .ok()?;

    Some((minutes * 60.0 + seconds, seconds_end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(times: &[f64]) -> LyricsTimeline {
        LyricsTimeline::from_lines(
            times
                .iter()
                .enumerate()
                .map(|(i, &time)| TimedLine {
                    time,
                    text: format!("line {}", i),
                })
                .collect(),
        )
    }

    #[test]
    fn test_parse_drops_garbage() {
        let parsed = LyricsTimeline::parse("[00:12.50]Hello\ngarbage\n[01:00]World");
        assert_eq!(
            parsed.lines(),
            &[
                TimedLine { time: 12.5, text: "Hello".to_string() },
                TimedLine { time: 60.0, text: "World".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(LyricsTimeline::parse("").is_empty());
        assert!(LyricsTimeline::parse("\n\n  \n").is_empty());
        assert!(LyricsTimeline::parse("no tags here\nnor here").is_empty());
    }

    #[test]
    fn test_parse_skips_metadata_tags() {
        let parsed = LyricsTimeline::parse("[ar:Charli]\n[ti:365]\n[offset:+100]\n[00:01.00]go");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.lines()[0].text, "go");
    }

    #[test]
    fn test_parse_instrumental_line() {
        let parsed = LyricsTimeline::parse("[00:05.00]   \n[00:09.10]words");
        assert_eq!(parsed.len(), 2);
        assert!(parsed.lines()[0].is_instrumental());
        assert_eq!(parsed.lines()[0].display_text(), INSTRUMENTAL_GLYPH);
        assert_eq!(parsed.lines()[1].display_text(), "words");
    }

    #[test]
    fn test_parse_keeps_file_order_and_duplicates() {
        let parsed = LyricsTimeline::parse("[00:30]b\n[00:10]a\n[00:10]a");
        let times: Vec<f64> = parsed.lines().iter().map(|l| l.time).collect();
        assert_eq!(times, vec![30.0, 10.0, 10.0]);
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let parsed = LyricsTimeline::parse("[1:02]a\n[10:5.25]b\n[00:07.]c\n[123:00.5]d");
        let times: Vec<f64> = parsed.lines().iter().map(|l| l.time).collect();
        assert_eq!(times, vec![62.0, 605.25, 7.0, 7380.5]);
    }

    #[test]
    fn test_parse_rejects_malformed_tags() {
        let parsed = LyricsTimeline::parse("[:12]x\n[00:]x\n[00:12.5.1]x\n[aa:12]x\n[00-12]x\n[00:12");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_uses_first_tag_anywhere_in_line() {
        let parsed = LyricsTimeline::parse("prefix [00:03]after\n[bad][00:04] ok ");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.lines()[0].time, 3.0);
        assert_eq!(parsed.lines()[0].text, "after");
        assert_eq!(parsed.lines()[1].time, 4.0);
        assert_eq!(parsed.lines()[1].text, "ok");
    }

    #[test]
    fn test_parse_repeated_tags_keep_rest_as_text() {
        let parsed = LyricsTimeline::parse("[00:01][00:20]chorus");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.lines()[0].time, 1.0);
        assert_eq!(parsed.lines()[0].text, "[00:20]chorus");
    }

    #[test]
    fn test_parse_crlf_input() {
        let parsed = LyricsTimeline::parse("[00:01.00]one\r\n[00:02.00]two\r\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.lines()[0].text, "one");
        assert_eq!(parsed.lines()[1].text, "two");
    }

    #[test]
    fn test_parse_non_ascii_text() {
        let parsed = LyricsTimeline::parse("é [00:02.00] héllo ♫\n[００:01]fullwidth");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.lines()[0].text, "héllo ♫");
    }

    #[test]
    fn test_range_interior_uses_next_line_start() {
        let timeline = timeline(&[10.0, 20.0, 30.0]);
        let range = timeline.range_for(0, 1).unwrap();
        assert_eq!(range, TimeRange::new("0:10", "0:30"));
    }

    #[test]
    fn test_range_last_line_adds_tail() {
        let timeline = timeline(&[10.0, 20.0, 50.0]);
        let range = timeline.range_for(2, 2).unwrap();
        assert_eq!(range, TimeRange::new("0:50", "0:55"));
    }

    #[test]
    fn test_range_single_interior_line() {
        let timeline = timeline(&[10.0, 20.0, 50.0]);
        assert_eq!(timeline.range_for(1, 1).unwrap(), TimeRange::new("0:20", "0:50"));
    }

    #[test]
    fn test_range_follows_file_order_not_time_order() {
        let timeline = timeline(&[40.0, 15.0]);
        assert_eq!(timeline.range_for(0, 0).unwrap(), TimeRange::new("0:40", "0:15"));
    }

    #[test]
    fn test_range_rejects_bad_indices() {
        let timeline = timeline(&[1.0, 2.0, 3.0]);
        assert!(matches!(timeline.range_for(2, 1), Err(Error::InvalidInput(_))));
        assert!(matches!(timeline.range_for(0, 3), Err(Error::InvalidInput(_))));
        assert!(matches!(LyricsTimeline::default().range_for(0, 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_default_time_range() {
        assert_eq!(TimeRange::default(), TimeRange::new("0:00", "0:15"));
        assert_eq!(TimeRange::default().to_string(), "0:00 - 0:15");
    }
}
