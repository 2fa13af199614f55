//! Progress decoding for encoder diagnostic lines.
//!
//! A line is decodable when it carries both fields:
//!
//! ```text
//! time-field := "time=" DD ":" DD ":" DD "." DD       (first occurrence that parses)
//! dur-field  := "duration=" D+ "." D+                  (first occurrence that parses)
//! ```
//!
//! `time=00:01:30.50 duration=600.0` decodes to 90.5s of 600s. Anything else
//! is reported as "not decodable" and never as an error.

/// Marker preceding the elapsed-time field.
const TIME_MARKER: &str = "time=";

/// Marker preceding the total-duration field.
const DURATION_MARKER: &str = "duration=";

/// Elapsed and total seconds decoded from one diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub elapsed_secs: f64,
    /// Always greater than zero.
    pub duration_secs: f64,
}

impl ProgressSample {
    /// Completion percentage, clamped to `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        (self.elapsed_secs / self.duration_secs * 100.0).clamp(0.0, 100.0)
    }
}

/// Decode a progress sample from one diagnostic line.
///
/// Returns `None` when either marker is missing, when a field is malformed,
/// or when the duration is not positive.
pub fn parse_progress(line: &str) -> Option<ProgressSample> {
    if !line.contains(TIME_MARKER) || !line.contains(DURATION_MARKER) {
        return None;
    }

    let elapsed_secs = find_field(line, TIME_MARKER, parse_clock)?;
    let duration_secs = find_field(line, DURATION_MARKER, parse_decimal)?;

    if duration_secs <= 0.0 {
        return None;
    }

    Some(ProgressSample {
        elapsed_secs,
        duration_secs,
    })
}

/// Try `parse` at every occurrence of `marker`, returning the first success.
fn find_field(line: &str, marker: &str, parse: fn(&str) -> Option<f64>) -> Option<f64> {
    line.match_indices(marker)
        .find_map(|(i, _)| parse(&line[i + marker.len()..]))
}

/// Consume exactly `n` ASCII digits from the front of `s`.
fn take_digits(s: &str, n: usize) -> Option<(&str, &str)> {
    let digits = s.get(..n)?;
    digits
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| (digits, &s[n..]))
}

/// Consume one or more ASCII digits from the front of `s`.
fn take_digit_run(s: &str) -> Option<(&str, &str)> {
    let end = s.bytes().take_while(u8::is_ascii_digit).count();
    (end > 0).then(|| s.split_at(end))
}

/// `HH:MM:SS.ss` at the start of `s`, as seconds. Trailing text is ignored.
fn parse_clock(s: &str) -> Option<f64> {
    let (hours, rest) = take_digits(s, 2)?;
    let rest = rest.strip_prefix(':')?;
    let (minutes, rest) = take_digits(rest, 2)?;
    let rest = rest.strip_prefix(':')?;
    let (whole, rest) = take_digits(rest, 2)?;
    let rest = rest.strip_prefix('.')?;
    let (frac, _) = take_digits(rest, 2)?;

    let hours: f64 = hours.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = format!("{whole}.{frac}").parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// `D+.D+` at the start of `s`. Trailing text is ignored.
fn parse_decimal(s: &str) -> Option<f64> {
    let (int_part, rest) = take_digit_run(s)?;
    let rest = rest.strip_prefix('.')?;
    let (frac_part, _) = take_digit_run(rest)?;
    format!("{int_part}.{frac_part}").parse().ok()
}
