//! Playback time codec.
//!
//! Converts between seconds and the `[h:]mm:ss` text used in chat, and
//! parses the loose numeric forms people actually type (`1:23`, `1:02:03`,
//! `90`, `-5`, `t=0`).

use regex::Regex;
use std::sync::OnceLock;

/// Matches one signed integer run.
static NUMBER_RUN: OnceLock<Regex> = OnceLock::new();

fn number_run() -> &'static Regex {
    NUMBER_RUN.get_or_init(|| Regex::new(r"-?\d+").expect("valid number regex"))
}

/// Formats seconds as `H:MM:SS` when there is at least one hour, `M:SS` otherwise.
///
/// The value is rounded to the nearest whole second first. Negative and
/// non-finite inputs render as `0:00`.
///
/// # Examples
///
/// ```
/// use moov_core::time::format_time;
///
/// assert_eq!(format_time(0.0), "0:00");
/// assert_eq!(format_time(65.4), "1:05");
/// assert_eq!(format_time(3723.0), "1:02:03");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let (h, rest) = (total / 3600, total % 3600);
    let (m, s) = (rest / 60, rest % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Parses free-form time text into signed seconds.
///
/// Up to the first three integer runs are folded as base-60 places, so
/// `"90"` is 90 seconds, `"1:30"` is 90 and `"1:00:30"` is 3630. Further runs
/// are ignored. A minus sign on the first run makes the whole value negative.
/// Text without digits parses as 0.
///
/// # Examples
///
/// ```
/// use moov_core::time::parse_time;
///
/// assert_eq!(parse_time("1:02:03"), 3723);
/// assert_eq!(parse_time("-5"), -5);
/// assert_eq!(parse_time("soon"), 0);
/// ```
pub fn parse_time(text: &str) -> i64 {
    parse_time_strict(text).unwrap_or(0)
}

/// Like [`parse_time`], but returns `None` when the text holds no digits.
pub fn parse_time_strict(text: &str) -> Option<i64> {
    let mut runs = number_run().find_iter(text).take(3).peekable();
    let negative = runs.peek()?.as_str().starts_with('-');

    let magnitude = runs.fold(0i64, |acc, run| {
        let digits = run.as_str().trim_start_matches('-');
        let place = digits.parse::<i64>().unwrap_or(i64::MAX);
        acc.saturating_mul(60).saturating_add(place)
    });

    Some(if negative { -magnitude } else { magnitude })
}
