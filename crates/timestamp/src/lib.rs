//! Relay - Timestamp extraction
//!
//! Finds and parses a timestamp embedded in a log payload. Listeners consult
//! the extractor once per message (unless configured to ignore embedded
//! timestamps) and fall back to ingestion time when nothing is found -
//! failure to find a timestamp is never an error.
//!
//! The extractor prefers the leftmost recognizable timestamp in the payload
//! and can optionally treat zone-less timestamps as local time instead of
//! UTC (for appliances that log naive local times).
//!
//! Recognized shapes:
//!
//! - RFC 3339 / ISO-8601 with zone: `2024-03-01T12:34:56.789Z`,
//!   `2024-03-01 12:34:56+02:00`
//! - ISO-8601 without zone: `2024-03-01T12:34:56`, `2024-03-01 12:34:56.5`
//! - BSD syslog, year-less: `Mar  1 12:34:56` (year taken from the clock)

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Configuration for a [`TimeExtractor`]
///
/// Leftmost-match preference is always on; the only knob is how zone-less
/// timestamps are interpreted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeExtractorConfig {
    /// Interpret timestamps without zone information as local time rather
    /// than UTC
    pub assume_local_timezone: bool,
}

/// Which parse routine a matched candidate goes through
#[derive(Debug, Clone, Copy)]
enum PatternKind {
    /// Full RFC 3339 with zone designator
    Rfc3339,
    /// ISO-8601 date-time without a zone
    IsoNoZone,
    /// BSD syslog `Mmm dd HH:MM:SS`, no year
    BsdSyslog,
}

struct Pattern {
    regex: Regex,
    kind: PatternKind,
}

/// Timestamp recognizer with leftmost-match preference
///
/// Construction compiles the pattern table once; listeners create one
/// extractor per connection and reuse it for every message.
///
/// # Example
///
/// ```
/// use relay_timestamp::{TimeExtractor, TimeExtractorConfig};
///
/// let extractor = TimeExtractor::new(TimeExtractorConfig::default());
/// let ts = extractor.extract(b"<34>1 2024-03-01T12:34:56Z host app - - hello");
/// assert!(ts.is_some());
/// ```
pub struct TimeExtractor {
    patterns: Vec<Pattern>,
    assume_local: bool,
}

impl TimeExtractor {
    /// Build an extractor with the fixed pattern table
    pub fn new(config: TimeExtractorConfig) -> Self {
        // Pattern order is the tie-break for candidates matching at the same
        // offset, so the zoned form must come before its zone-less prefix.
        let patterns = vec![
            Pattern {
                regex: Regex::new(
                    r"\d{4}-\d{2}-\d{2}[Tt ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:[Zz]|[+-]\d{2}:?\d{2})",
                )
                .expect("static regex"),
                kind: PatternKind::Rfc3339,
            },
            Pattern {
                regex: Regex::new(r"\d{4}-\d{2}-\d{2}[Tt ]\d{2}:\d{2}:\d{2}(?:\.\d+)?")
                    .expect("static regex"),
                kind: PatternKind::IsoNoZone,
            },
            Pattern {
                regex: Regex::new(
                    r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) {1,2}\d{1,2} \d{2}:\d{2}:\d{2}",
                )
                .expect("static regex"),
                kind: PatternKind::BsdSyslog,
            },
        ];

        Self {
            patterns,
            assume_local: config.assume_local_timezone,
        }
    }

    /// Find and parse the leftmost timestamp in `payload`
    ///
    /// Returns `None` when no recognizable timestamp is present; callers fall
    /// back to ingestion time.
    pub fn extract(&self, payload: &[u8]) -> Option<DateTime<Utc>> {
        let text = String::from_utf8_lossy(payload);

        // Collect the leftmost match of every pattern, then try them in
        // position order (pattern-table order breaks ties) until one parses.
        let mut candidates: Vec<(usize, usize, &str, PatternKind)> = self
            .patterns
            .iter()
            .enumerate()
            .filter_map(|(order, p)| {
                p.regex
                    .find(&text)
                    .map(|m| (m.start(), order, m.as_str(), p.kind))
            })
            .collect();
        candidates.sort_by_key(|&(start, order, _, _)| (start, order));

        candidates
            .into_iter()
            .find_map(|(_, _, matched, kind)| self.parse(matched, kind))
    }

    fn parse(&self, matched: &str, kind: PatternKind) -> Option<DateTime<Utc>> {
        match kind {
            PatternKind::Rfc3339 => {
                let normalized = normalize_separator(matched);
                DateTime::parse_from_rfc3339(&normalized)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }
            PatternKind::IsoNoZone => {
                let normalized = normalize_separator(matched);
                let naive =
                    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
                self.resolve_naive(naive)
            }
            PatternKind::BsdSyslog => {
                // Year-less: borrow the year from the clock in the zone the
                // timestamp will be interpreted in.
                let year = if self.assume_local {
                    Local::now().year()
                } else {
                    Utc::now().year()
                };
                let collapsed = matched.split_whitespace().collect::<Vec<_>>().join(" ");
                let with_year = format!("{} {}", year, collapsed);
                let naive = NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S").ok()?;
                self.resolve_naive(naive)
            }
        }
    }

    /// Interpret a zone-less timestamp per the configured bias
    fn resolve_naive(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        if self.assume_local {
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        } else {
            Some(Utc.from_utc_datetime(&naive))
        }
    }
}

/// Rewrite the date/time separator to `T` so one chrono format string covers
/// the `T`, `t` and space variants the regexes accept
fn normalize_separator(matched: &str) -> String {
    let mut normalized = String::with_capacity(matched.len());
    for (i, c) in matched.char_indices() {
        if i == 10 && (c == ' ' || c == 't') {
            normalized.push('T');
        } else {
            normalized.push(c);
        }
    }
    normalized
}
