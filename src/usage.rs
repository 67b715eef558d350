//! Usage-log processing.
//!
//! The log is append-only: one comma-delimited event per line. Lines are
//! parsed into records, filtered against the exclusion lists, sorted into a
//! canonical order, and folded into a last-write-wins attribution index per
//! area.
use crate::key::report_key;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Classification of a usage event, derived from its path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Area {
    Closing,
    Production,
}

impl Area {
    fn from_token(token: &str) -> Option<Area> {
        match token {
            "Closing" => Some(Area::Closing),
            "Production" => Some(Area::Production),
            _ => None,
        }
    }
}

/// One surviving log event, consumed by the fold step.
#[derive(Debug)]
struct UsageRecord {
    key: String,
    area: Area,
    user: String,
    timestamp: NaiveDateTime,
}

/// Latest-use attribution for one report key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LastUse {
    /// `MM/DD/YYYY - <user>` display string.
    pub display: String,
    #[serde(skip)]
    timestamp: NaiveDateTime,
}

/// Last-write-wins attribution per area. Each key holds exactly the record
/// with the maximum timestamp seen for that (key, area) among non-excluded
/// log lines.
#[derive(Debug, Default, Serialize)]
pub struct UsageIndex {
    pub production: BTreeMap<String, LastUse>,
    pub closing: BTreeMap<String, LastUse>,
}

impl UsageIndex {
    /// Display string for a key, or the empty string when the key has no
    /// attribution in that area.
    pub fn display_for(&self, area: Area, key: &str) -> &str {
        self.area_map(area)
            .get(key)
            .map(|last| last.display.as_str())
            .unwrap_or("")
    }

    fn area_map(&self, area: Area) -> &BTreeMap<String, LastUse> {
        match area {
            Area::Production => &self.production,
            Area::Closing => &self.closing,
        }
    }

    fn apply(&mut self, record: UsageRecord) {
        let map = match record.area {
            Area::Production => &mut self.production,
            Area::Closing => &mut self.closing,
        };
        if let Some(stored) = map.get(&record.key) {
            if record.timestamp <= stored.timestamp {
                return;
            }
        }
        let display = format!("{} - {}", record.timestamp.format("%m/%d/%Y"), record.user);
        map.insert(
            record.key,
            LastUse {
                display,
                timestamp: record.timestamp,
            },
        );
    }
}

/// Per-run accounting of log processing.
#[derive(Debug, Default, Serialize)]
pub struct LogStats {
    /// Lines that produced a usage record.
    pub parsed: usize,
    /// Lines filtered out by the area gate or the exclusion lists.
    pub dropped: usize,
    /// Malformed lines skipped with a diagnostic.
    pub skipped: usize,
}

/// Attribution index plus the accounting for the lines that built it.
#[derive(Debug, Default)]
pub struct LogOutcome {
    pub index: UsageIndex,
    pub stats: LogStats,
}

/// Process the usage log into a last-write-wins attribution index.
///
/// A missing or unreadable log file is fatal; individual malformed lines
/// are skipped with a warning and counted, never silently lost.
pub fn process_log(
    log_path: &Path,
    excluded_users: &[String],
    excluded_folders: &[String],
) -> Result<LogOutcome> {
    let text = fs::read_to_string(log_path)
        .with_context(|| format!("read usage log {}", log_path.display()))?;
    Ok(process_lines(text.lines(), excluded_users, excluded_folders))
}

/// Parse, filter, sort, and fold usage-log lines.
///
/// The sort into (area, key, timestamp) order before the fold makes the
/// result independent of the log's original line order.
pub fn process_lines<'a, I>(
    lines: I,
    excluded_users: &[String],
    excluded_folders: &[String],
) -> LogOutcome
where
    I: IntoIterator<Item = &'a str>,
{
    let parser = LineParser::new(excluded_users, excluded_folders);
    let mut records = Vec::new();
    let mut stats = LogStats::default();

    for (index, raw) in lines.into_iter().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        match parser.parse(raw) {
            Ok(Some(record)) => {
                stats.parsed += 1;
                records.push(record);
            }
            Ok(None) => stats.dropped += 1,
            Err(reason) => {
                stats.skipped += 1;
                tracing::warn!(line = index + 1, %reason, "skipping malformed usage-log line");
            }
        }
    }

    records.sort_by(|a, b| {
        a.area
            .cmp(&b.area)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    let mut index = UsageIndex::default();
    for record in records {
        index.apply(record);
    }
    LogOutcome { index, stats }
}

/// Line parser with the timestamp shape precompiled and the user exclusions
/// pre-uppercased.
struct LineParser {
    timestamp_shape: Regex,
    excluded_users: Vec<String>,
    excluded_folders: Vec<String>,
}

impl LineParser {
    fn new(excluded_users: &[String], excluded_folders: &[String]) -> Self {
        LineParser {
            timestamp_shape: timestamp_shape(),
            excluded_users: excluded_users
                .iter()
                .map(|user| user.to_uppercase())
                .collect(),
            excluded_folders: excluded_folders.to_vec(),
        }
    }

    /// Parse one log line.
    ///
    /// `Ok(None)` means the line was filtered out (wrong area, excluded user
    /// or folder); `Err` carries the reason a malformed line was skipped.
    fn parse(&self, raw: &str) -> Result<Option<UsageRecord>, String> {
        let cleaned = raw.replace('"', "").replace('\\', "/");
        let cleaned = cleaned.trim_start_matches('/');
        let fields: Vec<&str> = cleaned.split(',').collect();
        if fields.len() < 6 {
            return Err(format!("expected at least 6 fields, found {}", fields.len()));
        }

        let path = fields[0];
        if !path.contains("Production") && !path.contains("Closing") {
            return Ok(None);
        }
        let user = fields[2].to_uppercase();
        if self.excluded_users.contains(&user) {
            return Ok(None);
        }

        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 4 {
            return Err(format!("path {path:?} has fewer than 4 segments"));
        }
        if self
            .excluded_folders
            .iter()
            .any(|folder| folder.as_str() == segments[3])
        {
            return Ok(None);
        }

        let area = segments[2]
            .split('-')
            .nth(2)
            .map(str::trim)
            .and_then(Area::from_token)
            .ok_or_else(|| format!("unrecognized area in path segment {:?}", segments[2]))?;
        let timestamp = self
            .parse_timestamp(fields[5])
            .ok_or_else(|| format!("unparseable timestamp {:?}", fields[5]))?;

        Ok(Some(UsageRecord {
            key: report_key(segments[3], fields[1]),
            area,
            user,
            timestamp,
        }))
    }

    /// Lenient timestamp parsing, in the spirit of the mixed shapes the log
    /// has accumulated: `/` or `-` separated dates, month-first or
    /// year-first, 2- or 4-digit years, optional time with optional seconds
    /// and an optional 12-hour AM/PM clock.
    fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        let caps = self.timestamp_shape.captures(raw.trim())?;

        let first = caps.get(1)?.as_str();
        let second: u32 = caps.get(2)?.as_str().parse().ok()?;
        let third = caps.get(3)?.as_str();
        let (year, month, day): (i32, u32, u32) = if first.len() == 4 {
            (first.parse().ok()?, second, third.parse().ok()?)
        } else {
            (expand_year(third.parse().ok()?), first.parse().ok()?, second)
        };

        let mut hour: u32 = match caps.get(4) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        let minute: u32 = match caps.get(5) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        let second_of_minute: u32 = match caps.get(6) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        match caps.get(7).map(|m| m.as_str().to_ascii_uppercase()) {
            Some(meridiem) if meridiem == "P" && hour < 12 => hour += 12,
            Some(meridiem) if meridiem == "A" && hour == 12 => hour = 0,
            _ => {}
        }

        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second_of_minute)
    }
}

fn timestamp_shape() -> Regex {
    Regex::new(concat!(
        r"^(\d{1,4})[/-](\d{1,2})[/-](\d{1,4})",
        r"(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([APap])\.?[Mm]\.?)?)?$",
    ))
    .expect("timestamp shape pattern")
}

/// Two-digit years pivot at 70, matching the usual lenient-parser rule.
fn expand_year(year: i32) -> i32 {
    match year {
        0..=69 => 2000 + year,
        70..=99 => 1900 + year,
        _ => year,
    }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
