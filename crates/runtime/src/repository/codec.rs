//! Line-oriented encoding of the persisted assignment index.
//!
//! # File Format
//!
//! ```text
//! # vip_assignments: one JSON record per line (subject_id, rank, expires_at UTC)
//! {"subject_id":"7656119@steam","rank":"VIP","expires_at":"2025-06-01T18:00:00Z"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Lines in the older
//! `subjectId|rankText|expiresAtUtcTicks` layout of `vip_assignments.txt`
//! are still read, where ticks count 100ns intervals since
//! 0001-01-01T00:00:00Z; they are rewritten as JSON on the next save.

use chrono::{DateTime, Utc};
use rank_core::{Assignment, RankLabel, SubjectId};
use tracing::warn;

use super::error::{RepositoryError, Result};
use super::traits::LoadReport;

pub const HEADER: &str =
    "# vip_assignments: one JSON record per line (subject_id, rank, expires_at UTC)";

/// Ticks between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Encode assignments as the full file contents, header first.
pub fn encode(assignments: &[Assignment]) -> Result<String> {
    let mut out = String::with_capacity(HEADER.len() + 1 + assignments.len() * 96);
    out.push_str(HEADER);
    out.push('\n');

    for assignment in assignments {
        let line = serde_json::to_string(assignment)
            .map_err(|e| RepositoryError::Json(format!("Failed to encode assignment: {}", e)))?;
        out.push_str(&line);
        out.push('\n');
    }

    Ok(out)
}

/// Decode file contents, skipping records that fail to parse.
pub fn decode(contents: &str) -> LoadReport {
    let mut report = LoadReport::default();

    for (index, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match decode_record(trimmed) {
            Ok(assignment) => report.assignments.push(assignment),
            Err(reason) => {
                warn!("Skipping assignment record on line {}: {}", index + 1, reason);
                report.skipped += 1;
            }
        }
    }

    report
}

fn decode_record(line: &str) -> std::result::Result<Assignment, String> {
    let assignment = if line.starts_with('{') {
        serde_json::from_str::<Assignment>(line).map_err(|e| e.to_string())?
    } else {
        decode_legacy(line)?
    };

    if assignment.subject_id.is_empty() {
        return Err("empty subject id".to_string());
    }
    Ok(assignment)
}

fn decode_legacy(line: &str) -> std::result::Result<Assignment, String> {
    let parts: Vec<&str> = line.split('|').collect();
    let [subject, rank, ticks] = parts.as_slice() else {
        return Err(format!("expected 3 '|' separated fields, found {}", parts.len()));
    };

    let ticks: i64 = ticks
        .trim()
        .parse()
        .map_err(|e| format!("invalid tick count {:?}: {}", ticks, e))?;
    let expires_at = from_ticks(ticks).ok_or_else(|| format!("tick count {} out of range", ticks))?;
    let rank = RankLabel::parse(rank).map_err(|e| e.to_string())?;

    Ok(Assignment::from_parts(
        SubjectId::new(subject.trim()),
        rank,
        expires_at,
    ))
}

fn from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    let since_epoch = ticks.checked_sub(UNIX_EPOCH_TICKS)?;
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}
