//! Daily sections and their heading totals.
//!
//! A section starts at a heading of the form
//!
//! ```text
//! ## Pomodoro 2026-03-02 (Monday) — 🍅 45:00, 🏖 05:00, Σ 50:00
//! ```
//!
//! and runs until the next level-1 or level-2 heading, or the end of the
//! text. The totals are never accumulated: every refresh re-reads the
//! finished entries of the section and rewrites the heading line, so
//! hand edits to the entries are picked up on the next write.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::format::{format_duration, parse_duration};

pub const HEADING_PREFIX: &str = "## Pomodoro ";

/// Finished entries: a pomodoro or break tag, optionally qualified as
/// quit early or overtime, followed somewhere by ` — <duration>`.
/// Start and unsuccessful entries never match.
static FINISHED_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[(🍅|🏖)(?: (?:Quit Early|Overtime))?\] .*? — (\d+:\d{2}(?::\d{2})?)(?:\s|$)")
        .unwrap()
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub work_ms: u64,
    pub break_ms: u64,
}

impl DailyTotals {
    pub fn total_ms(&self) -> u64 {
        self.work_ms + self.break_ms
    }
}

/// The full heading line for `date`.
pub fn render_heading(date: NaiveDate, totals: DailyTotals) -> String {
    format!(
        "{HEADING_PREFIX}{} ({}) — 🍅 {}, 🏖 {}, Σ {}",
        date.format("%Y-%m-%d"),
        date.format("%A"),
        format_duration(totals.work_ms),
        format_duration(totals.break_ms),
        format_duration(totals.total_ms()),
    )
}

fn is_heading_for(line: &str, date: NaiveDate) -> bool {
    let key = format!("{HEADING_PREFIX}{}", date.format("%Y-%m-%d"));
    match line.strip_prefix(&key) {
        Some(rest) => rest.is_empty() || rest.starts_with(' '),
        None => false,
    }
}

fn is_section_boundary(line: &str) -> bool {
    line.starts_with("# ") || line.starts_with("## ") || line == "#" || line == "##"
}

/// `(heading index, end index)` of the section for `date`; the end index
/// is exclusive.
fn find_section(lines: &[String], date: NaiveDate) -> Option<(usize, usize)> {
    let heading = lines.iter().position(|l| is_heading_for(l, date))?;
    let end = lines[heading + 1..]
        .iter()
        .position(|l| is_section_boundary(l))
        .map(|offset| heading + 1 + offset)
        .unwrap_or(lines.len());
    Some((heading, end))
}

/// Sum the durations of all finished entries in `lines`.
pub fn scan_totals<'a>(lines: impl IntoIterator<Item = &'a str>) -> DailyTotals {
    let mut totals = DailyTotals::default();
    for line in lines {
        let Some(caps) = FINISHED_ENTRY_RE.captures(line) else {
            continue;
        };
        let Some(ms) = caps.get(2).and_then(|m| parse_duration(m.as_str())) else {
            continue;
        };
        match caps.get(1).map(|m| m.as_str()) {
            Some("🍅") => totals.work_ms += ms,
            _ => totals.break_ms += ms,
        }
    }
    totals
}

struct Document {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl Document {
    fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
            trailing_newline: content.ends_with('\n') || content.is_empty(),
        }
    }

    fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Insert `entry` at the end of the section for `date`, appending a new
/// section when there is none yet. The heading is not refreshed.
pub fn insert_entry(content: &str, date: NaiveDate, entry: &str) -> String {
    let mut doc = Document::parse(content);

    match find_section(&doc.lines, date) {
        Some((heading, end)) => {
            // After the last non-blank line, so trailing spacing stays
            // in front of the next section.
            let insert_at = (heading + 1..end)
                .rev()
                .find(|&i| !doc.lines[i].trim().is_empty())
                .map(|i| i + 1)
                .unwrap_or(heading + 1);
            doc.lines.insert(insert_at, entry.to_string());
        }
        None => {
            if doc.lines.last().is_some_and(|l| !l.trim().is_empty()) {
                doc.lines.push(String::new());
            }
            doc.lines.push(render_heading(date, DailyTotals::default()));
            doc.lines.push(entry.to_string());
            doc.trailing_newline = true;
        }
    }

    doc.render()
}

/// Recompute the heading for `date` from its section. Content without a
/// section for `date` is returned unchanged.
pub fn refresh(content: &str, date: NaiveDate) -> String {
    let mut doc = Document::parse(content);
    let Some((heading, end)) = find_section(&doc.lines, date) else {
        return content.to_string();
    };
    let totals = scan_totals(doc.lines[heading + 1..end].iter().map(String::as_str));
    doc.lines[heading] = render_heading(date, totals);
    doc.render()
}

/// Totals of the section for `date`, if one exists.
pub fn section_totals(content: &str, date: NaiveDate) -> Option<DailyTotals> {
    let doc = Document::parse(content);
    let (heading, end) = find_section(&doc.lines, date)?;
    Some(scan_totals(doc.lines[heading + 1..end].iter().map(String::as_str)))
}
