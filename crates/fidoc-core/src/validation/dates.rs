//! Issue/due date validation.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::models::config::ValidationConfig;

use super::ValidationResult;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a date as providers commonly return it.
///
/// Accepts RFC 3339 timestamps (the NFe XML `dhEmi` form), naive ISO
/// timestamps and the usual day-first and year-first date layouts.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Validate issue and due dates against each other and a reference date.
pub fn validate_dates(
    issue_date: Option<&str>,
    due_date: Option<&str>,
    today: NaiveDate,
    config: &ValidationConfig,
) -> ValidationResult {
    let adj = &config.adjustments;
    let mut result = ValidationResult::new();

    let issue = issue_date.and_then(|raw| {
        let parsed = parse_date(raw);
        if parsed.is_none() {
            result.error(
                format!("issue date '{}' could not be parsed", raw),
                adj.date_unparseable,
            );
        }
        parsed
    });

    let due = due_date.and_then(|raw| {
        let parsed = parse_date(raw);
        if parsed.is_none() {
            result.error(
                format!("due date '{}' could not be parsed", raw),
                adj.date_unparseable,
            );
        }
        parsed
    });

    if let Some(issue) = issue {
        if issue > today {
            result.warning(
                format!("issue date {} is in the future", issue),
                adj.date_in_future,
            );
        }
        if issue.year() < config.min_issue_year {
            result.warning(
                format!("issue date {} is before {}", issue, config.min_issue_year),
                adj.date_too_old,
            );
        }
    }

    if let (Some(issue), Some(due)) = (issue, due) {
        if due < issue {
            result.error(
                format!("due date {} is before issue date {}", due, issue),
                adj.due_before_issue,
            );
        }
    }

    result
}
