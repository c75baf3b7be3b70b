//! Date extraction from raw document text.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DATE_YMD, DUE_DATE, ISSUE_DATE};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        // DD/MM/YYYY, DD.MM.YYYY or DD-MM-YYYY
        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push(
                    ExtractionMatch::new(date, 0.9, m.as_str()).with_position(m.start(), m.end()),
                );
            }
        }

        // YYYY-MM-DD
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                if results.iter().any(|r| r.value == date) {
                    continue;
                }
                results.push(
                    ExtractionMatch::new(date, 0.9, m.as_str()).with_position(m.start(), m.end()),
                );
            }
        }

        results.sort_by_key(|r| r.position.map(|(start, _)| start));
        results
    }
}

/// Labeled dates found in a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentDates {
    /// Issue date (data de emissão).
    pub issue_date: Option<ExtractionMatch<NaiveDate>>,
    /// Due date (vencimento).
    pub due_date: Option<ExtractionMatch<NaiveDate>>,
}

/// Extract labeled dates from document text.
///
/// Unlabeled dates are not guessed at: a wrong issue date costs more
/// confidence than a missing one.
pub fn extract_dates(text: &str) -> DocumentDates {
    let extractor = DateExtractor::new();
    let labeled = |pattern: &regex::Regex| {
        pattern.captures(text).and_then(|caps| {
            let date_text = caps.get(1)?.as_str();
            extractor
                .extract(date_text)
                .map(|date| ExtractionMatch::new(date.value, 0.95, date_text))
        })
    };

    DocumentDates {
        issue_date: labeled(&ISSUE_DATE),
        due_date: labeled(&DUE_DATE),
    }
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}
