//! Plain-text scrap reports.
//!
//! Records render as one entry each:
//!
//! ```text
//! • {title}_{source}
//! {link}
//!
//! ```
//!
//! [`render_category_report`] groups a result list by [`Category`];
//! [`ScrapBook`] collects hand-picked entries under named sections.

use crate::models::{ArticleRecord, Category};
use crate::utils::{target_date, weekday_ko};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Placeholder line for a section without entries.
pub const EMPTY_SECTION: &str = "(기사 없음)";

/// Sections of the default morning scrap.
pub const DEFAULT_SECTIONS: &[&str] = &["공사 관련 보도", "철도 등 기타 유관기관 관련 보도"];

pub fn format_record(record: &ArticleRecord) -> String {
    format!(
        "• {}_{}\n{}\n\n",
        record.title, record.source_name, record.canonical_link
    )
}

/// `<{M}월 {D}일({weekday}) 조간 스크랩>` for the business day after `today`.
pub fn report_header(today: NaiveDate, extra_holidays: &[NaiveDate]) -> String {
    header_for(target_date(today, extra_holidays))
}

fn header_for(date: NaiveDate) -> String {
    format!(
        "<{}월 {}일({}) 조간 스크랩>",
        date.month(),
        date.day(),
        weekday_ko(date.weekday())
    )
}

/// Group `records` under one heading per category, in display order.
pub fn render_category_report(header: &str, records: &[ArticleRecord]) -> String {
    let mut out = format!("{header}\n\n");
    for category in Category::ORDERED {
        out.push_str(&format!("[{category}]\n"));
        let entries: Vec<String> = records
            .iter()
            .filter(|r| r.category == category)
            .map(format_record)
            .collect();
        if entries.is_empty() {
            out.push_str(EMPTY_SECTION);
            out.push_str("\n\n");
        } else {
            entries.iter().for_each(|e| out.push_str(e));
        }
    }
    out
}

/// Ordered named sections of formatted entries.
#[derive(Debug, Clone, Default)]
pub struct ScrapBook {
    sections: Vec<(String, Vec<String>)>,
}

impl ScrapBook {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            sections: names
                .iter()
                .map(|n| (n.as_ref().to_string(), Vec::new()))
                .collect(),
        }
    }

    /// Append `record` to `section`, creating the section if needed.
    ///
    /// Returns `false` when the same entry is already in that section.
    pub fn add(&mut self, section: &str, record: &ArticleRecord) -> bool {
        let entry = format_record(record);
        let idx = match self.sections.iter().position(|(name, _)| name == section) {
            Some(idx) => idx,
            None => {
                self.sections.push((section.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };
        let entries = &mut self.sections[idx].1;
        if entries.contains(&entry) {
            debug!(section, title = %record.title, "Entry already in section");
            return false;
        }
        entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|(_, e)| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.sections.iter_mut().for_each(|(_, e)| e.clear());
    }

    pub fn render(&self, header: &str) -> String {
        let mut out = format!("{header}\n\n");
        for (name, entries) in &self.sections {
            out.push_str(&format!("[{name}]\n"));
            if entries.is_empty() {
                out.push_str(EMPTY_SECTION);
                out.push_str("\n\n");
            } else {
                entries.iter().for_each(|e| out.push_str(e));
            }
        }
        out
    }
}
