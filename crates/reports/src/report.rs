use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The fixed set of generated reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Assets,
    Licenses,
    Inventory,
    Employees,
    Tracking,
}

impl ReportKind {
    pub fn default_report_id(&self) -> &'static str {
        match self {
            ReportKind::Assets => "assets-master",
            ReportKind::Licenses => "licenses-master",
            ReportKind::Inventory => "inventory-master",
            ReportKind::Employees => "employees-master",
            ReportKind::Tracking => "tracking-master",
        }
    }
}

/// `{data, reportId, generatedAt, summary}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<T> {
    pub data: Vec<T>,
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    /// Record count per status.
    pub summary: BTreeMap<String, u64>,
}

impl<T> Report<T> {
    pub fn new(kind: ReportKind, report_id: Option<String>, data: Vec<T>, summary: BTreeMap<String, u64>) -> Self {
        Self {
            data,
            report_id: report_id.unwrap_or_else(|| kind.default_report_id().to_string()),
            generated_at: Utc::now(),
            summary,
        }
    }
}

/// Count occurrences of each status label.
pub fn summarize<'a>(statuses: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, u64> {
    let mut summary = BTreeMap::new();
    for status in statuses {
        *summary.entry(status.to_string()).or_insert(0) += 1;
    }
    summary
}
