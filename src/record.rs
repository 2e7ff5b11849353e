// src/record.rs

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

pub const ISSUE_DATE: &str = "Issue date";
pub const ISSUE_NUMBER: &str = "Issue Number";
pub const COST_CENTER: &str = "Requesting Cost Center";
pub const ITEM_CODE: &str = "Item Code";
pub const ITEM_NAME: &str = "Item Name";
pub const CATEGORY: &str = "Category";
pub const UOM: &str = "UOM";
pub const REQUISITION_QUANTITY: &str = "Requisition Quantity";
pub const ISSUE_QUANTITY: &str = "Issue Quantity";
pub const PENDING_ISSUE_QUANTITY: &str = "Pending Issue Quantity";
pub const ITEM_RATE: &str = "Item Rate";
pub const LINE_ITEM_TOTAL: &str = "Line Item Total";
pub const ISSUE_STATUS: &str = "Issue Status";

/// Derived column appended to exports.
pub const MONTH_YEAR: &str = "Month_Year";

/// Columns coerced to numbers on load; unparsable cells become 0.
pub const NUMERIC_COLUMNS: &[&str] = &[
    REQUISITION_QUANTITY,
    ISSUE_QUANTITY,
    PENDING_ISSUE_QUANTITY,
    LINE_ITEM_TOTAL,
    ITEM_RATE,
];

/// Display label for a month, e.g. `Jan-2026`.
pub fn month_label(date: &NaiveDateTime) -> String {
    date.format("%b-%Y").to_string()
}

/// One line of the requisition/issue log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequisitionRecord {
    /// `None` when the source cell could not be parsed as a date.
    pub issue_date: Option<NaiveDateTime>,
    /// Derived from `issue_date`; `None` for undated rows.
    pub month_year: Option<String>,
    pub issue_number: String,
    pub cost_center: String,
    pub item_code: String,
    pub item_name: String,
    pub category: String,
    pub uom: String,
    pub requisition_qty: f64,
    pub issue_qty: f64,
    pub pending_qty: f64,
    pub item_rate: f64,
    pub line_total: f64,
    pub issue_status: String,
    /// Cells from columns outside the known set, keyed by normalized header.
    pub extra: BTreeMap<String, String>,
}

impl RequisitionRecord {
    /// Set the issue date and keep the month label in step with it.
    pub fn with_issue_date(mut self, date: Option<NaiveDateTime>) -> Self {
        self.month_year = date.as_ref().map(month_label);
        self.issue_date = date;
        self
    }

    /// Text value of a column as it would appear in an export.
    pub fn cell(&self, column: &str) -> String {
        match column {
            ISSUE_DATE => self.issue_date.map(format_timestamp).unwrap_or_default(),
            MONTH_YEAR => self.month_year.clone().unwrap_or_default(),
            ISSUE_NUMBER => self.issue_number.clone(),
            COST_CENTER => self.cost_center.clone(),
            ITEM_CODE => self.item_code.clone(),
            ITEM_NAME => self.item_name.clone(),
            CATEGORY => self.category.clone(),
            UOM => self.uom.clone(),
            REQUISITION_QUANTITY => self.requisition_qty.to_string(),
            ISSUE_QUANTITY => self.issue_qty.to_string(),
            PENDING_ISSUE_QUANTITY => self.pending_qty.to_string(),
            ITEM_RATE => self.item_rate.to_string(),
            LINE_ITEM_TOTAL => self.line_total.to_string(),
            ISSUE_STATUS => self.issue_status.clone(),
            other => self.extra.get(other).cloned().unwrap_or_default(),
        }
    }
}

/// Midnight timestamps are written as a bare date.
fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.time() == chrono::NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Counters for the silent coercions applied while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    pub unparsable_dates: usize,
    pub coerced_numbers: usize,
}

/// A fully loaded requisition log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Normalized column names in source order.
    pub columns: Vec<String>,
    pub records: Vec<RequisitionRecord>,
    pub stats: LoadStats,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
