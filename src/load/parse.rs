// src/load/parse.rs

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::record::{
    Dataset, LoadStats, RequisitionRecord, CATEGORY, COST_CENTER, ISSUE_DATE, ISSUE_NUMBER,
    ISSUE_QUANTITY, ISSUE_STATUS, ITEM_CODE, ITEM_NAME, ITEM_RATE, LINE_ITEM_TOTAL,
    PENDING_ISSUE_QUANTITY, REQUISITION_QUANTITY, UOM,
};

/// Trim a header and drop `" :"` / `":"` markers, so `"Issue date :"`
/// becomes `"Issue date"`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .replace(" :", "")
        .replace(':', "")
}

/// Parse a numeric cell. `None` for anything that is not a finite number.
pub fn coerce_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// Month-first ahead of day-first: `01/02/2026` is 2 January.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
];

/// Parse an issue-date cell, `None` if no known format matches.
pub fn parse_issue_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Column positions resolved once from the header row.
struct Layout {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    extra: Vec<(usize, String)>,
}

const KNOWN_COLUMNS: &[&str] = &[
    ISSUE_DATE,
    ISSUE_NUMBER,
    COST_CENTER,
    ITEM_CODE,
    ITEM_NAME,
    CATEGORY,
    UOM,
    REQUISITION_QUANTITY,
    ISSUE_QUANTITY,
    PENDING_ISSUE_QUANTITY,
    ITEM_RATE,
    LINE_ITEM_TOTAL,
    ISSUE_STATUS,
];

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut columns: Vec<String> = Vec::with_capacity(headers.len());
        let mut index = HashMap::new();
        let mut extra = Vec::new();
        for (i, raw) in headers.iter().enumerate() {
            let base = normalize_header(raw);
            let mut name = base.clone();
            // repeats become `name.1`, `name.2`, ...
            let mut n = 0;
            while index.contains_key(&name) {
                n += 1;
                name = format!("{}.{}", base, n);
            }
            if n > 0 {
                debug!(column = %base, renamed = %name, position = i, "duplicate column renamed");
            }
            if !KNOWN_COLUMNS.contains(&name.as_str()) {
                extra.push((i, name.clone()));
            }
            index.insert(name.clone(), i);
            columns.push(name);
        }
        if !index.contains_key(ISSUE_DATE) {
            bail!(
                "missing `{}` column (found: {})",
                ISSUE_DATE,
                columns.join(", ")
            );
        }
        Ok(Self {
            columns,
            index,
            extra,
        })
    }

    fn text<'r>(&self, row: &'r StringRecord, column: &str) -> &'r str {
        self.index
            .get(column)
            .and_then(|&i| row.get(i))
            .unwrap_or("")
    }
}

/// Parse raw CSV bytes into a [`Dataset`].
///
/// Individual cells never fail the parse: bad dates become `None`, bad
/// numbers become 0. Only a malformed CSV or a missing `Issue date` column
/// is an error.
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr.headers().context("reading CSV header row")?.clone();
    let layout = Layout::from_headers(&headers)?;

    let mut stats = LoadStats::default();
    let mut records = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let row = result.with_context(|| format!("CSV parse error at record {}", idx))?;

        let raw_date = layout.text(&row, ISSUE_DATE);
        let issue_date = parse_issue_date(raw_date);
        if issue_date.is_none() {
            stats.unparsable_dates += 1;
        }

        let mut number = |column: &str| -> f64 {
            let raw = layout.text(&row, column);
            match coerce_number(raw) {
                Some(v) => v,
                None => {
                    if !raw.trim().is_empty() {
                        stats.coerced_numbers += 1;
                    }
                    0.0
                }
            }
        };

        let requisition_qty = number(REQUISITION_QUANTITY);
        let issue_qty = number(ISSUE_QUANTITY);
        let pending_qty = number(PENDING_ISSUE_QUANTITY);
        let item_rate = number(ITEM_RATE);
        let line_total = number(LINE_ITEM_TOTAL);

        let record = RequisitionRecord {
            issue_number: layout.text(&row, ISSUE_NUMBER).to_string(),
            cost_center: layout.text(&row, COST_CENTER).to_string(),
            item_code: layout.text(&row, ITEM_CODE).to_string(),
            item_name: layout.text(&row, ITEM_NAME).to_string(),
            category: layout.text(&row, CATEGORY).to_string(),
            uom: layout.text(&row, UOM).to_string(),
            requisition_qty,
            issue_qty,
            pending_qty,
            item_rate,
            line_total,
            issue_status: layout.text(&row, ISSUE_STATUS).to_string(),
            extra: layout
                .extra
                .iter()
                .map(|(i, name)| (name.clone(), row.get(*i).unwrap_or("").to_string()))
                .collect(),
            ..Default::default()
        }
        .with_issue_date(issue_date);

        records.push(record);
    }

    stats.rows = records.len();
    info!(
        rows = stats.rows,
        columns = layout.columns.len(),
        unparsable_dates = stats.unparsable_dates,
        coerced_numbers = stats.coerced_numbers,
        "parsed requisition log"
    );

    Ok(Dataset {
        columns: layout.columns,
        records,
        stats,
    })
}
