// src/dashboard/render.rs

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use std::fmt::Write;

use crate::config::Config;
use crate::load::Loaded;
use crate::pipeline::{build_view, DashboardView, FilterSelection, GroupTotal};

const BAR_WIDTH: usize = 30;

/// Presentation knobs taken from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub top_n: usize,
    pub detail_expanded: bool,
    pub currency_symbol: String,
}

impl From<&Config> for DisplaySettings {
    fn from(cfg: &Config) -> Self {
        Self {
            top_n: cfg.density.top_n(),
            detail_expanded: cfg.detail_expanded,
            currency_symbol: cfg.currency_symbol.clone(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// `1234567.891` → `1,234,567.89` for `decimals = 2`.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    // `-0.00` reads as zero
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    out
}

pub fn format_currency(symbol: &str, value: f64) -> String {
    format!("{}{}", symbol, group_thousands(value, 2))
}

pub fn format_units(value: f64) -> String {
    group_thousands(value, 0)
}

/// `Overview: Feb-2026 | Jan-2026`, months in recency order.
pub fn overview_caption(view: &DashboardView<'_>) -> String {
    if view.filters.months.is_empty() {
        return "Overview: All Time".to_string();
    }
    let mut months: Vec<&str> = view
        .options
        .months
        .iter()
        .filter(|m| view.filters.months.contains(*m))
        .map(String::as_str)
        .collect();
    for m in &view.filters.months {
        if !months.contains(&m.as_str()) {
            months.push(m);
        }
    }
    format!("Overview: {}", months.join(" | "))
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "█".repeat(len.min(BAR_WIDTH))
}

fn display_key(key: &str) -> &str {
    if key.trim().is_empty() {
        "(blank)"
    } else {
        key
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn align_right(table: &mut Table, columns: &[usize]) {
    for &i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

/// Largest on top, like a horizontal bar chart read top-down.
fn spend_table(groups: &[GroupTotal], symbol: &str) -> Table {
    let max = groups.iter().map(|g| g.value).fold(0.0, f64::max);
    let mut table = new_table(vec!["Cost Center", "Spend", ""]);
    for g in groups.iter().rev() {
        table.add_row(vec![
            Cell::new(display_key(&g.key)),
            Cell::new(format_currency(symbol, g.value)),
            Cell::new(bar(g.value, max)),
        ]);
    }
    align_right(&mut table, &[1]);
    table
}

fn items_table(groups: &[GroupTotal]) -> Table {
    let total: f64 = groups.iter().map(|g| g.value).sum();
    let mut table = new_table(vec!["Item", "Qty", "Share"]);
    for g in groups {
        let share = if total > 0.0 {
            g.value / total * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(display_key(&g.key)),
            Cell::new(format_units(g.value)),
            Cell::new(format!("{:.1}%", share)),
        ]);
    }
    align_right(&mut table, &[1, 2]);
    table
}

fn details_table(view: &DashboardView<'_>, symbol: &str) -> Table {
    let mut table = new_table(vec!["Date", "Cost Center", "Item", "Qty", "Cost"]);
    for r in &view.records {
        let date = r
            .issue_date
            .map(|d| d.format("%d %b").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(date),
            Cell::new(&r.cost_center),
            Cell::new(&r.item_name),
            Cell::new(format_units(r.issue_qty)),
            Cell::new(format!("{}{:.0}", symbol, r.line_total)),
        ]);
    }
    align_right(&mut table, &[3, 4]);
    table
}

/// Text rendering of one populated view.
pub fn render_view(view: &DashboardView<'_>, settings: &DisplaySettings) -> String {
    let symbol = settings.currency_symbol.as_str();
    let m = &view.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "Supply Chain Analytics");
    let _ = writeln!(out, "{}", overview_caption(view));
    let _ = writeln!(out);
    let _ = writeln!(out, "  Total Spend   {}", format_currency(symbol, m.total_spend));
    let _ = writeln!(out, "  Units Issued  {}", format_units(m.units_issued));
    let _ = writeln!(out, "  Unique Items  {}", m.unique_items);
    let _ = writeln!(out, "  Cost Centers  {}", m.active_cost_centers);
    let _ = writeln!(out);

    let _ = writeln!(out, "Spend by Cost Center");
    if view.spend_by_cost_center.is_empty() {
        let _ = writeln!(out, "  (no rows)");
    } else {
        let _ = writeln!(out, "{}", spend_table(&view.spend_by_cost_center, symbol));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Top Items");
    if view.top_items.is_empty() {
        let _ = writeln!(out, "  (no rows)");
    } else {
        let _ = writeln!(out, "{}", items_table(&view.top_items));
    }
    let _ = writeln!(out);

    if settings.detail_expanded {
        let _ = writeln!(out, "Data Log ({} rows)", view.records.len());
        let _ = writeln!(out, "{}", details_table(view, symbol));
    } else {
        let _ = writeln!(out, "Data Log ({} rows, collapsed)", view.records.len());
    }
    out
}

/// Whole dashboard for a load result: error banner, then the view or
/// the "no data" notice.
pub fn render_dashboard(
    loaded: &Loaded,
    selection: &FilterSelection,
    settings: &DisplaySettings,
) -> String {
    let mut out = String::new();
    if let Some(err) = &loaded.error {
        let _ = writeln!(out, "{}", err);
    }
    match build_view(&loaded.dataset, selection, settings.top_n) {
        Some(view) => out.push_str(&render_view(&view, settings)),
        None => {
            let _ = writeln!(out, "No data.");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::parse_dataset;
    use anyhow::Result;

    const CSV: &str = "\
Issue date,Requesting Cost Center,Item Code,Item Name,Issue Quantity,Line Item Total
2026-01-15,A,C-01,Cups,10,1000
2026-01-20,B,C-01,Cups,5,500
2025-12-02,B,T-02,Tea,1200,250000
";

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0, 2), "0.00");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1500.0, 2), "1,500.00");
        assert_eq!(group_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(-9876543.0, 0), "-9,876,543");
        assert_eq!(group_thousands(-0.001, 2), "0.00");
        assert_eq!(format_currency("₹", 1500.0), "₹1,500.00");
        assert_eq!(format_units(15.0), "15");
    }

    #[test]
    fn renders_kpis_and_caption() -> Result<()> {
        let ds = parse_dataset(CSV.as_bytes())?;
        let view = build_view(&ds, &FilterSelection::default(), 8).expect("view");
        let text = render_view(&view, &DisplaySettings::default());
        assert!(text.contains("Overview: Jan-2026"));
        assert!(text.contains("Total Spend   ₹1,500.00"));
        assert!(text.contains("Units Issued  15"));
        assert!(text.contains("Unique Items  1"));
        assert!(text.contains("Cost Centers  2"));
        assert!(text.contains("Data Log (2 rows, collapsed)"));
        Ok(())
    }

    #[test]
    fn caption_lists_months_by_recency() -> Result<()> {
        let ds = parse_dataset(CSV.as_bytes())?;
        let sel = FilterSelection::default().with_months(["Dec-2025", "Jan-2026"]);
        let view = build_view(&ds, &sel, 8).expect("view");
        assert_eq!(overview_caption(&view), "Overview: Jan-2026 | Dec-2025");

        let all = build_view(&ds, &FilterSelection::default().all_months(), 8).expect("view");
        assert_eq!(overview_caption(&all), "Overview: All Time");
        Ok(())
    }

    #[test]
    fn expanded_details_list_rows() -> Result<()> {
        let ds = parse_dataset(CSV.as_bytes())?;
        let view = build_view(&ds, &FilterSelection::default().all_months(), 8).expect("view");
        let settings = DisplaySettings {
            detail_expanded: true,
            ..Default::default()
        };
        let text = render_view(&view, &settings);
        assert!(text.contains("Data Log (3 rows)"));
        assert!(text.contains("20 Jan"));
        assert!(text.contains("₹250000"));
        assert!(text.contains("1,200"));
        Ok(())
    }

    #[test]
    fn spend_table_puts_largest_first() -> Result<()> {
        let ds = parse_dataset(CSV.as_bytes())?;
        let view = build_view(&ds, &FilterSelection::default().all_months(), 8).expect("view");
        let text = render_view(&view, &DisplaySettings::default());
        let b = text.find("₹250,500.00").expect("B total");
        let a = text.find("₹1,000.00").expect("A total");
        assert!(b < a);
        Ok(())
    }

    #[test]
    fn long_names_keep_columns_aligned() -> Result<()> {
        let long = "Disposable Paper Cups With Lids 250ml x50";
        let csv = format!(
            "Issue date,Requesting Cost Center,Item Code,Item Name,Issue Quantity,Line Item Total\n\
2026-01-15,A,C-01,{long},10,1000\n\
2026-01-20,Central Kitchen And Banquets,T-02,Tea,5,500\n"
        );
        let ds = parse_dataset(csv.as_bytes())?;
        let view = build_view(&ds, &FilterSelection::default(), 8).expect("view");

        for mut table in [
            details_table(&view, "₹"),
            items_table(&view.top_items),
            spend_table(&view.spend_by_cost_center, "₹"),
        ] {
            // no terminal width, so nothing wraps
            table.force_no_tty();
            let text = table.to_string();
            let widths: Vec<usize> = text.lines().map(|l| l.chars().count()).collect();
            assert!(widths.len() > 3);
            assert!(widths.iter().all(|w| *w == widths[0]), "{text}");
        }
        let mut details = details_table(&view, "₹");
        details.force_no_tty();
        assert!(details.to_string().contains(long));
        Ok(())
    }

    #[test]
    fn failed_load_shows_error_and_no_data() {
        let loaded = Loaded {
            dataset: Default::default(),
            error: Some("Error loading data: boom".into()),
        };
        let text = render_dashboard(&loaded, &FilterSelection::default(), &DisplaySettings::default());
        assert_eq!(text, "Error loading data: boom\nNo data.\n");
    }
}
