// src/pipeline/mod.rs

pub mod aggregate;
pub mod filter;

use std::cmp::Ordering;

use crate::record::{Dataset, RequisitionRecord};
pub use aggregate::{
    group_sum, quantity_by_item, spend_by_cost_center, summarize, GroupTotal, SummaryMetrics,
};
pub use filter::{apply, Filter, FilterOptions, FilterSelection, ResolvedFilters};

/// Stable sort, newest first, undated rows last.
pub fn most_recent_first(records: &[RequisitionRecord]) -> Vec<&RequisitionRecord> {
    let mut ordered: Vec<&RequisitionRecord> = records.iter().collect();
    ordered.sort_by(|a, b| match (a.issue_date, b.issue_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ordered
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub options: FilterOptions,
    pub filters: ResolvedFilters,
    /// Filtered rows, most recent first.
    pub records: Vec<&'a RequisitionRecord>,
    pub metrics: SummaryMetrics,
    /// Ascending, largest `top_n` only.
    pub spend_by_cost_center: Vec<GroupTotal>,
    /// Descending, largest `top_n` only.
    pub top_items: Vec<GroupTotal>,
}

/// Run the whole pipeline. `None` when the dataset has no rows at all.
pub fn build_view<'a>(
    dataset: &'a Dataset,
    selection: &FilterSelection,
    top_n: usize,
) -> Option<DashboardView<'a>> {
    if dataset.is_empty() {
        return None;
    }

    let ordered = most_recent_first(&dataset.records);
    let options = FilterOptions::from_records(&ordered);
    let filters = selection.resolve(&options);
    let records = apply(&ordered, &filters.filters());

    Some(DashboardView {
        metrics: summarize(&records),
        spend_by_cost_center: spend_by_cost_center(&records, top_n),
        top_items: quantity_by_item(&records, top_n),
        options,
        filters,
        records,
    })
}
