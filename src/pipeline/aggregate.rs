// src/pipeline/aggregate.rs

use std::collections::{BTreeMap, HashSet};

use crate::record::RequisitionRecord;

/// Headline numbers for a filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryMetrics {
    pub total_spend: f64,
    pub units_issued: f64,
    pub unique_items: usize,
    pub active_cost_centers: usize,
}

/// Blank keys are not counted as distinct values.
pub fn summarize(view: &[&RequisitionRecord]) -> SummaryMetrics {
    let distinct = |key: fn(&RequisitionRecord) -> &str| {
        view.iter()
            .map(|r| key(*r))
            .filter(|k| !k.trim().is_empty())
            .collect::<HashSet<_>>()
            .len()
    };
    SummaryMetrics {
        total_spend: view.iter().map(|r| r.line_total).sum(),
        units_issued: view.iter().map(|r| r.issue_qty).sum(),
        unique_items: distinct(|r| r.item_code.as_str()),
        active_cost_centers: distinct(|r| r.cost_center.as_str()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub value: f64,
}

/// Sum `value` per distinct `key`, in key order.
pub fn group_sum<K, V>(view: &[&RequisitionRecord], key: K, value: V) -> Vec<GroupTotal>
where
    K: Fn(&RequisitionRecord) -> &str,
    V: Fn(&RequisitionRecord) -> f64,
{
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for r in view {
        *sums.entry(key(*r)).or_insert(0.0) += value(*r);
    }
    sums.into_iter()
        .map(|(k, v)| GroupTotal {
            key: k.to_string(),
            value: v,
        })
        .collect()
}

/// Ascending by value; ties by key so the order is deterministic.
fn sort_ascending(groups: &mut [GroupTotal]) {
    groups.sort_by(|a, b| a.value.total_cmp(&b.value).then_with(|| a.key.cmp(&b.key)));
}

/// Spend per cost center: the `top_n` largest, smallest first.
pub fn spend_by_cost_center(view: &[&RequisitionRecord], top_n: usize) -> Vec<GroupTotal> {
    let mut groups = group_sum(view, |r| r.cost_center.as_str(), |r| r.line_total);
    sort_ascending(&mut groups);
    let skip = groups.len().saturating_sub(top_n);
    groups.split_off(skip)
}

/// Issued quantity per item name: the `top_n` largest, largest first.
pub fn quantity_by_item(view: &[&RequisitionRecord], top_n: usize) -> Vec<GroupTotal> {
    let mut groups = group_sum(view, |r| r.item_name.as_str(), |r| r.issue_qty);
    groups.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    groups.truncate(top_n);
    groups
}
