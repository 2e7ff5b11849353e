// src/pipeline/filter.rs

use std::collections::{BTreeSet, HashSet};

use crate::record::RequisitionRecord;

/// What the caller picked. An empty set means "no restriction".
///
/// `months: None` means nothing was picked yet, in which case the most
/// recent month in the data is used; `Some(empty)` means all months.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub months: Option<BTreeSet<String>>,
    pub cost_centers: BTreeSet<String>,
    pub items: BTreeSet<String>,
}

impl FilterSelection {
    pub fn all_months(mut self) -> Self {
        self.months = Some(BTreeSet::new());
        self
    }

    pub fn with_months<I, T>(mut self, months: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.months = Some(months.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cost_centers<I, T>(mut self, ccs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.cost_centers = ccs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_items<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Fill in the default month from `options`.
    pub fn resolve(&self, options: &FilterOptions) -> ResolvedFilters {
        let months = match &self.months {
            Some(m) => m.clone(),
            None => options.default_month().map(str::to_string).into_iter().collect(),
        };
        ResolvedFilters {
            months,
            cost_centers: self.cost_centers.clone(),
            items: self.items.clone(),
        }
    }
}

/// Values a caller may choose from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Most recent first.
    pub months: Vec<String>,
    /// Sorted ascending.
    pub cost_centers: Vec<String>,
    /// Sorted ascending.
    pub items: Vec<String>,
}

impl FilterOptions {
    /// `ordered` must already be most-recent-first.
    pub fn from_records(ordered: &[&RequisitionRecord]) -> Self {
        let mut seen = HashSet::new();
        let months = ordered
            .iter()
            .filter_map(|r| r.month_year.as_deref())
            .filter(|m| seen.insert(*m))
            .map(str::to_string)
            .collect();
        let cost_centers: BTreeSet<&str> =
            ordered.iter().map(|r| r.cost_center.as_str()).collect();
        let items: BTreeSet<&str> = ordered.iter().map(|r| r.item_name.as_str()).collect();
        Self {
            months,
            cost_centers: cost_centers.into_iter().map(str::to_string).collect(),
            items: items.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn default_month(&self) -> Option<&str> {
        self.months.first().map(String::as_str)
    }
}

/// Selection after defaults are applied; what the view was computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFilters {
    pub months: BTreeSet<String>,
    pub cost_centers: BTreeSet<String>,
    pub items: BTreeSet<String>,
}

impl ResolvedFilters {
    pub fn filters(&self) -> [Filter<'_>; 3] {
        [
            Filter::Months(&self.months),
            Filter::CostCenters(&self.cost_centers),
            Filter::Items(&self.items),
        ]
    }
}

/// One membership test against a record field.
#[derive(Debug, Clone, Copy)]
pub enum Filter<'a> {
    Months(&'a BTreeSet<String>),
    CostCenters(&'a BTreeSet<String>),
    Items(&'a BTreeSet<String>),
}

impl Filter<'_> {
    pub fn matches(&self, record: &RequisitionRecord) -> bool {
        match self {
            Filter::Months(set) => {
                set.is_empty()
                    || record
                        .month_year
                        .as_ref()
                        .is_some_and(|m| set.contains(m))
            }
            Filter::CostCenters(set) => set.is_empty() || set.contains(&record.cost_center),
            Filter::Items(set) => set.is_empty() || set.contains(&record.item_name),
        }
    }
}

/// Keep records that pass every filter, preserving order.
pub fn apply<'a>(records: &[&'a RequisitionRecord], filters: &[Filter<'_>]) -> Vec<&'a RequisitionRecord> {
    records
        .iter()
        .copied()
        .filter(|r| filters.iter().all(|f| f.matches(r)))
        .collect()
}
