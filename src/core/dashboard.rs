//! Dashboard query engine: filtering, ordering and headline stats over an item
//! snapshot. Everything here is pure; the caller supplies the snapshot.

use crate::core::{
    item::Item,
    profile::{self, ProfileSettings},
    status::ItemStatus,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashMap};

/// How many tags the dashboard headline shows.
pub const TOP_TAG_LIMIT: usize = 3;

/// Dashboard list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ready items first, then waiting ones by eligibility, then decided ones
    #[default]
    NextReady,
    /// Most recently created first
    Newest,
    /// Oldest first
    Oldest,
    /// Cheapest first, unpriced last
    PriceAsc,
    /// Most expensive first, unpriced last
    PriceDesc,
}

impl SortOrder {
    /// Parses a query value. Unknown values fall back to [`SortOrder::NextReady`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "newest" => Self::Newest,
            "oldest" => Self::Oldest,
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            _ => Self::NextReady,
        }
    }
}

/// Filter and sort parameters for the dashboard list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    /// Case-insensitive free-text search
    pub search: String,
    /// Statuses to show; empty shows everything
    pub statuses: Vec<ItemStatus>,
    /// Exact tag to filter on
    pub tag: String,
    /// List ordering
    pub sort: SortOrder,
}

impl Default for DashboardQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            statuses: ItemStatus::OPEN.to_vec(),
            tag: String::new(),
            sort: SortOrder::NextReady,
        }
    }
}

impl DashboardQuery {
    /// Builds a query from raw query-string values.
    ///
    /// No status values selects the default open statuses. Unrecognised
    /// status labels are ignored.
    #[must_use]
    pub fn from_params(search: &str, statuses: &[String], tag: &str, sort: &str) -> Self {
        let statuses = if statuses.is_empty() {
            ItemStatus::OPEN.to_vec()
        } else {
            let mut parsed = Vec::new();
            for status in statuses.iter().filter_map(|raw| ItemStatus::from_label(raw)) {
                if !parsed.contains(&status) {
                    parsed.push(status);
                }
            }
            parsed
        };

        Self {
            search: search.trim().to_string(),
            statuses,
            tag: tag.trim().to_string(),
            sort: SortOrder::parse(sort),
        }
    }

    /// Whether anything other than the default view was requested.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        let default_statuses = self.statuses.len() == ItemStatus::OPEN.len()
            && ItemStatus::OPEN.iter().all(|s| self.statuses.contains(s));
        !self.search.is_empty() || !self.tag.is_empty() || !default_statuses
    }

    fn matches(&self, item: &Item) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&item.status) {
            return false;
        }
        if !self.tag.is_empty() && !item.has_tag(&self.tag) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        [&item.title, &item.note, &item.link, &item.tags]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Applies `query` to `items`, returning the matching items in display order.
#[must_use]
pub fn filter_and_sort(items: &[Item], query: &DashboardQuery) -> Vec<Item> {
    let mut matching: Vec<Item> = items
        .iter()
        .filter(|item| query.matches(item))
        .cloned()
        .collect();
    matching.sort_by(|a, b| compare(a, b, query.sort));
    matching
}

fn compare(a: &Item, b: &Item, sort: SortOrder) -> Ordering {
    let primary = match sort {
        SortOrder::NextReady => next_ready_rank(a.status)
            .cmp(&next_ready_rank(b.status))
            .then_with(|| {
                if a.status.is_terminal() {
                    b.created_at.cmp(&a.created_at)
                } else {
                    a.eligible_at.cmp(&b.eligible_at)
                }
            }),
        SortOrder::Newest => b.created_at.cmp(&a.created_at),
        SortOrder::Oldest => a.created_at.cmp(&b.created_at),
        SortOrder::PriceAsc => compare_prices(a.price_value, b.price_value, false),
        SortOrder::PriceDesc => compare_prices(a.price_value, b.price_value, true),
    };

    primary
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

const fn next_ready_rank(status: ItemStatus) -> u8 {
    match status {
        ItemStatus::ReadyToBuy => 0,
        ItemStatus::Waiting => 1,
        ItemStatus::Bought | ItemStatus::Skipped => 2,
    }
}

fn compare_prices(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.total_cmp(&a),
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A tag and how many items carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    /// Normalised tag
    pub name: String,
    /// Number of items
    pub count: usize,
}

/// Most frequent tags across `items`, count descending then name ascending.
#[must_use]
pub fn top_tags(items: &[Item], limit: usize) -> Vec<TagCount> {
    let mut totals: HashMap<String, usize> = HashMap::new();
    for item in items {
        for tag in item.tag_list() {
            *totals.entry(tag).or_default() += 1;
        }
    }

    let mut counts: Vec<TagCount> = totals
        .into_iter()
        .map(|(name, count)| TagCount { name, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts.truncate(limit);
    counts
}

/// Number of skipped items.
#[must_use]
pub fn skipped_count(items: &[Item]) -> usize {
    items
        .iter()
        .filter(|item| item.status == ItemStatus::Skipped)
        .count()
}

/// Sum of the parsed prices of skipped items.
#[must_use]
pub fn saved_total(items: &[Item]) -> f64 {
    items
        .iter()
        .filter(|item| item.status == ItemStatus::Skipped)
        .filter_map(|item| item.price_value)
        .sum()
}

/// One dashboard list entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    /// The item
    pub item: Item,
    /// Formatted work hours, when a price and wage are known
    pub work_hours: Option<String>,
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Filtered, ordered rows
    pub rows: Vec<DashboardRow>,
    /// The query the rows were built from
    pub query: DashboardQuery,
    /// Whether the filter panel should be shown as active
    pub is_filtered: bool,
    /// Currency symbol
    pub currency: String,
    /// Parsed hourly wage
    pub hourly_wage: Option<f64>,
    /// Skipped items across the whole profile
    pub skipped_count: usize,
    /// Money saved across the whole profile
    pub saved_total: f64,
    /// Most used tags across the whole profile
    pub top_tags: Vec<TagCount>,
}

impl Dashboard {
    /// Builds the dashboard for a snapshot of the active profile.
    #[must_use]
    pub fn build(items: &[Item], settings: &ProfileSettings, query: &DashboardQuery) -> Self {
        let hourly_wage = settings.hourly_wage_value();
        let rows = filter_and_sort(items, query)
            .into_iter()
            .map(|item| DashboardRow {
                work_hours: profile::work_hours(item.price_value, hourly_wage)
                    .map(profile::format_work_hours),
                item,
            })
            .collect();

        Self {
            rows,
            query: query.clone(),
            is_filtered: query.is_filtered(),
            currency: settings.currency.clone(),
            hourly_wage,
            skipped_count: skipped_count(items),
            saved_total: saved_total(items),
            top_tags: top_tags(items, TOP_TAG_LIMIT),
        }
    }
}
