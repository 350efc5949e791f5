//! Aggregates for the insights page: headline numbers, monthly trends and
//! which tags get skipped most.

use crate::core::{
    dashboard::{self, TagCount},
    item::Item,
    status::ItemStatus,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// How many tag skip ratios are reported.
pub const SKIP_RATIO_LIMIT: usize = 5;

/// Bought/skipped counts for one creation month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyDecisions {
    /// `YYYY-MM`
    pub month: String,
    /// Items bought
    pub bought: usize,
    /// Items skipped
    pub skipped: usize,
}

/// Money saved by skipping, for one creation month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySaved {
    /// `YYYY-MM`
    pub month: String,
    /// Sum of skipped prices
    pub amount: f64,
}

/// Share of decided items with a tag that were skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagSkipRatio {
    /// Normalised tag
    pub name: String,
    /// Skipped items carrying the tag
    pub skipped: usize,
    /// Decided (bought or skipped) items carrying the tag
    pub decided: usize,
    /// `skipped / decided`
    pub ratio: f64,
}

/// Everything the insights page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    /// Items in the profile
    pub item_count: usize,
    /// Skipped items
    pub skipped_count: usize,
    /// Money saved by skipping
    pub saved_total: f64,
    /// Most used tags
    pub top_tags: Vec<TagCount>,
    /// Decisions per month, ascending
    pub decision_trend: Vec<MonthlyDecisions>,
    /// Savings per month, ascending, months with savings only
    pub saved_trend: Vec<MonthlySaved>,
    /// Tags ranked by how often they get skipped
    pub skip_ratios: Vec<TagSkipRatio>,
}

impl Insights {
    /// Builds insights for a snapshot of the active profile.
    #[must_use]
    pub fn build(items: &[Item]) -> Self {
        Self {
            item_count: items.len(),
            skipped_count: dashboard::skipped_count(items),
            saved_total: dashboard::saved_total(items),
            top_tags: dashboard::top_tags(items, dashboard::TOP_TAG_LIMIT),
            decision_trend: monthly_decisions(items),
            saved_trend: monthly_saved(items),
            skip_ratios: tag_skip_ratios(items),
        }
    }
}

fn month_key(item: &Item) -> String {
    item.created_at.format("%Y-%m").to_string()
}

/// Bought and skipped counts grouped by creation month.
#[must_use]
pub fn monthly_decisions(items: &[Item]) -> Vec<MonthlyDecisions> {
    let mut months: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for item in items {
        let (bought, skipped) = match item.status {
            ItemStatus::Bought => (1, 0),
            ItemStatus::Skipped => (0, 1),
            ItemStatus::Waiting | ItemStatus::ReadyToBuy => continue,
        };
        let entry = months.entry(month_key(item)).or_default();
        entry.0 += bought;
        entry.1 += skipped;
    }

    months
        .into_iter()
        .map(|(month, (bought, skipped))| MonthlyDecisions {
            month,
            bought,
            skipped,
        })
        .collect()
}

/// Skipped amounts grouped by creation month.
#[must_use]
pub fn monthly_saved(items: &[Item]) -> Vec<MonthlySaved> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for item in items {
        if item.status != ItemStatus::Skipped {
            continue;
        }
        if let Some(price) = item.price_value {
            *months.entry(month_key(item)).or_default() += price;
        }
    }

    months
        .into_iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|(month, amount)| MonthlySaved { month, amount })
        .collect()
}

/// Per-tag skip ratio over decided items, highest first.
///
/// Ties are broken by decision volume, then alphabetically.
#[must_use]
pub fn tag_skip_ratios(items: &[Item]) -> Vec<TagSkipRatio> {
    let mut tags: HashMap<String, (usize, usize)> = HashMap::new();
    for item in items.iter().filter(|item| item.status.is_terminal()) {
        let skipped = usize::from(item.status == ItemStatus::Skipped);
        for tag in item.tag_list() {
            let entry = tags.entry(tag).or_default();
            entry.0 += skipped;
            entry.1 += 1;
        }
    }

    let mut ratios: Vec<TagSkipRatio> = tags
        .into_iter()
        .map(|(name, (skipped, decided))| {
            #[allow(clippy::cast_precision_loss)]
            let ratio = skipped as f64 / decided as f64;
            TagSkipRatio {
                name,
                skipped,
                decided,
                ratio,
            }
        })
        .collect();
    ratios.sort_by(|a, b| {
        b.ratio
            .total_cmp(&a.ratio)
            .then_with(|| b.decided.cmp(&a.decided))
            .then_with(|| a.name.cmp(&b.name))
    });
    ratios.truncate(SKIP_RATIO_LIMIT);
    ratios
}
