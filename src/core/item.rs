//! Waitlist items and the add/edit form that produces them.
//!
//! `ItemForm` is the raw, untrusted input. `ItemForm::validate` turns it into an
//! `ItemDraft` (trimmed fields, parsed price, resolved buy-after instant) without
//! touching any state, so a validation failure never mutates anything.

use crate::{
    core::{
        status::{self, ItemStatus},
        wait::{self, Timestamp, WaitSpec},
    },
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A candidate purchase on the waitlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Assigned by the store on insert and never reused
    pub id: i64,
    /// What the user wants to buy
    pub title: String,
    /// Price exactly as entered
    pub price: String,
    /// Parsed price, present only for positive finite numbers
    pub price_value: Option<f64>,
    /// Optional product link
    pub link: String,
    /// Free-form note
    pub note: String,
    /// Comma-joined tags as entered
    pub tags: String,
    /// Lifecycle state
    pub status: ItemStatus,
    /// The wait selection the buy-after instant was computed from
    pub wait: WaitSpec,
    /// Buy-after instant
    pub eligible_at: Timestamp,
    /// When the item was added
    pub created_at: Timestamp,
    /// Whether a notification was already attempted for the current wait
    pub notification_attempted: bool,
}

impl Item {
    /// Builds a new, not yet stored item from a validated draft.
    #[must_use]
    pub fn from_draft(draft: ItemDraft, now: Timestamp) -> Self {
        Self {
            id: 0,
            status: status::status_for_eligibility(draft.eligible_at, now),
            title: draft.title,
            price: draft.price,
            price_value: draft.price_value,
            link: draft.link,
            note: draft.note,
            tags: draft.tags,
            wait: draft.wait,
            eligible_at: draft.eligible_at,
            created_at: now,
            notification_attempted: false,
        }
    }

    /// Replaces every editable field with the draft's, re-deriving status.
    ///
    /// Identity, creation time and (unless the status reopens) the
    /// notification flag are kept.
    #[must_use]
    pub fn edited(&self, draft: ItemDraft, now: Timestamp) -> Self {
        let wait_changed = draft
            .wait
            .differs_from(&self.wait, draft.eligible_at, self.eligible_at);
        let outcome = status::after_edit(self.status, wait_changed, draft.eligible_at, now);

        Self {
            id: self.id,
            status: outcome.status,
            title: draft.title,
            price: draft.price,
            price_value: draft.price_value,
            link: draft.link,
            note: draft.note,
            tags: draft.tags,
            wait: draft.wait,
            eligible_at: draft.eligible_at,
            created_at: self.created_at,
            notification_attempted: self.notification_attempted && !outcome.reset_notification,
        }
    }

    /// Normalised tags of this item.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        tag_list(&self.tags)
    }

    /// Whether this item carries `tag` (case-insensitive, exact).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        self.tag_list().iter().any(|t| *t == wanted)
    }
}

/// Raw add/edit form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemForm {
    /// Required title
    pub title: String,
    /// Free-text price
    pub price: String,
    /// Product link
    pub link: String,
    /// Note
    pub note: String,
    /// Comma-separated tags
    pub tags: String,
    /// Wait preset form value; blank means "use the default"
    pub wait_preset: String,
    /// Custom hours for the `custom` preset
    pub wait_custom_hours: String,
    /// Wall-clock buy-after input for the `date` preset
    pub buy_after: String,
    /// Browser `getTimezoneOffset()` in minutes, if supplied
    pub tz_offset: Option<String>,
}

/// Validated form input, ready to become or update an [`Item`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    /// Trimmed, non-empty title
    pub title: String,
    /// Trimmed price text
    pub price: String,
    /// Parsed price
    pub price_value: Option<f64>,
    /// Trimmed link
    pub link: String,
    /// Trimmed note
    pub note: String,
    /// Trimmed tags
    pub tags: String,
    /// Parsed wait selection
    pub wait: WaitSpec,
    /// Resolved buy-after instant
    pub eligible_at: Timestamp,
}

impl ItemForm {
    /// Validates the form against `now`.
    ///
    /// `default_wait` replaces a blank preset (the add flow passes the profile's
    /// default). Without it a blank preset means one day.
    pub fn validate(&self, default_wait: Option<&WaitSpec>, now: Timestamp) -> Result<ItemDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::validation("Please enter a title."));
        }

        let wait = match default_wait {
            Some(default) if self.wait_preset.trim().is_empty() => default.clone(),
            _ => WaitSpec::parse(&self.wait_preset, &self.wait_custom_hours)?,
        };
        let eligible_at =
            wait::resolve_eligibility(&wait, &self.buy_after, self.tz_offset.as_deref(), now)?;

        let price = self.price.trim().to_string();
        Ok(ItemDraft {
            title: title.to_string(),
            price_value: parse_price(&price),
            price,
            link: self.link.trim().to_string(),
            note: self.note.trim().to_string(),
            tags: self.tags.trim().to_string(),
            wait,
            eligible_at,
        })
    }
}

/// Parses a free-text price. Only positive finite numbers count.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

/// Splits comma-joined tags into trimmed, lower-case, de-duplicated names.
#[must_use]
pub fn tag_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
