//! Item lifecycle rules.
//!
//! `Waiting -> ReadyToBuy` is the only transition that happens on its own, once
//! the buy-after instant has passed. Every other edge needs an explicit action:
//! a buy/skip decision, a snooze, or an edit. `Bought` and `Skipped` are final
//! unless an edit deliberately extends the wait.

use crate::{
    core::wait::{Timestamp, WaitPreset},
    errors::{Error, Result},
};
use chrono::TimeDelta;
use sea_orm::{DeriveActiveEnum, EnumIter, sea_query::StringLen};
use serde::{Deserialize, Serialize};

/// How many hours a snooze pushes the buy-after instant.
pub const SNOOZE_HOURS: i64 = 24;

const TRANSITION_NOT_ALLOWED: &str = "status transition not allowed";
const INVALID_SNOOZE: &str = "Please select a valid snooze time.";

/// Where an item is in its lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ItemStatus {
    /// The buy-after instant is still in the future
    #[sea_orm(string_value = "Waiting")]
    Waiting,
    /// The wait is over and a decision is due
    #[sea_orm(string_value = "Ready to buy")]
    ReadyToBuy,
    /// Decided: bought
    #[sea_orm(string_value = "Bought")]
    Bought,
    /// Decided: skipped
    #[sea_orm(string_value = "Skipped")]
    Skipped,
}

impl ItemStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Waiting, Self::ReadyToBuy, Self::Bought, Self::Skipped];

    /// Statuses that still need attention.
    pub const OPEN: [Self; 2] = [Self::Waiting, Self::ReadyToBuy];

    /// Whether a decision has been made.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Bought | Self::Skipped)
    }

    /// Display label, also the stored and query-string form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::ReadyToBuy => "Ready to buy",
            Self::Bought => "Bought",
            Self::Skipped => "Skipped",
        }
    }

    /// Parses a label as produced by [`ItemStatus::label`].
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == raw.trim())
    }
}

/// A manual buy/skip decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The item was bought
    Bought,
    /// The item was skipped
    Skipped,
}

impl Decision {
    /// Parses a decision form value.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "Bought" => Ok(Self::Bought),
            "Skipped" => Ok(Self::Skipped),
            _ => Err(Error::validation("invalid status")),
        }
    }
}

impl From<Decision> for ItemStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Bought => Self::Bought,
            Decision::Skipped => Self::Skipped,
        }
    }
}

/// Status of a freshly created or re-timed item.
#[must_use]
pub fn status_for_eligibility(eligible_at: Timestamp, now: Timestamp) -> ItemStatus {
    if eligible_at > now {
        ItemStatus::Waiting
    } else {
        ItemStatus::ReadyToBuy
    }
}

/// Whether the promotion sweep moves this item to `ReadyToBuy`.
#[must_use]
pub fn should_promote(status: ItemStatus, eligible_at: Timestamp, now: Timestamp) -> bool {
    status == ItemStatus::Waiting && eligible_at <= now
}

/// Applies a buy/skip decision. Only items that are ready can be decided.
pub fn decide(current: ItemStatus, decision: Decision) -> Result<ItemStatus> {
    match current {
        ItemStatus::ReadyToBuy => Ok(decision.into()),
        ItemStatus::Waiting | ItemStatus::Bought | ItemStatus::Skipped => {
            Err(Error::conflict(TRANSITION_NOT_ALLOWED))
        }
    }
}

/// Parses the snooze selection. Only the one-day preset is offered; a blank
/// selection means the same.
pub fn parse_snooze_preset(raw: &str) -> Result<WaitPreset> {
    match WaitPreset::parse(raw) {
        Ok(WaitPreset::Hours24) => Ok(WaitPreset::Hours24),
        _ => Err(Error::validation(INVALID_SNOOZE)),
    }
}

/// New buy-after instant for a snoozed item. The item returns to `Waiting`.
pub fn snooze(current: ItemStatus, eligible_at: Timestamp, now: Timestamp) -> Result<Timestamp> {
    match current {
        ItemStatus::ReadyToBuy => Ok(eligible_at.max(now) + TimeDelta::hours(SNOOZE_HOURS)),
        ItemStatus::Waiting | ItemStatus::Bought | ItemStatus::Skipped => {
            Err(Error::conflict(TRANSITION_NOT_ALLOWED))
        }
    }
}

/// Result of re-deriving status after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    /// Status the edited item ends up in
    pub status: ItemStatus,
    /// Whether the notification-attempted flag must be cleared
    pub reset_notification: bool,
}

/// Status after a full-field edit.
///
/// A decided item keeps its decision unless the edit changed the wait selection
/// to one that ends in the future, which reopens it. Open items are re-derived
/// from the new buy-after instant exactly as on creation.
#[must_use]
pub fn after_edit(
    prior: ItemStatus,
    wait_changed: bool,
    eligible_at: Timestamp,
    now: Timestamp,
) -> EditOutcome {
    if prior.is_terminal() {
        if wait_changed && eligible_at > now {
            return EditOutcome {
                status: ItemStatus::Waiting,
                reset_notification: true,
            };
        }
        return EditOutcome {
            status: prior,
            reset_notification: false,
        };
    }

    let status = status_for_eligibility(eligible_at, now);
    EditOutcome {
        status,
        reset_notification: status == ItemStatus::Waiting,
    }
}
