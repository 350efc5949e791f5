//! Wait-time resolution - turns a wait-time selection into a buy-after instant.
//!
//! Every function here is pure: the reference instant is passed in by the caller,
//! so the same inputs always resolve to the same eligibility timestamp. Instants
//! keep the UTC offset they were resolved in, which is what lets a date picked in
//! the browser's zone round-trip through the store unchanged.

use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeDelta, TimeZone};
use sea_orm::{DeriveActiveEnum, EnumIter, sea_query::StringLen};
use serde::{Deserialize, Serialize};

/// An absolute instant that remembers the offset it was resolved in.
pub type Timestamp = DateTime<FixedOffset>;

/// Wall-clock format of the buy-after input (`<input type="datetime-local">`).
pub const BUY_AFTER_FORMAT: &str = "%Y-%m-%dT%H:%M";

const INVALID_WAIT_SELECTION: &str = "Please select a valid wait time.";
const INVALID_CUSTOM_HOURS: &str = "Please enter a valid number of custom hours (> 0).";
const MISSING_BUY_AFTER: &str = "Please enter a buy-after date and time.";
const INVALID_BUY_AFTER: &str = "Please enter a valid buy-after date and time.";
const INVALID_TIMEZONE_OFFSET: &str = "Please enter a valid timezone offset.";

/// The wait-time choices offered when adding an item.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum WaitPreset {
    /// Wait one day
    #[default]
    #[sea_orm(string_value = "24h")]
    Hours24,
    /// Wait one week
    #[sea_orm(string_value = "7d")]
    Days7,
    /// Wait thirty days
    #[sea_orm(string_value = "30d")]
    Days30,
    /// Wait a user-supplied number of hours
    #[sea_orm(string_value = "custom")]
    Custom,
    /// Wait until an explicit wall-clock date
    #[sea_orm(string_value = "date")]
    Date,
}

impl WaitPreset {
    /// Parses a form value. A blank selection means the one-day default.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "" | "24h" => Ok(Self::Hours24),
            "7d" => Ok(Self::Days7),
            "30d" => Ok(Self::Days30),
            "custom" => Ok(Self::Custom),
            "date" => Ok(Self::Date),
            _ => Err(Error::validation(INVALID_WAIT_SELECTION)),
        }
    }

    /// The form value for this preset.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hours24 => "24h",
            Self::Days7 => "7d",
            Self::Days30 => "30d",
            Self::Custom => "custom",
            Self::Date => "date",
        }
    }
}

/// A wait-time selection: preset plus the custom-hours text that goes with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSpec {
    /// Which preset was chosen
    pub preset: WaitPreset,
    /// Raw custom-hours input, only meaningful for [`WaitPreset::Custom`]
    pub custom_hours: String,
}

impl WaitSpec {
    /// Builds a spec from already-parsed parts.
    pub fn new(preset: WaitPreset, custom_hours: impl Into<String>) -> Self {
        Self {
            preset,
            custom_hours: custom_hours.into().trim().to_string(),
        }
    }

    /// Parses form values into a spec. Only the preset is validated here;
    /// custom hours are checked when the duration is resolved.
    pub fn parse(preset: &str, custom_hours: &str) -> Result<Self> {
        Ok(Self::new(WaitPreset::parse(preset)?, custom_hours))
    }

    /// The relative wait for this spec. Fails for [`WaitPreset::Date`], which
    /// has no fixed duration.
    pub fn duration(&self) -> Result<TimeDelta> {
        match self.preset {
            WaitPreset::Hours24 => Ok(TimeDelta::hours(24)),
            WaitPreset::Days7 => Ok(TimeDelta::days(7)),
            WaitPreset::Days30 => Ok(TimeDelta::days(30)),
            WaitPreset::Custom => parse_custom_hours(&self.custom_hours),
            WaitPreset::Date => Err(Error::validation(INVALID_WAIT_SELECTION)),
        }
    }

    /// Whether `self` is a different wait selection than `previous`.
    ///
    /// Custom-hours text only counts for custom presets. Two `date` selections
    /// are compared by the instants they resolved to.
    #[must_use]
    pub fn differs_from(
        &self,
        previous: &Self,
        resolved: Timestamp,
        previous_resolved: Timestamp,
    ) -> bool {
        if self.preset != previous.preset {
            return true;
        }
        match self.preset {
            WaitPreset::Custom => self.custom_hours != previous.custom_hours,
            WaitPreset::Date => resolved != previous_resolved,
            WaitPreset::Hours24 | WaitPreset::Days7 | WaitPreset::Days30 => false,
        }
    }
}

/// Parses a custom-hours value into a strictly positive duration.
///
/// Fractional hours are allowed (`0.002` is a little over seven seconds).
pub fn parse_custom_hours(raw: &str) -> Result<TimeDelta> {
    let hours: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::validation(INVALID_CUSTOM_HOURS))?;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(Error::validation(INVALID_CUSTOM_HOURS));
    }

    #[allow(clippy::cast_possible_truncation)] // float-to-int casts saturate
    let millis = (hours * 3_600_000.0).round() as i64;
    TimeDelta::try_milliseconds(millis)
        .filter(|wait| *wait > TimeDelta::zero())
        .ok_or_else(|| Error::validation(INVALID_CUSTOM_HOURS))
}

/// Parses a `YYYY-MM-DDTHH:MM` wall-clock input.
///
/// `tz_offset` is the browser's `getTimezoneOffset()` in minutes (positive west
/// of UTC), so `-120` means UTC+02:00. Without it the server's local zone is used.
pub fn parse_buy_after(raw: &str, tz_offset: Option<&str>) -> Result<Timestamp> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), BUY_AFTER_FORMAT)
        .map_err(|_| Error::validation(INVALID_BUY_AFTER))?;

    match tz_offset.map(str::trim).filter(|offset| !offset.is_empty()) {
        Some(offset) => client_zone(offset)?
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| Error::validation(INVALID_BUY_AFTER)),
        None => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.fixed_offset())
            .ok_or_else(|| Error::validation(INVALID_BUY_AFTER)),
    }
}

fn client_zone(raw: &str) -> Result<FixedOffset> {
    let minutes: i32 = raw
        .parse()
        .map_err(|_| Error::validation(INVALID_TIMEZONE_OFFSET))?;
    minutes
        .checked_mul(-60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| Error::validation(INVALID_TIMEZONE_OFFSET))
}

/// Resolves the eligibility instant for `spec`, relative to `now`.
///
/// `buy_after` and `tz_offset` are only consulted for [`WaitPreset::Date`].
pub fn resolve_eligibility(
    spec: &WaitSpec,
    buy_after: &str,
    tz_offset: Option<&str>,
    now: Timestamp,
) -> Result<Timestamp> {
    if spec.preset == WaitPreset::Date {
        if buy_after.trim().is_empty() {
            return Err(Error::validation(MISSING_BUY_AFTER));
        }
        return parse_buy_after(buy_after, tz_offset);
    }

    let wait = spec.duration()?;
    now.checked_add_signed(wait)
        .ok_or_else(|| Error::validation(INVALID_CUSTOM_HOURS))
}

/// The current instant in the server's local zone.
#[must_use]
pub fn current_time() -> Timestamp {
    Local::now().fixed_offset()
}
