//! Profile settings: hourly wage, currency, default wait and ntfy target.

use crate::{
    core::wait::{self, WaitPreset, WaitSpec},
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};

/// Currency symbol used when none is configured.
pub const DEFAULT_CURRENCY: &str = "€";

const INVALID_WAGE: &str = "Please enter a valid hourly wage (> 0).";
const PARTIAL_NOTIFY_TARGET: &str =
    "Please provide both ntfy endpoint and topic, or leave both empty.";
const INVALID_DEFAULT_WAIT: &str = "Please select a valid wait time.";

/// Settings stored per profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Hourly wage as entered; parsed on demand
    pub hourly_wage: String,
    /// Currency symbol shown next to prices
    pub currency: String,
    /// Wait applied when the add form leaves the preset blank
    pub default_wait: WaitSpec,
    /// ntfy server base URL, without trailing slash
    pub notify_endpoint: String,
    /// ntfy topic
    pub notify_topic: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            hourly_wage: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            default_wait: WaitSpec::default(),
            notify_endpoint: String::new(),
            notify_topic: String::new(),
        }
    }
}

impl ProfileSettings {
    /// Parsed hourly wage. Blank, zero or unparseable wages yield `None`.
    #[must_use]
    pub fn hourly_wage_value(&self) -> Option<f64> {
        self.hourly_wage
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|wage| wage.is_finite() && *wage > 0.0)
    }

    /// Endpoint and topic, when both are configured.
    #[must_use]
    pub fn notification_target(&self) -> Option<(&str, &str)> {
        let endpoint = self.notify_endpoint.trim();
        let topic = self.notify_topic.trim();
        if endpoint.is_empty() || topic.is_empty() {
            None
        } else {
            Some((endpoint, topic))
        }
    }
}

/// Read view of the active profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSnapshot {
    /// Profile name
    pub name: String,
    /// Current settings
    pub settings: ProfileSettings,
    /// Whether an hourly wage has been saved
    pub is_configured: bool,
}

/// Raw settings form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileForm {
    /// New profile name; blank keeps the current one
    pub name: String,
    /// Hourly wage
    pub hourly_wage: String,
    /// Currency symbol
    pub currency: String,
    /// Default wait preset
    pub default_wait_preset: String,
    /// Default custom hours
    pub default_wait_custom_hours: String,
    /// ntfy endpoint
    pub notify_endpoint: String,
    /// ntfy topic
    pub notify_topic: String,
}

/// A validated settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Requested name, `None` when the form left it blank
    pub name: Option<String>,
    /// Settings to store
    pub settings: ProfileSettings,
}

impl ProfileForm {
    /// Validates the form into settings ready to be stored.
    pub fn validate(&self) -> Result<ProfileUpdate> {
        let hourly_wage = self.hourly_wage.trim().to_string();
        if !hourly_wage.is_empty() {
            let valid = hourly_wage
                .parse::<f64>()
                .is_ok_and(|wage| wage.is_finite() && wage >= 0.0);
            if !valid {
                return Err(Error::validation(INVALID_WAGE));
            }
        }

        let default_wait = validate_default_wait(
            &self.default_wait_preset,
            &self.default_wait_custom_hours,
        )?;

        let notify_endpoint = self.notify_endpoint.trim().trim_end_matches('/').to_string();
        let notify_topic = self.notify_topic.trim().to_string();
        if notify_endpoint.is_empty() != notify_topic.is_empty() {
            return Err(Error::validation(PARTIAL_NOTIFY_TARGET));
        }

        let name = Some(self.name.trim().to_string()).filter(|name| !name.is_empty());

        Ok(ProfileUpdate {
            name,
            settings: ProfileSettings {
                hourly_wage,
                currency: normalize_currency(&self.currency),
                default_wait,
                notify_endpoint,
                notify_topic,
            },
        })
    }
}

fn validate_default_wait(preset: &str, custom_hours: &str) -> Result<WaitSpec> {
    match WaitPreset::parse(preset)? {
        WaitPreset::Date => Err(Error::validation(INVALID_DEFAULT_WAIT)),
        WaitPreset::Custom => {
            wait::parse_custom_hours(custom_hours)?;
            Ok(WaitSpec::new(WaitPreset::Custom, custom_hours))
        }
        preset => Ok(WaitSpec::new(preset, "")),
    }
}

/// Trims a currency symbol, falling back to [`DEFAULT_CURRENCY`].
#[must_use]
pub fn normalize_currency(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_CURRENCY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Hours of work a price represents, rounded to one decimal.
#[must_use]
pub fn work_hours(price: Option<f64>, hourly_wage: Option<f64>) -> Option<f64> {
    let (price, wage) = (price?, hourly_wage?);
    if wage <= 0.0 {
        return None;
    }
    Some((price / wage * 10.0).round() / 10.0)
}

/// Display form of [`work_hours`].
#[must_use]
pub fn format_work_hours(hours: f64) -> String {
    format!("{hours:.1}")
}
