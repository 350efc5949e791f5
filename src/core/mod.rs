//! Framework-agnostic waitlist logic.
//!
//! Every function that depends on the current time takes it as a parameter.

/// Dashboard filtering, ordering and headline stats
pub mod dashboard;
/// Insights page aggregates
pub mod insights;
/// Items and the add/edit form
pub mod item;
/// Profile settings and the settings form
pub mod profile;
/// Item lifecycle rules
pub mod status;
/// Wait-time resolution
pub mod wait;
