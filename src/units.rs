//! Unit conversion and formatting helpers
//!
//! Internal values are always seconds and meters. These helpers exist for
//! callers that display values in other units; the analytics modules never
//! store converted values.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const METERS_PER_KILOMETER: f64 = 1000.0;
pub const METERS_PER_MILE: f64 = 1609.344;
pub const METERS_PER_YARD: f64 = 0.9144;
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Unit a pace is expressed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceUnit {
    PerKilometer,
    PerMile,
    Per100Meters,
    Per100Yards,
}

impl PaceUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            PaceUnit::PerKilometer => "/km",
            PaceUnit::PerMile => "/mi",
            PaceUnit::Per100Meters => "/100m",
            PaceUnit::Per100Yards => "/100yd",
        }
    }
}

pub fn meters_to_kilometers(meters: f64) -> f64 {
    meters / METERS_PER_KILOMETER
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

pub fn meters_to_yards(meters: f64) -> f64 {
    meters / METERS_PER_YARD
}

pub fn yards_to_meters(yards: f64) -> f64 {
    yards * METERS_PER_YARD
}

/// Meters per second to kilometers per hour
pub fn mps_to_kph(speed: f64) -> f64 {
    speed * SECONDS_PER_HOUR / METERS_PER_KILOMETER
}

/// Kilometers per hour to meters per second
pub fn kph_to_mps(speed: f64) -> f64 {
    speed * METERS_PER_KILOMETER / SECONDS_PER_HOUR
}

/// Pace in seconds per kilometer from a speed in meters per second
pub fn pace_from_speed(speed_mps: f64) -> Option<f64> {
    if speed_mps > 0.0 && speed_mps.is_finite() {
        Some(METERS_PER_KILOMETER / speed_mps)
    } else {
        None
    }
}

/// Speed in meters per second from a pace in seconds per kilometer
pub fn speed_from_pace(pace_seconds_per_km: f64) -> Option<f64> {
    if pace_seconds_per_km > 0.0 && pace_seconds_per_km.is_finite() {
        Some(METERS_PER_KILOMETER / pace_seconds_per_km)
    } else {
        None
    }
}

/// Convert a per-kilometer pace to a per-mile pace
pub fn pace_per_km_to_per_mile(pace_seconds_per_km: f64) -> f64 {
    pace_seconds_per_km * METERS_PER_MILE / METERS_PER_KILOMETER
}

/// Convert a per-100m swim pace to a per-100yd swim pace
pub fn pace_per_100m_to_per_100yd(pace_seconds: f64) -> f64 {
    pace_seconds * METERS_PER_YARD
}

/// Swim pace in seconds per 100 meters
pub fn swim_pace_per_100m(distance_meters: f64, duration_seconds: u32) -> Option<f64> {
    if distance_meters <= 0.0 || duration_seconds == 0 {
        return None;
    }
    Some(duration_seconds as f64 * 100.0 / distance_meters)
}

/// Seconds needed to cover a distance at a speed, rounded to whole seconds
pub fn seconds_for_distance(distance_meters: f64, speed_mps: f64) -> u32 {
    if speed_mps <= 0.0 || distance_meters <= 0.0 {
        return 0;
    }
    (distance_meters / speed_mps).round() as u32
}

/// Format a duration as `h:mm:ss`, or `m:ss` below one hour
pub fn format_duration(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Format a pace value (seconds per unit) with its unit suffix, e.g. `4:30/km`
pub fn format_pace(pace_seconds: u32, unit: PaceUnit) -> String {
    format!("{}:{:02}{}", pace_seconds / 60, pace_seconds % 60, unit.suffix())
}

/// Round a decimal to one decimal place (the precision used for percentages)
pub fn round_one_decimal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an f64 percentage to a one-decimal Decimal
pub fn percent_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(round_one_decimal)
}

/// Round an f64 number of seconds to whole seconds, saturating at zero
pub fn whole_seconds(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
