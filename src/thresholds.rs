//! Lactate threshold estimation and heart-rate training zones
//!
//! LT1 and LT2 are placed at fixed fractions of heart-rate reserve
//! (Karvonen). The anchors are modelling assumptions and live in
//! [`LactateThresholdConfig`].

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Zone boundaries as fractions of heart-rate reserve
const RECOVERY_TOP: Decimal = dec!(0.55);
const TEMPO_TOP: Decimal = dec!(0.78);
const VO2_TOP: Decimal = dec!(0.92);

/// Heart-rate input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdError {
    #[error("{field} heart rate must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("Max heart rate ({max} bpm) must be above resting heart rate ({resting} bpm)")]
    MaxNotAboveResting { max: u16, resting: u16 },

    #[error("{field} heart rate of {value} bpm is outside the plausible range {min}-{max} bpm")]
    Implausible {
        field: &'static str,
        value: u16,
        min: u16,
        max: u16,
    },

    #[error("Heart rate reserve of {reserve} bpm is too small (minimum {minimum} bpm)")]
    ReserveTooSmall { reserve: u16, minimum: u16 },

    #[error("Invalid threshold anchors: {0}")]
    InvalidAnchors(String),
}

/// Threshold anchors and plausibility bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LactateThresholdConfig {
    /// LT1 as a fraction of heart-rate reserve
    pub lt1_fraction: Decimal,
    /// LT2 as a fraction of heart-rate reserve
    pub lt2_fraction: Decimal,
    pub min_resting_hr: u16,
    pub max_resting_hr: u16,
    pub min_max_hr: u16,
    pub max_max_hr: u16,
    /// Smallest heart-rate reserve that still yields six distinct zones
    pub min_heart_rate_reserve: u16,
}

impl Default for LactateThresholdConfig {
    fn default() -> Self {
        LactateThresholdConfig {
            lt1_fraction: dec!(0.70),
            lt2_fraction: dec!(0.85),
            min_resting_hr: 20,
            max_resting_hr: 120,
            min_max_hr: 100,
            max_max_hr: 230,
            min_heart_rate_reserve: 20,
        }
    }
}

impl LactateThresholdConfig {
    /// LT1 must sit inside the endurance band and LT2 inside the threshold band
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.lt1_fraction <= RECOVERY_TOP || self.lt1_fraction >= TEMPO_TOP {
            return Err(ThresholdError::InvalidAnchors(format!(
                "LT1 fraction {} must lie between {} and {}",
                self.lt1_fraction, RECOVERY_TOP, TEMPO_TOP
            )));
        }
        if self.lt2_fraction <= TEMPO_TOP || self.lt2_fraction >= VO2_TOP {
            return Err(ThresholdError::InvalidAnchors(format!(
                "LT2 fraction {} must lie between {} and {}",
                self.lt2_fraction, TEMPO_TOP, VO2_TOP
            )));
        }
        Ok(())
    }
}

/// One heart-rate training zone with inclusive bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZone {
    pub number: u8,
    pub name: String,
    pub min_bpm: u16,
    pub max_bpm: u16,
    pub color: String,
    pub description: String,
}

impl HeartRateZone {
    pub fn contains(&self, heart_rate: u16) -> bool {
        heart_rate >= self.min_bpm && heart_rate <= self.max_bpm
    }
}

/// Estimated thresholds and the zones built from them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LactateThresholds {
    pub max_hr: u16,
    pub resting_hr: u16,
    pub heart_rate_reserve: u16,
    pub lt1: u16,
    pub lt2: u16,
    pub zones: Vec<HeartRateZone>,
}

impl LactateThresholds {
    /// Zone containing the heart rate, if it lies within resting..=max
    pub fn zone_for(&self, heart_rate: u16) -> Option<&HeartRateZone> {
        self.zones.iter().find(|zone| zone.contains(heart_rate))
    }

    /// Share of samples spent in each zone, in percent
    ///
    /// Samples outside resting..=max are counted in the total but not in any
    /// zone.
    pub fn zone_distribution(&self, heart_rates: &[u16]) -> Vec<ZoneShare> {
        let total = heart_rates.len();
        self.zones
            .iter()
            .map(|zone| {
                let count = heart_rates.iter().filter(|hr| zone.contains(**hr)).count();
                ZoneShare {
                    zone: zone.number,
                    samples: count,
                    percent: calculate_percentage(count, total),
                }
            })
            .collect()
    }
}

/// Time-in-zone share for one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneShare {
    pub zone: u8,
    pub samples: usize,
    pub percent: Decimal,
}

/// Estimates LT1/LT2 and six zones from max and resting heart rate
#[derive(Debug, Clone, Default)]
pub struct LactateThresholdEstimator {
    config: LactateThresholdConfig,
}

impl LactateThresholdEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LactateThresholdConfig) -> Self {
        LactateThresholdEstimator { config }
    }

    /// Validate inputs, then place LT1/LT2 and build contiguous zones
    pub fn estimate(
        &self,
        max_hr: u16,
        resting_hr: u16,
    ) -> Result<LactateThresholds, ThresholdError> {
        self.config.validate()?;
        self.validate_inputs(max_hr, resting_hr)?;

        let reserve = max_hr - resting_hr;
        let at = |fraction: Decimal| Self::reserve_point(resting_hr, reserve, fraction);

        let lt1 = at(self.config.lt1_fraction)?;
        let lt2 = at(self.config.lt2_fraction)?;
        let recovery_top = at(RECOVERY_TOP)?;
        let tempo_top = at(TEMPO_TOP)?;
        let vo2_top = at(VO2_TOP)?;

        let bounds = [
            (resting_hr, recovery_top.saturating_sub(1)),
            (recovery_top, lt1),
            (lt1 + 1, tempo_top),
            (tempo_top + 1, lt2),
            (lt2 + 1, vo2_top),
            (vo2_top + 1, max_hr),
        ];

        if let Some((min, max)) = bounds.iter().find(|(min, max)| min > max) {
            return Err(ThresholdError::InvalidAnchors(format!(
                "zone {}-{} bpm is empty for max {} and resting {}",
                min, max, max_hr, resting_hr
            )));
        }

        let zones = bounds
            .iter()
            .zip(ZONE_TEMPLATES.iter())
            .enumerate()
            .map(|(i, ((min, max), template))| HeartRateZone {
                number: (i + 1) as u8,
                name: template.name.to_string(),
                min_bpm: *min,
                max_bpm: *max,
                color: template.color.to_string(),
                description: template.description.to_string(),
            })
            .collect();

        debug!(max_hr, resting_hr, lt1, lt2, "estimated lactate thresholds");

        Ok(LactateThresholds {
            max_hr,
            resting_hr,
            heart_rate_reserve: reserve,
            lt1,
            lt2,
            zones,
        })
    }

    fn validate_inputs(&self, max_hr: u16, resting_hr: u16) -> Result<(), ThresholdError> {
        if max_hr == 0 {
            return Err(ThresholdError::ZeroValue { field: "Max" });
        }
        if resting_hr == 0 {
            return Err(ThresholdError::ZeroValue { field: "Resting" });
        }
        if max_hr <= resting_hr {
            return Err(ThresholdError::MaxNotAboveResting {
                max: max_hr,
                resting: resting_hr,
            });
        }
        if resting_hr < self.config.min_resting_hr || resting_hr > self.config.max_resting_hr {
            return Err(ThresholdError::Implausible {
                field: "Resting",
                value: resting_hr,
                min: self.config.min_resting_hr,
                max: self.config.max_resting_hr,
            });
        }
        if max_hr < self.config.min_max_hr || max_hr > self.config.max_max_hr {
            return Err(ThresholdError::Implausible {
                field: "Max",
                value: max_hr,
                min: self.config.min_max_hr,
                max: self.config.max_max_hr,
            });
        }
        let reserve = max_hr - resting_hr;
        if reserve < self.config.min_heart_rate_reserve {
            return Err(ThresholdError::ReserveTooSmall {
                reserve,
                minimum: self.config.min_heart_rate_reserve,
            });
        }
        Ok(())
    }

    /// resting + fraction × reserve, rounded half away from zero
    fn reserve_point(
        resting_hr: u16,
        reserve: u16,
        fraction: Decimal,
    ) -> Result<u16, ThresholdError> {
        let value = Decimal::from(resting_hr) + fraction * Decimal::from(reserve);
        value
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u16()
            .ok_or_else(|| ThresholdError::InvalidAnchors(format!("{} is not a heart rate", value)))
    }

    /// Estimate max heart rate from age (220 - age formula)
    pub fn estimate_max_hr_from_age(age: u8) -> Option<u16> {
        if !(10..=100).contains(&age) {
            return None;
        }
        Some(220u16.saturating_sub(u16::from(age)))
    }
}

struct ZoneTemplate {
    name: &'static str,
    color: &'static str,
    description: &'static str,
}

const ZONE_TEMPLATES: [ZoneTemplate; 6] = [
    ZoneTemplate {
        name: "Recovery",
        color: "#9E9E9E",
        description: "Very easy effort for active recovery and warm-ups",
    },
    ZoneTemplate {
        name: "Aerobic Endurance",
        color: "#2196F3",
        description: "Conversational pace that builds the aerobic base, up to LT1",
    },
    ZoneTemplate {
        name: "Tempo",
        color: "#4CAF50",
        description: "Comfortably hard steady effort between the two thresholds",
    },
    ZoneTemplate {
        name: "Threshold",
        color: "#FFC107",
        description: "Sustained hard effort up to LT2",
    },
    ZoneTemplate {
        name: "VO2 Max",
        color: "#FF5722",
        description: "Hard intervals of three to eight minutes",
    },
    ZoneTemplate {
        name: "Anaerobic",
        color: "#F44336",
        description: "Short maximal efforts above VO2 max",
    },
];

fn calculate_percentage(count: usize, total: usize) -> Decimal {
    if total == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(count) / Decimal::from(total) * dec!(100)).round_dp(1)
    }
}
