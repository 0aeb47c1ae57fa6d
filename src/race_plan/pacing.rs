//! Per-leg pacing targets and the three-point finish estimate

use super::distances::{DistanceCategory, ResolvedDistance};
use super::{Classification, CourseProfile, PlanConfigError, RaceConditions, WaterType, Wind};
use crate::fitness::FitnessSnapshot;
use crate::units::{percent_from_f64, whole_seconds};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Inclusive range of a target, `low` being the easier end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Band { low, high }
    }

    pub fn mid(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Pacing model constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Bike intensity factor (fraction of FTP) per category
    pub bike_if_sprint: Band,
    pub bike_if_olympic: Band,
    pub bike_if_half: Band,
    pub bike_if_full: Band,

    /// Run pace as a multiple of threshold pace per category
    pub run_pace_sprint: Band,
    pub run_pace_olympic: Band,
    pub run_pace_half: Band,
    pub run_pace_full: Band,

    /// Swim pace as a multiple of CSS pace per category
    pub swim_pace_sprint: Band,
    pub swim_pace_olympic: Band,
    pub swim_pace_half: Band,
    pub swim_pace_full: Band,

    /// Used when the snapshot has no threshold
    pub default_ftp_watts: f64,
    pub default_ftp_watts_per_kg: f64,
    pub default_run_threshold_pace: f64,
    pub default_css_pace: f64,

    /// Flat-course speed at the reference power (km/h)
    pub reference_bike_speed_kph: f64,
    pub reference_bike_power: f64,

    /// Heat: percent slowdown per degree above the threshold temperature
    pub heat_threshold_c: f64,
    pub heat_percent_per_degree: f64,
    pub humidity_threshold_percent: f64,
    pub humidity_percent_per_point: f64,
    pub max_heat_percent: f64,

    /// Altitude: percent power loss per step above the threshold altitude
    pub altitude_threshold_meters: f64,
    pub altitude_step_meters: f64,
    pub altitude_percent_per_step: f64,
    pub max_altitude_percent: f64,

    /// Swim pace multipliers relative to CSS, which is taken as a pool swim
    /// without a wetsuit. Applied when a wetsuit is known to be worn or
    /// known to be banned, and left out when that is unknown.
    pub wetsuit_swim_factor: f64,
    pub non_wetsuit_swim_factor: f64,
    pub open_water_swim_factor: f64,
    /// Highest water temperature at which wetsuits are legal
    pub wetsuit_cutoff_age_group_c: f64,
    pub wetsuit_cutoff_professional_c: f64,

    /// Run slowdown applied to the conservative estimate
    pub conservative_run_fade: f64,
    pub optimistic_transition_factor: f64,
    pub conservative_transition_factor: f64,
    pub professional_transition_factor: f64,
    pub wetsuit_t1_extra_seconds: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        PacingConfig {
            bike_if_sprint: Band::new(0.90, 0.95),
            bike_if_olympic: Band::new(0.85, 0.90),
            bike_if_half: Band::new(0.76, 0.82),
            bike_if_full: Band::new(0.68, 0.74),
            run_pace_sprint: Band::new(1.02, 1.05),
            run_pace_olympic: Band::new(1.04, 1.07),
            run_pace_half: Band::new(1.10, 1.14),
            run_pace_full: Band::new(1.18, 1.25),
            swim_pace_sprint: Band::new(1.00, 1.03),
            swim_pace_olympic: Band::new(1.02, 1.05),
            swim_pace_half: Band::new(1.04, 1.08),
            swim_pace_full: Band::new(1.06, 1.10),
            default_ftp_watts: 180.0,
            default_ftp_watts_per_kg: 2.5,
            default_run_threshold_pace: 330.0,
            default_css_pace: 120.0,
            reference_bike_speed_kph: 32.0,
            reference_bike_power: 200.0,
            heat_threshold_c: 21.0,
            heat_percent_per_degree: 0.6,
            humidity_threshold_percent: 60.0,
            humidity_percent_per_point: 0.05,
            max_heat_percent: 10.0,
            altitude_threshold_meters: 1000.0,
            altitude_step_meters: 300.0,
            altitude_percent_per_step: 1.0,
            max_altitude_percent: 12.0,
            wetsuit_swim_factor: 0.96,
            non_wetsuit_swim_factor: 1.0,
            open_water_swim_factor: 1.03,
            wetsuit_cutoff_age_group_c: 24.5,
            wetsuit_cutoff_professional_c: 21.8,
            conservative_run_fade: 1.03,
            optimistic_transition_factor: 0.85,
            conservative_transition_factor: 1.2,
            professional_transition_factor: 0.6,
            wetsuit_t1_extra_seconds: 30,
        }
    }
}

impl PacingConfig {
    /// Reject bands and factors that would break the estimate ordering
    pub fn validate(&self) -> Result<(), PlanConfigError> {
        let bands = [
            ("bike_if_sprint", self.bike_if_sprint),
            ("bike_if_olympic", self.bike_if_olympic),
            ("bike_if_half", self.bike_if_half),
            ("bike_if_full", self.bike_if_full),
            ("run_pace_sprint", self.run_pace_sprint),
            ("run_pace_olympic", self.run_pace_olympic),
            ("run_pace_half", self.run_pace_half),
            ("run_pace_full", self.run_pace_full),
            ("swim_pace_sprint", self.swim_pace_sprint),
            ("swim_pace_olympic", self.swim_pace_olympic),
            ("swim_pace_half", self.swim_pace_half),
            ("swim_pace_full", self.swim_pace_full),
        ];
        for (name, band) in bands {
            if !(band.low > 0.0 && band.low <= band.high && band.high.is_finite()) {
                return Err(PlanConfigError::Pacing(format!(
                    "{} needs 0 < low <= high, got {} to {}",
                    name, band.low, band.high
                )));
            }
        }

        let positive = [
            ("default_ftp_watts", self.default_ftp_watts),
            ("default_ftp_watts_per_kg", self.default_ftp_watts_per_kg),
            ("default_run_threshold_pace", self.default_run_threshold_pace),
            ("default_css_pace", self.default_css_pace),
            ("reference_bike_speed_kph", self.reference_bike_speed_kph),
            ("reference_bike_power", self.reference_bike_power),
            ("altitude_step_meters", self.altitude_step_meters),
            ("wetsuit_swim_factor", self.wetsuit_swim_factor),
            ("non_wetsuit_swim_factor", self.non_wetsuit_swim_factor),
            ("open_water_swim_factor", self.open_water_swim_factor),
            ("optimistic_transition_factor", self.optimistic_transition_factor),
            ("professional_transition_factor", self.professional_transition_factor),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                let reason = format!("{} must be positive, got {}", name, value);
                return Err(PlanConfigError::Pacing(reason));
            }
        }

        let non_negative = [
            ("heat_percent_per_degree", self.heat_percent_per_degree),
            ("humidity_percent_per_point", self.humidity_percent_per_point),
            ("max_heat_percent", self.max_heat_percent),
            ("altitude_percent_per_step", self.altitude_percent_per_step),
            ("max_altitude_percent", self.max_altitude_percent),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                let reason = format!("{} cannot be negative, got {}", name, value);
                return Err(PlanConfigError::Pacing(reason));
            }
        }
        if self.max_altitude_percent >= 100.0 {
            return Err(PlanConfigError::Pacing(format!(
                "max_altitude_percent {} would leave no power",
                self.max_altitude_percent
            )));
        }

        let optimistic = self.optimistic_transition_factor;
        let conservative = self.conservative_transition_factor;
        if !(optimistic <= 1.0 && conservative >= 1.0 && conservative.is_finite()) {
            return Err(PlanConfigError::Pacing(format!(
                "transition factors need optimistic <= 1 <= conservative, got {} and {}",
                optimistic, conservative
            )));
        }
        if !(self.conservative_run_fade >= 1.0 && self.conservative_run_fade.is_finite()) {
            return Err(PlanConfigError::Pacing(format!(
                "conservative_run_fade must be at least 1, got {}",
                self.conservative_run_fade
            )));
        }
        Ok(())
    }

    fn bike_band(&self, category: DistanceCategory) -> Band {
        match category {
            DistanceCategory::Sprint => self.bike_if_sprint,
            DistanceCategory::Olympic => self.bike_if_olympic,
            DistanceCategory::Half => self.bike_if_half,
            DistanceCategory::Full => self.bike_if_full,
        }
    }

    fn run_band(&self, category: DistanceCategory) -> Band {
        match category {
            DistanceCategory::Sprint => self.run_pace_sprint,
            DistanceCategory::Olympic => self.run_pace_olympic,
            DistanceCategory::Half => self.run_pace_half,
            DistanceCategory::Full => self.run_pace_full,
        }
    }

    fn swim_band(&self, category: DistanceCategory) -> Band {
        match category {
            DistanceCategory::Sprint => self.swim_pace_sprint,
            DistanceCategory::Olympic => self.swim_pace_olympic,
            DistanceCategory::Half => self.swim_pace_half,
            DistanceCategory::Full => self.swim_pace_full,
        }
    }
}

impl CourseProfile {
    /// Bike speed relative to a flat course
    fn bike_speed_factor(&self) -> f64 {
        match self {
            CourseProfile::Flat => 1.0,
            CourseProfile::Rolling => 0.95,
            CourseProfile::Hilly => 0.88,
            CourseProfile::Mountainous => 0.78,
        }
    }

    /// Highest acceptable variability index on the bike
    fn variability_allowance(&self) -> f64 {
        match self {
            CourseProfile::Flat => 1.02,
            CourseProfile::Rolling => 1.05,
            CourseProfile::Hilly => 1.08,
            CourseProfile::Mountainous => 1.12,
        }
    }

    /// Run pace multiplier on a hilly run course
    fn run_pace_factor(&self) -> f64 {
        match self {
            CourseProfile::Flat => 1.0,
            CourseProfile::Rolling => 1.01,
            CourseProfile::Hilly => 1.03,
            CourseProfile::Mountainous => 1.05,
        }
    }
}

impl Wind {
    fn bike_speed_factor(&self) -> f64 {
        match self {
            Wind::Calm => 1.0,
            Wind::Moderate => 0.97,
            Wind::Strong => 0.93,
        }
    }
}

/// Environmental adjustments applied to the targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionAdjustments {
    /// Slowdown from heat and humidity, percent
    pub heat_percent: Decimal,
    /// Sustainable power lost to altitude, percent
    pub altitude_percent: Decimal,
    pub course_profile: CourseProfile,
    pub wind: Wind,
    /// Whether a wetsuit is expected, if known
    pub wetsuit: Option<bool>,
    pub open_water: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimPacing {
    pub distance_meters: u32,
    /// Seconds per 100 meters, fast end first
    pub target_pace_fast: u32,
    pub target_pace_slow: u32,
    pub realistic_seconds: u32,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikePacing {
    pub distance_meters: u32,
    pub ftp_watts: u32,
    pub target_power_low: u32,
    pub target_power_high: u32,
    /// Power ceiling for climbs and surges
    pub surge_ceiling_watts: u32,
    pub intensity_factor_low: Decimal,
    pub intensity_factor_high: Decimal,
    pub variability_allowance: Decimal,
    pub expected_speed_kph: Decimal,
    pub realistic_seconds: u32,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPacing {
    pub distance_meters: u32,
    /// Seconds per kilometer, fast end first
    pub target_pace_fast: u32,
    pub target_pace_slow: u32,
    pub realistic_seconds: u32,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTargets {
    pub t1_seconds: u32,
    pub t2_seconds: u32,
}

/// Leg and transition durations for one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Splits {
    pub swim_seconds: u32,
    pub t1_seconds: u32,
    pub bike_seconds: u32,
    pub t2_seconds: u32,
    pub run_seconds: u32,
}

impl Splits {
    /// Sum of all legs, saturating at `u32::MAX`
    pub fn total_seconds(&self) -> u32 {
        [self.t1_seconds, self.bike_seconds, self.t2_seconds, self.run_seconds]
            .iter()
            .fold(self.swim_seconds, |total, leg| total.saturating_add(*leg))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishEstimate {
    pub optimistic_seconds: u32,
    pub realistic_seconds: u32,
    pub conservative_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingPlan {
    pub category: DistanceCategory,
    pub swim: Option<SwimPacing>,
    pub bike: Option<BikePacing>,
    pub run: Option<RunPacing>,
    pub transitions: TransitionTargets,
    pub adjustments: ConditionAdjustments,
    pub optimistic_splits: Splits,
    pub realistic_splits: Splits,
    pub conservative_splits: Splits,
    pub finish: FinishEstimate,
}

/// Thresholds the pacing model works from, after defaults
#[derive(Debug, Clone, Copy)]
struct PacingInputs {
    ftp: f64,
    run_threshold: f64,
    css: f64,
}

/// Three scenario values for one leg
#[derive(Debug, Clone, Copy)]
struct Scenario {
    optimistic: u32,
    realistic: u32,
    conservative: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PacingPlanner {
    config: PacingConfig,
}

impl PacingPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PacingConfig) -> Self {
        PacingPlanner { config }
    }

    pub fn plan(
        &self,
        snapshot: &FitnessSnapshot,
        distance: &ResolvedDistance,
        conditions: Option<&RaceConditions>,
        classification: Classification,
    ) -> PacingPlan {
        let inputs = self.inputs(snapshot);
        let adjustments = self.adjustments(conditions, classification);
        let heat = to_f64(adjustments.heat_percent) / 100.0;
        let altitude = to_f64(adjustments.altitude_percent) / 100.0;
        let category = distance.category;
        let legs = distance.legs;

        let mut swim_times = Scenario::zero();
        let swim = (legs.swim_meters > 0).then(|| {
            let (pacing, times) = self.swim_leg(legs.swim_meters, category, &inputs, &adjustments);
            swim_times = times;
            pacing
        });

        let mut bike_times = Scenario::zero();
        let bike = (legs.bike_meters > 0).then(|| {
            let (pacing, times) =
                self.bike_leg(legs.bike_meters, category, &inputs, &adjustments, heat, altitude);
            bike_times = times;
            pacing
        });

        let mut run_times = Scenario::zero();
        let run = (legs.run_meters > 0).then(|| {
            let (pacing, times) =
                self.run_leg(legs.run_meters, category, &inputs, &adjustments, heat, altitude);
            run_times = times;
            pacing
        });

        let transitions = self.transitions(category, classification, adjustments.wetsuit);
        let t1 = if swim.is_some() && (bike.is_some() || run.is_some()) {
            transitions.t1_seconds
        } else {
            0
        };
        let t2 = if bike.is_some() && run.is_some() {
            transitions.t2_seconds
        } else {
            0
        };
        let scale = |seconds: u32, factor: f64| whole_seconds(f64::from(seconds) * factor);

        let optimistic_splits = Splits {
            swim_seconds: swim_times.optimistic,
            t1_seconds: scale(t1, self.config.optimistic_transition_factor),
            bike_seconds: bike_times.optimistic,
            t2_seconds: scale(t2, self.config.optimistic_transition_factor),
            run_seconds: run_times.optimistic,
        };
        let realistic_splits = Splits {
            swim_seconds: swim_times.realistic,
            t1_seconds: t1,
            bike_seconds: bike_times.realistic,
            t2_seconds: t2,
            run_seconds: run_times.realistic,
        };
        let conservative_splits = Splits {
            swim_seconds: swim_times.conservative,
            t1_seconds: scale(t1, self.config.conservative_transition_factor),
            bike_seconds: bike_times.conservative,
            t2_seconds: scale(t2, self.config.conservative_transition_factor),
            run_seconds: run_times.conservative,
        };

        let finish = FinishEstimate {
            optimistic_seconds: optimistic_splits.total_seconds(),
            realistic_seconds: realistic_splits.total_seconds(),
            conservative_seconds: conservative_splits.total_seconds(),
        };

        debug!(
            optimistic = finish.optimistic_seconds,
            realistic = finish.realistic_seconds,
            conservative = finish.conservative_seconds,
            "estimated finish times"
        );

        PacingPlan {
            category,
            swim,
            bike,
            run,
            transitions: TransitionTargets {
                t1_seconds: t1,
                t2_seconds: t2,
            },
            adjustments,
            optimistic_splits,
            realistic_splits,
            conservative_splits,
            finish,
        }
    }

    fn inputs(&self, snapshot: &FitnessSnapshot) -> PacingInputs {
        let ftp = match (snapshot.ftp_watts, snapshot.body_weight_kg.and_then(|w| w.to_f64())) {
            (Some(ftp), _) if ftp > 0 => f64::from(ftp),
            (_, Some(weight)) if weight > 0.0 => {
                warn!("No FTP available, estimating from body weight");
                weight * self.config.default_ftp_watts_per_kg
            }
            _ => {
                warn!("No FTP available, using default of {} W", self.config.default_ftp_watts);
                self.config.default_ftp_watts
            }
        };
        let run_threshold = snapshot
            .threshold_run_pace
            .filter(|p| *p > 0)
            .map(f64::from)
            .unwrap_or_else(|| {
                warn!("No threshold run pace available, using default");
                self.config.default_run_threshold_pace
            });
        let css = snapshot
            .css_pace
            .filter(|p| *p > 0)
            .map(f64::from)
            .unwrap_or_else(|| {
                warn!("No CSS pace available, using default");
                self.config.default_css_pace
            });

        PacingInputs {
            ftp,
            run_threshold,
            css,
        }
    }

    /// Heat, altitude, course and water adjustments from race conditions
    pub fn adjustments(
        &self,
        conditions: Option<&RaceConditions>,
        classification: Classification,
    ) -> ConditionAdjustments {
        let default_conditions = RaceConditions::default();
        let conditions = conditions.unwrap_or(&default_conditions);
        let cfg = &self.config;

        let temperature = conditions.temperature_high_c.or(conditions.temperature_low_c);
        let heat_from_temperature = temperature
            .map(|t| (t - cfg.heat_threshold_c).max(0.0) * cfg.heat_percent_per_degree)
            .unwrap_or(0.0);
        let heat_from_humidity = conditions
            .humidity_percent
            .map(|h| (h - cfg.humidity_threshold_percent).max(0.0) * cfg.humidity_percent_per_point)
            .unwrap_or(0.0);
        let heat = (heat_from_temperature + heat_from_humidity).min(cfg.max_heat_percent);

        let altitude = conditions
            .altitude_meters
            .map(|a| {
                (a - cfg.altitude_threshold_meters).max(0.0) / cfg.altitude_step_meters
                    * cfg.altitude_percent_per_step
            })
            .unwrap_or(0.0)
            .min(cfg.max_altitude_percent);

        let wetsuit = conditions.wetsuit_legal.or_else(|| {
            conditions.water_temperature_c.map(|water| {
                let cutoff = match classification {
                    Classification::AgeGroup => cfg.wetsuit_cutoff_age_group_c,
                    Classification::Professional => cfg.wetsuit_cutoff_professional_c,
                };
                water <= cutoff
            })
        });

        ConditionAdjustments {
            heat_percent: percent_from_f64(heat).unwrap_or(Decimal::ZERO),
            altitude_percent: percent_from_f64(altitude).unwrap_or(Decimal::ZERO),
            course_profile: conditions.course_profile.unwrap_or(CourseProfile::Flat),
            wind: conditions.wind.unwrap_or(Wind::Calm),
            wetsuit,
            open_water: conditions.water_type.map_or(true, |w| w != WaterType::Pool),
        }
    }

    fn swim_leg(
        &self,
        meters: u32,
        category: DistanceCategory,
        inputs: &PacingInputs,
        adjustments: &ConditionAdjustments,
    ) -> (SwimPacing, Scenario) {
        let band = self.config.swim_band(category);
        let mut factor = 1.0;
        let mut notes = Vec::new();

        if adjustments.wetsuit == Some(true) {
            factor *= self.config.wetsuit_swim_factor;
            notes.push("Wetsuit legal: expect a faster, more buoyant swim".to_string());
        } else if adjustments.wetsuit == Some(false) {
            factor *= self.config.non_wetsuit_swim_factor;
            notes.push("Non-wetsuit swim: hold form and avoid an early surge".to_string());
        }
        if adjustments.open_water {
            factor *= self.config.open_water_swim_factor;
            notes.push("Sight every 6-8 strokes and draft where possible".to_string());
        }

        let fast = inputs.css * band.low * factor;
        let slow = inputs.css * band.high * factor;
        let leg_seconds = |pace: f64| whole_seconds(pace * f64::from(meters) / 100.0);
        let times = Scenario {
            optimistic: leg_seconds(fast),
            realistic: leg_seconds((fast + slow) / 2.0),
            conservative: leg_seconds(slow),
        };

        (
            SwimPacing {
                distance_meters: meters,
                target_pace_fast: round_u32(fast),
                target_pace_slow: round_u32(slow),
                realistic_seconds: times.realistic,
                notes,
            },
            times,
        )
    }

    fn bike_leg(
        &self,
        meters: u32,
        category: DistanceCategory,
        inputs: &PacingInputs,
        adjustments: &ConditionAdjustments,
        heat: f64,
        altitude: f64,
    ) -> (BikePacing, Scenario) {
        let band = self.config.bike_band(category);
        let environment = (1.0 - heat) * (1.0 - altitude);
        let power = Band::new(
            inputs.ftp * band.low * environment,
            inputs.ftp * band.high * environment,
        );
        let allowance = adjustments.course_profile.variability_allowance();
        let course_factor =
            adjustments.course_profile.bike_speed_factor() * adjustments.wind.bike_speed_factor();

        let speed_kph = |watts: f64| {
            self.config.reference_bike_speed_kph
                * (watts.max(1.0) / self.config.reference_bike_power).cbrt()
                * course_factor
        };
        let leg_seconds =
            |watts: f64| whole_seconds(f64::from(meters) / 1000.0 / speed_kph(watts) * 3600.0);

        let times = Scenario {
            optimistic: leg_seconds(power.high),
            realistic: leg_seconds(power.mid()),
            conservative: leg_seconds(power.low),
        };

        let mut notes = Vec::new();
        if heat > 0.0 {
            notes.push(format!(
                "Power lowered {}% for heat and humidity",
                adjustments.heat_percent
            ));
        }
        if altitude > 0.0 {
            notes.push(format!("Power lowered {}% for altitude", adjustments.altitude_percent));
        }
        if allowance > 1.02 {
            notes.push(format!(
                "Keep variability index under {:.2}; cap climbs at the surge ceiling",
                allowance
            ));
        }

        (
            BikePacing {
                distance_meters: meters,
                ftp_watts: round_u32(inputs.ftp),
                target_power_low: round_u32(power.low),
                target_power_high: round_u32(power.high),
                surge_ceiling_watts: round_u32(power.high * allowance),
                intensity_factor_low: to_decimal(band.low, 2),
                intensity_factor_high: to_decimal(band.high, 2),
                variability_allowance: to_decimal(allowance, 2),
                expected_speed_kph: to_decimal(speed_kph(power.mid()), 1),
                realistic_seconds: times.realistic,
                notes,
            },
            times,
        )
    }

    fn run_leg(
        &self,
        meters: u32,
        category: DistanceCategory,
        inputs: &PacingInputs,
        adjustments: &ConditionAdjustments,
        heat: f64,
        altitude: f64,
    ) -> (RunPacing, Scenario) {
        let band = self.config.run_band(category);
        let environment =
            (1.0 + heat) * (1.0 + altitude) * adjustments.course_profile.run_pace_factor();
        let fast = inputs.run_threshold * band.low * environment;
        let slow = inputs.run_threshold * band.high * environment;
        let leg_seconds = |pace: f64| whole_seconds(pace * f64::from(meters) / 1000.0);

        let times = Scenario {
            optimistic: leg_seconds(fast),
            realistic: leg_seconds((fast + slow) / 2.0),
            conservative: leg_seconds(slow * self.config.conservative_run_fade),
        };

        let mut notes =
            vec!["Start the run at the slow end of the range for the first 2 km".to_string()];
        if heat > 0.0 {
            notes.push("Use every aid station to cool down".to_string());
        }
        if category.is_long_course() {
            notes.push("Walk aid stations if needed to hold pace between them".to_string());
        }

        (
            RunPacing {
                distance_meters: meters,
                target_pace_fast: round_u32(fast),
                target_pace_slow: round_u32(slow),
                realistic_seconds: times.realistic,
                notes,
            },
            times,
        )
    }

    /// Typical transition durations by race category
    pub fn transitions(
        &self,
        category: DistanceCategory,
        classification: Classification,
        wetsuit: Option<bool>,
    ) -> TransitionTargets {
        let (t1, t2): (u32, u32) = match category {
            DistanceCategory::Sprint => (150, 90),
            DistanceCategory::Olympic => (180, 120),
            DistanceCategory::Half => (240, 150),
            DistanceCategory::Full => (360, 240),
        };
        let t1 = if wetsuit == Some(true) {
            t1.saturating_add(self.config.wetsuit_t1_extra_seconds)
        } else {
            t1
        };

        match classification {
            Classification::AgeGroup => TransitionTargets {
                t1_seconds: t1,
                t2_seconds: t2,
            },
            Classification::Professional => {
                let factor = self.config.professional_transition_factor;
                TransitionTargets {
                    t1_seconds: whole_seconds(f64::from(t1) * factor),
                    t2_seconds: whole_seconds(f64::from(t2) * factor),
                }
            }
        }
    }
}

impl Scenario {
    fn zero() -> Self {
        Scenario {
            optimistic: 0,
            realistic: 0,
            conservative: 0,
        }
    }
}

/// Round a non-negative quantity (watts, pace seconds) to an integer
fn round_u32(value: f64) -> u32 {
    whole_seconds(value)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn to_decimal(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(dp))
        .unwrap_or(Decimal::ZERO)
}
