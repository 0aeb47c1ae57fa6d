use crate::models::{Sport, Workout};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// TSS calculation errors
#[derive(Error, Debug)]
pub enum TssError {
    #[error("Invalid TSS configuration: {0}")]
    InvalidConfig(String),
}

/// TSS calculation result with method used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TssResult {
    pub tss: Decimal,
    pub method: TssMethod,
    pub intensity_factor: Option<Decimal>,
}

/// Methods used for TSS calculation, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TssMethod {
    Recorded,          // TSS stored on the workout
    PowerBased,        // Bike power against FTP or the variability proxy
    PaceBased,         // rTSS for running, sTSS for swimming
    HeartRateBased,    // hrTSS from average heart rate against LTHR
    PerceivedExertion, // RPE mapped to an intensity factor
    DurationOnly,      // Sport-specific TSS per hour
}

/// Athlete thresholds the estimator scales against
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TssThresholds {
    /// Functional threshold power in watts
    pub ftp: Option<u16>,
    /// Lactate threshold heart rate in bpm
    pub lthr: Option<u16>,
    /// Threshold running pace in seconds per kilometer
    pub threshold_run_pace: Option<u32>,
    /// Critical swim speed pace in seconds per 100 meters
    pub css_pace: Option<u32>,
}

/// Fallback constants used when a workout or athlete lacks data
///
/// All values are assumptions in line with common coaching practice and are
/// configurable rather than fixed invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TssConfig {
    /// Intensity factor assumed for a steady ride when FTP is unknown.
    /// Multiplied by the variability index (NP / average power).
    pub reference_bike_if: Decimal,

    /// Threshold run pace (s/km) assumed when the athlete has none
    pub reference_run_pace: Decimal,

    /// CSS pace (s/100m) assumed when the athlete has none
    pub reference_swim_pace: Decimal,

    /// RPE intensity mapping: IF = base + step * RPE (RPE 10 -> 1.05)
    pub rpe_base_if: Decimal,
    pub rpe_step_if: Decimal,

    /// TSS per hour when only the duration is known
    pub swim_tss_per_hour: Decimal,
    pub bike_tss_per_hour: Decimal,
    pub run_tss_per_hour: Decimal,
    pub brick_tss_per_hour: Decimal,

    /// Bounds applied to every estimated intensity factor
    pub min_intensity_factor: Decimal,
    pub max_intensity_factor: Decimal,
}

impl Default for TssConfig {
    fn default() -> Self {
        TssConfig {
            reference_bike_if: dec!(0.70),
            reference_run_pace: dec!(330),
            reference_swim_pace: dec!(120),
            rpe_base_if: dec!(0.45),
            rpe_step_if: dec!(0.06),
            swim_tss_per_hour: dec!(60),
            bike_tss_per_hour: dec!(55),
            run_tss_per_hour: dec!(65),
            brick_tss_per_hour: dec!(60),
            min_intensity_factor: dec!(0.30),
            max_intensity_factor: dec!(1.50),
        }
    }
}

impl TssConfig {
    pub fn validate(&self) -> Result<(), TssError> {
        if self.min_intensity_factor <= Decimal::ZERO
            || self.min_intensity_factor >= self.max_intensity_factor
        {
            return Err(TssError::InvalidConfig(format!(
                "intensity factor bounds must satisfy 0 < min < max, got {}..{}",
                self.min_intensity_factor, self.max_intensity_factor
            )));
        }
        if self.reference_run_pace <= Decimal::ZERO || self.reference_swim_pace <= Decimal::ZERO {
            return Err(TssError::InvalidConfig(
                "reference paces must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn tss_per_hour(&self, sport: Sport) -> Decimal {
        match sport {
            Sport::Swim => self.swim_tss_per_hour,
            Sport::Bike => self.bike_tss_per_hour,
            Sport::Run => self.run_tss_per_hour,
            Sport::Brick => self.brick_tss_per_hour,
        }
    }
}

/// Core TSS estimation engine
#[derive(Debug, Clone, Default)]
pub struct TssCalculator {
    config: TssConfig,
}

impl TssCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TssConfig) -> Self {
        TssCalculator { config }
    }

    pub fn config(&self) -> &TssConfig {
        &self.config
    }

    /// Estimate TSS for a workout using the best available method
    ///
    /// A recorded TSS always wins. Every workout gets a value: the last
    /// fallback only needs the duration.
    pub fn calculate_tss(&self, workout: &Workout, thresholds: &TssThresholds) -> TssResult {
        if let Some(recorded) = workout.summary.tss {
            return TssResult {
                tss: recorded.max(Decimal::ZERO),
                method: TssMethod::Recorded,
                intensity_factor: None,
            };
        }

        let result = match workout.sport {
            Sport::Bike => self.power_tss(workout, thresholds),
            Sport::Run => self.run_pace_tss(workout, thresholds),
            Sport::Swim => self.swim_pace_tss(workout, thresholds),
            Sport::Brick => None,
        }
        .or_else(|| self.heart_rate_tss(workout, thresholds))
        .or_else(|| self.perceived_exertion_tss(workout))
        .unwrap_or_else(|| self.duration_tss(workout));

        debug!(
            workout = %workout.id,
            method = ?result.method,
            tss = %result.tss,
            "estimated training stress"
        );
        result
    }

    /// Bike power TSS: TSS = hours × IF² × 100
    pub fn power_tss(&self, workout: &Workout, thresholds: &TssThresholds) -> Option<TssResult> {
        let power = workout.effective_power()?;

        let intensity_factor = match thresholds.ftp.filter(|ftp| *ftp > 0) {
            Some(ftp) => Decimal::from(power) / Decimal::from(ftp),
            None => self.config.reference_bike_if * Self::variability_index(workout),
        };

        Some(self.squared_result(workout, intensity_factor, TssMethod::PowerBased))
    }

    /// Running TSS from pace: IF = threshold pace / workout pace
    pub fn run_pace_tss(&self, workout: &Workout, thresholds: &TssThresholds) -> Option<TssResult> {
        let pace = workout.pace_per_km()?;
        let threshold = thresholds
            .threshold_run_pace
            .filter(|p| *p > 0)
            .map(Decimal::from)
            .unwrap_or(self.config.reference_run_pace);

        Some(self.squared_result(workout, threshold / pace, TssMethod::PaceBased))
    }

    /// Swimming TSS from pace against CSS: sTSS = hours × IF³ × 100
    pub fn swim_pace_tss(
        &self,
        workout: &Workout,
        thresholds: &TssThresholds,
    ) -> Option<TssResult> {
        let pace = workout.pace_per_100m()?;
        let css = thresholds
            .css_pace
            .filter(|p| *p > 0)
            .map(Decimal::from)
            .unwrap_or(self.config.reference_swim_pace);

        let intensity_factor = self.clamp_if(css / pace);
        let tss = Self::hours(workout)
            * intensity_factor
            * intensity_factor
            * intensity_factor
            * Decimal::from(100);

        Some(TssResult {
            tss,
            method: TssMethod::PaceBased,
            intensity_factor: Some(intensity_factor),
        })
    }

    /// Heart rate TSS: IF = average HR / LTHR
    pub fn heart_rate_tss(
        &self,
        workout: &Workout,
        thresholds: &TssThresholds,
    ) -> Option<TssResult> {
        let avg_hr = workout.heart_rate()?;
        let lthr = thresholds.lthr.filter(|lthr| *lthr > 0)?;

        let intensity_factor = Decimal::from(avg_hr) / Decimal::from(lthr);
        Some(self.squared_result(workout, intensity_factor, TssMethod::HeartRateBased))
    }

    /// TSS from perceived exertion on a 1-10 scale
    pub fn perceived_exertion_tss(&self, workout: &Workout) -> Option<TssResult> {
        let rpe = workout.perceived_exertion.filter(|rpe| (1..=10).contains(rpe))?;
        let intensity_factor =
            self.config.rpe_base_if + self.config.rpe_step_if * Decimal::from(rpe);
        Some(self.squared_result(workout, intensity_factor, TssMethod::PerceivedExertion))
    }

    /// Sport TSS-per-hour estimate when nothing but the duration is known
    pub fn duration_tss(&self, workout: &Workout) -> TssResult {
        TssResult {
            tss: Self::hours(workout) * self.config.tss_per_hour(workout.sport),
            method: TssMethod::DurationOnly,
            intensity_factor: None,
        }
    }

    fn squared_result(
        &self,
        workout: &Workout,
        intensity_factor: Decimal,
        method: TssMethod,
    ) -> TssResult {
        let intensity_factor = self.clamp_if(intensity_factor);
        TssResult {
            tss: Self::hours(workout) * intensity_factor * intensity_factor * Decimal::from(100),
            method,
            intensity_factor: Some(intensity_factor),
        }
    }

    fn clamp_if(&self, intensity_factor: Decimal) -> Decimal {
        intensity_factor
            .max(self.config.min_intensity_factor)
            .min(self.config.max_intensity_factor)
    }

    fn hours(workout: &Workout) -> Decimal {
        Decimal::from(workout.duration_seconds) / Decimal::from(3600)
    }

    /// NP / average power, 1.0 when only one of them is recorded
    fn variability_index(workout: &Workout) -> Decimal {
        match (workout.summary.normalized_power, workout.summary.avg_power) {
            (Some(np), Some(avg)) if avg > 0 && np > 0 => Decimal::from(np) / Decimal::from(avg),
            _ => Decimal::ONE,
        }
    }
}
