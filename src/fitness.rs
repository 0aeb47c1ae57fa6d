//! Fitness snapshot: an athlete's current capabilities as of one date
//!
//! A snapshot is derived once from workouts and manual logs and never
//! mutated. Rebuilding with new data produces a new snapshot.

use crate::models::{logs_of_type, LogType, ManualLog, Sport, Workout};
use crate::pmc::{PmcCalculator, PmcMetrics};
use crate::thresholds::{LactateThresholdEstimator, LactateThresholds};
use crate::tss::TssThresholds;
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How much recent data backs the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSupport {
    Low,
    Medium,
    High,
}

impl DataSupport {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSupport::Low => "low",
            DataSupport::Medium => "medium",
            DataSupport::High => "high",
        }
    }
}

/// Lactate threshold heart rate per discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SportLthr {
    pub swim: Option<u16>,
    pub bike: Option<u16>,
    pub run: Option<u16>,
}

impl SportLthr {
    pub fn for_sport(&self, sport: Sport) -> Option<u16> {
        match sport {
            Sport::Swim => self.swim,
            Sport::Bike => self.bike,
            Sport::Run | Sport::Brick => self.run,
        }
    }
}

/// Average weekly training volume per discipline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklyVolume {
    pub swim_meters: Decimal,
    pub bike_meters: Decimal,
    pub run_meters: Decimal,
    pub swim_seconds: u32,
    pub bike_seconds: u32,
    pub run_seconds: u32,
}

/// Average training paces over the volume window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentPaces {
    /// Seconds per 100 meters
    pub swim_pace_per_100m: Option<Decimal>,
    pub bike_speed_kph: Option<Decimal>,
    /// Seconds per kilometer
    pub run_pace_per_km: Option<Decimal>,
}

/// Derived athlete capabilities at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessSnapshot {
    pub as_of: NaiveDate,
    pub ftp_watts: Option<u16>,
    /// Seconds per kilometer
    pub threshold_run_pace: Option<u32>,
    /// Critical swim speed pace, seconds per 100 meters
    pub css_pace: Option<u32>,
    pub lthr: SportLthr,
    pub max_hr: Option<u16>,
    pub resting_hr: Option<u16>,
    pub lactate_thresholds: Option<LactateThresholds>,
    pub body_weight_kg: Option<Decimal>,
    pub weekly_volume: WeeklyVolume,
    pub recent_paces: RecentPaces,
    pub age_grading_multiplier: Option<Decimal>,
    /// Training load projected to `as_of`
    pub form: Option<PmcMetrics>,
    pub workouts_considered: usize,
    pub data_support: DataSupport,
}

impl From<&FitnessSnapshot> for TssThresholds {
    fn from(snapshot: &FitnessSnapshot) -> Self {
        TssThresholds {
            ftp: snapshot.ftp_watts,
            lthr: snapshot.lthr.run,
            threshold_run_pace: snapshot.threshold_run_pace,
            css_pace: snapshot.css_pace,
        }
    }
}

/// Windows and factors used to derive a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Days searched for best efforts
    pub lookback_days: u16,
    /// Days averaged for volume and recent paces
    pub volume_window_days: u16,
    /// Shortest session that counts as a threshold effort
    pub min_threshold_effort_seconds: u32,
    /// Efforts shorter than this get the short-effort factor
    pub full_effort_seconds: u32,
    /// FTP from efforts shorter than an hour (20-minute test rule)
    pub short_ride_ftp_factor: Decimal,
    /// Threshold pace from runs shorter than an hour
    pub short_run_pace_factor: Decimal,
    /// CSS from best sustained swim pace
    pub css_pace_factor: Decimal,
    pub min_css_distance_meters: Decimal,
    pub resting_hr_samples: usize,
    pub bike_lthr_offset: u16,
    pub swim_lthr_offset: u16,
    pub medium_support_workouts: usize,
    pub high_support_workouts: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            lookback_days: 90,
            volume_window_days: 28,
            min_threshold_effort_seconds: 1200,
            full_effort_seconds: 3600,
            short_ride_ftp_factor: dec!(0.95),
            short_run_pace_factor: dec!(1.04),
            css_pace_factor: dec!(1.02),
            min_css_distance_meters: dec!(400),
            resting_hr_samples: 7,
            bike_lthr_offset: 5,
            swim_lthr_offset: 10,
            medium_support_workouts: 8,
            high_support_workouts: 24,
        }
    }
}

/// Builds fitness snapshots
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    config: SnapshotConfig,
    pmc: PmcCalculator,
    thresholds: LactateThresholdEstimator,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SnapshotConfig) -> Self {
        SnapshotBuilder {
            config,
            ..Self::default()
        }
    }

    pub fn with_calculators(
        config: SnapshotConfig,
        pmc: PmcCalculator,
        thresholds: LactateThresholdEstimator,
    ) -> Self {
        SnapshotBuilder {
            config,
            pmc,
            thresholds,
        }
    }

    /// Derive a snapshot from workouts and logs dated on or before `as_of`
    pub fn build(
        &self,
        workouts: &[Workout],
        logs: &[ManualLog],
        as_of: NaiveDate,
        age_grading_multiplier: Option<Decimal>,
    ) -> FitnessSnapshot {
        let recent = Self::window(workouts, as_of, self.config.lookback_days);

        let max_hr = self.max_heart_rate(&recent, logs, as_of);
        let resting_hr = self.resting_heart_rate(logs, as_of);
        let lactate_thresholds = match (max_hr, resting_hr) {
            (Some(max), Some(resting)) => match self.thresholds.estimate(max, resting) {
                Ok(thresholds) => Some(thresholds),
                Err(err) => {
                    warn!("Skipping lactate thresholds: {}", err);
                    None
                }
            },
            _ => None,
        };
        let lthr = self.sport_lthr(lactate_thresholds.as_ref());

        let mut snapshot = FitnessSnapshot {
            as_of,
            ftp_watts: self.estimate_ftp(&recent),
            threshold_run_pace: self.estimate_threshold_run_pace(&recent),
            css_pace: self.estimate_css_pace(&recent),
            lthr,
            max_hr,
            resting_hr,
            lactate_thresholds,
            body_weight_kg: logs_of_type(logs, LogType::BodyWeight, as_of)
                .first()
                .map(|log| log.value),
            weekly_volume: self.weekly_volume(workouts, as_of),
            recent_paces: self.recent_paces(workouts, as_of),
            age_grading_multiplier: age_grading_multiplier.filter(|m| *m > Decimal::ZERO),
            form: None,
            workouts_considered: recent.len(),
            data_support: self.data_support(recent.len()),
        };

        let tss_thresholds = TssThresholds::from(&snapshot);
        snapshot.form = self.pmc.latest_metrics(workouts, &tss_thresholds, as_of);

        debug!(
            as_of = %as_of,
            workouts = snapshot.workouts_considered,
            ftp = ?snapshot.ftp_watts,
            run_pace = ?snapshot.threshold_run_pace,
            css = ?snapshot.css_pace,
            "built fitness snapshot"
        );
        snapshot
    }

    /// Workouts in (as_of - days, as_of]
    fn window(workouts: &[Workout], as_of: NaiveDate, days: u16) -> Vec<&Workout> {
        let start = as_of
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        workouts
            .iter()
            .filter(|w| w.date > start && w.date <= as_of)
            .collect()
    }

    fn is_threshold_effort(&self, workout: &Workout) -> bool {
        workout.duration_seconds >= self.config.min_threshold_effort_seconds
    }

    fn is_short_effort(&self, workout: &Workout) -> bool {
        workout.duration_seconds < self.config.full_effort_seconds
    }

    /// Best sustained power, discounted for efforts under an hour
    pub fn estimate_ftp(&self, workouts: &[&Workout]) -> Option<u16> {
        workouts
            .iter()
            .filter(|w| w.sport == Sport::Bike && self.is_threshold_effort(w))
            .filter_map(|w| {
                let power = Decimal::from(w.effective_power()?);
                Some(if self.is_short_effort(w) {
                    power * self.config.short_ride_ftp_factor
                } else {
                    power
                })
            })
            .max()
            .and_then(|ftp| ftp.round().to_u16())
    }

    /// Best sustained run pace, slowed for efforts under an hour
    pub fn estimate_threshold_run_pace(&self, workouts: &[&Workout]) -> Option<u32> {
        workouts
            .iter()
            .filter(|w| w.sport == Sport::Run && self.is_threshold_effort(w))
            .filter_map(|w| {
                let pace = w.pace_per_km()?;
                Some(if self.is_short_effort(w) {
                    pace * self.config.short_run_pace_factor
                } else {
                    pace
                })
            })
            .min()
            .and_then(|pace| pace.round().to_u32())
    }

    /// Critical swim speed pace from the best sustained swim
    pub fn estimate_css_pace(&self, workouts: &[&Workout]) -> Option<u32> {
        workouts
            .iter()
            .filter(|w| w.sport == Sport::Swim)
            .filter(|w| {
                w.distance_meters()
                    .is_some_and(|d| d >= self.config.min_css_distance_meters)
            })
            .filter_map(|w| w.pace_per_100m())
            .min()
            .and_then(|pace| (pace * self.config.css_pace_factor).round().to_u32())
    }

    fn max_heart_rate(
        &self,
        workouts: &[&Workout],
        logs: &[ManualLog],
        as_of: NaiveDate,
    ) -> Option<u16> {
        if let Some(log) = logs_of_type(logs, LogType::MaxHeartRate, as_of).first() {
            if let Some(value) = log.value.round().to_u16().filter(|v| *v > 0) {
                return Some(value);
            }
        }
        workouts
            .iter()
            .filter_map(|w| w.summary.max_heart_rate)
            .filter(|hr| *hr > 0)
            .max()
    }

    fn resting_heart_rate(&self, logs: &[ManualLog], as_of: NaiveDate) -> Option<u16> {
        let values: Vec<Decimal> = logs_of_type(logs, LogType::RestingHeartRate, as_of)
            .into_iter()
            .take(self.config.resting_hr_samples)
            .map(|log| log.value)
            .collect();
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().sum::<Decimal>() / Decimal::from(values.len());
        mean.round().to_u16().filter(|v| *v > 0)
    }

    fn sport_lthr(&self, thresholds: Option<&LactateThresholds>) -> SportLthr {
        match thresholds {
            Some(t) => SportLthr {
                swim: Some(t.lt2.saturating_sub(self.config.swim_lthr_offset)),
                bike: Some(t.lt2.saturating_sub(self.config.bike_lthr_offset)),
                run: Some(t.lt2),
            },
            None => SportLthr::default(),
        }
    }

    fn weekly_volume(&self, workouts: &[Workout], as_of: NaiveDate) -> WeeklyVolume {
        let window = Self::window(workouts, as_of, self.config.volume_window_days);
        let weeks = Decimal::from(self.config.volume_window_days.max(1)) / Decimal::from(7);

        let meters = |sport: Sport| -> Decimal {
            let total: Decimal = window
                .iter()
                .filter(|w| w.sport == sport)
                .filter_map(|w| w.distance_meters())
                .sum();
            (total / weeks).round_dp(0)
        };
        let seconds = |sport: Sport| -> u32 {
            let total: u64 = window
                .iter()
                .filter(|w| w.sport == sport)
                .map(|w| u64::from(w.duration_seconds))
                .sum();
            (Decimal::from(total) / weeks).round().to_u32().unwrap_or(0)
        };

        WeeklyVolume {
            swim_meters: meters(Sport::Swim),
            bike_meters: meters(Sport::Bike),
            run_meters: meters(Sport::Run),
            swim_seconds: seconds(Sport::Swim),
            bike_seconds: seconds(Sport::Bike),
            run_seconds: seconds(Sport::Run),
        }
    }

    fn recent_paces(&self, workouts: &[Workout], as_of: NaiveDate) -> RecentPaces {
        let window = Self::window(workouts, as_of, self.config.volume_window_days);

        // Total seconds and meters over sessions that recorded a distance
        let totals = |sport: Sport| -> Option<(Decimal, Decimal)> {
            let (seconds, meters) = window
                .iter()
                .filter(|w| w.sport == sport && w.duration_seconds > 0)
                .filter_map(|w| Some((Decimal::from(w.duration_seconds), w.distance_meters()?)))
                .fold((Decimal::ZERO, Decimal::ZERO), |(s, m), (ws, wm)| (s + ws, m + wm));
            if seconds > Decimal::ZERO && meters > Decimal::ZERO {
                Some((seconds, meters))
            } else {
                None
            }
        };

        RecentPaces {
            swim_pace_per_100m: totals(Sport::Swim)
                .map(|(s, m)| (s * Decimal::from(100) / m).round_dp(1)),
            bike_speed_kph: totals(Sport::Bike).map(|(s, m)| (m / s * dec!(3.6)).round_dp(1)),
            run_pace_per_km: totals(Sport::Run)
                .map(|(s, m)| (s * Decimal::from(1000) / m).round_dp(1)),
        }
    }

    fn data_support(&self, workouts: usize) -> DataSupport {
        if workouts >= self.config.high_support_workouts {
            DataSupport::High
        } else if workouts >= self.config.medium_support_workouts {
            DataSupport::Medium
        } else {
            DataSupport::Low
        }
    }
}
