//! Efficiency factor and aerobic decoupling
//!
//! Efficiency factor (EF) relates output to heart rate for a whole workout.
//! Aerobic decoupling compares that relationship between the two halves of a
//! single session.

use crate::models::{SessionMetric, Sport, Workout};
use crate::pmc::TrendDirection;
use crate::units::percent_from_f64;
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

/// Window and threshold settings for efficiency analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EfficiencyConfig {
    /// Length of each trend window in days
    pub trend_window_days: u16,

    /// Fewest samples a session needs for decoupling
    pub min_decoupling_samples: usize,

    /// Decoupling percentage where a session stops counting as well coupled
    pub mild_decoupling_percent: Decimal,

    /// Decoupling percentage above which drift is significant
    pub significant_decoupling_percent: Decimal,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        EfficiencyConfig {
            trend_window_days: 30,
            min_decoupling_samples: 10,
            mild_decoupling_percent: Decimal::from(5),
            significant_decoupling_percent: Decimal::from(10),
        }
    }
}

/// EF for one workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfPoint {
    pub workout_id: String,
    pub date: NaiveDate,
    pub sport: Sport,
    pub efficiency_factor: Decimal,
}

/// Mean EF in the recent window against the window before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfTrend {
    pub sport: Sport,
    pub recent_mean: Decimal,
    pub previous_mean: Decimal,
    /// Percent change from the previous window, one decimal
    pub percent_change: Decimal,
    pub direction: TrendDirection,
    pub recent_count: usize,
    pub previous_count: usize,
}

/// Output stream used as the numerator of the decoupling ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    Power,
    Speed,
    /// Speed derived from recorded pace
    PaceSpeed,
}

/// Coupling quality of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecouplingClass {
    WellCoupled,
    Mild,
    Significant,
}

impl DecouplingClass {
    pub fn label(&self) -> &'static str {
        match self {
            DecouplingClass::WellCoupled => "Well coupled",
            DecouplingClass::Mild => "Mild decoupling",
            DecouplingClass::Significant => "Significant decoupling",
        }
    }

    /// Display colour name
    pub fn color(&self) -> &'static str {
        match self {
            DecouplingClass::WellCoupled => "green",
            DecouplingClass::Mild => "yellow",
            DecouplingClass::Significant => "red",
        }
    }
}

/// Decoupling result with the intermediate ratios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecouplingAnalysis {
    pub channel: OutputChannel,
    pub first_half_ratio: Decimal,
    pub second_half_ratio: Decimal,
    /// (first - second) / first × 100, one decimal
    pub decoupling_percent: Decimal,
    pub classification: DecouplingClass,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EfficiencyAnalyzer {
    config: EfficiencyConfig,
}

impl EfficiencyAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EfficiencyConfig) -> Self {
        EfficiencyAnalyzer { config }
    }

    /// Efficiency factor for one workout, unrounded
    ///
    /// Bike: power / HR. Run: speed in m/min per beat, from pace in s/km,
    /// scaled ×100. Swim: m/s per beat ×100. `None` when any input is
    /// missing or zero, and for brick workouts.
    pub fn efficiency_factor(workout: &Workout) -> Option<Decimal> {
        let heart_rate = Decimal::from(workout.heart_rate()?);

        match workout.sport {
            Sport::Bike => {
                let power = workout.effective_power()?;
                Some(Decimal::from(power) / heart_rate)
            }
            Sport::Run => {
                let pace = workout.summary.avg_pace.filter(|p| *p > Decimal::ZERO)?;
                Some(Decimal::from(1000) / pace / heart_rate * Decimal::from(100))
            }
            Sport::Swim => {
                let distance = workout.distance_meters()?;
                if workout.duration_seconds == 0 {
                    return None;
                }
                let speed = distance / Decimal::from(workout.duration_seconds);
                Some(speed / heart_rate * Decimal::from(100))
            }
            Sport::Brick => None,
        }
    }

    /// EF points for every workout that has one, oldest first
    pub fn ef_series(&self, workouts: &[Workout]) -> Vec<EfPoint> {
        let mut points: Vec<EfPoint> = workouts
            .iter()
            .filter_map(|workout| {
                Self::efficiency_factor(workout).map(|ef| EfPoint {
                    workout_id: workout.id.clone(),
                    date: workout.date,
                    sport: workout.sport,
                    efficiency_factor: ef,
                })
            })
            .collect();
        points.sort_by(|a, b| a.date.cmp(&b.date));
        points
    }

    /// Compare mean EF in (as_of - window, as_of] with the window before it
    pub fn ef_trend(
        &self,
        workouts: &[Workout],
        sport: Sport,
        as_of: NaiveDate,
    ) -> Option<EfTrend> {
        let window = Days::new(u64::from(self.config.trend_window_days));
        let recent_start = as_of.checked_sub_days(window)?;
        let previous_start = recent_start.checked_sub_days(window)?;

        let window_values = |from: NaiveDate, to: NaiveDate| -> Vec<f64> {
            workouts
                .iter()
                .filter(|w| w.sport == sport && w.date > from && w.date <= to)
                .filter_map(Self::efficiency_factor)
                .filter_map(|ef| ef.to_f64())
                .collect()
        };

        let recent = window_values(recent_start, as_of);
        let previous = window_values(previous_start, recent_start);
        if recent.is_empty() || previous.is_empty() {
            return None;
        }

        let recent_mean = recent.iter().mean();
        let previous_mean = previous.iter().mean();
        if previous_mean <= 0.0 {
            return None;
        }

        let percent_change =
            percent_from_f64((recent_mean - previous_mean) / previous_mean * 100.0)?;
        let direction = if percent_change > Decimal::ZERO {
            TrendDirection::Increasing
        } else if percent_change < Decimal::ZERO {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };

        Some(EfTrend {
            sport,
            recent_mean: Decimal::from_f64(recent_mean)?.round_dp(2),
            previous_mean: Decimal::from_f64(previous_mean)?.round_dp(2),
            percent_change,
            direction,
            recent_count: recent.len(),
            previous_count: previous.len(),
        })
    }

    /// Aerobic decoupling percentage for a session
    pub fn decoupling(&self, samples: &[SessionMetric]) -> Option<Decimal> {
        self.analyze_decoupling(samples)
            .map(|analysis| analysis.decoupling_percent)
    }

    /// Full decoupling analysis for a session
    ///
    /// Samples are split at the midpoint by offset. Each half's ratio is mean
    /// output over mean heart rate, using only samples that carry both.
    pub fn analyze_decoupling(&self, samples: &[SessionMetric]) -> Option<DecouplingAnalysis> {
        if samples.len() < self.config.min_decoupling_samples || samples.is_empty() {
            return None;
        }

        let mut ordered: Vec<&SessionMetric> = samples.iter().collect();
        ordered.sort_by_key(|sample| sample.offset_seconds);

        let channel = Self::output_channel(&ordered)?;
        let (first, second) = ordered.split_at(ordered.len() / 2);

        let first_ratio = Self::half_ratio(first, channel)?;
        let second_ratio = Self::half_ratio(second, channel)?;
        if first_ratio <= 0.0 {
            return None;
        }

        let decoupling_percent =
            percent_from_f64((first_ratio - second_ratio) / first_ratio * 100.0)?;
        let classification = self.classify(decoupling_percent);

        debug!(
            channel = ?channel,
            decoupling = %decoupling_percent,
            "computed aerobic decoupling"
        );

        Some(DecouplingAnalysis {
            channel,
            first_half_ratio: Decimal::from_f64(first_ratio)?.round_dp(4),
            second_half_ratio: Decimal::from_f64(second_ratio)?.round_dp(4),
            decoupling_percent,
            classification,
            sample_count: samples.len(),
        })
    }

    /// Classify a decoupling percentage; drift in either direction counts
    pub fn classify(&self, decoupling_percent: Decimal) -> DecouplingClass {
        let magnitude = decoupling_percent.abs();
        if magnitude < self.config.mild_decoupling_percent {
            DecouplingClass::WellCoupled
        } else if magnitude <= self.config.significant_decoupling_percent {
            DecouplingClass::Mild
        } else {
            DecouplingClass::Significant
        }
    }

    fn output_channel(samples: &[&SessionMetric]) -> Option<OutputChannel> {
        if samples.iter().any(|s| s.power.is_some()) {
            Some(OutputChannel::Power)
        } else if samples.iter().any(|s| s.speed.is_some()) {
            Some(OutputChannel::Speed)
        } else if samples.iter().any(|s| s.pace.is_some()) {
            Some(OutputChannel::PaceSpeed)
        } else {
            None
        }
    }

    fn output_value(sample: &SessionMetric, channel: OutputChannel) -> Option<f64> {
        match channel {
            OutputChannel::Power => sample.power.map(f64::from),
            OutputChannel::Speed => sample.speed.and_then(|s| s.to_f64()),
            OutputChannel::PaceSpeed => sample
                .pace
                .filter(|p| *p > Decimal::ZERO)
                .and_then(|p| p.to_f64())
                .map(|pace| 1000.0 / pace),
        }
    }

    fn half_ratio(samples: &[&SessionMetric], channel: OutputChannel) -> Option<f64> {
        let (outputs, heart_rates): (Vec<f64>, Vec<f64>) = samples
            .iter()
            .filter_map(|sample| {
                let hr = sample.heart_rate.filter(|hr| *hr > 0)?;
                let output = Self::output_value(sample, channel)?;
                Some((output, f64::from(hr)))
            })
            .unzip();

        if outputs.is_empty() {
            return None;
        }
        Some(outputs.iter().mean() / heart_rates.iter().mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutSummary;
    use rust_decimal_macros::dec;

    fn workout(sport: Sport, date: NaiveDate, summary: WorkoutSummary) -> Workout {
        Workout {
            id: format!("{}_{}", sport, date),
            date,
            sport,
            duration_seconds: 3600,
            perceived_exertion: None,
            summary,
            notes: None,
            athlete_id: None,
        }
    }

    fn ride(date: NaiveDate, power: u16, hr: u16) -> Workout {
        workout(
            Sport::Bike,
            date,
            WorkoutSummary {
                normalized_power: Some(power),
                avg_heart_rate: Some(hr),
                ..WorkoutSummary::default()
            },
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + Days::new(u64::from(d))
    }

    fn power_samples(count: u32, hr: u16, power_for: impl Fn(u32) -> u16) -> Vec<SessionMetric> {
        (0..count)
            .map(|i| SessionMetric {
                workout_id: "ride".to_string(),
                offset_seconds: i * 60,
                heart_rate: Some(hr),
                power: Some(power_for(i)),
                ..SessionMetric::default()
            })
            .collect()
    }

    #[test]
    fn test_bike_efficiency_factor() {
        let ef = EfficiencyAnalyzer::efficiency_factor(&ride(day(0), 210, 150)).unwrap();
        assert_eq!(ef, dec!(1.4));
    }

    #[test]
    fn test_run_and_swim_efficiency_factor() {
        let run = workout(
            Sport::Run,
            day(0),
            WorkoutSummary {
                avg_pace: Some(dec!(250)),
                avg_heart_rate: Some(160),
                ..WorkoutSummary::default()
            },
        );
        // 4 m/s over 160 bpm
        assert_eq!(EfficiencyAnalyzer::efficiency_factor(&run), Some(dec!(2.5)));

        let swim = workout(
            Sport::Swim,
            day(0),
            WorkoutSummary {
                total_distance: Some(dec!(3600)),
                avg_heart_rate: Some(125),
                ..WorkoutSummary::default()
            },
        );
        assert_eq!(EfficiencyAnalyzer::efficiency_factor(&swim), Some(dec!(0.8)));
    }

    #[test]
    fn test_efficiency_factor_missing_inputs() {
        assert_eq!(EfficiencyAnalyzer::efficiency_factor(&ride(day(0), 210, 0)), None);
        assert_eq!(EfficiencyAnalyzer::efficiency_factor(&ride(day(0), 0, 150)), None);

        let brick = workout(
            Sport::Brick,
            day(0),
            WorkoutSummary {
                avg_power: Some(200),
                avg_heart_rate: Some(140),
                ..WorkoutSummary::default()
            },
        );
        assert_eq!(EfficiencyAnalyzer::efficiency_factor(&brick), None);
    }

    #[test]
    fn test_ef_monotonicity() {
        let base = EfficiencyAnalyzer::efficiency_factor(&ride(day(0), 200, 150)).unwrap();
        let more_power = EfficiencyAnalyzer::efficiency_factor(&ride(day(0), 201, 150)).unwrap();
        let higher_hr = EfficiencyAnalyzer::efficiency_factor(&ride(day(0), 200, 151)).unwrap();
        assert!(more_power > base);
        assert!(higher_hr < base);
    }

    #[test]
    fn test_ef_series_sorted_and_filtered() {
        let analyzer = EfficiencyAnalyzer::new();
        let workouts = vec![ride(day(5), 200, 140), ride(day(1), 190, 0), ride(day(2), 180, 150)];

        let points = analyzer.ef_series(&workouts);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, day(2));
        assert_eq!(points[1].date, day(5));
    }

    #[test]
    fn test_ef_trend() {
        let analyzer = EfficiencyAnalyzer::new();
        let as_of = day(60);
        let workouts = vec![
            // previous window (day 0, day 30]
            ride(day(10), 150, 150),
            ride(day(20), 150, 150),
            // recent window (day 30, day 60]
            ride(day(45), 165, 150),
            ride(day(60), 165, 150),
            // outside both windows
            ride(day(61), 300, 150),
        ];

        let trend = analyzer.ef_trend(&workouts, Sport::Bike, as_of).unwrap();
        assert_eq!(trend.percent_change, dec!(10.0));
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert_eq!(trend.recent_count, 2);
        assert_eq!(trend.previous_count, 2);
        assert_eq!(trend.recent_mean, dec!(1.1));
    }

    #[test]
    fn test_ef_trend_needs_both_windows() {
        let analyzer = EfficiencyAnalyzer::new();
        let workouts = vec![ride(day(45), 165, 150)];
        assert!(analyzer.ef_trend(&workouts, Sport::Bike, day(60)).is_none());
        assert!(analyzer.ef_trend(&workouts, Sport::Run, day(60)).is_none());
    }

    #[test]
    fn test_steady_session_has_zero_decoupling() {
        let analyzer = EfficiencyAnalyzer::new();
        let samples = power_samples(30, 140, |_| 200);

        let analysis = analyzer.analyze_decoupling(&samples).unwrap();
        assert_eq!(analysis.decoupling_percent, Decimal::ZERO);
        assert_eq!(analysis.classification, DecouplingClass::WellCoupled);
        assert_eq!(analysis.channel, OutputChannel::Power);
    }

    #[test]
    fn test_rising_power_gives_negative_decoupling() {
        let analyzer = EfficiencyAnalyzer::new();
        let samples = power_samples(20, 150, |i| 180 + (i as u16) * 40 / 19);

        let decoupling = analyzer.decoupling(&samples).unwrap();
        assert!(decoupling < Decimal::ZERO);
    }

    #[test]
    fn test_cardiac_drift_is_positive_decoupling() {
        let analyzer = EfficiencyAnalyzer::new();
        let samples: Vec<SessionMetric> = (0..20u32)
            .map(|i| SessionMetric {
                offset_seconds: i * 60,
                heart_rate: Some(if i < 10 { 140 } else { 160 }),
                power: Some(200),
                ..SessionMetric::default()
            })
            .collect();

        let analysis = analyzer.analyze_decoupling(&samples).unwrap();
        // (200/140 - 200/160) / (200/140) = 12.5%
        assert_eq!(analysis.decoupling_percent, dec!(12.5));
        assert_eq!(analysis.classification, DecouplingClass::Significant);
    }

    #[test]
    fn test_decoupling_requires_enough_samples() {
        let analyzer = EfficiencyAnalyzer::new();
        assert!(analyzer.decoupling(&power_samples(9, 140, |_| 200)).is_none());
        assert!(analyzer.decoupling(&[]).is_none());
    }

    #[test]
    fn test_decoupling_falls_back_to_pace() {
        let analyzer = EfficiencyAnalyzer::new();
        let samples: Vec<SessionMetric> = (0..12u32)
            .map(|i| SessionMetric {
                offset_seconds: i * 30,
                heart_rate: Some(150),
                pace: Some(dec!(300)),
                ..SessionMetric::default()
            })
            .collect();

        let analysis = analyzer.analyze_decoupling(&samples).unwrap();
        assert_eq!(analysis.channel, OutputChannel::PaceSpeed);
        assert_eq!(analysis.decoupling_percent, Decimal::ZERO);
    }

    #[test]
    fn test_half_without_heart_rate_yields_none() {
        let analyzer = EfficiencyAnalyzer::new();
        let mut samples = power_samples(12, 150, |_| 200);
        for sample in samples.iter_mut().skip(6) {
            sample.heart_rate = None;
        }
        assert!(analyzer.decoupling(&samples).is_none());
    }

    #[test]
    fn test_classification_bands() {
        let analyzer = EfficiencyAnalyzer::new();
        assert_eq!(analyzer.classify(dec!(4.9)), DecouplingClass::WellCoupled);
        assert_eq!(analyzer.classify(dec!(5.0)), DecouplingClass::Mild);
        assert_eq!(analyzer.classify(dec!(10.0)), DecouplingClass::Mild);
        assert_eq!(analyzer.classify(dec!(10.1)), DecouplingClass::Significant);
        assert_eq!(DecouplingClass::Mild.color(), "yellow");
    }
}
