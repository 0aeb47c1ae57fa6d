use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Disciplines an athlete can log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Swim,
    Bike,
    Run,
    Brick,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Swim => "swim",
            Sport::Bike => "bike",
            Sport::Run => "run",
            Sport::Brick => "brick",
        }
    }
}

impl std::str::FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swim" | "swimming" => Ok(Sport::Swim),
            "bike" | "cycling" | "ride" => Ok(Sport::Bike),
            "run" | "running" => Ok(Sport::Run),
            "brick" => Ok(Sport::Brick),
            _ => Err(format!("Unknown sport: {}", s)),
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate metrics recorded for a workout
///
/// Every field is optional: which aggregates exist depends on the sport and
/// the device that recorded the session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutSummary {
    /// Total distance in meters
    pub total_distance: Option<Decimal>,

    /// Average heart rate in beats per minute
    pub avg_heart_rate: Option<u16>,

    /// Maximum heart rate reached during the workout
    pub max_heart_rate: Option<u16>,

    /// Average power output in watts (bike)
    pub avg_power: Option<u16>,

    /// Normalized power in watts (bike)
    pub normalized_power: Option<u16>,

    /// Average cadence (rpm on the bike, steps per minute running)
    pub avg_cadence: Option<u16>,

    /// Average pace in seconds per kilometer (run)
    pub avg_pace: Option<Decimal>,

    /// Pool length in meters (swim)
    pub pool_length: Option<u16>,

    /// Average SWOLF score (swim)
    pub swolf: Option<u16>,

    /// Calories burned
    pub calories: Option<u16>,

    /// Total elevation gain in meters
    pub elevation_gain: Option<u16>,

    /// Training Stress Score recorded by the device or platform
    pub tss: Option<Decimal>,
}

/// One completed training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier for the workout
    pub id: String,

    /// Calendar date of the workout
    pub date: NaiveDate,

    pub sport: Sport,

    /// Duration of the workout in seconds
    pub duration_seconds: u32,

    /// Perceived exertion on a 1-10 scale
    #[serde(default)]
    pub perceived_exertion: Option<u8>,

    /// Recorded aggregate metrics
    #[serde(default)]
    pub summary: WorkoutSummary,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub athlete_id: Option<String>,
}

impl Workout {
    /// Distance in meters when recorded and positive
    pub fn distance_meters(&self) -> Option<Decimal> {
        self.summary
            .total_distance
            .filter(|distance| *distance > Decimal::ZERO)
    }

    /// Power used for intensity work: normalized power, else average power
    pub fn effective_power(&self) -> Option<u16> {
        self.summary
            .normalized_power
            .or(self.summary.avg_power)
            .filter(|power| *power > 0)
    }

    /// Average running pace in seconds per kilometer
    ///
    /// Uses the recorded pace and falls back to duration over distance.
    pub fn pace_per_km(&self) -> Option<Decimal> {
        if let Some(pace) = self.summary.avg_pace.filter(|p| *p > Decimal::ZERO) {
            return Some(pace);
        }
        let distance = self.distance_meters()?;
        if self.duration_seconds == 0 {
            return None;
        }
        Some(Decimal::from(self.duration_seconds) * Decimal::from(1000) / distance)
    }

    /// Average swim pace in seconds per 100 meters
    pub fn pace_per_100m(&self) -> Option<Decimal> {
        let distance = self.distance_meters()?;
        if self.duration_seconds == 0 {
            return None;
        }
        Some(Decimal::from(self.duration_seconds) * Decimal::from(100) / distance)
    }

    /// Average heart rate when recorded and nonzero
    pub fn heart_rate(&self) -> Option<u16> {
        self.summary.avg_heart_rate.filter(|hr| *hr > 0)
    }
}

/// One timestamped sample within a workout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMetric {
    pub workout_id: String,

    /// Seconds from the start of the workout
    pub offset_seconds: u32,

    pub heart_rate: Option<u16>,

    /// Power in watts
    pub power: Option<u16>,

    /// Pace in seconds per kilometer
    pub pace: Option<Decimal>,

    pub cadence: Option<u16>,

    /// Speed in meters per second
    pub speed: Option<Decimal>,
}

/// Category of a manual log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Metabolic,
    Physiological,
    Environmental,
}

/// Typed observation recorded in a manual log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    // Metabolic
    BodyWeight,
    BodyFat,
    BloodGlucose,
    Ketones,
    CarbohydrateIntake,
    // Physiological
    RestingHeartRate,
    MaxHeartRate,
    HeartRateVariability,
    SleepHours,
    Lactate,
    // Environmental
    Temperature,
    Humidity,
    Altitude,
}

impl LogType {
    /// The single category a log type belongs to
    pub fn category(&self) -> LogCategory {
        match self {
            LogType::BodyWeight
            | LogType::BodyFat
            | LogType::BloodGlucose
            | LogType::Ketones
            | LogType::CarbohydrateIntake => LogCategory::Metabolic,
            LogType::RestingHeartRate
            | LogType::MaxHeartRate
            | LogType::HeartRateVariability
            | LogType::SleepHours
            | LogType::Lactate => LogCategory::Physiological,
            LogType::Temperature | LogType::Humidity | LogType::Altitude => {
                LogCategory::Environmental
            }
        }
    }
}

/// A dated scalar observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualLog {
    pub date: NaiveDate,
    pub category: LogCategory,
    pub log_type: LogType,
    pub value: Decimal,
}

impl ManualLog {
    /// True when the declared category matches the log type
    pub fn is_consistent(&self) -> bool {
        self.log_type.category() == self.category
    }
}

/// Latest consistent logs of one type, newest first
pub fn logs_of_type(logs: &[ManualLog], log_type: LogType, as_of: NaiveDate) -> Vec<&ManualLog> {
    let mut matching: Vec<&ManualLog> = logs
        .iter()
        .filter(|log| log.log_type == log_type && log.is_consistent() && log.date <= as_of)
        .collect();
    matching.sort_by(|a, b| b.date.cmp(&a.date));
    matching
}

/// Display unit preference, used only by presentation helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}
