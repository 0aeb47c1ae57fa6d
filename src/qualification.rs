//! Championship qualifying standards and readiness against them

use crate::fitness::{DataSupport, FitnessSnapshot};
use crate::units::format_duration;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Margin by which an estimate may miss the standard and still be competitive
pub const DEFAULT_COMPETITIVE_MARGIN_PERCENT: Decimal = dec!(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" | "men" => Ok(Gender::Male),
            "female" | "f" | "women" => Ok(Gender::Female),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

/// How a standard turns into a target time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StandardRule {
    /// Absolute qualifying time
    Cutoff { seconds: u32 },
    /// Reference time scaled by an age-group multiplier
    AgeGraded {
        multiplier: Decimal,
        reference_seconds: u32,
    },
}

/// Reference row for one championship, year, gender and age group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationStandard {
    pub championship: String,
    pub year: u16,
    pub gender: Gender,
    pub age_group: String,
    pub rule: StandardRule,
}

impl QualificationStandard {
    pub fn target_seconds(&self) -> u32 {
        match self.rule {
            StandardRule::Cutoff { seconds } => seconds,
            StandardRule::AgeGraded {
                multiplier,
                reference_seconds,
            } => round_seconds(Decimal::from(reference_seconds) * multiplier),
        }
    }

    fn matches(&self, championship: &str, gender: Gender, age_group: &str) -> bool {
        self.gender == gender
            && self.championship.trim().eq_ignore_ascii_case(championship.trim())
            && self.age_group.trim().eq_ignore_ascii_case(age_group.trim())
    }
}

/// Find the standard for a championship, gender and age group
///
/// When several years match, the latest one wins.
pub fn find_standard<'a>(
    standards: &'a [QualificationStandard],
    championship: &str,
    gender: Gender,
    age_group: &str,
) -> Option<&'a QualificationStandard> {
    standards
        .iter()
        .filter(|s| s.matches(championship, gender, age_group))
        .max_by_key(|s| s.year)
}

/// Qualification goal attached to a race plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationTarget {
    pub championship: String,
    pub year: u16,
    pub gender: Gender,
    pub age_group: String,
    pub target_seconds: u32,
    pub estimated_seconds: u32,
    pub age_graded_seconds: u32,
    pub margin_percent: Decimal,
    /// Slowest estimate still considered competitive
    pub competitive_cutoff_seconds: u32,
    pub competitive: bool,
}

impl QualificationTarget {
    /// Compare an estimated finish with a standard
    ///
    /// The estimate is age graded with the athlete multiplier when one is
    /// known, then judged against the target widened by `margin_percent`.
    pub fn from_standard(
        standard: &QualificationStandard,
        estimated_seconds: u32,
        age_grading_multiplier: Option<Decimal>,
        margin_percent: Decimal,
    ) -> Self {
        let target_seconds = standard.target_seconds();
        let age_graded_seconds = age_graded(estimated_seconds, age_grading_multiplier);
        let competitive_cutoff_seconds = round_seconds(
            Decimal::from(target_seconds) * (Decimal::ONE + margin_percent / Decimal::ONE_HUNDRED),
        );

        QualificationTarget {
            championship: standard.championship.clone(),
            year: standard.year,
            gender: standard.gender,
            age_group: standard.age_group.clone(),
            target_seconds,
            estimated_seconds,
            age_graded_seconds,
            margin_percent,
            competitive_cutoff_seconds,
            competitive: age_graded_seconds <= competitive_cutoff_seconds,
        }
    }
}

/// Verdict on whether an athlete is ready to meet a standard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationReadiness {
    pub ready: bool,
    /// Positive when the athlete is short of the standard
    pub gap_seconds: i64,
    pub confidence: DataSupport,
    pub age_graded_seconds: u32,
    pub target_seconds: u32,
    pub recommendations: Vec<String>,
    pub explanation: String,
}

pub fn assess_qualification_readiness(
    estimated_finish_seconds: u32,
    standard: &QualificationStandard,
    snapshot: &FitnessSnapshot,
) -> QualificationReadiness {
    let target_seconds = standard.target_seconds();
    let age_graded_seconds = age_graded(estimated_finish_seconds, snapshot.age_grading_multiplier);
    let gap_seconds = i64::from(age_graded_seconds) - i64::from(target_seconds);
    let ready = gap_seconds <= 0;

    debug!(
        estimated = estimated_finish_seconds,
        age_graded = age_graded_seconds,
        target = target_seconds,
        gap = gap_seconds,
        "qualification readiness"
    );

    let recommendations = if ready {
        Vec::new()
    } else {
        recommendations(gap_seconds, target_seconds, snapshot)
    };

    let verdict = if ready {
        format!("inside the standard by {}", format_duration(gap_seconds.unsigned_abs() as u32))
    } else {
        format!("short of the standard by {}", format_duration(gap_seconds as u32))
    };
    let graded = match snapshot.age_grading_multiplier {
        Some(multiplier) => format!(
            " (age graded x{} to {})",
            multiplier.normalize(),
            format_duration(age_graded_seconds)
        ),
        None => String::new(),
    };
    let explanation = format!(
        "Estimated finish {}{} against the {} {} {} {} standard of {}: {}. \
         Confidence is {} based on {} recent workouts.",
        format_duration(estimated_finish_seconds),
        graded,
        standard.year,
        standard.championship,
        standard.gender.as_str(),
        standard.age_group,
        format_duration(target_seconds),
        verdict,
        snapshot.data_support.as_str(),
        snapshot.workouts_considered,
    );

    QualificationReadiness {
        ready,
        gap_seconds,
        confidence: snapshot.data_support,
        age_graded_seconds,
        target_seconds,
        recommendations,
        explanation,
    }
}

fn recommendations(
    gap_seconds: i64,
    target_seconds: u32,
    snapshot: &FitnessSnapshot,
) -> Vec<String> {
    let mut recs = Vec::new();
    let gap_percent = if target_seconds > 0 {
        Decimal::from(gap_seconds) * Decimal::ONE_HUNDRED / Decimal::from(target_seconds)
    } else {
        Decimal::ONE_HUNDRED
    };

    if gap_percent <= dec!(2) {
        recs.push(
            "The gap is small: rehearse race pacing and practice transitions to find the time"
                .to_string(),
        );
    } else if gap_percent <= dec!(5) {
        recs.push(format!(
            "Add threshold sessions in your weakest discipline to close a {:.1}% gap",
            gap_percent
        ));
        recs.push("Race a tune-up event to validate pacing before the qualifier".to_string());
    } else {
        recs.push(format!(
            "A {:.1}% gap needs a longer build: \
             prioritise aerobic volume before targeting this standard",
            gap_percent
        ));
        recs.push("Consider a later qualifying race to allow another training block".to_string());
    }

    if snapshot.ftp_watts.is_none() {
        recs.push("Do an FTP test so bike targets come from measured power".to_string());
    }
    if snapshot.threshold_run_pace.is_none() {
        recs.push("Run a threshold test to set run pacing from data".to_string());
    }
    if snapshot.css_pace.is_none() {
        recs.push("Do a CSS swim test to set swim pacing from data".to_string());
    }
    if snapshot.data_support == DataSupport::Low {
        recs.push("Log more training so the estimate is backed by recent data".to_string());
    }
    if let Some(form) = &snapshot.form {
        if form.tsb < dec!(-10) {
            recs.push("Fatigue is high: plan a taper so race-day form matches fitness".to_string());
        }
    }

    recs
}

/// Apply the athlete's age-grading multiplier to a finish time
pub fn age_graded(seconds: u32, multiplier: Option<Decimal>) -> u32 {
    match multiplier.filter(|m| *m > Decimal::ZERO) {
        Some(multiplier) => round_seconds(Decimal::from(seconds) * multiplier),
        None => seconds,
    }
}

fn round_seconds(value: Decimal) -> u32 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}
