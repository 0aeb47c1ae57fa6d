//! Race plan generation
//!
//! A plan is synthesized from a fitness snapshot, a race distance and the
//! expected conditions. Generation is deterministic: it reads no clock and
//! uses no randomness, so the same request always yields the same fields.
//! Only [`RacePlan::new`] draws a fresh identifier.

pub mod distances;
pub mod equipment;
pub mod mindset;
pub mod nutrition;
pub mod pacing;

use crate::fitness::{DataSupport, FitnessSnapshot, SnapshotBuilder};
use crate::models::{ManualLog, Workout};
use crate::qualification::{
    assess_qualification_readiness, find_standard, Gender, QualificationReadiness,
    QualificationStandard, QualificationTarget, DEFAULT_COMPETITIVE_MARGIN_PERCENT,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use distances::{LegDistances, RaceDistance, ResolvedDistance};
use equipment::{EquipmentCategory, EquipmentPlan, EquipmentPlanner};
use mindset::{MindsetPlan, MindsetPlanner};
use nutrition::{NutritionConfig, NutritionPlan, NutritionPlanner};
use pacing::{PacingConfig, PacingPlan, PacingPlanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Finish,
    PersonalBest,
    Podium,
    Qualification,
}

impl std::str::FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "finish" => Ok(GoalType::Finish),
            "pb" | "pr" | "personal_best" => Ok(GoalType::PersonalBest),
            "podium" => Ok(GoalType::Podium),
            "qualify" | "qualification" => Ok(GoalType::Qualification),
            _ => Err(format!("Unknown goal type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    AgeGroup,
    Professional,
}

impl std::str::FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "age_group" | "agegroup" | "ag" => Ok(Classification::AgeGroup),
            "professional" | "pro" | "elite" => Ok(Classification::Professional),
            _ => Err(format!("Unknown classification: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterType {
    Ocean,
    Lake,
    River,
    Pool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wind {
    Calm,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseProfile {
    Flat,
    Rolling,
    Hilly,
    Mountainous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    Loop,
    OutAndBack,
    PointToPoint,
}

/// Expected race-day conditions; anything unknown is left out
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConditions {
    pub temperature_low_c: Option<f64>,
    pub temperature_high_c: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub altitude_meters: Option<f64>,
    pub water_type: Option<WaterType>,
    pub water_temperature_c: Option<f64>,
    pub wetsuit_legal: Option<bool>,
    pub wind: Option<Wind>,
    pub course_profile: Option<CourseProfile>,
    pub course_type: Option<CourseType>,
}

/// Everything needed to generate a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePlanRequest {
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub logs: Vec<ManualLog>,
    pub distance: RaceDistance,
    pub goal_type: GoalType,
    pub race_name: String,
    #[serde(default)]
    pub conditions: Option<RaceConditions>,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub standards: Vec<QualificationStandard>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub custom_distances: Option<LegDistances>,
    /// Date the snapshot is taken
    pub as_of: NaiveDate,
    #[serde(default)]
    pub race_date: Option<NaiveDate>,
    /// Championship to qualify for; defaults by distance
    #[serde(default)]
    pub championship: Option<String>,
    #[serde(default)]
    pub age_grading_multiplier: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub competitive_margin_percent: Decimal,
    pub pacing: PacingConfig,
    pub nutrition: NutritionConfig,
}

/// Race plan configuration errors
#[derive(Debug, Error)]
pub enum PlanConfigError {
    #[error("competitive margin cannot be negative, got {0}%")]
    NegativeMargin(Decimal),

    #[error("pacing: {0}")]
    Pacing(String),

    #[error("nutrition: {0}")]
    Nutrition(String),
}

impl PlanConfig {
    pub fn validate(&self) -> Result<(), PlanConfigError> {
        if self.competitive_margin_percent < Decimal::ZERO {
            return Err(PlanConfigError::NegativeMargin(self.competitive_margin_percent));
        }
        self.pacing.validate()?;
        self.nutrition.validate()
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        PlanConfig {
            competitive_margin_percent: DEFAULT_COMPETITIVE_MARGIN_PERCENT,
            pacing: PacingConfig::default(),
            nutrition: NutritionConfig::default(),
        }
    }
}

/// Generated content of a race plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePlanFields {
    pub race_name: String,
    pub distance: ResolvedDistance,
    pub goal_type: GoalType,
    pub classification: Classification,
    pub snapshot: FitnessSnapshot,
    pub pacing: PacingPlan,
    pub nutrition: NutritionPlan,
    pub equipment: EquipmentPlan,
    pub mindset: MindsetPlan,
    pub qualification_target: Option<QualificationTarget>,
    pub qualification_competitive: bool,
    pub readiness: Option<QualificationReadiness>,
    pub race_date: Option<NaiveDate>,
    pub days_until_race: Option<i64>,
    pub warnings: Vec<String>,
}

/// A stored plan: fields under a stable identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePlan {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: RacePlanFields,
}

/// Checklist row handed to the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RacePlanChecklistItem {
    pub plan_id: Uuid,
    pub category: EquipmentCategory,
    pub item: String,
    pub required: bool,
    pub completed: bool,
}

impl RacePlan {
    pub fn new(fields: RacePlanFields) -> Self {
        RacePlan {
            id: Uuid::new_v4(),
            fields,
        }
    }

    /// Replace the generated fields, keeping the plan identity
    pub fn regenerate(&mut self, fields: RacePlanFields) {
        self.fields = fields;
    }

    pub fn checklist_records(&self) -> Vec<RacePlanChecklistItem> {
        self.fields
            .equipment
            .checklist
            .iter()
            .map(|item| RacePlanChecklistItem {
                plan_id: self.id,
                category: item.category,
                item: item.item.clone(),
                required: item.required,
                completed: false,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RacePlanGenerator {
    config: PlanConfig,
    snapshots: SnapshotBuilder,
    pacing: PacingPlanner,
    nutrition: NutritionPlanner,
    equipment: EquipmentPlanner,
    mindset: MindsetPlanner,
}

impl RacePlanGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PlanConfig) -> Self {
        RacePlanGenerator {
            snapshots: SnapshotBuilder::new(),
            pacing: PacingPlanner::with_config(config.pacing.clone()),
            nutrition: NutritionPlanner::with_config(config.nutrition.clone()),
            equipment: EquipmentPlanner::new(),
            mindset: MindsetPlanner::new(),
            config,
        }
    }

    /// Use a preconfigured snapshot builder
    pub fn with_snapshot_builder(mut self, snapshots: SnapshotBuilder) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn generate_full_race_plan(&self, request: &RacePlanRequest) -> RacePlanFields {
        let mut warnings = Vec::new();

        let distance = request.distance.resolve(request.custom_distances.as_ref());
        if distance.distance != request.distance {
            warnings.push("Custom race without distances: planned as Olympic distance".to_string());
        }

        let snapshot = self.snapshots.build(
            &request.workouts,
            &request.logs,
            request.as_of,
            request.age_grading_multiplier,
        );
        warnings.extend(Self::snapshot_warnings(&snapshot));

        let conditions = request.conditions.as_ref();
        let pacing = self
            .pacing
            .plan(&snapshot, &distance, conditions, request.classification);
        let nutrition = self.nutrition.plan(&pacing, snapshot.body_weight_kg);
        let equipment = self.equipment.plan(
            &distance,
            &pacing.adjustments,
            conditions,
            &nutrition,
            request.race_date,
        );
        let mindset = self
            .mindset
            .plan(request.goal_type, request.classification, distance.category);

        let (qualification_target, readiness) = if request.goal_type == GoalType::Qualification {
            match self.qualification(request, &distance, &snapshot, &pacing) {
                Some((target, readiness)) => (Some(target), Some(readiness)),
                None => {
                    warnings.push("No matching qualification standard found".to_string());
                    (None, None)
                }
            }
        } else {
            (None, None)
        };
        let qualification_competitive = qualification_target
            .as_ref()
            .map_or(false, |t| t.competitive);

        info!(
            race = %request.race_name,
            realistic = pacing.finish.realistic_seconds,
            "generated race plan"
        );

        RacePlanFields {
            race_name: request.race_name.clone(),
            distance,
            goal_type: request.goal_type,
            classification: request.classification,
            snapshot,
            pacing,
            nutrition,
            equipment,
            mindset,
            qualification_target,
            qualification_competitive,
            readiness,
            race_date: request.race_date,
            days_until_race: request
                .race_date
                .map(|race| race.signed_duration_since(request.as_of).num_days()),
            warnings,
        }
    }

    fn qualification(
        &self,
        request: &RacePlanRequest,
        distance: &ResolvedDistance,
        snapshot: &FitnessSnapshot,
        pacing: &PacingPlan,
    ) -> Option<(QualificationTarget, QualificationReadiness)> {
        let championship = request
            .championship
            .as_deref()
            .or_else(|| distance.distance.default_championship())?;
        let (Some(gender), Some(age_group)) = (request.gender, request.age_group.as_deref()) else {
            warn!("Qualification goal without gender or age group");
            return None;
        };

        let standard = find_standard(&request.standards, championship, gender, age_group)?;
        let estimate = pacing.finish.realistic_seconds;
        let target = QualificationTarget::from_standard(
            standard,
            estimate,
            snapshot.age_grading_multiplier,
            self.config.competitive_margin_percent,
        );
        let readiness = assess_qualification_readiness(estimate, standard, snapshot);
        Some((target, readiness))
    }

    fn snapshot_warnings(snapshot: &FitnessSnapshot) -> Vec<String> {
        let mut warnings = Vec::new();
        if snapshot.ftp_watts.is_none() {
            warnings.push("No FTP estimate: bike targets use a default".to_string());
        }
        if snapshot.threshold_run_pace.is_none() {
            warnings.push("No threshold run pace: run targets use a default".to_string());
        }
        if snapshot.css_pace.is_none() {
            warnings.push("No CSS pace: swim targets use a default".to_string());
        }
        if snapshot.data_support == DataSupport::Low {
            warnings.push("Limited recent training data: treat estimates with caution".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qualification::StandardRule;

    fn request(goal_type: GoalType) -> RacePlanRequest {
        RacePlanRequest {
            workouts: Vec::new(),
            logs: Vec::new(),
            distance: RaceDistance::HalfIronman,
            goal_type,
            race_name: "Lake Placid 70.3".to_string(),
            conditions: None,
            classification: Classification::AgeGroup,
            standards: Vec::new(),
            gender: Some(Gender::Female),
            age_group: Some("F35-39".to_string()),
            custom_distances: None,
            as_of: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            race_date: NaiveDate::from_ymd_opt(2024, 7, 21),
            championship: None,
            age_grading_multiplier: None,
        }
    }

    fn standard(seconds: u32) -> QualificationStandard {
        QualificationStandard {
            championship: "Ironman 70.3 World Championship".to_string(),
            year: 2024,
            gender: Gender::Female,
            age_group: "F35-39".to_string(),
            rule: StandardRule::Cutoff { seconds },
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = RacePlanGenerator::new();
        let request = request(GoalType::PersonalBest);
        assert_eq!(
            generator.generate_full_race_plan(&request),
            generator.generate_full_race_plan(&request)
        );
    }

    #[test]
    fn test_days_until_race() {
        let fields = RacePlanGenerator::new().generate_full_race_plan(&request(GoalType::Finish));
        assert_eq!(fields.days_until_race, Some(50));
        assert!(fields.qualification_target.is_none());
        assert!(!fields.qualification_competitive);
    }

    #[test]
    fn test_qualification_uses_default_championship() {
        let mut request = request(GoalType::Qualification);
        request.standards = vec![standard(40_000)];

        let fields = RacePlanGenerator::new().generate_full_race_plan(&request);
        let target = fields.qualification_target.unwrap();
        assert_eq!(target.target_seconds, 40_000);
        assert_eq!(target.estimated_seconds, fields.pacing.finish.realistic_seconds);
        assert!(fields.qualification_competitive);
        assert!(fields.readiness.unwrap().ready);
    }

    #[test]
    fn test_unreachable_standard_is_not_competitive() {
        let mut request = request(GoalType::Qualification);
        request.standards = vec![standard(3_600)];

        let fields = RacePlanGenerator::new().generate_full_race_plan(&request);
        assert!(!fields.qualification_competitive);
        let readiness = fields.readiness.unwrap();
        assert!(!readiness.ready);
        assert!(!readiness.recommendations.is_empty());
    }

    #[test]
    fn test_missing_standard_yields_no_target() {
        let mut request = request(GoalType::Qualification);
        request.standards = vec![standard(40_000)];
        request.age_group = Some("F40-44".to_string());

        let fields = RacePlanGenerator::new().generate_full_race_plan(&request);
        assert!(fields.qualification_target.is_none());
        assert!(fields.readiness.is_none());
        assert!(fields.warnings.iter().any(|w| w.contains("qualification standard")));
    }

    #[test]
    fn test_custom_without_distances_warns() {
        let mut request = request(GoalType::Finish);
        request.distance = RaceDistance::Custom;

        let fields = RacePlanGenerator::new().generate_full_race_plan(&request);
        assert_eq!(fields.distance.distance, RaceDistance::Olympic);
        assert!(fields.warnings.iter().any(|w| w.contains("Olympic")));
    }

    #[test]
    fn test_oversized_custom_race_saturates() {
        let mut request = request(GoalType::Finish);
        request.distance = RaceDistance::Custom;
        request.custom_distances = Some(LegDistances::new(4_000_000_000, 100_000, 42_195));

        let fields = RacePlanGenerator::new().generate_full_race_plan(&request);
        let finish = fields.pacing.finish;
        assert_eq!(fields.distance.category, distances::DistanceCategory::Full);
        assert_eq!(finish.realistic_seconds, u32::MAX);
        assert!(finish.optimistic_seconds <= finish.realistic_seconds);
        assert!(finish.realistic_seconds <= finish.conservative_seconds);
        assert!(fields.nutrition.total_carbs_g > 0);
    }

    #[test]
    fn test_plan_config_validation() {
        assert!(PlanConfig::default().validate().is_ok());

        let negative_margin = PlanConfig {
            competitive_margin_percent: Decimal::NEGATIVE_ONE,
            ..PlanConfig::default()
        };
        assert!(matches!(negative_margin.validate(), Err(PlanConfigError::NegativeMargin(_))));

        let mut slow_optimist = PlanConfig::default();
        slow_optimist.pacing.optimistic_transition_factor = 1.5;
        assert!(matches!(slow_optimist.validate(), Err(PlanConfigError::Pacing(_))));
    }

    #[test]
    fn test_regenerate_keeps_identity() {
        let generator = RacePlanGenerator::new();
        let mut plan = RacePlan::new(generator.generate_full_race_plan(&request(GoalType::Finish)));
        let id = plan.id;

        let mut hotter = request(GoalType::Finish);
        hotter.conditions = Some(RaceConditions {
            temperature_high_c: Some(32.0),
            ..RaceConditions::default()
        });
        plan.regenerate(generator.generate_full_race_plan(&hotter));

        assert_eq!(plan.id, id);
        assert!(plan.fields.pacing.adjustments.heat_percent > Decimal::ZERO);

        let records = plan.checklist_records();
        assert_eq!(records.len(), plan.fields.equipment.checklist.len());
        assert!(records.iter().all(|r| r.plan_id == id && !r.completed));
    }

    #[test]
    fn test_parse_goal_and_classification() {
        assert_eq!("personal-best".parse::<GoalType>(), Ok(GoalType::PersonalBest));
        assert_eq!("qualify".parse::<GoalType>(), Ok(GoalType::Qualification));
        assert_eq!("pro".parse::<Classification>(), Ok(Classification::Professional));
        assert!("winner".parse::<GoalType>().is_err());
    }
}
