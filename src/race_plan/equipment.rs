//! Race-day checklist and race-week timeline

use super::distances::{DistanceCategory, ResolvedDistance};
use super::nutrition::NutritionPlan;
use super::pacing::ConditionAdjustments;
use super::{CourseProfile, RaceConditions, Wind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Water colder than this calls for cold-water swim gear
const COLD_WATER_C: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Swim,
    Bike,
    Run,
    Transition,
    Nutrition,
    SpecialNeeds,
}

impl EquipmentCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentCategory::Swim => "Swim",
            EquipmentCategory::Bike => "Bike",
            EquipmentCategory::Run => "Run",
            EquipmentCategory::Transition => "Transition",
            EquipmentCategory::Nutrition => "Nutrition",
            EquipmentCategory::SpecialNeeds => "Special Needs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub category: EquipmentCategory,
    pub item: String,
    pub required: bool,
}

/// Task scheduled a number of days before the race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineTask {
    pub days_before: u32,
    /// Calendar date, when the race date is known
    pub date: Option<NaiveDate>,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentPlan {
    pub checklist: Vec<ChecklistItem>,
    /// Ordered from the earliest task to race morning
    pub timeline: Vec<TimelineTask>,
}

impl EquipmentPlan {
    pub fn items_in(&self, category: EquipmentCategory) -> impl Iterator<Item = &ChecklistItem> {
        self.checklist.iter().filter(move |i| i.category == category)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EquipmentPlanner;

impl EquipmentPlanner {
    pub fn new() -> Self {
        EquipmentPlanner
    }

    pub fn plan(
        &self,
        distance: &ResolvedDistance,
        adjustments: &ConditionAdjustments,
        conditions: Option<&RaceConditions>,
        nutrition: &NutritionPlan,
        race_date: Option<NaiveDate>,
    ) -> EquipmentPlan {
        let mut checklist = Vec::new();
        let mut add = |category: EquipmentCategory, item: &str, required: bool| {
            checklist.push(ChecklistItem {
                category,
                item: item.to_string(),
                required,
            });
        };
        let long_course = distance.category.is_long_course();
        let hot = adjustments.heat_percent > Decimal::ZERO;

        if distance.legs.swim_meters > 0 {
            add(EquipmentCategory::Swim, "Goggles (plus a spare pair)", true);
            add(EquipmentCategory::Swim, "Race swim cap", true);
            match adjustments.wetsuit {
                Some(true) => {
                    add(EquipmentCategory::Swim, "Wetsuit", true);
                    add(EquipmentCategory::Swim, "Anti-chafe lubricant", true);
                }
                Some(false) if long_course => add(EquipmentCategory::Swim, "Swimskin", false),
                _ => {}
            }
            if adjustments.open_water {
                add(EquipmentCategory::Swim, "Tinted goggles for sighting", false);
            }
            let cold_water = conditions
                .and_then(|c| c.water_temperature_c)
                .map_or(false, |t| t < COLD_WATER_C);
            if cold_water {
                add(EquipmentCategory::Swim, "Neoprene cap", false);
                add(EquipmentCategory::Swim, "Earplugs", false);
            }
        }

        if distance.legs.bike_meters > 0 {
            add(EquipmentCategory::Bike, "Bike, serviced and race ready", true);
            add(EquipmentCategory::Bike, "Helmet", true);
            add(EquipmentCategory::Bike, "Bike shoes", true);
            add(EquipmentCategory::Bike, "Spare tube, levers and CO2", true);
            add(EquipmentCategory::Bike, "Sunglasses", false);
            match adjustments.course_profile {
                CourseProfile::Hilly | CourseProfile::Mountainous => {
                    add(EquipmentCategory::Bike, "Climbing gearing (wide-range cassette)", true)
                }
                CourseProfile::Flat | CourseProfile::Rolling => {}
            }
            if adjustments.wind == Wind::Strong {
                add(EquipmentCategory::Bike, "Shallower front wheel for crosswinds", false);
            }
            if hot || long_course {
                add(EquipmentCategory::Bike, "Extra bottle cage", false);
            }
        }

        if distance.legs.run_meters > 0 {
            add(EquipmentCategory::Run, "Run shoes with elastic laces", true);
            add(EquipmentCategory::Run, "Race belt with number", true);
            add(EquipmentCategory::Run, "Cap or visor", false);
            if hot {
                add(EquipmentCategory::Run, "Sunscreen", true);
                add(EquipmentCategory::Run, "Ice sleeves or neck cooler", false);
            }
        }

        add(EquipmentCategory::Transition, "Transition towel", true);
        add(EquipmentCategory::Transition, "Bike pump for race morning", true);
        if long_course {
            add(EquipmentCategory::Transition, "Labelled transition bags", true);
        }

        let feeds = nutrition.feeding_schedule.len();
        if feeds > 0 {
            add(
                EquipmentCategory::Nutrition,
                &format!(
                    "{} gels or feeds for the race ({} g carbohydrate)",
                    feeds, nutrition.total_carbs_g
                ),
                true,
            );
        }
        add(EquipmentCategory::Nutrition, "Bottles with drink mix", true);
        add(EquipmentCategory::Nutrition, "Electrolyte tablets or capsules", hot);
        add(EquipmentCategory::Nutrition, "Race-morning breakfast", true);

        if long_course {
            for item in [
                "Bike special needs bag: spare nutrition and tube",
                "Run special needs bag: dry socks and salty snack",
            ] {
                add(EquipmentCategory::SpecialNeeds, item, false);
            }
        }

        EquipmentPlan {
            checklist,
            timeline: self.timeline(distance.category, nutrition, race_date),
        }
    }

    fn timeline(
        &self,
        category: DistanceCategory,
        nutrition: &NutritionPlan,
        race_date: Option<NaiveDate>,
    ) -> Vec<TimelineTask> {
        let mut tasks: Vec<(u32, String)> = vec![
            (7, "Last key session at race pace, then begin the taper".to_string()),
            (5, "Check tyres, chain, brakes and gears; replace worn parts".to_string()),
            (2, "Pack every item on the checklist".to_string()),
            (1, "Check in, rack the bike and preview the course; short shakeout".to_string()),
            (
                0,
                format!(
                    "Eat breakfast {} hours before the start and set up transition early",
                    nutrition.race_morning.breakfast_hours_before_start
                ),
            ),
        ];
        if category.is_long_course() {
            tasks.push((10, "Final long brick at goal effort".to_string()));
        }
        if nutrition.pre_race.carb_loading_days > 0 {
            tasks.push((
                nutrition.pre_race.carb_loading_days,
                format!(
                    "Start carb loading: about {} g carbohydrate per day",
                    nutrition.pre_race.daily_carbs_g
                ),
            ));
        }

        // Stable sort keeps insertion order within a day
        tasks.sort_by(|a, b| b.0.cmp(&a.0));
        tasks
            .into_iter()
            .map(|(days_before, task)| TimelineTask {
                days_before,
                date: race_date
                    .and_then(|d| d.checked_sub_days(chrono::Days::new(u64::from(days_before)))),
                task,
            })
            .collect()
    }
}
