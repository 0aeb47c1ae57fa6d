//! Race fueling: hourly targets per leg, pre-race plan and feeding schedule

use super::distances::DistanceCategory;
use super::pacing::PacingPlan;
use super::PlanConfigError;
use crate::models::Sport;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fueling constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionConfig {
    /// Carbohydrate per hour by expected race duration
    pub short_race_carbs_g_per_hour: u32,
    pub medium_race_carbs_g_per_hour: u32,
    pub long_race_carbs_g_per_hour: u32,
    pub short_race_max_seconds: u32,
    pub medium_race_max_seconds: u32,
    /// Share of the bike carbohydrate rate tolerated while running
    pub run_carb_fraction: Decimal,

    pub base_sodium_mg_per_hour: u32,
    pub max_sodium_mg_per_hour: u32,
    /// Extra sodium per percent of heat adjustment
    pub sodium_mg_per_heat_percent: u32,

    pub base_fluid_ml_per_hour: u32,
    pub fluid_ml_per_kg: Decimal,
    pub min_fluid_ml_per_hour: u32,
    pub max_fluid_ml_per_hour: u32,
    pub fluid_ml_per_heat_percent: u32,
    /// Ceiling once the heat allowance is added
    pub max_fluid_with_heat_ml_per_hour: u32,

    pub bike_feed_interval_seconds: u32,
    pub run_feed_interval_seconds: u32,
    pub calories_per_gram_carb: u32,
    /// Body weight assumed for per-kilogram targets when none is logged
    pub default_body_weight_kg: Decimal,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        NutritionConfig {
            short_race_carbs_g_per_hour: 30,
            medium_race_carbs_g_per_hour: 60,
            long_race_carbs_g_per_hour: 85,
            short_race_max_seconds: 75 * 60,
            medium_race_max_seconds: 150 * 60,
            run_carb_fraction: dec!(0.8),
            base_sodium_mg_per_hour: 500,
            max_sodium_mg_per_hour: 1000,
            sodium_mg_per_heat_percent: 50,
            base_fluid_ml_per_hour: 500,
            fluid_ml_per_kg: dec!(7),
            min_fluid_ml_per_hour: 400,
            max_fluid_ml_per_hour: 800,
            fluid_ml_per_heat_percent: 50,
            max_fluid_with_heat_ml_per_hour: 1000,
            bike_feed_interval_seconds: 20 * 60,
            run_feed_interval_seconds: 30 * 60,
            calories_per_gram_carb: 4,
            default_body_weight_kg: dec!(70),
        }
    }
}

impl NutritionConfig {
    /// Reject tiers and limits that overlap or invert
    pub fn validate(&self) -> Result<(), PlanConfigError> {
        let invalid = |reason: String| Err(PlanConfigError::Nutrition(reason));
        if self.short_race_max_seconds > self.medium_race_max_seconds {
            return invalid(format!(
                "short_race_max_seconds {} is above medium_race_max_seconds {}",
                self.short_race_max_seconds, self.medium_race_max_seconds
            ));
        }
        if self.run_carb_fraction < Decimal::ZERO || self.run_carb_fraction > Decimal::ONE {
            return invalid(format!(
                "run_carb_fraction {} must lie between 0 and 1",
                self.run_carb_fraction
            ));
        }
        if self.base_sodium_mg_per_hour > self.max_sodium_mg_per_hour {
            return invalid(format!(
                "base_sodium_mg_per_hour {} is above max_sodium_mg_per_hour {}",
                self.base_sodium_mg_per_hour, self.max_sodium_mg_per_hour
            ));
        }
        if self.min_fluid_ml_per_hour > self.max_fluid_ml_per_hour {
            return invalid(format!(
                "min_fluid_ml_per_hour {} is above max_fluid_ml_per_hour {}",
                self.min_fluid_ml_per_hour, self.max_fluid_ml_per_hour
            ));
        }
        if self.max_fluid_ml_per_hour > self.max_fluid_with_heat_ml_per_hour {
            return invalid(format!(
                "max_fluid_ml_per_hour {} is above max_fluid_with_heat_ml_per_hour {}",
                self.max_fluid_ml_per_hour, self.max_fluid_with_heat_ml_per_hour
            ));
        }
        if self.fluid_ml_per_kg < Decimal::ZERO {
            return invalid(format!("fluid_ml_per_kg {} cannot be negative", self.fluid_ml_per_kg));
        }
        if self.default_body_weight_kg <= Decimal::ZERO {
            return invalid(format!(
                "default_body_weight_kg {} must be positive",
                self.default_body_weight_kg
            ));
        }
        Ok(())
    }
}

/// Hourly targets and totals for one leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegNutrition {
    pub sport: Sport,
    pub duration_seconds: u32,
    pub carbs_g_per_hour: u32,
    pub sodium_mg_per_hour: u32,
    pub fluid_ml_per_hour: u32,
    pub total_carbs_g: u32,
    pub total_sodium_mg: u32,
    pub total_fluid_ml: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreRacePlan {
    pub carb_loading_days: u32,
    pub carbs_g_per_kg_per_day: Decimal,
    pub daily_carbs_g: u32,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceMorningPlan {
    pub breakfast_hours_before_start: u32,
    pub breakfast_carbs_g: u32,
    pub fluid_ml: u32,
    pub pre_start_carbs_g: u32,
    pub items: Vec<String>,
}

/// One planned intake, timed from the race start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedingEvent {
    pub elapsed_seconds: u32,
    pub sport: Sport,
    pub item: String,
    pub carbs_g: u32,
    pub fluid_ml: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionPlan {
    pub legs: Vec<LegNutrition>,
    pub pre_race: PreRacePlan,
    pub race_morning: RaceMorningPlan,
    pub feeding_schedule: Vec<FeedingEvent>,
    pub total_carbs_g: u32,
    pub total_sodium_mg: u32,
    pub total_fluid_ml: u32,
    pub total_calories: u32,
}

#[derive(Debug, Clone, Default)]
pub struct NutritionPlanner {
    config: NutritionConfig,
}

impl NutritionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NutritionConfig) -> Self {
        NutritionPlanner { config }
    }

    /// Fueling plan sized to the realistic pacing splits
    pub fn plan(&self, pacing: &PacingPlan, body_weight_kg: Option<Decimal>) -> NutritionPlan {
        let splits = &pacing.realistic_splits;
        let heat = pacing.adjustments.heat_percent;
        let weight = body_weight_kg
            .filter(|w| *w > Decimal::ZERO)
            .unwrap_or(self.config.default_body_weight_kg);

        let carbs = self.carbs_per_hour(splits.total_seconds());
        let sodium = self.sodium_per_hour(heat);
        let fluid = self.fluid_per_hour(heat, body_weight_kg);
        let run_carbs = round_u32(Decimal::from(carbs) * self.config.run_carb_fraction);

        let mut legs = Vec::new();
        if splits.swim_seconds > 0 {
            // Nothing is taken on during the swim
            legs.push(Self::leg(Sport::Swim, splits.swim_seconds, 0, 0, 0));
        }
        if splits.bike_seconds > 0 {
            legs.push(Self::leg(Sport::Bike, splits.bike_seconds, carbs, sodium, fluid));
        }
        if splits.run_seconds > 0 {
            legs.push(Self::leg(Sport::Run, splits.run_seconds, run_carbs, sodium, fluid));
        }

        let feeding_schedule = self.feeding_schedule(pacing, carbs, run_carbs, fluid);

        let total = |amount: fn(&LegNutrition) -> u32| {
            legs.iter().map(amount).fold(0u32, u32::saturating_add)
        };
        let total_carbs_g = total(|l| l.total_carbs_g);
        NutritionPlan {
            pre_race: self.pre_race(pacing.category, weight),
            race_morning: self.race_morning(pacing.category, weight),
            feeding_schedule,
            total_carbs_g,
            total_sodium_mg: total(|l| l.total_sodium_mg),
            total_fluid_ml: total(|l| l.total_fluid_ml),
            total_calories: total_carbs_g.saturating_mul(self.config.calories_per_gram_carb),
            legs,
        }
    }

    pub fn carbs_per_hour(&self, race_seconds: u32) -> u32 {
        if race_seconds <= self.config.short_race_max_seconds {
            self.config.short_race_carbs_g_per_hour
        } else if race_seconds <= self.config.medium_race_max_seconds {
            self.config.medium_race_carbs_g_per_hour
        } else {
            self.config.long_race_carbs_g_per_hour
        }
    }

    pub fn sodium_per_hour(&self, heat_percent: Decimal) -> u32 {
        let extra = round_u32(heat_percent * Decimal::from(self.config.sodium_mg_per_heat_percent));
        self.config
            .base_sodium_mg_per_hour
            .saturating_add(extra)
            .min(self.config.max_sodium_mg_per_hour)
    }

    /// Sweat-rate proxy: per-kilogram when weight is known, plus heat
    pub fn fluid_per_hour(&self, heat_percent: Decimal, body_weight_kg: Option<Decimal>) -> u32 {
        let base = body_weight_kg
            .filter(|w| *w > Decimal::ZERO)
            .map(|w| {
                round_u32(per_kg(w, self.config.fluid_ml_per_kg))
                    .clamp(self.config.min_fluid_ml_per_hour, self.config.max_fluid_ml_per_hour)
            })
            .unwrap_or(self.config.base_fluid_ml_per_hour);
        let extra = round_u32(heat_percent * Decimal::from(self.config.fluid_ml_per_heat_percent));
        base.saturating_add(extra).min(self.config.max_fluid_with_heat_ml_per_hour)
    }

    fn leg(sport: Sport, seconds: u32, carbs: u32, sodium: u32, fluid: u32) -> LegNutrition {
        let per_leg = |rate: u32| hourly_share(rate, seconds);
        LegNutrition {
            sport,
            duration_seconds: seconds,
            carbs_g_per_hour: carbs,
            sodium_mg_per_hour: sodium,
            fluid_ml_per_hour: fluid,
            total_carbs_g: per_leg(carbs),
            total_sodium_mg: per_leg(sodium),
            total_fluid_ml: per_leg(fluid),
        }
    }

    fn feeding_schedule(
        &self,
        pacing: &PacingPlan,
        bike_carbs: u32,
        run_carbs: u32,
        fluid: u32,
    ) -> Vec<FeedingEvent> {
        let splits = &pacing.realistic_splits;
        let bike_start = splits.swim_seconds.saturating_add(splits.t1_seconds);
        let run_start = bike_start
            .saturating_add(splits.bike_seconds)
            .saturating_add(splits.t2_seconds);

        let mut events = Vec::new();
        let mut push_leg =
            |sport: Sport, start: u32, seconds: u32, interval: u32, carbs: u32, item: &str| {
                if interval == 0 || carbs == 0 {
                    return;
                }
                let carbs_per_feed = hourly_share(carbs, interval);
                let fluid_per_feed = hourly_share(fluid, interval);
                let mut offset = interval;
                while offset < seconds {
                    events.push(FeedingEvent {
                        elapsed_seconds: start.saturating_add(offset),
                        sport,
                        item: item.to_string(),
                        carbs_g: carbs_per_feed,
                        fluid_ml: fluid_per_feed,
                    });
                    offset = match offset.checked_add(interval) {
                        Some(next) => next,
                        None => break,
                    };
                }
            };

        push_leg(
            Sport::Bike,
            bike_start,
            splits.bike_seconds,
            self.config.bike_feed_interval_seconds,
            bike_carbs,
            "Sports drink or gel",
        );
        push_leg(
            Sport::Run,
            run_start,
            splits.run_seconds,
            self.config.run_feed_interval_seconds,
            run_carbs,
            "Gel with water at aid station",
        );
        events
    }

    fn pre_race(&self, category: DistanceCategory, weight: Decimal) -> PreRacePlan {
        let (days, carbs_per_kg, notes): (u32, Decimal, Vec<&str>) = match category {
            DistanceCategory::Sprint => (
                0,
                dec!(5),
                vec!["Keep your normal diet; no carb loading needed"],
            ),
            DistanceCategory::Olympic => (
                1,
                dec!(7),
                vec![
                    "Increase carbohydrate the day before",
                    "Limit fibre and fat the evening before",
                ],
            ),
            DistanceCategory::Half | DistanceCategory::Full => (
                2,
                dec!(9),
                vec![
                    "Carb load for two days with familiar foods",
                    "Drink to thirst and add electrolytes the day before",
                    "Limit fibre and fat 24 hours out",
                ],
            ),
        };

        PreRacePlan {
            carb_loading_days: days,
            carbs_g_per_kg_per_day: carbs_per_kg,
            daily_carbs_g: round_u32(per_kg(weight, carbs_per_kg)),
            notes: notes.into_iter().map(String::from).collect(),
        }
    }

    fn race_morning(&self, category: DistanceCategory, weight: Decimal) -> RaceMorningPlan {
        let (hours, carbs_per_kg) = match category {
            DistanceCategory::Sprint => (2, dec!(1)),
            DistanceCategory::Olympic => (3, dec!(1.5)),
            DistanceCategory::Half | DistanceCategory::Full => (3, dec!(2)),
        };

        RaceMorningPlan {
            breakfast_hours_before_start: hours,
            breakfast_carbs_g: round_u32(per_kg(weight, carbs_per_kg)),
            fluid_ml: 500,
            pre_start_carbs_g: 25,
            items: vec![
                "Low-fibre breakfast you have tested in training".to_string(),
                "500 ml of electrolyte drink with breakfast".to_string(),
                "One gel 15 minutes before the start".to_string(),
            ],
        }
    }
}

/// Round to a whole amount, clamped to `0..=u32::MAX`
fn round_u32(value: Decimal) -> u32 {
    if value <= Decimal::ZERO {
        return 0;
    }
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// Amount of an hourly rate taken over `seconds`
fn hourly_share(rate_per_hour: u32, seconds: u32) -> u32 {
    round_u32(Decimal::from(rate_per_hour) * Decimal::from(seconds) / Decimal::from(3600))
}

/// Body weight times a per-kilogram target, saturating on overflow
fn per_kg(weight: Decimal, amount_per_kg: Decimal) -> Decimal {
    weight.checked_mul(amount_per_kg).unwrap_or(Decimal::MAX)
}
