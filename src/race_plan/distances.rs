use serde::{Deserialize, Serialize};
use tracing::warn;

/// Named triathlon race distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceDistance {
    Sprint,
    Olympic,
    HalfIronman,
    Ironman,
    Custom,
}

impl RaceDistance {
    /// Standard swim/bike/run distances, `None` for custom races
    pub fn standard_legs(&self) -> Option<LegDistances> {
        match self {
            RaceDistance::Sprint => Some(LegDistances::new(750, 20_000, 5_000)),
            RaceDistance::Olympic => Some(LegDistances::new(1_500, 40_000, 10_000)),
            RaceDistance::HalfIronman => Some(LegDistances::new(1_900, 90_000, 21_097)),
            RaceDistance::Ironman => Some(LegDistances::new(3_800, 180_000, 42_195)),
            RaceDistance::Custom => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RaceDistance::Sprint => "Sprint",
            RaceDistance::Olympic => "Olympic",
            RaceDistance::HalfIronman => "Half Ironman (70.3)",
            RaceDistance::Ironman => "Ironman (140.6)",
            RaceDistance::Custom => "Custom",
        }
    }

    /// Championship a qualification goal targets when none is named
    pub fn default_championship(&self) -> Option<&'static str> {
        match self {
            RaceDistance::Sprint | RaceDistance::Olympic => {
                Some("World Triathlon Age Group Championships")
            }
            RaceDistance::HalfIronman => Some("Ironman 70.3 World Championship"),
            RaceDistance::Ironman => Some("Ironman World Championship"),
            RaceDistance::Custom => None,
        }
    }

    /// Resolve the legs to race
    ///
    /// A custom race without caller distances falls back to Olympic.
    pub fn resolve(&self, custom: Option<&LegDistances>) -> ResolvedDistance {
        let legs = match (self.standard_legs(), custom) {
            (Some(legs), _) => legs,
            (None, Some(custom)) if custom.total_meters() > 0 => *custom,
            (None, _) => {
                warn!("Custom race without distances, using Olympic distances");
                return RaceDistance::Olympic.resolve(None);
            }
        };

        ResolvedDistance {
            distance: *self,
            category: DistanceCategory::from_legs(&legs),
            legs,
        }
    }
}

impl std::str::FromStr for RaceDistance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "sprint" => Ok(RaceDistance::Sprint),
            "olympic" | "standard" => Ok(RaceDistance::Olympic),
            "half" | "half_ironman" | "70.3" | "middle" => Ok(RaceDistance::HalfIronman),
            "ironman" | "full" | "140.6" | "long" => Ok(RaceDistance::Ironman),
            "custom" => Ok(RaceDistance::Custom),
            _ => Err(format!("Unknown race distance: {}", s)),
        }
    }
}

/// Leg distances in meters; a zero leg is not raced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegDistances {
    pub swim_meters: u32,
    pub bike_meters: u32,
    pub run_meters: u32,
}

impl LegDistances {
    pub fn new(swim_meters: u32, bike_meters: u32, run_meters: u32) -> Self {
        LegDistances {
            swim_meters,
            bike_meters,
            run_meters,
        }
    }

    pub fn total_meters(&self) -> u64 {
        u64::from(self.swim_meters) + u64::from(self.bike_meters) + u64::from(self.run_meters)
    }
}

/// Intensity category that drives pacing bands and logistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceCategory {
    Sprint,
    Olympic,
    Half,
    Full,
}

/// Olympic leg lengths used to put any leg on the bike scale
const OLYMPIC_LEGS: LegDistances = LegDistances {
    swim_meters: 1_500,
    bike_meters: 40_000,
    run_meters: 10_000,
};

impl DistanceCategory {
    /// Categorise by bike distance, which dominates race duration
    pub fn from_bike_meters(bike_meters: u64) -> Self {
        match bike_meters {
            0..=25_000 => DistanceCategory::Sprint,
            25_001..=50_000 => DistanceCategory::Olympic,
            50_001..=100_000 => DistanceCategory::Half,
            _ => DistanceCategory::Full,
        }
    }

    /// Categorise by the longest leg relative to its Olympic length
    ///
    /// Each leg is scaled to an equivalent bike distance, so a race without
    /// a bike leg is sized by the legs it does contain.
    pub fn from_legs(legs: &LegDistances) -> Self {
        let scaled = |meters: u32, olympic: u32| {
            u64::from(meters) * u64::from(OLYMPIC_LEGS.bike_meters) / u64::from(olympic)
        };
        let equivalent_bike = scaled(legs.swim_meters, OLYMPIC_LEGS.swim_meters)
            .max(u64::from(legs.bike_meters))
            .max(scaled(legs.run_meters, OLYMPIC_LEGS.run_meters));
        Self::from_bike_meters(equivalent_bike)
    }

    pub fn is_long_course(&self) -> bool {
        matches!(self, DistanceCategory::Half | DistanceCategory::Full)
    }
}

/// Distance after custom legs and fallbacks are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDistance {
    pub distance: RaceDistance,
    pub legs: LegDistances,
    pub category: DistanceCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_distances() {
        let ironman = RaceDistance::Ironman.resolve(None);
        assert_eq!(ironman.legs, LegDistances::new(3800, 180_000, 42_195));
        assert_eq!(ironman.category, DistanceCategory::Full);

        let sprint = RaceDistance::Sprint.resolve(Some(&LegDistances::new(1, 2, 3)));
        assert_eq!(sprint.legs.swim_meters, 750);
        assert_eq!(sprint.category, DistanceCategory::Sprint);
    }

    #[test]
    fn test_custom_distances() {
        let custom = LegDistances::new(0, 60_000, 15_000);
        let resolved = RaceDistance::Custom.resolve(Some(&custom));
        assert_eq!(resolved.distance, RaceDistance::Custom);
        assert_eq!(resolved.legs, custom);
        assert_eq!(resolved.category, DistanceCategory::Half);
    }

    #[test]
    fn test_custom_without_bike_is_sized_by_longest_leg() {
        let aquathlon = RaceDistance::Custom.resolve(Some(&LegDistances::new(3_800, 0, 42_195)));
        assert_eq!(aquathlon.category, DistanceCategory::Full);

        let run_only = RaceDistance::Custom.resolve(Some(&LegDistances::new(0, 0, 21_097)));
        assert_eq!(run_only.category, DistanceCategory::Half);

        let short_aquathlon =
            RaceDistance::Custom.resolve(Some(&LegDistances::new(1_000, 0, 5_000)));
        assert_eq!(short_aquathlon.category, DistanceCategory::Olympic);
    }

    #[test]
    fn test_standard_legs_keep_their_category() {
        assert_eq!(RaceDistance::Sprint.resolve(None).category, DistanceCategory::Sprint);
        assert_eq!(RaceDistance::Olympic.resolve(None).category, DistanceCategory::Olympic);
        assert_eq!(RaceDistance::HalfIronman.resolve(None).category, DistanceCategory::Half);
    }

    #[test]
    fn test_missing_custom_falls_back_to_olympic() {
        let resolved = RaceDistance::Custom.resolve(None);
        assert_eq!(resolved.distance, RaceDistance::Olympic);
        assert_eq!(resolved.legs.bike_meters, 40_000);

        let empty = RaceDistance::Custom.resolve(Some(&LegDistances::default()));
        assert_eq!(empty.distance, RaceDistance::Olympic);
    }

    #[test]
    fn test_parse_distance() {
        assert_eq!("70.3".parse::<RaceDistance>(), Ok(RaceDistance::HalfIronman));
        assert_eq!("Half-Ironman".parse::<RaceDistance>(), Ok(RaceDistance::HalfIronman));
        assert_eq!("full".parse::<RaceDistance>(), Ok(RaceDistance::Ironman));
        assert!("ultra".parse::<RaceDistance>().is_err());
    }
}
