use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tripace::config::AppConfig;
use tripace::fitness::DataSupport;
use tripace::models::{LogCategory, LogType, ManualLog, Sport, Workout, WorkoutSummary};
use tripace::qualification::{Gender, QualificationStandard, StandardRule};
use tripace::race_plan::distances::RaceDistance;
use tripace::race_plan::{
    Classification, CourseProfile, GoalType, RaceConditions, RacePlan, RacePlanGenerator,
    RacePlanRequest, WaterType,
};
use tripace::{PmcCalculator, SnapshotBuilder, TssThresholds};

/// Integration tests that run complete workflows from records to plans

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn workout(
    id: String,
    date: NaiveDate,
    sport: Sport,
    seconds: u32,
    summary: WorkoutSummary,
) -> Workout {
    Workout {
        id,
        date,
        sport,
        duration_seconds: seconds,
        perceived_exertion: None,
        summary,
        notes: None,
        athlete_id: Some("athlete-1".to_string()),
    }
}

/// Twelve weeks of swim, bike, run and long ride ending on 2024-05-31
fn training_block() -> Vec<Workout> {
    let start = date(2024, 3, 9);
    let mut workouts = Vec::new();
    for week in 0..12u64 {
        let monday = start + Days::new(week * 7);
        workouts.push(workout(
            format!("swim-{}", week),
            monday,
            Sport::Swim,
            2400,
            WorkoutSummary {
                total_distance: Some(dec!(2000)),
                avg_heart_rate: Some(140),
                ..WorkoutSummary::default()
            },
        ));
        workouts.push(workout(
            format!("bike-{}", week),
            monday + Days::new(2),
            Sport::Bike,
            3600,
            WorkoutSummary {
                avg_power: Some(230),
                normalized_power: Some(240),
                avg_heart_rate: Some(150),
                max_heart_rate: Some(178),
                ..WorkoutSummary::default()
            },
        ));
        workouts.push(workout(
            format!("run-{}", week),
            monday + Days::new(4),
            Sport::Run,
            3000,
            WorkoutSummary {
                total_distance: Some(dec!(10000)),
                avg_heart_rate: Some(158),
                ..WorkoutSummary::default()
            },
        ));
        workouts.push(workout(
            format!("long-ride-{}", week),
            monday + Days::new(5),
            Sport::Bike,
            7200,
            WorkoutSummary {
                avg_power: Some(190),
                normalized_power: Some(200),
                avg_heart_rate: Some(135),
                total_distance: Some(dec!(60000)),
                ..WorkoutSummary::default()
            },
        ));
    }
    workouts
}

fn logs() -> Vec<ManualLog> {
    let log = |date: NaiveDate, category: LogCategory, log_type: LogType, value: Decimal| {
        ManualLog {
            date,
            category,
            log_type,
            value,
        }
    };
    vec![
        log(date(2024, 5, 20), LogCategory::Physiological, LogType::MaxHeartRate, dec!(190)),
        log(date(2024, 5, 28), LogCategory::Physiological, LogType::RestingHeartRate, dec!(49)),
        log(date(2024, 5, 29), LogCategory::Physiological, LogType::RestingHeartRate, dec!(51)),
        log(date(2024, 5, 30), LogCategory::Metabolic, LogType::BodyWeight, dec!(72)),
        // Declared under the wrong category and ignored
        log(date(2024, 5, 31), LogCategory::Environmental, LogType::RestingHeartRate, dec!(80)),
    ]
}

fn request(goal_type: GoalType) -> RacePlanRequest {
    RacePlanRequest {
        workouts: training_block(),
        logs: logs(),
        distance: RaceDistance::Olympic,
        goal_type,
        race_name: "Lake City Olympic".to_string(),
        conditions: Some(RaceConditions {
            temperature_high_c: Some(26.0),
            humidity_percent: Some(65.0),
            water_type: Some(WaterType::Lake),
            water_temperature_c: Some(21.0),
            course_profile: Some(CourseProfile::Rolling),
            ..RaceConditions::default()
        }),
        classification: Classification::AgeGroup,
        standards: vec![QualificationStandard {
            championship: "World Triathlon Age Group Championships".to_string(),
            year: 2024,
            gender: Gender::Male,
            age_group: "M40-44".to_string(),
            rule: StandardRule::AgeGraded {
                multiplier: dec!(1.25),
                reference_seconds: 6_600,
            },
        }],
        gender: Some(Gender::Male),
        age_group: Some("M40-44".to_string()),
        custom_distances: None,
        as_of: date(2024, 6, 1),
        race_date: Some(date(2024, 6, 30)),
        championship: None,
        age_grading_multiplier: None,
    }
}

#[test]
fn test_snapshot_from_training_block() {
    let snapshot = SnapshotBuilder::new().build(&training_block(), &logs(), date(2024, 6, 1), None);

    assert_eq!(snapshot.ftp_watts, Some(240));
    // Best run is under an hour: 300 s/km slowed by 4%
    assert_eq!(snapshot.threshold_run_pace, Some(312));
    // 120 s/100m swum, CSS 2% slower
    assert_eq!(snapshot.css_pace, Some(122));
    assert_eq!(snapshot.max_hr, Some(190));
    assert_eq!(snapshot.resting_hr, Some(50));
    assert_eq!(snapshot.body_weight_kg, Some(dec!(72)));
    assert_eq!(snapshot.lactate_thresholds.as_ref().map(|t| t.lt1), Some(148));
    assert_eq!(snapshot.data_support, DataSupport::High);

    let form = snapshot.form.expect("training load projected to as_of");
    assert_eq!(form.date, date(2024, 6, 1));
    assert_eq!(form.tsb, form.ctl - form.atl);
}

#[test]
fn test_pmc_series_over_block() {
    let workouts = training_block();
    let thresholds = TssThresholds {
        ftp: Some(240),
        ..TssThresholds::default()
    };
    let series = PmcCalculator::new().calculate_series(&workouts, &thresholds);

    // One point per day from the first to the last workout
    let first = series.first().unwrap().date;
    let last = series.last().unwrap().date;
    assert_eq!(first, date(2024, 3, 9));
    assert_eq!(series.len() as i64, (last - first).num_days() + 1);

    for point in &series {
        assert!(point.ctl >= Decimal::ZERO);
        assert!(point.atl >= Decimal::ZERO);
        assert_eq!(point.tsb, point.ctl - point.atl);
    }
}

#[test]
fn test_full_race_plan_workflow() {
    let generator = RacePlanGenerator::new();
    let fields = generator.generate_full_race_plan(&request(GoalType::Qualification));

    assert_eq!(fields.days_until_race, Some(29));
    assert_eq!(fields.snapshot.ftp_watts, Some(240));

    let finish = fields.pacing.finish;
    assert!(finish.optimistic_seconds <= finish.realistic_seconds);
    assert!(finish.realistic_seconds <= finish.conservative_seconds);
    assert!(fields.pacing.adjustments.heat_percent > Decimal::ZERO);
    assert_eq!(fields.pacing.adjustments.wetsuit, Some(true));

    let splits = fields.pacing.realistic_splits;
    for leg in &fields.nutrition.legs {
        let expected = match leg.sport {
            Sport::Swim => splits.swim_seconds,
            Sport::Bike => splits.bike_seconds,
            Sport::Run => splits.run_seconds,
            Sport::Brick => unreachable!("no brick leg in a triathlon"),
        };
        assert_eq!(leg.duration_seconds, expected);
    }
    // The weight log drives the per-kilogram pre-race targets
    assert_eq!(fields.nutrition.pre_race.daily_carbs_g, 504);

    // 6600 × 1.25 = 8250 s target
    let target = fields.qualification_target.as_ref().unwrap();
    assert_eq!(target.target_seconds, 8_250);
    assert_eq!(target.estimated_seconds, finish.realistic_seconds);
    let readiness = fields.readiness.as_ref().unwrap();
    assert_eq!(
        readiness.gap_seconds,
        i64::from(finish.realistic_seconds) - 8_250
    );
    assert_eq!(readiness.ready, readiness.gap_seconds <= 0);
    assert_eq!(readiness.confidence, DataSupport::High);

    assert!(fields
        .equipment
        .checklist
        .iter()
        .any(|item| item.item == "Wetsuit"));
    assert!(fields.mindset.professional_tactics.is_empty());
}

#[test]
fn test_plan_regeneration_keeps_identity() {
    let generator = RacePlanGenerator::new();
    let mut plan = RacePlan::new(generator.generate_full_race_plan(&request(GoalType::Finish)));
    let id = plan.id;

    let mut later = request(GoalType::Finish);
    later.as_of = date(2024, 6, 15);
    plan.regenerate(generator.generate_full_race_plan(&later));

    assert_eq!(plan.id, id);
    assert_eq!(plan.fields.days_until_race, Some(15));

    let json = serde_json::to_string(&plan).unwrap();
    let back: RacePlan = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, id);
}

#[test]
fn test_configured_generator_matches_default() {
    let config = AppConfig::default();
    let request = request(GoalType::PersonalBest);

    let configured = config.plan_generator().generate_full_race_plan(&request);
    let default = RacePlanGenerator::new().generate_full_race_plan(&request);
    assert_eq!(configured, default);
}

#[test]
fn test_request_from_json() {
    let json = r#"{
        "distance": "half_ironman",
        "goal_type": "podium",
        "race_name": "Coastal 70.3",
        "as_of": "2024-06-01",
        "classification": "professional",
        "conditions": { "water_type": "ocean", "wind": "strong" }
    }"#;
    let request: RacePlanRequest = serde_json::from_str(json).unwrap();
    assert!(request.workouts.is_empty());

    let fields = RacePlanGenerator::new().generate_full_race_plan(&request);
    assert_eq!(fields.snapshot.data_support, DataSupport::Low);
    assert!(!fields.mindset.professional_tactics.is_empty());
    assert!(fields.days_until_race.is_none());
    assert!(fields.warnings.iter().any(|w| w.contains("FTP")));
}
