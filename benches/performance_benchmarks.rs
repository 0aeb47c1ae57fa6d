use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal_macros::dec;
use tripace::models::{
    LogCategory, LogType, ManualLog, SessionMetric, Sport, Workout, WorkoutSummary,
};
use tripace::pmc::AthleteHistory;
use tripace::race_plan::distances::RaceDistance;
use tripace::race_plan::{GoalType, RacePlanGenerator, RacePlanRequest};
use tripace::{EfficiencyAnalyzer, PmcCalculator, TssCalculator, TssThresholds};

/// Performance benchmarks for the analytics engine
///
/// Dataset sizes range from a single week to several seasons so that the
/// daily series and plan generation can be checked for scalability.

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn thresholds() -> TssThresholds {
    TssThresholds {
        ftp: Some(250),
        lthr: Some(165),
        threshold_run_pace: Some(270),
        css_pace: Some(105),
    }
}

/// One workout per day rotating through the three sports
fn create_workout_series(days: u64) -> Vec<Workout> {
    (0..days)
        .map(|day| {
            let (sport, summary, seconds) = match day % 3 {
                0 => (
                    Sport::Swim,
                    WorkoutSummary {
                        total_distance: Some(dec!(2500)),
                        avg_heart_rate: Some(138),
                        ..WorkoutSummary::default()
                    },
                    2700,
                ),
                1 => (
                    Sport::Bike,
                    WorkoutSummary {
                        avg_power: Some(200 + (day % 40) as u16),
                        normalized_power: Some(215 + (day % 40) as u16),
                        avg_heart_rate: Some(145),
                        ..WorkoutSummary::default()
                    },
                    5400,
                ),
                _ => (
                    Sport::Run,
                    WorkoutSummary {
                        total_distance: Some(dec!(12000)),
                        avg_pace: Some(dec!(300)),
                        avg_heart_rate: Some(152),
                        ..WorkoutSummary::default()
                    },
                    3600,
                ),
            };
            Workout {
                id: format!("bench-{}", day),
                date: start_date() + Days::new(day),
                sport,
                duration_seconds: seconds,
                perceived_exertion: None,
                summary,
                notes: None,
                athlete_id: Some("bench".to_string()),
            }
        })
        .collect()
}

fn create_session(samples: u32) -> Vec<SessionMetric> {
    (0..samples)
        .map(|i| SessionMetric {
            workout_id: "bench-session".to_string(),
            offset_seconds: i,
            heart_rate: Some(140 + (i % 15) as u16),
            power: Some(220 + (i % 30) as u16),
            ..SessionMetric::default()
        })
        .collect()
}

fn bench_tss_calculation(c: &mut Criterion) {
    let calculator = TssCalculator::new();
    let thresholds = thresholds();

    let mut group = c.benchmark_group("TSS Calculation");

    for &size in &[1u64, 10, 100, 1000] {
        let workouts = create_workout_series(size);

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("calculate_tss", size), &workouts, |b, workouts| {
            b.iter(|| {
                for workout in workouts {
                    black_box(calculator.calculate_tss(workout, &thresholds));
                }
            });
        });
    }

    group.finish();
}

fn bench_pmc_calculation(c: &mut Criterion) {
    let calculator = PmcCalculator::new();
    let thresholds = thresholds();

    let mut group = c.benchmark_group("PMC Calculation");

    for &days in &[7u64, 30, 90, 365, 1095] {
        let workouts = create_workout_series(days);

        group.throughput(Throughput::Elements(days));
        group.bench_with_input(
            BenchmarkId::new("calculate_series", days),
            &workouts,
            |b, workouts| {
                b.iter(|| black_box(calculator.calculate_series(workouts, &thresholds)));
            },
        );
    }

    group.finish();
}

fn bench_pmc_batch(c: &mut Criterion) {
    let calculator = PmcCalculator::new();

    let mut group = c.benchmark_group("PMC Batch");
    group.sample_size(20);

    for &athletes in &[4usize, 16, 64] {
        let histories: Vec<AthleteHistory> = (0..athletes)
            .map(|i| AthleteHistory {
                athlete_id: format!("athlete-{}", i),
                workouts: create_workout_series(365),
                thresholds: thresholds(),
            })
            .collect();

        group.throughput(Throughput::Elements(athletes as u64));
        group.bench_with_input(
            BenchmarkId::new("calculate_batch", athletes),
            &histories,
            |b, histories| {
                b.iter(|| black_box(calculator.calculate_batch(histories)));
            },
        );
    }

    group.finish();
}

fn bench_decoupling(c: &mut Criterion) {
    let analyzer = EfficiencyAnalyzer::new();

    let mut group = c.benchmark_group("Aerobic Decoupling");

    // One sample per second, 30 minutes to 4 hours
    for &seconds in &[1800u32, 3600, 7200, 14400] {
        let session = create_session(seconds);

        group.throughput(Throughput::Elements(u64::from(seconds)));
        group.bench_with_input(
            BenchmarkId::new("analyze_decoupling", seconds),
            &session,
            |b, session| {
                b.iter(|| black_box(analyzer.analyze_decoupling(session)));
            },
        );
    }

    group.finish();
}

fn bench_race_plan_generation(c: &mut Criterion) {
    let generator = RacePlanGenerator::new();
    let workouts = create_workout_series(365);
    let logs = vec![
        ManualLog {
            date: start_date() + Days::new(300),
            category: LogCategory::Physiological,
            log_type: LogType::MaxHeartRate,
            value: dec!(188),
        },
        ManualLog {
            date: start_date() + Days::new(360),
            category: LogCategory::Physiological,
            log_type: LogType::RestingHeartRate,
            value: dec!(48),
        },
    ];

    let mut group = c.benchmark_group("Race Plan Generation");

    for distance in [
        RaceDistance::Sprint,
        RaceDistance::Olympic,
        RaceDistance::HalfIronman,
        RaceDistance::Ironman,
    ] {
        let request = RacePlanRequest {
            workouts: workouts.clone(),
            logs: logs.clone(),
            distance,
            goal_type: GoalType::PersonalBest,
            race_name: "Benchmark Race".to_string(),
            conditions: None,
            classification: Default::default(),
            standards: Vec::new(),
            gender: None,
            age_group: None,
            custom_distances: None,
            as_of: start_date() + Days::new(365),
            race_date: Some(start_date() + Days::new(400)),
            championship: None,
            age_grading_multiplier: None,
        };

        group.bench_with_input(
            BenchmarkId::new("generate_full_race_plan", format!("{:?}", distance)),
            &request,
            |b, request| {
                b.iter(|| black_box(generator.generate_full_race_plan(request)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tss_calculation,
    bench_pmc_calculation,
    bench_pmc_batch,
    bench_decoupling,
    bench_race_plan_generation,
);

criterion_main!(benches);
