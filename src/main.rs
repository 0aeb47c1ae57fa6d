use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use tripace::config::AppConfig;
use tripace::efficiency::EfficiencyAnalyzer;
use tripace::error::TriPaceError;
use tripace::export::{self, ExportFormat};
use tripace::logging::{init_logging, LogFormat, LogLevel};
use tripace::models::{ManualLog, SessionMetric, Sport, Units, Workout};
use tripace::pmc::{PmcMetrics, TsbInterpretation};
use tripace::qualification::{
    assess_qualification_readiness, find_standard, Gender, QualificationStandard,
};
use tripace::race_plan::pacing::{PacingPlan, Splits};
use tripace::race_plan::{RacePlan, RacePlanRequest};
use tripace::thresholds::LactateThresholdEstimator;
use tripace::units::{format_duration, format_pace, pace_per_km_to_per_mile, PaceUnit};
use tripace::TssThresholds;

/// TriPace - training load and race planning for triathletes
///
/// Reads workout, sample and log records exported as JSON arrays and derives
/// training load, efficiency, heart-rate zones and race plans.
#[derive(Parser)]
#[command(name = "tripace")]
#[command(version)]
#[command(about = "Training load analytics and race planning", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Training load (CTL/ATL/TSB) from a workout file
    Load {
        /// JSON array of workouts
        #[arg(short, long)]
        workouts: PathBuf,

        /// Only show days from this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Number of most recent days to show
        #[arg(short, long, default_value_t = 14)]
        limit: usize,

        /// FTP in watts for power-based TSS
        #[arg(long)]
        ftp: Option<u16>,

        /// Lactate threshold heart rate
        #[arg(long)]
        lthr: Option<u16>,

        /// Write the full series to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format (csv, json)
        #[arg(short = 'f', long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Efficiency factor per workout and its 30-day trend
    Efficiency {
        #[arg(short, long)]
        workouts: PathBuf,

        /// Sport for the trend (swim, bike, run)
        #[arg(short, long, default_value = "bike")]
        sport: Sport,

        /// Trend reference date, defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short = 'f', long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Aerobic decoupling of one session
    Decoupling {
        /// JSON array of session samples
        #[arg(short, long)]
        samples: PathBuf,

        /// Only use samples of this workout
        #[arg(long)]
        workout: Option<String>,
    },

    /// LT1/LT2 and heart-rate zones
    Thresholds {
        /// Maximum heart rate (estimated from age when omitted)
        #[arg(long)]
        max_hr: Option<u16>,

        #[arg(long)]
        resting_hr: u16,

        #[arg(long)]
        age: Option<u8>,
    },

    /// Fitness snapshot as of a date
    Snapshot {
        #[arg(short, long)]
        workouts: PathBuf,

        /// JSON array of manual logs
        #[arg(short, long)]
        logs: Option<PathBuf>,

        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Generate a race plan from a JSON request
    Plan {
        /// JSON race plan request
        #[arg(short, long)]
        request: PathBuf,

        /// Write the plan as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Readiness against a qualifying standard
    Readiness {
        /// Estimated finish time in seconds or H:MM:SS
        #[arg(short, long)]
        estimate: String,

        /// JSON array of qualification standards
        #[arg(short, long)]
        standards: PathBuf,

        #[arg(long)]
        championship: String,

        #[arg(long)]
        gender: Option<Gender>,

        #[arg(long)]
        age_group: Option<String>,

        #[arg(short, long)]
        workouts: Option<PathBuf>,

        #[arg(short, long)]
        logs: Option<PathBuf>,

        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Show or create the configuration file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,

        /// Print the config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Tabled)]
struct PmcRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "TSS")]
    tss: String,
    #[tabled(rename = "CTL")]
    ctl: String,
    #[tabled(rename = "ATL")]
    atl: String,
    #[tabled(rename = "TSB")]
    tsb: String,
    #[tabled(rename = "Form")]
    form: String,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Range (bpm)")]
    range: String,
    #[tabled(rename = "Purpose")]
    description: String,
}

#[derive(Tabled)]
struct LegRow {
    #[tabled(rename = "Leg")]
    leg: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Optimistic")]
    optimistic: String,
    #[tabled(rename = "Realistic")]
    realistic: String,
    #[tabled(rename = "Conservative")]
    conservative: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let message = match e.downcast_ref::<TriPaceError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match (&cli.config, &cli.command) {
        // `config --init` creates the file it is pointed at
        (Some(path), Commands::Config { .. }) if !path.exists() => AppConfig::default(),
        (Some(path), _) => AppConfig::load_from_file(path)?,
        (None, _) => AppConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    log_config.level = match cli.verbose {
        0 => log_config.level,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Load {
            workouts,
            from,
            limit,
            ftp,
            lthr,
            output,
            format,
        } => {
            let workouts: Vec<Workout> = export::read_json_records(&workouts)?;
            let thresholds = TssThresholds {
                ftp,
                lthr,
                ..TssThresholds::default()
            };
            let calculator = config.pmc_calculator();
            let series = calculator.calculate_series(&workouts, &thresholds);
            if series.is_empty() {
                println!("{}", "No workouts to analyze".yellow());
                return Ok(());
            }

            let shown: Vec<&PmcMetrics> = series
                .iter()
                .filter(|m| from.map_or(true, |f| m.date >= f))
                .collect();
            let start = shown.len().saturating_sub(limit);
            print_pmc(&shown[start..]);

            if let Ok(trends) = calculator.analyze_trends(&series) {
                println!(
                    "Trends: CTL {:?}, ATL {:?}, TSB {:?}, {} ATL spikes",
                    trends.ctl_trend, trends.atl_trend, trends.tsb_trend, trends.atl_spike_count
                );
            }
            if let Some(latest) = series.last() {
                for rec in calculator.generate_recommendations(latest) {
                    println!("  • {}", rec);
                }
            }

            if let Some(path) = output {
                export::export_pmc(&series, format, &path)
                    .map_err(TriPaceError::from)
                    .with_context(|| format!("Failed to export to {}", path.display()))?;
                println!("{} {}", "✓ Exported to".green(), path.display());
            }
        }

        Commands::Efficiency {
            workouts,
            sport,
            as_of,
            output,
            format,
        } => {
            let workouts: Vec<Workout> = export::read_json_records(&workouts)?;
            let analyzer = config.efficiency_analyzer();
            let points = analyzer.ef_series(&workouts);
            println!("{} workouts with an efficiency factor", points.len());

            let as_of = as_of.unwrap_or_else(today);
            match analyzer.ef_trend(&workouts, sport, as_of) {
                Some(trend) => {
                    let change = format!("{}%", trend.percent_change);
                    let change = if trend.percent_change >= Decimal::ZERO {
                        change.green()
                    } else {
                        change.red()
                    };
                    println!(
                        "{} EF: {} (last 30 days, {} workouts) \
                         vs {} (previous 30 days, {} workouts): {}",
                        sport,
                        trend.recent_mean.round_dp(3),
                        trend.recent_count,
                        trend.previous_mean.round_dp(3),
                        trend.previous_count,
                        change
                    );
                }
                None => println!("{}", "Not enough workouts in both windows for a trend".yellow()),
            }

            if let Some(path) = output {
                export::export_ef(&points, format, &path)
                    .map_err(TriPaceError::from)
                    .with_context(|| format!("Failed to export to {}", path.display()))?;
                println!("{} {}", "✓ Exported to".green(), path.display());
            }
        }

        Commands::Decoupling { samples, workout } => {
            let mut samples: Vec<SessionMetric> = export::read_json_records(&samples)?;
            if let Some(id) = workout {
                samples.retain(|s| s.workout_id == id);
            }
            let analyzer: EfficiencyAnalyzer = config.efficiency_analyzer();
            match analyzer.analyze_decoupling(&samples) {
                Some(analysis) => {
                    println!(
                        "Decoupling: {} ({})",
                        format!("{}%", analysis.decoupling_percent)
                            .color(analysis.classification.color()),
                        analysis.classification.label()
                    );
                    println!(
                        "  First half ratio {}, second half ratio {}, {} samples ({:?})",
                        analysis.first_half_ratio.round_dp(3),
                        analysis.second_half_ratio.round_dp(3),
                        analysis.sample_count,
                        analysis.channel
                    );
                }
                None => println!("{}", "Not enough paired samples for decoupling".yellow()),
            }
        }

        Commands::Thresholds {
            max_hr,
            resting_hr,
            age,
        } => {
            let max_hr = max_hr
                .or_else(|| age.and_then(LactateThresholdEstimator::estimate_max_hr_from_age))
                .context("Provide --max-hr or --age")?;
            let thresholds = config
                .threshold_estimator()
                .estimate(max_hr, resting_hr)
                .map_err(TriPaceError::from)?;

            println!(
                "LT1 {} bpm, LT2 {} bpm (reserve {} bpm)",
                thresholds.lt1.to_string().bold(),
                thresholds.lt2.to_string().bold(),
                thresholds.heart_rate_reserve
            );
            let rows: Vec<ZoneRow> = thresholds
                .zones
                .iter()
                .map(|z| ZoneRow {
                    zone: z.number,
                    name: z.name.color(z.color.as_str()).to_string(),
                    range: format!("{}-{}", z.min_bpm, z.max_bpm),
                    description: z.description.clone(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Snapshot {
            workouts,
            logs,
            as_of,
        } => {
            let workouts: Vec<Workout> = export::read_json_records(&workouts)?;
            let logs = read_logs(logs.as_deref())?;
            let snapshot = config.snapshot_builder().build(
                &workouts,
                &logs,
                as_of.unwrap_or_else(today),
                config.athlete.age_grading_multiplier,
            );
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Commands::Plan { request, output } => {
            let request: RacePlanRequest = read_json(&request)?;
            let fields = config.plan_generator().generate_full_race_plan(&request);
            let plan = RacePlan::new(fields);
            print_plan(&plan, config.athlete.preferred_units);

            if let Some(path) = output {
                std::fs::write(&path, serde_json::to_string_pretty(&plan)?)
                    .with_context(|| format!("Failed to write plan to {}", path.display()))?;
                println!("{} {}", "✓ Plan written to".green(), path.display());
            }
        }

        Commands::Readiness {
            estimate,
            standards,
            championship,
            gender,
            age_group,
            workouts,
            logs,
            as_of,
        } => {
            let estimate = parse_duration(&estimate)?;
            let standards: Vec<QualificationStandard> = export::read_json_records(&standards)?;
            let gender = gender
                .or(config.athlete.gender)
                .context("Provide --gender or set athlete.gender in the config")?;
            let age_group = age_group
                .or_else(|| config.athlete.age_group.clone())
                .context("Provide --age-group or set athlete.age_group in the config")?;

            let Some(standard) = find_standard(&standards, &championship, gender, &age_group) else {
                println!(
                    "{}",
                    format!("No standard for {} {} {}", championship, gender.as_str(), age_group)
                        .yellow()
                );
                return Ok(());
            };

            let workouts: Vec<Workout> = match workouts {
                Some(path) => export::read_json_records(&path)?,
                None => Vec::new(),
            };
            let logs = read_logs(logs.as_deref())?;
            let snapshot = config.snapshot_builder().build(
                &workouts,
                &logs,
                as_of.unwrap_or_else(today),
                config.athlete.age_grading_multiplier,
            );

            let readiness = assess_qualification_readiness(estimate, standard, &snapshot);
            let verdict = if readiness.ready {
                "READY".green().bold()
            } else {
                "NOT YET".red().bold()
            };
            println!("{} {}", verdict, readiness.explanation);
            for rec in &readiness.recommendations {
                println!("  • {}", rec);
            }
        }

        Commands::Config { init, path } => {
            let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
            if path {
                println!("{}", config_path.display());
            } else if init {
                if config_path.exists() {
                    println!("Config already exists at {}", config_path.display());
                } else {
                    let mut fresh = AppConfig::default();
                    fresh.save_to_file(&config_path)?;
                    println!("{} {}", "✓ Wrote default config to".green(), config_path.display());
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_logs(path: Option<&Path>) -> Result<Vec<ManualLog>> {
    match path {
        Some(path) => Ok(export::read_json_records(path)?),
        None => Ok(Vec::new()),
    }
}

/// Seconds, M:SS or H:MM:SS
fn parse_duration(text: &str) -> Result<u32> {
    let parts = text
        .split(':')
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid duration: {}", text))?;
    match parts.as_slice() {
        [s] => Ok(*s),
        [m, s] => Ok(m * 60 + s),
        [h, m, s] => Ok(h * 3600 + m * 60 + s),
        _ => anyhow::bail!("Invalid duration: {}", text),
    }
}

fn print_pmc(series: &[&PmcMetrics]) {
    let rows: Vec<PmcRow> = series
        .iter()
        .map(|m| {
            let tsb = m.tsb.round_dp(1).to_string();
            let tsb = if m.tsb >= Decimal::ZERO { tsb.green() } else { tsb.red() };
            let mut form = TsbInterpretation::from_tsb(m.tsb).description().to_string();
            if m.atl_spike {
                form.push_str(" (spike)");
            }
            PmcRow {
                date: m.date.to_string(),
                tss: m.daily_tss.round_dp(0).to_string(),
                ctl: m.ctl.round_dp(1).to_string(),
                atl: m.atl.round_dp(1).to_string(),
                tsb: tsb.to_string(),
                form,
            }
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_plan(plan: &RacePlan, units: Units) {
    let fields = &plan.fields;
    println!(
        "{} {} ({})",
        "Race plan:".bold(),
        fields.race_name.bold(),
        fields.distance.distance.label()
    );
    if let Some(days) = fields.days_until_race {
        println!("  {} days to race day", days);
    }
    for warning in &fields.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }

    println!("{}", Table::new(leg_rows(&fields.pacing, units)).with(Style::rounded()));
    println!(
        "Finish: {} optimistic, {} realistic, {} conservative",
        format_duration(fields.pacing.finish.optimistic_seconds).green(),
        format_duration(fields.pacing.finish.realistic_seconds).bold(),
        format_duration(fields.pacing.finish.conservative_seconds).red()
    );

    let nutrition = &fields.nutrition;
    println!(
        "Nutrition: {} g carbohydrate, {} ml fluid, {} mg sodium, {} feeds",
        nutrition.total_carbs_g,
        nutrition.total_fluid_ml,
        nutrition.total_sodium_mg,
        nutrition.feeding_schedule.len()
    );
    println!(
        "Checklist: {} items; mindset focus: {}",
        fields.equipment.checklist.len(),
        fields.mindset.focus
    );

    if let Some(target) = &fields.qualification_target {
        let flag = if fields.qualification_competitive {
            "competitive".green()
        } else {
            "not competitive".red()
        };
        println!(
            "Qualification: {} {} target {} ({})",
            target.year,
            target.championship,
            format_duration(target.target_seconds),
            flag
        );
    }
    if let Some(readiness) = &fields.readiness {
        println!("  {}", readiness.explanation);
    }
}

fn leg_rows(pacing: &PacingPlan, units: Units) -> Vec<LegRow> {
    let mut rows = Vec::new();
    let times = |leg: fn(&Splits) -> u32| {
        [
            format_duration(leg(&pacing.optimistic_splits)),
            format_duration(leg(&pacing.realistic_splits)),
            format_duration(leg(&pacing.conservative_splits)),
        ]
    };

    if let Some(swim) = &pacing.swim {
        let [optimistic, realistic, conservative] = times(|s| s.swim_seconds);
        rows.push(LegRow {
            leg: "Swim".to_string(),
            target: format!(
                "{}-{}",
                format_pace(swim.target_pace_fast, PaceUnit::Per100Meters),
                format_pace(swim.target_pace_slow, PaceUnit::Per100Meters)
            ),
            optimistic,
            realistic,
            conservative,
        });
    }
    if let Some(bike) = &pacing.bike {
        let [optimistic, realistic, conservative] = times(|s| s.bike_seconds);
        rows.push(LegRow {
            leg: "Bike".to_string(),
            target: format!("{}-{} W", bike.target_power_low, bike.target_power_high),
            optimistic,
            realistic,
            conservative,
        });
    }
    if let Some(run) = &pacing.run {
        let [optimistic, realistic, conservative] = times(|s| s.run_seconds);
        let (fast, slow, unit) = match units {
            Units::Metric => (run.target_pace_fast, run.target_pace_slow, PaceUnit::PerKilometer),
            Units::Imperial => (
                pace_per_km_to_per_mile(f64::from(run.target_pace_fast)).round() as u32,
                pace_per_km_to_per_mile(f64::from(run.target_pace_slow)).round() as u32,
                PaceUnit::PerMile,
            ),
        };
        rows.push(LegRow {
            leg: "Run".to_string(),
            target: format!("{}-{}", format_pace(fast, unit), format_pace(slow, unit)),
            optimistic,
            realistic,
            conservative,
        });
    }
    rows
}
