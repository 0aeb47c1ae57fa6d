// Library interface for TriPace modules
// The binary and the integration tests both go through this crate root

pub mod config;
pub mod efficiency;
pub mod error;
pub mod export;
pub mod fitness;
pub mod logging;
pub mod models;
pub mod pmc;
pub mod qualification;
pub mod race_plan;
pub mod thresholds;
pub mod tss;
pub mod units;

// Re-export commonly used types for convenience
pub use models::*;
pub use tss::{TssCalculator, TssThresholds};
pub use pmc::{PmcCalculator, PmcMetrics};
pub use efficiency::EfficiencyAnalyzer;
pub use thresholds::{LactateThresholdEstimator, LactateThresholds};
pub use fitness::{FitnessSnapshot, SnapshotBuilder};
pub use race_plan::{RacePlan, RacePlanFields, RacePlanGenerator, RacePlanRequest};
pub use qualification::{
    assess_qualification_readiness, QualificationReadiness, QualificationStandard,
};
pub use error::{Result, TriPaceError};
pub use logging::{LogConfig, LogFormat, LogLevel};
