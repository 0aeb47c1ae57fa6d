use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::efficiency::{EfficiencyAnalyzer, EfficiencyConfig};
use crate::error::TriPaceError;
use crate::fitness::{SnapshotBuilder, SnapshotConfig};
use crate::logging::LogConfig;
use crate::models::Units;
use crate::pmc::{PmcCalculator, PmcConfig};
use crate::qualification::Gender;
use crate::race_plan::{Classification, PlanConfig, RacePlanGenerator};
use crate::thresholds::{LactateThresholdConfig, LactateThresholdEstimator};
use crate::tss::{TssCalculator, TssConfig};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Performance Management Chart settings
    pub pmc: PmcConfig,

    /// TSS estimation fallbacks
    pub tss: TssConfig,

    /// Lactate threshold anchors and plausibility limits
    pub thresholds: LactateThresholdConfig,

    pub efficiency: EfficiencyConfig,

    /// Fitness snapshot windows and factors
    pub snapshot: SnapshotConfig,

    /// Race plan generation
    pub plan: PlanConfig,

    pub logging: LogConfig,

    /// Defaults for the athlete using this installation
    pub athlete: AthleteSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Athlete defaults used when a command does not say otherwise
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteSettings {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    /// Age group label as used by qualification standards, e.g. "M40-44"
    pub age_group: Option<String>,
    pub classification: Classification,
    pub age_grading_multiplier: Option<Decimal>,
    pub preferred_units: Units,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            pmc: PmcConfig::default(),
            tss: TssConfig::default(),
            thresholds: LactateThresholdConfig::default(),
            efficiency: EfficiencyConfig::default(),
            snapshot: SnapshotConfig::default(),
            plan: PlanConfig::default(),
            logging: LogConfig::default(),
            athlete: AthleteSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tripace")
            .join("config.toml")
    }

    /// Load from the default path, falling back to defaults when the file
    /// is missing or invalid
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();
        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {:#}", config_path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_default(&mut self) -> Result<PathBuf> {
        let config_path = Self::default_config_path();
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }

    /// Check every section for values the calculators cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        self.pmc
            .validate()
            .map_err(|e| TriPaceError::configuration("pmc", e))?;
        self.tss
            .validate()
            .map_err(|e| TriPaceError::configuration("tss", e))?;
        self.thresholds
            .validate()
            .map_err(|e| TriPaceError::configuration("thresholds", e))?;
        self.plan
            .validate()
            .map_err(|e| TriPaceError::configuration("plan", e))?;
        Ok(())
    }

    pub fn tss_calculator(&self) -> TssCalculator {
        TssCalculator::with_config(self.tss.clone())
    }

    pub fn pmc_calculator(&self) -> PmcCalculator {
        PmcCalculator::with_configs(self.pmc.clone(), self.tss.clone())
    }

    pub fn threshold_estimator(&self) -> LactateThresholdEstimator {
        LactateThresholdEstimator::with_config(self.thresholds.clone())
    }

    pub fn efficiency_analyzer(&self) -> EfficiencyAnalyzer {
        EfficiencyAnalyzer::with_config(self.efficiency.clone())
    }

    pub fn snapshot_builder(&self) -> SnapshotBuilder {
        SnapshotBuilder::with_calculators(
            self.snapshot.clone(),
            self.pmc_calculator(),
            self.threshold_estimator(),
        )
    }

    pub fn plan_generator(&self) -> RacePlanGenerator {
        RacePlanGenerator::with_config(self.plan.clone())
            .with_snapshot_builder(self.snapshot_builder())
    }
}
