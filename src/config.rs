use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Parser};

use crate::classifier::SvmConfig;
use crate::colours::{FIRST_SEASON, LAST_SEASON, TEAMS};

/// Load `.env.local` then `.env`; variables already set in the environment win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Match results CSV.
    #[arg(long, env = "AFL_CSV_PATH", default_value = "AFL.csv")]
    pub csv: PathBuf,

    #[arg(long, env = "AFL_TEAM", default_value = "Geelong")]
    pub team: String,

    #[arg(long, env = "AFL_SEASON", default_value_t = LAST_SEASON)]
    pub season: i32,
}

impl DataArgs {
    pub fn validate(&self) -> Result<()> {
        if !TEAMS.contains(&self.team.as_str()) {
            bail!(
                "unknown team {:?}; expected one of: {}",
                self.team,
                TEAMS.join(", ")
            );
        }
        if !(FIRST_SEASON..=LAST_SEASON).contains(&self.season) {
            bail!(
                "season {} outside {FIRST_SEASON}..={LAST_SEASON}",
                self.season
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct SvmArgs {
    #[arg(long = "svm-epochs", env = "AFL_SVM_EPOCHS", default_value_t = 20)]
    pub epochs: usize,

    #[arg(long = "svm-lambda", env = "AFL_SVM_LAMBDA", default_value_t = 1e-3)]
    pub lambda: f64,

    #[arg(long = "svm-seed", env = "AFL_SVM_SEED", default_value_t = 0)]
    pub seed: u64,
}

impl SvmArgs {
    pub fn config(&self) -> Result<SvmConfig> {
        if !(self.lambda.is_finite() && self.lambda > 0.0) {
            bail!("svm lambda must be positive, got {}", self.lambda);
        }
        Ok(SvmConfig {
            lambda: self.lambda,
            epochs: self.epochs.max(1),
            seed: self.seed,
            ..SvmConfig::default()
        })
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "afl_terminal", about = "Terminal dashboard for AFL match results")]
pub struct Settings {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub svm: SvmArgs,

    #[arg(long, env = "AFL_LOG_FILE", default_value = "afl_terminal.log")]
    pub log_file: PathBuf,

    #[arg(long, env = "AFL_EXPORT_PATH", default_value = "afl_dashboard.xlsx")]
    pub export_path: PathBuf,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.svm.config()?;
        Ok(())
    }
}
