use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::metrics::{PerformanceMetrics, SpanStrategy};

const HOME_DIR_NAME: &str = ".hrm";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where the JSON stores live. Defaults to `~/.hrm`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub metrics: MetricsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    pub hours_per_day: f64,
    pub span_strategy: SpanStrategy,
    /// Calendar used for day and month boundaries, in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            hours_per_day: 8.0,
            span_strategy: SpanStrategy::default(),
            utc_offset_minutes: 0,
        }
    }
}

impl MetricsSection {
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("utc_offset_minutes out of range: {}", self.utc_offset_minutes))
    }

    pub fn engine(&self) -> Result<PerformanceMetrics> {
        if !(self.hours_per_day > 0.0 && self.hours_per_day <= 24.0) {
            return Err(anyhow!("hours_per_day must be in (0, 24], got {}", self.hours_per_day));
        }
        Ok(PerformanceMetrics::new(self.hours_per_day, self.span_strategy, self.offset()?))
    }
}

impl Config {
    /// Data directory, falling back to `home`.
    pub fn data_dir(&self, home: &Path) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| home.to_path_buf())
    }
}

/// Resolves and creates the application home (`base` or `~/.hrm`).
pub fn ensure_home(base: Option<PathBuf>) -> Result<PathBuf> {
    let path = match base {
        Some(dir) => dir,
        None => {
            let home_dir = dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?;
            home_dir.join(HOME_DIR_NAME)
        }
    };
    fs::create_dir_all(&path).with_context(|| format!("create {}", path.display()))?;
    Ok(path)
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE_NAME)
}

pub fn load_config(home: &Path) -> Result<Config> {
    let p = config_path(home);
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn render_config(cfg: &Config) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

pub fn save_config(home: &Path, cfg: &Config) -> Result<()> {
    let p = config_path(home);
    let s = render_config(cfg)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Writes the default config unless one exists. Returns whether a file was written.
pub fn init_config(home: &Path) -> Result<bool> {
    if config_path(home).exists() {
        return Ok(false);
    }
    save_config(home, &Config::default())?;
    Ok(true)
}
