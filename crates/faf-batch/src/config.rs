//! Batch configuration.
//!
//! The FAF5 mode, region and commodity lists are built in; a TOML file can
//! replace any of them (every field is optional):
//!
//! ```toml
//! window = 8
//! log_dir = "logs/faf5_p2p"
//! modes = ["truck"]
//! regions = ["all", "11"]
//! commodities = ["all"]
//!
//! [program]
//! command = "python"
//! args = ["source/Point2PointFAF.py"]
//! ```

use crate::error::BatchError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Logical units launched between barriers
    #[serde(default = "default_window")]
    pub window: usize,
    /// Log directory, relative to the repository root unless absolute
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_modes")]
    pub modes: Vec<String>,
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,
    #[serde(default = "default_commodities")]
    pub commodities: Vec<String>,
    #[serde(default)]
    pub program: ProgramConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            log_dir: default_log_dir(),
            modes: default_modes(),
            regions: default_regions(),
            commodities: default_commodities(),
            program: ProgramConfig::default(),
        }
    }
}

impl BatchConfig {
    /// The full FAF5 enumeration.
    pub fn faf5() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.window == 0 {
            return Err(BatchError::InvalidConfig(
                "window must be at least 1".to_string(),
            ));
        }
        if self.modes.is_empty() {
            return Err(BatchError::InvalidConfig(
                "at least one mode is required".to_string(),
            ));
        }
        let lists = [
            ("modes", &self.modes),
            ("regions", &self.regions),
            ("commodities", &self.commodities),
        ];
        for (list, values) in lists {
            if values.iter().any(|value| value.trim().is_empty()) {
                return Err(BatchError::InvalidConfig(format!(
                    "{list} must not contain empty entries"
                )));
            }
        }
        if self.program.command.trim().is_empty() {
            return Err(BatchError::InvalidConfig(
                "program.command must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Logical units in a full run: `modes × (regions + commodities)`.
    pub fn total_units(&self) -> usize {
        self.modes.len() * (self.regions.len() + self.commodities.len())
    }

    /// Process launches in a full run; each region launches two jobs.
    pub fn total_launches(&self) -> usize {
        self.modes.len() * (2 * self.regions.len() + self.commodities.len())
    }
}

/// How to invoke the external point-to-point analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Executable; resolved against the repository root when it contains a path
    /// separator, otherwise looked up on `PATH`
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments placed before the per-job flags (e.g. the script path)
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_mode_flag")]
    pub mode_flag: String,
    #[serde(default = "default_origin_flag")]
    pub origin_flag: String,
    #[serde(default = "default_dest_flag")]
    pub dest_flag: String,
    #[serde(default = "default_commodity_flag")]
    pub commodity_flag: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            mode_flag: default_mode_flag(),
            origin_flag: default_origin_flag(),
            dest_flag: default_dest_flag(),
            commodity_flag: default_commodity_flag(),
        }
    }
}

pub fn load_batch_config(path: &Path) -> Result<BatchConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading batch config '{}'", path.display()))?;
    let config: BatchConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing batch config '{}'", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn default_window() -> usize {
    8
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs/faf5_p2p")
}

fn default_command() -> String {
    "python".to_string()
}

fn default_args() -> Vec<String> {
    vec!["source/Point2PointFAF.py".to_string()]
}

fn default_mode_flag() -> String {
    "-m".to_string()
}

fn default_origin_flag() -> String {
    "-o".to_string()
}

fn default_dest_flag() -> String {
    "-d".to_string()
}

fn default_commodity_flag() -> String {
    "-c".to_string()
}

fn default_modes() -> Vec<String> {
    to_strings(&["truck", "water", "rail"])
}

/// FAF5 zone identifiers, preceded by the whole-country aggregate.
fn default_regions() -> Vec<String> {
    let zones: &[u16] = &[
        11, 12, 19, 20, 41, 42, 49, 50, 61, 62, 63, 64, 65, 69, 81, 89, 91, 92, 99, 101, 111,
        121, 122, 123, 124, 129, 131, 139, 151, 159, 160, 171, 172, 179, 181, 182, 189, 190,
        201, 202, 209, 211, 212, 219, 221, 222, 223, 229, 230, 241, 249, 251, 252, 259, 261,
        262, 269, 271, 279, 280, 291, 292, 299, 300, 311, 319, 321, 329, 330, 341, 342, 350,
        361, 362, 363, 364, 369, 371, 372, 373, 379, 380, 391, 392, 393, 394, 395, 399, 401,
        402, 409, 411, 419, 421, 422, 429, 441, 451, 452, 459, 460, 471, 472, 473, 474, 479,
        481, 482, 483, 484, 485, 486, 489, 491, 500, 511, 512, 513, 519, 531, 532, 539, 540,
        551, 559, 560,
    ];
    std::iter::once("all".to_string())
        .chain(zones.iter().map(u16::to_string))
        .collect()
}

/// FAF5 SCTG commodity groups, preceded by the all-commodity aggregate.
fn default_commodities() -> Vec<String> {
    to_strings(&[
        "all",
        "Live animals/fish",
        "Cereal grains",
        "Other ag prods.",
        "Animal feed",
        "Meat/seafood",
        "Milled grain prods.",
        "Other foodstuffs",
        "Alcoholic beverages",
        "Tobacco prods.",
        "Building stone",
        "Natural sands",
        "Gravel",
        "Nonmetallic minerals",
        "Metallic ores",
        "Coal",
        "Crude petroleum",
        "Gasoline",
        "Fuel oils",
        "Natural gas and other fossil products",
        "Basic chemicals",
        "Pharmaceuticals",
        "Fertilizers",
        "Chemical prods.",
        "Plastics/rubber",
        "Logs",
        "Wood prods.",
        "Newsprint/paper",
        "Paper articles",
        "Printed prods.",
        "Textiles/leather",
        "Nonmetal min. prods.",
        "Base metals",
        "Articles-base metal",
        "Machinery",
        "Electronics",
        "Motorized vehicles",
        "Transport equip.",
        "Precision instruments",
        "Furniture",
        "Misc. mfg. prods.",
        "Waste/scrap",
        "Mixed freight",
    ])
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
