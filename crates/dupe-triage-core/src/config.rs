use crate::classify::{ThresholdMode, Thresholds};
use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub root_paths: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_fingerprint_cache_path")]
    pub fingerprint_cache_path: String,
    #[serde(default)]
    pub threshold_mode: ThresholdMode,
    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: f64,
    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: f64,
}

fn default_catalog_path() -> String {
    "dupe_triage.db".to_string()
}

fn default_fingerprint_cache_path() -> String {
    "fingerprint_cache.db".to_string()
}

fn default_lower_threshold() -> f64 {
    Thresholds::DEFAULT_LOWER
}

fn default_upper_threshold() -> f64 {
    Thresholds::DEFAULT_UPPER
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            root_paths: Vec::new(),
            ignore_patterns: Vec::new(),
            catalog_path: default_catalog_path(),
            fingerprint_cache_path: default_fingerprint_cache_path(),
            threshold_mode: ThresholdMode::default(),
            lower_threshold: default_lower_threshold(),
            upper_threshold: default_upper_threshold(),
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        let mut should_add = true;
        let result_clone = result.clone();

        for res_dir in &result_clone {
            let res_dir_path = Path::new(res_dir);

            if dir_path.starts_with(res_dir_path) {
                should_add = false;
                break;
            }

            if res_dir_path.starts_with(dir_path) {
                result.retain(|x| x != res_dir);
                break;
            }
        }

        if should_add {
            result.push(dir);
        }
    }

    result
}
