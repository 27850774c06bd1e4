use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default sentence encoder. Produces 384-dimensional vectors.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Tunable policy constants for classification, similarity and analytics.
///
/// None of these are calibrated against labeled data. Each can be overridden
/// per deployment through environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Minimum cosine score for a duplicate/similar match (default 0.75)
    pub similarity_threshold: f64,
    /// Semantic confidence at or above which the embedding winner is trusted (default 0.50)
    pub semantic_trust_threshold: f64,
    /// Weight of the keyword score added to a trusted semantic winner (default 0.2)
    pub keyword_boost_weight: f64,
    /// Weight of the semantic score added when keyword and semantic winners agree (default 0.3)
    pub agreement_boost_weight: f64,
    /// Multiplier turning a normalized keyword score into a confidence (default 2.0)
    pub keyword_multiplier: f64,
    /// Percent change beyond which a category is rising/falling (default 20.0)
    pub trend_cutoff_pct: f64,
    /// Percent change beyond which a trend is high severity (default 50.0)
    pub trend_high_cutoff_pct: f64,
    /// Standard deviations above the mean for a daily spike (default 2.5)
    pub spike_k: f64,
    /// Standard deviations above the mean for a high-severity spike (default 4.0)
    pub spike_high_k: f64,
    /// Factor over the anomaly threshold for a high-severity hotspot (default 1.5)
    pub anomaly_severity_multiplier: f64,
    /// Days of daily counts considered by spike detection (default 7)
    pub spike_days: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
            semantic_trust_threshold: 0.50,
            keyword_boost_weight: 0.2,
            agreement_boost_weight: 0.3,
            keyword_multiplier: 2.0,
            trend_cutoff_pct: 20.0,
            trend_high_cutoff_pct: 50.0,
            spike_k: 2.5,
            spike_high_k: 4.0,
            anomaly_severity_multiplier: 1.5,
            spike_days: 7,
        }
    }
}

impl EngineSettings {
    /// Read overrides from the environment, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            similarity_threshold: env_f64(
                "WASTEWATCH_SIMILARITY_THRESHOLD",
                d.similarity_threshold,
            )?,
            semantic_trust_threshold: env_f64(
                "WASTEWATCH_SEMANTIC_TRUST",
                d.semantic_trust_threshold,
            )?,
            keyword_boost_weight: env_f64("WASTEWATCH_KEYWORD_BOOST", d.keyword_boost_weight)?,
            agreement_boost_weight: env_f64(
                "WASTEWATCH_AGREEMENT_BOOST",
                d.agreement_boost_weight,
            )?,
            keyword_multiplier: env_f64("WASTEWATCH_KEYWORD_MULTIPLIER", d.keyword_multiplier)?,
            trend_cutoff_pct: env_f64("WASTEWATCH_TREND_CUTOFF", d.trend_cutoff_pct)?,
            trend_high_cutoff_pct: env_f64(
                "WASTEWATCH_TREND_HIGH_CUTOFF",
                d.trend_high_cutoff_pct,
            )?,
            spike_k: env_f64("WASTEWATCH_SPIKE_K", d.spike_k)?,
            spike_high_k: env_f64("WASTEWATCH_SPIKE_HIGH_K", d.spike_high_k)?,
            anomaly_severity_multiplier: env_f64(
                "WASTEWATCH_ANOMALY_SEVERITY",
                d.anomaly_severity_multiplier,
            )?,
            spike_days: d.spike_days,
        })
    }
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Directory containing downloaded model subdirectories
    pub model_dir: PathBuf,
    /// Sentence encoder identifier (HuggingFace sentence-transformers name)
    pub model_name: String,
    pub log_format: LogFormat,
    pub engine: EngineSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default, so this only fails on malformed values.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("WASTEWATCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embedding::download::default_model_dir());

        Ok(Self {
            db_path: env::var("WASTEWATCH_DB_PATH")
                .unwrap_or_else(|_| "./wastewatch.db".to_string()),
            model_dir,
            model_name: env::var("WASTEWATCH_MODEL_NAME")
                .unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string()),
            log_format: log_format_from_env(),
            engine: EngineSettings::from_env()?,
        })
    }

    /// Check that the encoder model files are on disk.
    /// Call this before any operation that needs embeddings.
    pub fn require_model(&self) -> Result<()> {
        if !crate::embedding::download::model_files_present(&self.model_dir, &self.model_name) {
            anyhow::bail!(
                "Embedding model {} not found in {}\n\
                 Run `wastewatch download-model` to download it.",
                self.model_name,
                self.model_dir.display()
            );
        }
        Ok(())
    }
}

/// Read the log format without loading the rest of the config, so logging can
/// be set up before anything else runs.
pub fn log_format_from_env() -> LogFormat {
    match env::var("WASTEWATCH_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

fn env_f64(name: &str, default: f64) -> Result<f64> {
    match env::var(name) {
        Ok(raw) => parse_f64(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_f64(name: &str, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a number, got {raw:?}"))?;
    if !value.is_finite() {
        anyhow::bail!("{name} must be finite, got {raw:?}");
    }
    Ok(value)
}
