use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GoalsetError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

// ── Null handling ─────────────────────────────────────────────

/// What to do when a referenced field has no usable numeric value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullHandling {
    /// Block the action and report the null field in the goal sentinel.
    #[default]
    Flag,
    /// Keep evaluating; null operands of actions count as zero.
    Ignore,
}

impl NullHandling {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullHandling::Flag => "flag",
            NullHandling::Ignore => "ignore",
        }
    }
}

impl fmt::Display for NullHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NullHandling {
    type Err = GoalsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flag" => Ok(NullHandling::Flag),
            "ignore" => Ok(NullHandling::Ignore),
            other => Err(GoalsetError::InvalidConfig(format!(
                "unknown null handling '{other}' (expected 'flag' or 'ignore')"
            ))),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

pub const DEFAULT_BPS_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub goals: GoalConfig,
    pub data: DataConfig,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Invalid settings that fell back to defaults. Reported by
    /// [`Config::log_summary`] once a subscriber is installed.
    #[serde(skip)]
    pub fallbacks: Vec<String>,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `GOALSET_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("GOALSET_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let mut fallbacks = Vec::new();
        Self {
            profile: p.to_string(),
            goals: GoalConfig::from_env_profiled(p, &mut fallbacks),
            data: DataConfig::from_env_profiled(p),
            log_level: profiled_env_or(p, "GOALSET_LOG", "warn"),
            fallbacks,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    pub fn log_summary(&self) {
        for fallback in &self.fallbacks {
            tracing::warn!("{fallback}");
        }
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  goals:  bps_threshold={}, null_handling={}",
            self.goals.bps_threshold,
            self.goals.null_handling
        );
        tracing::info!(
            "  data:   process_column={}, rules_path={}",
            self.data.process_column.as_deref().unwrap_or("(first column)"),
            self.data.rules_path.display()
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            goals: GoalConfig::default(),
            data: DataConfig::default(),
            log_level: "warn".to_string(),
            fallbacks: Vec::new(),
        }
    }
}

// ── Goals ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GoalConfig {
    /// Spread between tiers, in basis points.
    pub bps_threshold: f64,
    pub null_handling: NullHandling,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            bps_threshold: DEFAULT_BPS_THRESHOLD,
            null_handling: NullHandling::Flag,
        }
    }
}

impl GoalConfig {
    fn from_env_profiled(p: &str, fallbacks: &mut Vec<String>) -> Self {
        let bps_threshold = match profiled_env_opt(p, "GOALSET_BPS_THRESHOLD") {
            None => DEFAULT_BPS_THRESHOLD,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    fallbacks.push(format!(
                        "invalid GOALSET_BPS_THRESHOLD '{raw}', using {DEFAULT_BPS_THRESHOLD}"
                    ));
                    DEFAULT_BPS_THRESHOLD
                }
            },
        };

        let null_handling = match profiled_env_opt(p, "GOALSET_NULL_HANDLING") {
            None => NullHandling::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e: GoalsetError| {
                fallbacks.push(format!(
                    "invalid GOALSET_NULL_HANDLING: {e}, using {}",
                    NullHandling::default()
                ));
                NullHandling::default()
            }),
        };

        Self {
            bps_threshold,
            null_handling,
        }
    }
}

// ── Data ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Explicit process column; the first column of the sheet when unset.
    pub process_column: Option<String>,
    /// Rule store file (JSON or YAML, chosen by extension).
    pub rules_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            process_column: None,
            rules_path: PathBuf::from("data/rules/rules.json"),
        }
    }
}

impl DataConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            process_column: profiled_env_opt(p, "GOALSET_PROCESS_COLUMN"),
            rules_path: PathBuf::from(profiled_env_or(
                p,
                "GOALSET_RULES_PATH",
                "data/rules/rules.json",
            )),
        }
    }
}
