//! Workflow tuning and layered settings loading.
//!
//! Priority (highest first):
//! 1. `CHUNLIAN_` environment variables (`CHUNLIAN_LLM__MODEL`,
//!    `CHUNLIAN_WORKFLOW__BANNER_COUNT`, …; `__` separates the table)
//! 2. An explicit config file passed to [`Settings::load`]
//! 3. `chunlian.toml` in the working directory
//! 4. The flat connection variables read by [`LlmConfig::from_env`]
//! 5. Default values

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use chunlian_core::{
    config::LlmConfig,
    validate::{char_count, validate_banner_set},
};
use chunlian_types::couplet::BannerCount;

pub const PROJECT_CONFIG_FILE: &str = "chunlian.toml";
pub const ENV_PREFIX: &str = "CHUNLIAN_";

pub const DEFAULT_BANNERS: [&str; 6] = ["春回大地", "万象更新", "吉星高照", "福气满满", "财源广进", "合家欢乐"];
pub const DEFAULT_HORIZONTAL_SCROLL: &str = "新春大吉";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] Box<figment::Error>),
    #[error("invalid workflow config: {0}")]
    Invalid(String),
}

/// Retry budgets and fallbacks of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Upper/lower pair attempts before election.
    pub couplet_attempts: u32,
    pub banner_attempts: u32,
    pub analysis_attempts: u32,
    pub banner_count: BannerCount,
    pub banner_chars: usize,
    /// Run the model format review on every length-compliant pair.
    pub review_couplets: bool,
    /// Used when every banner attempt failed. Entries of the wrong length
    /// are skipped and the set is topped up from [`DEFAULT_BANNERS`].
    pub default_banners: Vec<String>,
    pub default_horizontal_scroll: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            couplet_attempts: 5,
            banner_attempts: 5,
            analysis_attempts: 3,
            banner_count: BannerCount::default(),
            banner_chars: 4,
            review_couplets: false,
            default_banners: DEFAULT_BANNERS.iter().map(|s| s.to_string()).collect(),
            default_horizontal_scroll: DEFAULT_HORIZONTAL_SCROLL.to_owned(),
        }
    }
}

impl WorkflowConfig {
    pub fn with_couplet_attempts(mut self, attempts: u32) -> Self {
        self.couplet_attempts = attempts;
        self
    }

    pub fn with_banner_count(mut self, count: BannerCount) -> Self {
        self.banner_count = count;
        self
    }

    pub fn with_review(mut self, enabled: bool) -> Self {
        self.review_couplets = enabled;
        self
    }

    /// The fallback banner set for the configured count.
    pub fn fallback_banners(&self) -> Vec<String> {
        let mut banners: Vec<String> = Vec::with_capacity(self.banner_count.get());
        let configured = self.default_banners.iter().map(String::as_str);
        for banner in configured.chain(DEFAULT_BANNERS) {
            if banners.len() == self.banner_count.get() {
                break;
            }
            if char_count(banner) == self.banner_chars && !banners.iter().any(|b| b == banner) {
                banners.push(banner.to_owned());
            }
        }
        banners
    }

    /// Every budget must allow at least one attempt and the fallback banners
    /// must themselves pass banner validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.couplet_attempts == 0 || self.banner_attempts == 0 || self.analysis_attempts == 0 {
            return Err(ConfigError::Invalid("attempt budgets must be at least 1".into()));
        }
        if let Some(bad) = self
            .default_banners
            .iter()
            .find(|b| char_count(b) != self.banner_chars)
        {
            return Err(ConfigError::Invalid(format!(
                "default banner \"{bad}\" is not {} characters",
                self.banner_chars
            )));
        }
        let outcome = validate_banner_set(
            &self.fallback_banners(),
            self.banner_count.get(),
            self.banner_chars,
        );
        if !outcome.passed {
            return Err(ConfigError::Invalid(format!(
                "default banners: {}",
                outcome.reason()
            )));
        }
        Ok(())
    }
}

/// Everything a deployment configures: `[llm]` and `[workflow]` tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmConfig,
    pub workflow: WorkflowConfig,
}

impl Settings {
    /// Load settings from defaults, `chunlian.toml`, `config_path` and the
    /// environment, in that order.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = Settings {
            llm: LlmConfig::from_env(),
            workflow: WorkflowConfig::default(),
        };
        let mut figment = Figment::new().merge(Serialized::defaults(base));

        let project = Path::new(PROJECT_CONFIG_FILE);
        if project.exists() {
            figment = figment.merge(Toml::file(project));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut settings: Settings = figment.extract().map_err(Box::new)?;
        settings.llm.base_url = chunlian_core::config::normalize_base_url(&settings.llm.base_url);
        settings.workflow.validate()?;
        Ok(settings)
    }
}
