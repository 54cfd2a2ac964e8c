use std::{fs, time::Duration};

use log::{debug, trace, LevelFilter};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    core::{ErrorContext, OrderResult},
    form::{Schema, ToppingCatalog, ToppingsPolicy},
};

#[derive(Default, Debug, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    #[serde(default)]
    pub log: Log,

    #[validate(nested)]
    #[serde(default)]
    pub catalog: ToppingCatalog,

    #[validate(nested)]
    #[serde(default)]
    pub form: Form,

    #[validate(nested)]
    #[serde(default)]
    pub submission: Submission,
}

// Config file load and validation
impl Config {
    pub fn load_from_yaml<P>(path: P) -> OrderResult<Self>
    where
        P: AsRef<std::path::Path> + std::fmt::Display,
    {
        let conf_str = fs::read_to_string(&path)
            .map_err(|e| crate::config_error!("Unable to read conf file from {}: {}", path, e))?;
        debug!("Conf file read from {path}");
        Self::from_yaml(&conf_str)
    }

    // config file load entry point
    pub fn load_or_default(path: Option<&str>) -> OrderResult<Self> {
        match path {
            Some(path) => Self::load_from_yaml(path),
            None => {
                debug!("No conf file given, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_yaml(conf_str: &str) -> OrderResult<Self> {
        trace!("Read conf file: {conf_str}");
        let conf: Config = serde_yaml::from_str(conf_str)
            .map_err(|e| crate::config_error!("Unable to parse yaml conf: {}", e))?;

        trace!("Loaded conf: {conf:?}");

        // use validator to validate conf file
        conf.validate()?;

        Ok(conf)
    }

    pub fn to_yaml(&self) -> OrderResult<String> {
        serde_yaml::to_string(self).with_context("Unable to serialize conf")
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.form.toppings_policy)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Log {
    #[serde(default = "Log::default_level")]
    #[validate(custom(function = "Log::validate_level"))]
    pub level: String,
    /// Log file; stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            path: None,
        }
    }
}

impl Log {
    fn default_level() -> String {
        "info".to_string()
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }

    fn validate_level(level: &String) -> Result<(), ValidationError> {
        if level.parse::<LevelFilter>().is_ok() {
            Ok(())
        } else {
            let mut err = ValidationError::new("invalid_log_level");
            err.add_param("level".into(), level);
            Err(err)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Form {
    #[serde(default)]
    pub toppings_policy: ToppingsPolicy,
    #[serde(default = "Form::default_banner_timeout_ms")]
    #[validate(range(min = 1))]
    pub banner_timeout_ms: u64,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            toppings_policy: ToppingsPolicy::default(),
            banner_timeout_ms: Self::default_banner_timeout_ms(),
        }
    }
}

impl Form {
    fn default_banner_timeout_ms() -> u64 {
        5000
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_millis(self.banner_timeout_ms)
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    Accept,
    Reject,
    #[default]
    Random,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Submission {
    #[serde(default)]
    pub mode: SubmissionMode,
    /// Share of accepted orders in `random` mode (0-100).
    #[serde(default = "Submission::default_success_percentage")]
    #[validate(range(min = 0, max = 100))]
    pub success_percentage: u32,
    #[serde(default = "Submission::default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            mode: SubmissionMode::default(),
            success_percentage: Self::default_success_percentage(),
            delay_ms: Self::default_delay_ms(),
        }
    }
}

impl Submission {
    fn default_success_percentage() -> u32 {
        80
    }

    fn default_delay_ms() -> u64 {
        1000
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OrderError;

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_default_config_round_trips() {
        init_log();
        let conf = Config::default();
        let yaml = conf.to_yaml().unwrap();
        let loaded = Config::from_yaml(&yaml).unwrap();
        assert_eq!(loaded.catalog, conf.catalog);
        assert_eq!(loaded.form.banner_timeout_ms, 5000);
    }

    #[test]
    fn test_load_file() {
        init_log();
        let conf_str = r#"
---
log:
  level: debug

catalog:
  toppings:
    - id: "1"
      label: Pepperoni
    - id: "2"
      label: Olives

form:
  toppings_policy: at_least_one
  banner_timeout_ms: 3000

submission:
  mode: accept
  delay_ms: 250
        "#;
        let conf = Config::from_yaml(conf_str).unwrap();
        assert_eq!(conf.log.level_filter(), LevelFilter::Debug);
        assert_eq!(conf.catalog.len(), 2);
        assert_eq!(conf.form.toppings_policy, ToppingsPolicy::AtLeastOne);
        assert_eq!(conf.form.banner_timeout(), Duration::from_secs(3));
        assert_eq!(conf.submission.mode, SubmissionMode::Accept);
        assert_eq!(conf.submission.success_percentage, 80);
        assert_eq!(conf.submission.delay(), Duration::from_millis(250));
        assert_eq!(conf.schema().toppings_policy(), ToppingsPolicy::AtLeastOne);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        init_log();
        let conf = Config::from_yaml("---\n{}\n").unwrap();
        assert_eq!(conf.catalog, ToppingCatalog::default());
        assert_eq!(conf.submission.mode, SubmissionMode::Random);
        assert_eq!(conf.log.level, "info");
    }

    #[test]
    fn test_valid_catalog_duplicate_ids() {
        init_log();
        let conf_str = r#"
---
catalog:
  toppings:
    - id: "1"
      label: Pepperoni
    - id: "1"
      label: Olives
        "#;
        let conf = Config::from_yaml(conf_str);
        assert!(matches!(conf, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_valid_catalog_not_empty() {
        init_log();
        let conf = Config::from_yaml("catalog:\n  toppings: []\n");
        assert!(matches!(conf, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_valid_success_percentage() {
        init_log();
        let conf = Config::from_yaml("submission:\n  success_percentage: 101\n");
        assert!(matches!(conf, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_valid_banner_timeout() {
        init_log();
        let conf = Config::from_yaml("form:\n  banner_timeout_ms: 0\n");
        assert!(matches!(conf, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_valid_log_level() {
        init_log();
        let conf = Config::from_yaml("log:\n  level: loud\n");
        assert!(matches!(conf, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        init_log();
        let conf = Config::from_yaml("form:\n  toppings_policy: sometimes\n");
        assert!(matches!(conf, Err(OrderError::Configuration(_))));
    }

    #[test]
    fn test_missing_file() {
        init_log();
        let conf = Config::load_from_yaml("/nonexistent/pizza-order.yaml");
        assert!(matches!(conf, Err(OrderError::Configuration(_))));
        assert!(Config::load_or_default(None).is_ok());
    }
}
