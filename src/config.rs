//! Runtime configuration: collaborator targets, timeout, default user.
//!
//! Precedence per field: CLI flag > `FINASSIST_*` env var > config file >
//! built-in default. Config files are YAML or JSON, chosen by extension.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MATCHER: &str = "lambda:function_matcher";
pub const DEFAULT_SUBSCRIPTIONS: &str = "lambda:subscriptions";
pub const DEFAULT_PRODUCTS: &str = "lambda:products";
pub const DEFAULT_GOALS: &str = "lambda:goals";
pub const DEFAULT_SUMMARIZE: &str = "lambda:summarize";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_ID: &str = "test_user";

/// Backend targets per domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendTargets {
    pub subscriptions: String,
    pub products: String,
    pub goals: String,
    /// Receives operations the alias table does not know.
    pub fallback: Option<String>,
}

impl Default for BackendTargets {
    fn default() -> Self {
        Self {
            subscriptions: DEFAULT_SUBSCRIPTIONS.to_string(),
            products: DEFAULT_PRODUCTS.to_string(),
            goals: DEFAULT_GOALS.to_string(),
            fallback: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matcher: String,
    pub backends: BackendTargets,
    pub summarize: Option<String>,
    pub timeout_secs: u64,
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matcher: DEFAULT_MATCHER.to_string(),
            backends: BackendTargets::default(),
            summarize: Some(DEFAULT_SUMMARIZE.to_string()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

/// Overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub matcher: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Read a config file (YAML for .yaml/.yml, JSON otherwise).
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let lower = path.to_string_lossy().to_ascii_lowercase();
        let config: Config = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw).context("failed to parse YAML config")?
        } else {
            serde_json::from_str(&raw).context("failed to parse JSON config")?
        };
        Ok(config)
    }

    /// Load the effective configuration: file (explicit path or
    /// `FINASSIST_CONFIG`), then environment, then CLI overrides.
    pub fn load(path: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        let env_path = env_value("FINASSIST_CONFIG");
        let mut config = match path.map(Path::to_path_buf).or(env_path.map(Into::into)) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(env_value)?;
        if let Some(m) = &cli.matcher {
            config.matcher = m.clone();
        }
        if let Some(t) = cli.timeout_secs {
            config.timeout_secs = t;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply `FINASSIST_*` variables through `lookup` (blank values ignored).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("FINASSIST_MATCHER") {
            self.matcher = v;
        }
        if let Some(v) = lookup("FINASSIST_SUBSCRIPTIONS") {
            self.backends.subscriptions = v;
        }
        if let Some(v) = lookup("FINASSIST_PRODUCTS") {
            self.backends.products = v;
        }
        if let Some(v) = lookup("FINASSIST_GOALS") {
            self.backends.goals = v;
        }
        if let Some(v) = lookup("FINASSIST_FALLBACK") {
            self.backends.fallback = Some(v);
        }
        if let Some(v) = lookup("FINASSIST_SUMMARIZE") {
            self.summarize = Some(v);
        }
        if let Some(v) = lookup("FINASSIST_TIMEOUT_SECS") {
            self.timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("FINASSIST_TIMEOUT_SECS is not a number: '{v}'"))?;
        }
        if let Some(v) = lookup("FINASSIST_USER_ID") {
            self.user_id = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        let required = [
            ("matcher", &self.matcher),
            ("backends.subscriptions", &self.backends.subscriptions),
            ("backends.products", &self.backends.products),
            ("backends.goals", &self.backends.goals),
        ];
        for (name, target) in required {
            if target.trim().is_empty() {
                bail!("{name} target is empty");
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned().filter(|s| !s.trim().is_empty())
    }

    #[test]
    fn defaults_point_at_the_deployed_functions() {
        let c = Config::default();
        assert_eq!(c.matcher, "lambda:function_matcher");
        assert_eq!(c.backends.goals, "lambda:goals");
        assert_eq!(c.user_id, "test_user");
        assert!(c.backends.fallback.is_none());
        c.validate().unwrap();
    }

    #[test]
    fn yaml_file_fills_missing_fields_with_defaults() {
        let path = std::env::temp_dir().join("finassist_config_test.yaml");
        std::fs::write(
            &path,
            "matcher: https://api.example.com/match\nbackends:\n  goals: ./goals-server\ntimeout_secs: 5\n",
        )
        .unwrap();
        let c = Config::from_file(&path).unwrap();
        assert_eq!(c.matcher, "https://api.example.com/match");
        assert_eq!(c.backends.goals, "./goals-server");
        assert_eq!(c.backends.products, DEFAULT_PRODUCTS);
        assert_eq!(c.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn json_file_is_accepted() {
        let path = std::env::temp_dir().join("finassist_config_test.json");
        std::fs::write(&path, r#"{"user_id": "u42", "backends": {"fallback": "lambda:router"}}"#)
            .unwrap();
        let c = Config::from_file(&path).unwrap();
        assert_eq!(c.user_id, "u42");
        assert_eq!(c.backends.fallback.as_deref(), Some("lambda:router"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut c = Config::default();
        c.apply_env(lookup(&[
            ("FINASSIST_GOALS", "https://goals.example.com"),
            ("FINASSIST_TIMEOUT_SECS", " 12 "),
            ("FINASSIST_USER_ID", "  "),
        ]))
        .unwrap();
        assert_eq!(c.backends.goals, "https://goals.example.com");
        assert_eq!(c.timeout_secs, 12);
        assert_eq!(c.user_id, DEFAULT_USER_ID);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut c = Config::default();
        assert!(c.apply_env(lookup(&[("FINASSIST_TIMEOUT_SECS", "soon")])).is_err());

        c.timeout_secs = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn empty_targets_are_rejected() {
        let mut c = Config::default();
        c.backends.products = " ".into();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("backends.products"));
    }
}
