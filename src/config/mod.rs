use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::ScanPolicy;

/// Top-level configuration from `.terraguard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub policy: ScanPolicy,
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# terraguard configuration

[policy]
# Rule IDs whose results are suppressed entirely.
# exclude = ["AWS008"]

# Retain excluded results, marked ignored, instead of dropping them.
# show_ignored = true

# Synthesize an explicit passed record per clean check.
# include_passed = true

# Per-rule severity overrides (info, warning, error).
# [policy.severity_overrides]
# "GEN001" = "info"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    #[test]
    fn missing_file_yields_default() {
        let config = Config::load(Path::new("/nonexistent/.terraguard.toml")).unwrap();
        assert!(config.policy.exclude.is_empty());
        assert!(!config.policy.include_passed);
    }

    #[test]
    fn parses_policy_sections() {
        let config: Config = toml::from_str(
            r#"
[policy]
exclude = ["AWS004"]
include_passed = true

[policy.severity_overrides]
"GEN001" = "info"
"#,
        )
        .unwrap();
        assert!(config.policy.exclude.contains("AWS004"));
        assert!(config.policy.include_passed);
        assert_eq!(
            config.policy.severity_overrides.get("GEN001"),
            Some(&Severity::Info)
        );
    }

    #[test]
    fn starter_config_round_trips() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert!(config.policy.exclude.is_empty());
    }
}
