//! Configuration for weekly-digest.
//!
//! Priority: CLI args > environment variables > config file > defaults.
use crate::business::HealthPolicy;
use crate::error::{DigestError, Result};
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "weekly-digest.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub orchestrate: OrchestrateConfig,
    #[serde(default)]
    pub health: HealthPolicy,
    #[serde(default)]
    pub rules: RuleSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Combined dump with one `=== REPO: ... ===` section per repository
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Directory of per-repository dumps used by `orchestrate`
    #[serde(default = "default_commit_dir")]
    pub commit_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Where per-repository analysis artifacts are written and read back
    #[serde(default = "default_agent_output_dir")]
    pub agent_output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrateConfig {
    #[serde(default = "default_repositories")]
    pub repositories: Vec<String>,

    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/tmp/weekly_commits_full.txt")
}

fn default_commit_dir() -> PathBuf {
    PathBuf::from("/tmp/weekly_commits_by_repo")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("ai_docs/weekly-summaries")
}

fn default_agent_output_dir() -> PathBuf {
    PathBuf::from("/tmp/weekly_agent_outputs")
}

fn default_repositories() -> Vec<String> {
    [
        "web-app",
        "workers",
        "data-pipelines",
        "data-cluster",
        "data-cluster-operator",
        "data-cluster-helm",
        "k8s-charts",
        "skupper-gateway",
        "MCPs/mcp-base",
        "MCPs/mcp-boilerplate",
        "MCPs/mcp-datacluster",
        "MCPs/mcp-openaire",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_max_workers() -> usize {
    6
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            commit_dir: default_commit_dir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: default_report_dir(),
            agent_output_dir: default_agent_output_dir(),
        }
    }
}

impl Default for OrchestrateConfig {
    fn default() -> Self {
        Self {
            repositories: default_repositories(),
            max_workers: default_max_workers(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path, else `weekly-digest.toml` in the working directory, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                tracing::info!("Loading config from: {}", p.display());
                Self::from_file(p)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                tracing::info!("Loading config from: {}", DEFAULT_CONFIG_FILE);
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("WEEKLY_DIGEST_LOG_FILE") {
            self.input.log_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("WEEKLY_DIGEST_COMMIT_DIR") {
            self.input.commit_dir = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("WEEKLY_DIGEST_OUTPUT_DIR") {
            self.output.agent_output_dir = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("WEEKLY_DIGEST_REPORT_DIR") {
            self.output.report_dir = PathBuf::from(path);
        }
        if let Ok(workers) = std::env::var("WEEKLY_DIGEST_MAX_WORKERS") {
            match workers.parse() {
                Ok(n) => self.orchestrate.max_workers = n,
                Err(_) => {
                    tracing::warn!("Ignoring WEEKLY_DIGEST_MAX_WORKERS={workers}: not a number")
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.orchestrate.max_workers == 0 {
            return Err(DigestError::config(
                "orchestrate.max_workers",
                "must be greater than 0",
            ));
        }
        check_ratio("health.component_fix_ratio", self.health.component_fix_ratio)?;
        check_ratio("health.overall_fix_ratio", self.health.overall_fix_ratio)?;
        if self.rules.fallback_component.trim().is_empty() {
            return Err(DigestError::config(
                "rules.fallback_component",
                "must not be empty",
            ));
        }
        if let Some(rule) = self.rules.initiatives.iter().find(|r| r.name.trim().is_empty()) {
            return Err(DigestError::config(
                "rules.initiatives",
                format!("initiative with keywords {:?} has no name", rule.keywords),
            ));
        }
        if let Some(rule) = self.rules.components.iter().find(|r| r.name.trim().is_empty()) {
            return Err(DigestError::config(
                "rules.components",
                format!("component for {:?} has no name", rule.repositories),
            ));
        }
        Ok(())
    }
}

fn check_ratio(key: &str, ratio: f64) -> Result<()> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(DigestError::config(
            key,
            format!("must be a positive number, got {ratio}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.orchestrate.repositories.len(), 12);
        assert_eq!(config.orchestrate.max_workers, 6);
        assert_eq!(config.health.critical_issue_threshold, 3);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("digest.toml");
        std::fs::write(
            &path,
            "[orchestrate]\nmax_workers = 2\n\n[rules]\nseverity_markers = [\"panic\"]\n",
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.orchestrate.max_workers, 2);
        assert_eq!(config.orchestrate.repositories.len(), 12);
        assert_eq!(config.rules.severity_markers, vec!["panic".to_string()]);
        assert_eq!(config.rules.initiatives.len(), 12);
        assert_eq!(config.rules.fallback_component, "Infrastructure");
    }

    #[test]
    fn rejects_zero_workers() {
        let mut config = Config::default();
        config.orchestrate.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nameless_rules() {
        let mut config = Config::default();
        config.rules.initiatives[0].name = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_ratios() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("digest.toml");
        for ratio in ["nan", "inf", "-1.0", "0.0"] {
            std::fs::write(&path, format!("[health]\noverall_fix_ratio = {ratio}\n")).unwrap();
            assert!(
                matches!(Config::from_file(&path), Err(DigestError::Config { .. })),
                "ratio {ratio} should be rejected"
            );
        }
    }

    #[test]
    fn configured_initiative_keywords_are_case_folded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("digest.toml");
        std::fs::write(
            &path,
            "[[rules.initiatives]]\nname = \"Streaming\"\nkeywords = [\"Kafka\", \"RedPanda\"]\n",
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        let hits: Vec<_> = config
            .rules
            .initiatives_for("feat: redpanda topic for Kafka bridge")
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Streaming"]);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[orchestrate\nmax_workers = ").unwrap();
        assert!(matches!(Config::from_file(&path), Err(DigestError::Toml(_))));
    }
}
