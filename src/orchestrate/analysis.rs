use crate::aggregate::AggregatedData;
use crate::alpha::{
    count_active_branches, detect_alpha_deployments, feature_branches, AlphaDeployment,
    FeatureBranch,
};
use crate::business::{clean_issue, BusinessSummary, HealthLevel, HealthPolicy};
use crate::error::Result;
use crate::model::CommitType;
use crate::parse::CommitParser;
use crate::rules::RuleSet;
use crate::scan::{Lines, Token};
use crate::util::{read_input, repo_file_stem, write_json};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeSummary {
    pub name: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub commits: usize,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Per-repository artifact written by each analysis unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoAnalysis {
    pub repo: String,
    #[serde(default = "default_health")]
    pub health: String,
    pub total_commits: usize,
    #[serde(default)]
    pub active_branches: usize,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub initiatives: Vec<InitiativeSummary>,
    #[serde(default)]
    pub alpha_deployments: Vec<AlphaDeployment>,
    #[serde(default)]
    pub bugs_fixed: Vec<String>,
    #[serde(default)]
    pub infrastructure: Vec<String>,
    #[serde(default)]
    pub feature_branches: Vec<FeatureBranch>,
}

fn default_health() -> String {
    HealthLevel::Healthy.marker().to_string()
}

/// Derives the artifact for one repository's raw dump.
pub fn analyze_dump(
    repo: &str,
    raw: &str,
    rules: &RuleSet,
    policy: &HealthPolicy,
) -> RepoAnalysis {
    let data = AggregatedData::fold(CommitParser::new(repo, raw));
    let summary = BusinessSummary::build(&data, rules, policy);

    let health = summary
        .components
        .iter()
        .map(|c| c.status(policy))
        .max()
        .unwrap_or(HealthLevel::Healthy);

    let initiatives = summary
        .ranked_initiatives()
        .into_iter()
        .map(|i| InitiativeSummary {
            name: i.name.clone(),
            impact: format!("{} related changes in {}", i.commits, repo),
            commits: i.commits,
            highlights: i.highlights.clone(),
        })
        .collect();

    let subjects_of = |types: &[CommitType], clean: fn(&str) -> String| -> Vec<String> {
        data.records()
            .iter()
            .filter(|r| types.contains(&r.commit_type))
            .map(|r| clean(&r.subject))
            .collect()
    };

    RepoAnalysis {
        repo: repo.to_string(),
        health: health.marker().to_string(),
        total_commits: data.total_commits(),
        active_branches: count_active_branches(raw),
        authors: data.authors().into_iter().map(String::from).collect(),
        initiatives,
        alpha_deployments: detect_alpha_deployments(data.records()),
        bugs_fixed: subjects_of(&[CommitType::Fix], clean_issue),
        infrastructure: subjects_of(&[CommitType::Ci, CommitType::Chore], str::to_string),
        feature_branches: feature_branches(data.records()),
    }
}

/// Everything an analysis unit needs; shared read-only across workers.
pub struct UnitContext<'a> {
    pub commit_dir: &'a Path,
    pub artifact_dir: &'a Path,
    pub rules: &'a RuleSet,
    pub policy: &'a HealthPolicy,
}

impl UnitContext<'_> {
    pub fn input_path(&self, repo: &str) -> PathBuf {
        self.commit_dir.join(format!("{}.txt", repo_file_stem(repo)))
    }

    pub fn artifact_name(repo: &str) -> String {
        format!("{}_analysis.json", repo_file_stem(repo))
    }
}

/// Analyses one repository and writes its artifact.
///
/// `Ok(None)` means there was nothing to analyse (no dump, or an explicit
/// no-activity marker); errors are I/O or serialization failures.
pub fn run_unit(repo: &str, ctx: &UnitContext<'_>) -> Result<Option<RepoAnalysis>> {
    let input = ctx.input_path(repo);
    if !input.exists() {
        warn!(repo = %repo, "No commit file found at {}, skipping", input.display());
        return Ok(None);
    }

    let raw = read_input(&input)?;
    if Lines::new(&raw).any(|l| l.token() == Token::NoActivity) {
        info!(repo = %repo, "No activity this week");
        return Ok(None);
    }

    let analysis = analyze_dump(repo, &raw, ctx.rules, ctx.policy);
    write_json(ctx.artifact_dir, &UnitContext::artifact_name(repo), &analysis)?;
    info!(repo = %repo, commits = analysis.total_commits, "Analysis complete");
    Ok(Some(analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const RAW: &str = "\
refs/heads/dev
refs/heads/feature/status-page
COMMIT_START
a1|Al|al@x|2024-01-02|feat(status): uptime kuma status page
COMMIT_END
COMMIT_START
a2|Bo|bo@x|2024-01-03|fix: gateway 504 timeout
COMMIT_END
COMMIT_START
a3|Al|al@x|2024-01-04|ci: cache cargo registry
COMMIT_END
COMMIT_START
a4|Al|al@x|2024-01-05|Merge branch 'feature/status-page' into 'dev'
COMMIT_END
";

    #[test]
    fn analysis_fills_artifact_schema() {
        let a = analyze_dump("web-app", RAW, &RuleSet::default(), &HealthPolicy::default());
        assert_eq!(a.total_commits, 4);
        assert_eq!(a.active_branches, 2);
        assert_eq!(a.authors, vec!["Al".to_string(), "Bo".to_string()]);
        assert_eq!(a.health, "🔴");
        assert_eq!(a.bugs_fixed, vec!["gateway 504 timeout".to_string()]);
        assert_eq!(a.infrastructure, vec!["ci: cache cargo registry".to_string()]);
        assert_eq!(a.alpha_deployments.len(), 1);
        assert_eq!(a.alpha_deployments[0].feature, "feature/status-page");
        assert_eq!(a.feature_branches.len(), 1);
        assert_eq!(a.initiatives[0].name, "Infrastructure Monitoring");
        assert_eq!(a.initiatives[0].highlights, vec!["uptime kuma status page".to_string()]);
    }

    #[test]
    fn unit_skips_missing_and_idle_inputs() {
        let commits = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        std::fs::write(
            commits.path().join("workers.txt"),
            "=== NO ACTIVITY THIS WEEK ===\n",
        )
        .unwrap();
        let rules = RuleSet::default();
        let policy = HealthPolicy::default();
        let ctx = UnitContext {
            commit_dir: commits.path(),
            artifact_dir: artifacts.path(),
            rules: &rules,
            policy: &policy,
        };
        assert!(run_unit("web-app", &ctx).unwrap().is_none());
        assert!(run_unit("workers", &ctx).unwrap().is_none());
    }

    #[test]
    fn unit_writes_artifact_with_flattened_name() {
        let commits = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        std::fs::write(commits.path().join("MCPs_mcp-base.txt"), RAW).unwrap();
        let rules = RuleSet::default();
        let policy = HealthPolicy::default();
        let ctx = UnitContext {
            commit_dir: commits.path(),
            artifact_dir: artifacts.path(),
            rules: &rules,
            policy: &policy,
        };
        let analysis = run_unit("MCPs/mcp-base", &ctx).unwrap().unwrap();
        let written =
            std::fs::read_to_string(artifacts.path().join("MCPs_mcp-base_analysis.json")).unwrap();
        let back: RepoAnalysis = serde_json::from_str(&written).unwrap();
        assert_eq!(back, analysis);
    }

    #[test]
    fn sparse_artifact_decodes_with_defaults() {
        let a: RepoAnalysis = serde_json::from_str(r#"{"repo":"x","total_commits":3}"#).unwrap();
        assert_eq!(a.health, "🟢");
        assert!(a.initiatives.is_empty());
    }
}
