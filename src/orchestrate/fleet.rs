use super::analysis::RepoAnalysis;
use crate::alpha::AlphaDeployment;
use crate::error::{DigestError, Result};
use crate::model::{ReportHeader, WeekRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;

pub const ARTIFACT_SUFFIX: &str = "_analysis.json";
const TOP_INITIATIVES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRow {
    pub repo: String,
    pub health: String,
    pub commits: usize,
    pub active_branches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedInitiative {
    pub repo: String,
    pub name: String,
    pub impact: String,
    pub commits: usize,
}

/// Cross-repository rollup of whatever analyses completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSummary {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub total_commits: usize,
    pub authors: Vec<String>,
    pub active_components: usize,
    pub tracked_repositories: usize,
    pub components: Vec<ComponentRow>,
    pub alpha_deployments: Vec<AlphaDeployment>,
    pub top_initiatives: Vec<RankedInitiative>,
}

impl FleetSummary {
    pub fn from_analyses(
        analyses: &[RepoAnalysis],
        tracked_repositories: usize,
        week: WeekRange,
    ) -> Self {
        let authors: BTreeSet<&str> = analyses
            .iter()
            .flat_map(|a| a.authors.iter().map(String::as_str))
            .collect();

        let alpha_deployments = analyses
            .iter()
            .flat_map(|a| {
                a.alpha_deployments.iter().map(move |d| AlphaDeployment {
                    repo: Some(a.repo.clone()),
                    ..d.clone()
                })
            })
            .collect();

        let mut initiatives: Vec<RankedInitiative> = analyses
            .iter()
            .flat_map(|a| {
                a.initiatives.iter().map(move |i| RankedInitiative {
                    repo: a.repo.clone(),
                    name: i.name.clone(),
                    impact: i.impact.clone(),
                    commits: i.commits,
                })
            })
            .collect();
        initiatives.sort_by(|a, b| b.commits.cmp(&a.commits));
        initiatives.truncate(TOP_INITIATIVES);

        Self {
            header: ReportHeader::new(week),
            total_commits: analyses.iter().map(|a| a.total_commits).sum(),
            authors: authors.into_iter().map(String::from).collect(),
            active_components: analyses.len(),
            tracked_repositories,
            components: analyses
                .iter()
                .map(|a| ComponentRow {
                    repo: a.repo.clone(),
                    health: a.health.clone(),
                    commits: a.total_commits,
                    active_branches: a.active_branches,
                })
                .collect(),
            alpha_deployments,
            top_initiatives: initiatives,
        }
    }
}

/// Loads every `*_analysis.json` in `dir`, skipping files that fail to decode.
pub fn load_artifacts(dir: &Path) -> Result<Vec<RepoAnalysis>> {
    if !dir.exists() {
        warn!("No analysis artifacts found at {}", dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(ARTIFACT_SUFFIX))
        })
        .collect();
    paths.sort();

    let mut analyses = Vec::with_capacity(paths.len());
    for path in paths {
        match read_artifact(&path) {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => warn!("Skipping artifact: {e}"),
        }
    }
    Ok(analyses)
}

fn read_artifact(path: &Path) -> Result<RepoAnalysis> {
    let text = std::fs::read_to_string(path).map_err(|e| DigestError::artifact(path, e))?;
    serde_json::from_str(&text).map_err(|e| DigestError::artifact(path, e))
}
