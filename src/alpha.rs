//! Detection of feature/fix branches merged into the `dev` integration
//! branch, which deploys to the alpha environment.

use crate::model::CommitRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlphaDeployment {
    pub feature: String,
    pub description: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBranch {
    pub name: String,
    pub description: String,
    pub commits: usize,
}

/// Text between the first pair of single quotes.
fn quoted(subject: &str) -> Option<&str> {
    let mut parts = subject.split('\'');
    parts.next()?;
    parts.next()
}

pub fn is_alpha_merge(subject: &str) -> bool {
    let lower = subject.to_lowercase();
    lower.contains("merge")
        && lower.contains("dev")
        && (lower.contains("feature/") || lower.contains("fix/"))
}

pub fn detect_alpha_deployments<'a, I>(records: I) -> Vec<AlphaDeployment>
where
    I: IntoIterator<Item = &'a CommitRecord>,
{
    records
        .into_iter()
        .filter(|r| is_alpha_merge(&r.subject))
        .map(|r| AlphaDeployment {
            feature: quoted(&r.subject).unwrap_or(r.subject.as_str()).to_string(),
            description: "Merged to dev (alpha environment)".to_string(),
            date: r.day().to_string(),
            repo: None,
        })
        .collect()
}

/// `feature/*` branches named in merge subjects, counted in first-seen order.
pub fn feature_branches<'a, I>(records: I) -> Vec<FeatureBranch>
where
    I: IntoIterator<Item = &'a CommitRecord>,
{
    let mut branches: Vec<FeatureBranch> = Vec::new();
    for record in records.into_iter().filter(|r| r.is_merge()) {
        let Some(name) = quoted(&record.subject) else {
            continue;
        };
        if !name.starts_with("feature/") {
            continue;
        }
        match branches.iter_mut().find(|b| b.name == name) {
            Some(branch) => branch.commits += 1,
            None => branches.push(FeatureBranch {
                name: name.to_string(),
                description: record.subject.clone(),
                commits: 1,
            }),
        }
    }
    branches
}

/// Lines of a raw dump that reference a branch head.
pub fn count_active_branches(raw: &str) -> usize {
    raw.lines().filter(|l| l.contains("refs/heads/")).count()
}
