use crate::aggregate::AggregatedData;
use crate::model::{CommitRecord, CommitType};
use crate::rules::RuleSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

pub const MAX_HIGHLIGHTS: usize = 3;

static FEAT_SCOPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^feat\([\w-]+\):\s*").expect("valid regex"));
static FEAT_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^feat:\s*").expect("valid regex"));
static FIX_SCOPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^fix\([\w-]+\):\s*").expect("valid regex"));
static FIX_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^fix:\s*").expect("valid regex"));

/// Drops a leading `feat(scope): ` or `feat: `.
pub fn clean_highlight(subject: &str) -> String {
    let s = FEAT_SCOPED.replace(subject, "");
    FEAT_BARE.replace(&s, "").into_owned()
}

/// Drops a leading `fix(scope): ` or `fix: `.
pub fn clean_issue(subject: &str) -> String {
    let s = FIX_SCOPED.replace(subject, "");
    FIX_BARE.replace(&s, "").into_owned()
}

/// Thresholds for the health ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPolicy {
    /// A component with more than this many fixes per feature needs attention.
    #[serde(default = "default_component_fix_ratio")]
    pub component_fix_ratio: f64,
    /// Run-wide fixes per feature above which overall health degrades one level.
    #[serde(default = "default_overall_fix_ratio")]
    pub overall_fix_ratio: f64,
    /// Critical issue count at which overall health drops to the worst level.
    #[serde(default = "default_critical_issue_threshold")]
    pub critical_issue_threshold: usize,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            component_fix_ratio: default_component_fix_ratio(),
            overall_fix_ratio: default_overall_fix_ratio(),
            critical_issue_threshold: default_critical_issue_threshold(),
        }
    }
}

fn default_component_fix_ratio() -> f64 {
    2.0
}

fn default_overall_fix_ratio() -> f64 {
    1.5
}

fn default_critical_issue_threshold() -> usize {
    3
}

/// Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Healthy,
    NeedsAttention,
    AtRisk,
}

impl HealthLevel {
    pub fn marker(&self) -> &'static str {
        match self {
            HealthLevel::Healthy => "🟢",
            HealthLevel::NeedsAttention => "🟡",
            HealthLevel::AtRisk => "🔴",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Strong,
    Moderate,
    NeedsAttention,
}

impl OverallHealth {
    pub fn assess(features: usize, fixes: usize, issues: usize, policy: &HealthPolicy) -> Self {
        let mut health = OverallHealth::Strong;
        if fixes as f64 > features as f64 * policy.overall_fix_ratio {
            health = OverallHealth::Moderate;
        }
        if issues >= policy.critical_issue_threshold {
            health = OverallHealth::NeedsAttention;
        }
        health
    }

    pub fn level(&self) -> HealthLevel {
        match self {
            OverallHealth::Strong => HealthLevel::Healthy,
            OverallHealth::Moderate => HealthLevel::NeedsAttention,
            OverallHealth::NeedsAttention => HealthLevel::AtRisk,
        }
    }
}

impl fmt::Display for OverallHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OverallHealth::Strong => "Strong",
            OverallHealth::Moderate => "Moderate",
            OverallHealth::NeedsAttention => "Needs Attention",
        };
        write!(f, "{} {}", self.level().marker(), label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    pub name: String,
    pub commits: usize,
    pub repositories: BTreeSet<String>,
    /// Cleaned subjects of the first few matching features.
    pub highlights: Vec<String>,
}

impl Initiative {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commits: 0,
            repositories: BTreeSet::new(),
            highlights: Vec::new(),
        }
    }

    fn record(&mut self, commit: &CommitRecord) {
        self.commits += 1;
        self.repositories.insert(commit.repo.clone());
        if commit.commit_type == CommitType::Feat && self.highlights.len() < MAX_HIGHLIGHTS {
            self.highlights.push(clean_highlight(&commit.subject));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub features: usize,
    pub fixes: usize,
    /// Original subjects of fixes that carry a severity marker.
    pub issues: Vec<String>,
}

impl ComponentHealth {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            features: 0,
            fixes: 0,
            issues: Vec::new(),
        }
    }

    pub fn status(&self, policy: &HealthPolicy) -> HealthLevel {
        if !self.issues.is_empty() {
            HealthLevel::AtRisk
        } else if self.fixes as f64 > self.features as f64 * policy.component_fix_ratio {
            HealthLevel::NeedsAttention
        } else {
            HealthLevel::Healthy
        }
    }
}

/// Initiative rollup and component health for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub initiatives: Vec<Initiative>,
    pub components: Vec<ComponentHealth>,
    pub total_commits: usize,
    pub features: usize,
    pub fixes: usize,
    pub merge_requests: usize,
    pub overall: OverallHealth,
}

impl BusinessSummary {
    pub fn build(data: &AggregatedData, rules: &RuleSet, policy: &HealthPolicy) -> Self {
        let mut acc = Accumulator::default();
        for record in data.records() {
            acc.push(record, rules);
        }

        let features = data.count(CommitType::Feat);
        let fixes = data.count(CommitType::Fix);
        let issues: usize = acc.components.iter().map(|c| c.issues.len()).sum();

        Self {
            initiatives: acc.initiatives,
            components: acc.components,
            total_commits: data.total_commits(),
            features,
            fixes,
            merge_requests: data.merge_request_count(),
            overall: OverallHealth::assess(features, fixes, issues, policy),
        }
    }

    pub fn initiative(&self, name: &str) -> Option<&Initiative> {
        self.initiatives.iter().find(|i| i.name == name)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentHealth> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Initiatives by commit count, busiest first; ties keep first-match order.
    pub fn ranked_initiatives(&self) -> Vec<&Initiative> {
        let mut ranked: Vec<_> = self.initiatives.iter().collect();
        ranked.sort_by(|a, b| b.commits.cmp(&a.commits));
        ranked
    }

    pub fn top_initiative(&self) -> Option<&Initiative> {
        self.ranked_initiatives().into_iter().next()
    }

    pub fn issue_count(&self) -> usize {
        self.components.iter().map(|c| c.issues.len()).sum()
    }

    /// (component, cleaned subject) for every flagged fix.
    pub fn critical_issues(&self) -> Vec<(&str, String)> {
        self.components
            .iter()
            .flat_map(|c| c.issues.iter().map(move |i| (c.name.as_str(), clean_issue(i))))
            .collect()
    }

    /// Components with heavy fix activity but no flagged issue.
    pub fn stability_focus(&self, policy: &HealthPolicy) -> Vec<&ComponentHealth> {
        self.components
            .iter()
            .filter(|c| c.status(policy) == HealthLevel::NeedsAttention)
            .collect()
    }

    /// Initiatives with enough momentum to continue next week.
    pub fn continuing_initiatives(&self) -> Vec<&Initiative> {
        self.initiatives
            .iter()
            .filter(|i| (5..15).contains(&i.commits))
            .collect()
    }
}

#[derive(Default)]
struct Accumulator {
    initiatives: Vec<Initiative>,
    components: Vec<ComponentHealth>,
}

impl Accumulator {
    fn push(&mut self, record: &CommitRecord, rules: &RuleSet) {
        match record.commit_type {
            CommitType::Feat => self.component(rules.component_for(&record.repo)).features += 1,
            CommitType::Fix => {
                let component = self.component(rules.component_for(&record.repo));
                component.fixes += 1;
                if rules.is_severe(&record.subject) {
                    component.issues.push(record.subject.clone());
                }
            }
            _ => {}
        }

        for rule in rules.initiatives_for(&record.subject) {
            self.initiative(&rule.name).record(record);
        }
    }

    fn component(&mut self, name: &str) -> &mut ComponentHealth {
        let pos = match self.components.iter().position(|c| c.name == name) {
            Some(pos) => pos,
            None => {
                self.components.push(ComponentHealth::new(name));
                self.components.len() - 1
            }
        };
        &mut self.components[pos]
    }

    fn initiative(&mut self, name: &str) -> &mut Initiative {
        let pos = match self.initiatives.iter().position(|i| i.name == name) {
            Some(pos) => pos,
            None => {
                self.initiatives.push(Initiative::new(name));
                self.initiatives.len() - 1
            }
        };
        &mut self.initiatives[pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(repo: &str, subject: &str) -> CommitRecord {
        CommitRecord {
            hash: None,
            author: "Al".into(),
            email: None,
            date: "2024-01-01".into(),
            subject: subject.into(),
            body: String::new(),
            commit_type: CommitType::classify(subject),
            repo: repo.into(),
        }
    }

    fn summarize(records: Vec<CommitRecord>) -> BusinessSummary {
        BusinessSummary::build(
            &AggregatedData::fold(records),
            &RuleSet::default(),
            &HealthPolicy::default(),
        )
    }

    #[test]
    fn cleans_conventional_prefixes() {
        assert_eq!(clean_highlight("feat(api-v2): add thing"), "add thing");
        assert_eq!(clean_highlight("feat: add thing"), "add thing");
        assert_eq!(clean_highlight("Feature flag work"), "Feature flag work");
        assert_eq!(clean_issue("fix(ui): crash on load"), "crash on load");
        assert_eq!(clean_issue("fix:timeout"), "timeout");
    }

    #[test]
    fn one_record_can_feed_many_initiatives() {
        let summary = summarize(vec![record("web-app", "feat: auth for postgres pool")]);
        let security = summary.initiative("Security & Authentication").unwrap();
        let database = summary.initiative("Database Infrastructure").unwrap();
        assert_eq!(security.commits, 1);
        assert_eq!(database.commits, 1);
        assert_eq!(security.highlights, vec!["auth for postgres pool".to_string()]);
    }

    #[test]
    fn highlights_cap_at_three_in_first_seen_order() {
        let records = (1..=5)
            .map(|i| record("workers", &format!("feat(hooks): webhook retry {i}")))
            .collect();
        let summary = summarize(records);
        let events = summary.initiative("Event Processing").unwrap();
        assert_eq!(events.commits, 5);
        assert_eq!(
            events.highlights,
            vec!["webhook retry 1", "webhook retry 2", "webhook retry 3"]
        );
    }

    #[test]
    fn initiative_repositories_are_unique() {
        let summary = summarize(vec![
            record("workers", "fix: webhook"),
            record("workers", "chore: webhook"),
            record("web-app", "feat: webhook"),
        ]);
        let events = summary.initiative("Event Processing").unwrap();
        let repos: Vec<_> = events.repositories.iter().cloned().collect();
        assert_eq!(repos, vec!["web-app".to_string(), "workers".to_string()]);
        assert_eq!(events.highlights.len(), 1);
    }

    #[test]
    fn unmatched_repository_lands_in_fallback_only() {
        let summary = summarize(vec![record("mystery-repo", "feat: x")]);
        assert_eq!(summary.components.len(), 1);
        assert_eq!(summary.components[0].name, "Infrastructure");
        assert_eq!(summary.components[0].features, 1);
    }

    #[test]
    fn component_status_rules() {
        let policy = HealthPolicy::default();
        let mut c = ComponentHealth::new("x");
        c.features = 1;
        c.fixes = 2;
        assert_eq!(c.status(&policy), HealthLevel::Healthy);
        c.fixes = 3;
        assert_eq!(c.status(&policy), HealthLevel::NeedsAttention);
        c.issues.push("fix: crash".into());
        assert_eq!(c.status(&policy), HealthLevel::AtRisk);
    }

    #[test]
    fn overall_health_thresholds() {
        let policy = HealthPolicy::default();
        assert_eq!(OverallHealth::assess(2, 3, 0, &policy), OverallHealth::Strong);
        assert_eq!(OverallHealth::assess(2, 4, 0, &policy), OverallHealth::Moderate);
        assert_eq!(OverallHealth::assess(10, 0, 3, &policy), OverallHealth::NeedsAttention);
        assert_eq!(OverallHealth::assess(10, 0, 2, &policy), OverallHealth::Strong);
    }

    #[test]
    fn only_feat_and_fix_create_components() {
        let summary = summarize(vec![
            record("workers", "chore: bump"),
            record("web-app", "docs: x"),
        ]);
        assert!(summary.components.is_empty());
    }

    #[test]
    fn severe_fixes_become_issues() {
        let summary = summarize(vec![
            record("workers", "fix(queue): worker crash on empty batch"),
            record("workers", "fix: typo"),
        ]);
        let workers = summary.component("Workers").unwrap();
        assert_eq!(workers.fixes, 2);
        assert_eq!(workers.issues, vec!["fix(queue): worker crash on empty batch".to_string()]);
        assert_eq!(
            summary.critical_issues(),
            vec![("Workers", "worker crash on empty batch".to_string())]
        );
    }

    #[test]
    fn ranking_is_stable_and_continuing_window_applies() {
        let mut records = Vec::new();
        for _ in 0..6 {
            records.push(record("web-app", "chore: api cleanup"));
        }
        records.push(record("web-app", "chore: webhook"));
        let summary = summarize(records);
        let ranked: Vec<_> = summary.ranked_initiatives().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(ranked, vec!["API & Developer Experience", "Event Processing"]);
        assert_eq!(summary.continuing_initiatives().len(), 1);
        assert_eq!(summary.top_initiative().unwrap().commits, 6);
    }
}
