use crate::aggregate::AggregatedData;
use crate::business::{
    BusinessSummary, ComponentHealth, HealthLevel, HealthPolicy, Initiative, OverallHealth,
};
use crate::cli::CommonArgs;
use crate::model::{CommitType, ReportHeader, WeekRange};
use crate::parse::parse_log;
use crate::rules::RuleSet;
use crate::util::{read_input, write_json};
use anyhow::Context;
use console::style;
use serde::{Deserialize, Serialize};
use tracing::info;

const TOP_INITIATIVES: usize = 3;
const ISSUES_SHOWN: usize = 3;
const FOCUS_AREAS_SHOWN: usize = 2;
const MERGES_SHOWN: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub component: String,
    pub status: HealthLevel,
    pub features: usize,
    pub fixes: usize,
    pub critical_issues: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEntry {
    pub component: String,
    pub issue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeEntry {
    pub repo: String,
    pub author: String,
    pub date: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub author: String,
    pub features: usize,
    pub fixes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentMetrics {
    pub features: usize,
    pub fixes: usize,
    pub tests: usize,
    pub refactors: usize,
    pub active_repositories: usize,
    pub tracked_repositories: usize,
    pub merge_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub focus: Option<Initiative>,
    pub team: Vec<String>,
    pub velocity: usize,
    pub health: OverallHealth,
    pub components: Vec<ComponentStatus>,
    pub top_initiatives: Vec<Initiative>,
    pub critical_issues: Vec<IssueEntry>,
    pub stability_focus: Vec<ComponentHealth>,
    pub metrics: DevelopmentMetrics,
    pub merges: Vec<MergeEntry>,
    pub contributions: Vec<Contribution>,
    pub next_priorities: Vec<String>,
}

pub fn build_report(
    data: &AggregatedData,
    summary: &BusinessSummary,
    policy: &HealthPolicy,
    tracked_repositories: usize,
    week: WeekRange,
) -> BusinessReport {
    let mut components: Vec<_> = summary
        .components
        .iter()
        .map(|c| ComponentStatus {
            component: c.name.clone(),
            status: c.status(policy),
            features: c.features,
            fixes: c.fixes,
            critical_issues: c.issues.len(),
        })
        .collect();
    components.sort_by(|a, b| a.component.cmp(&b.component));

    let ranked = summary.ranked_initiatives();

    let continuing = summary.continuing_initiatives();
    let next_priorities = if continuing.is_empty() {
        vec![
            "Address critical issues from this week".to_string(),
            "Continue feature development momentum".to_string(),
            "Focus on code quality and test coverage".to_string(),
        ]
    } else {
        continuing
            .iter()
            .take(3)
            .map(|i| format!("Continue {} work", i.name))
            .collect()
    };

    BusinessReport {
        header: ReportHeader::new(week),
        focus: summary.top_initiative().cloned(),
        team: data.authors().into_iter().map(String::from).collect(),
        velocity: data.total_commits(),
        health: summary.overall,
        components,
        top_initiatives: ranked.into_iter().take(TOP_INITIATIVES).cloned().collect(),
        critical_issues: summary
            .critical_issues()
            .into_iter()
            .take(ISSUES_SHOWN)
            .map(|(component, issue)| IssueEntry {
                component: component.to_string(),
                issue,
            })
            .collect(),
        stability_focus: summary
            .stability_focus(policy)
            .into_iter()
            .take(FOCUS_AREAS_SHOWN)
            .cloned()
            .collect(),
        metrics: DevelopmentMetrics {
            features: summary.features,
            fixes: summary.fixes,
            tests: data.count(CommitType::Test),
            refactors: data.count(CommitType::Refactor),
            active_repositories: data.active_repositories(),
            tracked_repositories,
            merge_requests: summary.merge_requests,
        },
        merges: data
            .merge_requests()
            .map(|r| MergeEntry {
                repo: r.repo.clone(),
                author: r.author.clone(),
                date: r.day().to_string(),
                subject: r.subject.clone(),
            })
            .collect(),
        contributions: data
            .author_contributions()
            .into_iter()
            .map(|(author, features, fixes)| Contribution {
                author: author.to_string(),
                features,
                fixes,
            })
            .collect(),
        next_priorities,
    }
}

/// Parses and summarises a dump in one go.
pub fn summarize(
    text: &str,
    rules: &RuleSet,
    policy: &HealthPolicy,
) -> (AggregatedData, BusinessSummary) {
    let data = AggregatedData::from_parsed(parse_log(text));
    let summary = BusinessSummary::build(&data, rules, policy);
    (data, summary)
}

pub fn exec(common: CommonArgs, week: WeekRange, json: bool) -> anyhow::Result<()> {
    let config = common.config()?;

    info!("Parsing commits and aggregating initiatives from {}", config.input.log_file.display());
    let text = read_input(&config.input.log_file).with_context(|| {
        format!("Failed to read commit dump {}", config.input.log_file.display())
    })?;
    let (data, summary) = summarize(&text, &config.rules, &config.health);

    let report = build_report(
        &data,
        &summary,
        &config.health,
        config.orchestrate.repositories.len(),
        week,
    );

    if !common.no_save {
        let file_name = format!("{}-business.json", week.start);
        let path = write_json(&config.output.report_dir, &file_name, &report)
            .context("Failed to save business summary")?;
        info!("Business summary saved to {}", path.display());
    }

    info!("Identified {} initiatives", summary.initiatives.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output_summary(&report)?;
    }
    Ok(())
}

fn output_summary(report: &BusinessReport) -> anyhow::Result<()> {
    println!("{}", style("Weekly Engineering Update").bold());
    println!("{}", report.header.week);
    println!("{}", "─".repeat(60));

    match &report.focus {
        Some(focus) => println!(
            "This week's focus: {} ({} changes across {} components)",
            style(&focus.name).green(),
            focus.commits,
            focus.repositories.len()
        ),
        None => println!("This week's focus: General improvements"),
    }
    println!(
        "Team: {} • Velocity: {} changes • Health: {}",
        report.team.join(", "),
        style(report.velocity).cyan(),
        report.health
    );

    println!("\n{}", style("Component status").bold());
    for c in &report.components {
        let detail = match c.status {
            HealthLevel::AtRisk => format!(
                "{} features, {} fixes, {} critical issues",
                c.features, c.fixes, c.critical_issues
            ),
            HealthLevel::NeedsAttention => {
                format!("{} features, {} fixes (high fix activity)", c.features, c.fixes)
            }
            HealthLevel::Healthy => format!("{} features, {} fixes", c.features, c.fixes),
        };
        println!("  {} {:<20} {}", c.status.marker(), c.component, detail);
    }

    println!("\n{}", style("Top initiatives").bold());
    for (idx, initiative) in report.top_initiatives.iter().enumerate() {
        println!(
            "  {}. {} ({} changes across {} components)",
            idx + 1,
            style(&initiative.name).green(),
            initiative.commits,
            initiative.repositories.len()
        );
        for highlight in &initiative.highlights {
            println!("     - {highlight}");
        }
    }

    println!("\n{}", style("Issues & challenges").bold());
    if report.critical_issues.is_empty() {
        println!("  No critical issues this week");
    }
    for entry in &report.critical_issues {
        println!("  {}: {}", style(&entry.component).red(), entry.issue);
    }
    for c in &report.stability_focus {
        println!(
            "  {}: high bug fix activity ({} fixes vs {} features)",
            style(&c.name).yellow(),
            c.fixes,
            c.features
        );
    }

    let m = &report.metrics;
    println!("\n{}", style("Development metrics").bold());
    println!("  Features shipped: {}", m.features);
    println!("  Issues resolved: {}", m.fixes);
    println!("  Tests: {}, refactorings: {}", m.tests, m.refactors);
    println!(
        "  Active components: {}/{} repositories",
        m.active_repositories, m.tracked_repositories
    );
    println!("  Merge requests: {}", m.merge_requests);
    for merge in report.merges.iter().take(MERGES_SHOWN) {
        println!(
            "    {} {} ({})",
            style(&merge.date).dim(),
            merge.subject,
            merge.repo
        );
    }

    println!("\n{}", style("Team contribution").bold());
    for c in &report.contributions {
        println!("  {}: {} features, {} fixes", c.author, c.features, c.fixes);
    }

    println!("\n{}", style("Next week").bold());
    for (idx, item) in report.next_priorities.iter().enumerate() {
        println!("  {}. {}", idx + 1, item);
    }
    Ok(())
}
