use crate::aggregate::AggregatedData;
use crate::cli::CommonArgs;
use crate::model::{CommitRecord, CommitType, ReportHeader, WeekRange};
use crate::parse::parse_log;
use crate::util::{read_input, truncate, write_json};
use anyhow::Context;
use console::style;
use serde::{Deserialize, Serialize};
use tracing::info;

const AUTHOR_COMMITS_SHOWN: usize = 5;
const REPO_COMMITS_SHOWN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCount {
    pub repo: String,
    pub commits: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeGroup {
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub commits: Vec<CommitRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoActivity {
    pub repo: String,
    pub commits: usize,
    pub by_type: Vec<TypeGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorActivity {
    pub author: String,
    pub commits: usize,
    pub repositories: Vec<RepoActivity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub total_commits: usize,
    pub active_repositories: usize,
    pub contributors: Vec<String>,
    pub most_active_repository: Option<RepoCount>,
    pub commit_types: Vec<TypeCount>,
    pub authors: Vec<AuthorActivity>,
    pub repositories: Vec<RepoActivity>,
    pub idle_repositories: Vec<String>,
    pub unreachable_repositories: Vec<String>,
}

/// Groups commits by type in reporting order; types outside it are left out.
fn group_by_type(commits: &[&CommitRecord]) -> Vec<TypeGroup> {
    CommitType::REPORT_ORDER
        .iter()
        .filter_map(|&t| {
            let matching: Vec<CommitRecord> = commits
                .iter()
                .filter(|c| c.commit_type == t)
                .map(|c| (*c).clone())
                .collect();
            (!matching.is_empty()).then_some(TypeGroup {
                commit_type: t,
                commits: matching,
            })
        })
        .collect()
}

/// Commits of `commits` split per repository, busiest repository first.
fn per_repository(commits: &[&CommitRecord]) -> Vec<RepoActivity> {
    let data = AggregatedData::fold(commits.iter().map(|c| (*c).clone()));
    let mut rows: Vec<_> = data
        .by_repo()
        .iter()
        .map(|(repo, ids)| {
            let repo_commits: Vec<_> = data.resolve(ids).collect();
            RepoActivity {
                repo: repo.to_string(),
                commits: ids.len(),
                by_type: group_by_type(&repo_commits),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.commits.cmp(&a.commits));
    rows
}

pub fn build_report(data: &AggregatedData, week: WeekRange) -> TechnicalReport {
    let mut authors: Vec<_> = data
        .by_author()
        .iter()
        .map(|(author, ids)| {
            let commits: Vec<_> = data.resolve(ids).collect();
            AuthorActivity {
                author: author.to_string(),
                commits: ids.len(),
                repositories: per_repository(&commits),
            }
        })
        .collect();
    authors.sort_by(|a, b| b.commits.cmp(&a.commits));

    let mut repositories: Vec<_> = data
        .by_repo()
        .iter()
        .map(|(repo, ids)| {
            let commits: Vec<_> = data.resolve(ids).collect();
            RepoActivity {
                repo: repo.to_string(),
                commits: ids.len(),
                by_type: group_by_type(&commits),
            }
        })
        .collect();
    repositories.sort_by(|a, b| b.commits.cmp(&a.commits));

    TechnicalReport {
        header: ReportHeader::new(week),
        total_commits: data.total_commits(),
        active_repositories: data.active_repositories(),
        contributors: data.authors().into_iter().map(String::from).collect(),
        most_active_repository: data.most_active_repository().map(|(repo, commits)| RepoCount {
            repo: repo.to_string(),
            commits,
        }),
        commit_types: data
            .types_by_count()
            .into_iter()
            .map(|(commit_type, count)| TypeCount { commit_type, count })
            .collect(),
        authors,
        repositories,
        idle_repositories: data.idle_repositories.clone(),
        unreachable_repositories: data.unreachable_repositories.clone(),
    }
}

pub fn exec(common: CommonArgs, week: WeekRange, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let config = common.config()?;

    info!("Parsing commits from {}", config.input.log_file.display());
    let text = read_input(&config.input.log_file).with_context(|| {
        format!("Failed to read commit dump {}", config.input.log_file.display())
    })?;
    let data = AggregatedData::from_parsed(parse_log(&text));

    let report = build_report(&data, week);

    if !common.no_save {
        let file_name = format!("{}-technical.json", week.start);
        let path = write_json(&config.output.report_dir, &file_name, &report)
            .context("Failed to save technical report")?;
        info!("Report saved to {}", path.display());
    }

    if json {
        output_json(&report)?;
    } else if ndjson {
        output_ndjson(&data)?;
    } else {
        output_table(&report)?;
    }

    Ok(())
}

fn output_json(report: &TechnicalReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn output_ndjson(data: &AggregatedData) -> anyhow::Result<()> {
    for record in data.records() {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn output_table(report: &TechnicalReport) -> anyhow::Result<()> {
    println!("{}", style(format!("Weekly Summary: {}", report.header.week)).bold());
    println!("{}", "─".repeat(60));
    println!("Total commits: {}", style(report.total_commits).cyan());
    println!(
        "Active repositories: {}",
        style(report.active_repositories).cyan()
    );
    println!("Contributors: {}", report.contributors.join(", "));
    if let Some(top) = &report.most_active_repository {
        println!("Most active repo: {} ({} commits)", style(&top.repo).green(), top.commits);
    }

    println!("\n{}", style("Commits by type").bold());
    for tc in &report.commit_types {
        println!("  {:<10} {:>5}", tc.commit_type.as_str(), tc.count);
    }

    println!("\n{}", style("Contributions by author").bold());
    for author in &report.authors {
        println!("\n{} ({} commits)", style(&author.author).yellow(), author.commits);
        for repo in &author.repositories {
            println!("  {} ({} commits)", repo.repo, repo.commits);
            for group in &repo.by_type {
                println!("    {}:", group.commit_type.title());
                print_commits(&group.commits, AUTHOR_COMMITS_SHOWN, false);
            }
        }
    }

    println!("\n{}", style("Activity by repository").bold());
    for repo in &report.repositories {
        println!("\n{} ({} commits)", style(&repo.repo).green(), repo.commits);
        for group in &repo.by_type {
            println!("  {} ({})", group.commit_type.title(), group.commits.len());
            print_commits(&group.commits, REPO_COMMITS_SHOWN, true);
        }
    }

    if !report.idle_repositories.is_empty() {
        println!("\n{}", style("Repositories with no activity").bold());
        for repo in &report.idle_repositories {
            println!("  - {repo}");
        }
    }
    if !report.unreachable_repositories.is_empty() {
        println!("\n{}", style("Repositories not found").bold());
        for repo in &report.unreachable_repositories {
            println!("  - {}", style(repo).dim());
        }
    }

    Ok(())
}

fn print_commits(commits: &[CommitRecord], limit: usize, detailed: bool) {
    for c in commits.iter().take(limit) {
        if detailed {
            println!(
                "    {} {} - {} - {}",
                style(c.short_hash()).dim(),
                c.subject,
                c.author,
                c.day()
            );
        } else {
            println!("      {} {}", style(c.short_hash()).dim(), c.subject);
        }
        if let Some(line) = c.body_summary() {
            let max = if detailed { 150 } else { 100 };
            println!("        > {}", truncate(line, max));
        }
    }
    if commits.len() > limit {
        println!("      (and {} more)", commits.len() - limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const DUMP: &str = "\
=== REPO: web-app ===
COMMIT_START
aaaaaaaaa|Al|al@x|2024-01-02|feat: one
first body line
COMMIT_END
COMMIT_START
bbbbbbbbb|Bo|bo@x|2024-01-03|fix: two
COMMIT_END
COMMIT_START
ccccccccc|Al|al@x|2024-01-03|ci: three
COMMIT_END
=== REPO: workers ===
COMMIT_START
ddddddddd|Al|al@x|2024-01-04|feat: four
COMMIT_END
=== REPO: k8s-charts ===
=== NO ACTIVITY THIS WEEK ===
";

    fn week() -> WeekRange {
        WeekRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn report_summarises_overview() {
        let data = AggregatedData::from_parsed(parse_log(DUMP));
        let report = build_report(&data, week());
        assert_eq!(report.total_commits, 4);
        assert_eq!(report.active_repositories, 2);
        assert_eq!(report.contributors, vec!["Al".to_string(), "Bo".to_string()]);
        assert_eq!(report.most_active_repository.unwrap().repo, "web-app");
        assert_eq!(report.idle_repositories, vec!["k8s-charts".to_string()]);
        assert_eq!(report.commit_types[0].commit_type, CommitType::Feat);
        assert_eq!(report.commit_types[0].count, 2);
    }

    #[test]
    fn type_groups_skip_types_outside_report_order() {
        let data = AggregatedData::from_parsed(parse_log(DUMP));
        let report = build_report(&data, week());
        let web = &report.repositories[0];
        let types: Vec<_> = web.by_type.iter().map(|g| g.commit_type).collect();
        // the ci commit is counted but not listed
        assert_eq!(types, vec![CommitType::Feat, CommitType::Fix]);
        assert_eq!(web.commits, 3);
    }

    #[test]
    fn authors_are_split_per_repository() {
        let data = AggregatedData::from_parsed(parse_log(DUMP));
        let report = build_report(&data, week());
        let al = &report.authors[0];
        assert_eq!(al.author, "Al");
        assert_eq!(al.commits, 3);
        let repos: Vec<_> = al.repositories.iter().map(|r| (r.repo.as_str(), r.commits)).collect();
        assert_eq!(repos, vec![("web-app", 2), ("workers", 1)]);
    }

    #[test]
    fn report_serialises_with_header_fields() {
        let data = AggregatedData::from_parsed(parse_log(DUMP));
        let value = serde_json::to_value(build_report(&data, week())).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["week"]["start"], "2024-01-01");
        assert_eq!(value["repositories"][0]["by_type"][0]["type"], "feat");
    }
}
