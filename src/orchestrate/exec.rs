use super::analysis::{run_unit, RepoAnalysis, UnitContext};
use super::fleet::{load_artifacts, FleetSummary};
use crate::cli::{CommonArgs, OrchestrateArgs};
use crate::config::Config;
use crate::model::WeekRange;
use crate::util::write_json;
use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{error, info, warn};

pub fn exec(common: CommonArgs, week: WeekRange, opts: OrchestrateArgs) -> anyhow::Result<()> {
    let mut config = common.config()?;
    if let Some(dir) = opts.commit_dir {
        config.input.commit_dir = dir;
    }
    if let Some(dir) = opts.artifact_dir {
        config.output.agent_output_dir = dir;
    }

    let analyses = if opts.aggregate_only {
        info!(
            "Aggregating existing artifacts from {}",
            config.output.agent_output_dir.display()
        );
        load_artifacts(&config.output.agent_output_dir)
            .context("Failed to read analysis artifacts")?
    } else {
        analyze_fleet(&config, !opts.json)?
    };

    let summary =
        FleetSummary::from_analyses(&analyses, config.orchestrate.repositories.len(), week);

    if !common.no_save {
        let file_name = format!("{}-fleet.json", week.start);
        let path = write_json(&config.output.report_dir, &file_name, &summary)
            .context("Failed to save fleet summary")?;
        info!("Fleet summary saved to {}", path.display());
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output_fleet(&summary);
    }
    Ok(())
}

/// Runs one analysis unit per configured repository on a bounded pool.
///
/// A failing unit is logged and left out; the rest still aggregate.
pub fn analyze_fleet(config: &Config, show_progress: bool) -> anyhow::Result<Vec<RepoAnalysis>> {
    let repos = &config.orchestrate.repositories;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.orchestrate.max_workers)
        .build()
        .context("Failed to build worker pool")?;

    let ctx = UnitContext {
        commit_dir: &config.input.commit_dir,
        artifact_dir: &config.output.agent_output_dir,
        rules: &config.rules,
        policy: &config.health,
    };

    let pb = if show_progress {
        ProgressBar::new(repos.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message("Analysing repositories...");

    info!(
        "Launching {} analysis units with {} workers",
        repos.len(),
        config.orchestrate.max_workers
    );

    let results: Vec<_> = pool.install(|| {
        repos
            .par_iter()
            .map(|repo| {
                let outcome = run_unit(repo, &ctx);
                pb.inc(1);
                (repo, outcome)
            })
            .collect()
    });
    pb.finish_and_clear();

    let mut analyses = Vec::new();
    let mut failed = 0usize;
    for (repo, outcome) in results {
        match outcome {
            Ok(Some(analysis)) => analyses.push(analysis),
            Ok(None) => {}
            Err(e) => {
                failed += 1;
                error!(repo = %repo, "Analysis failed: {e}");
            }
        }
    }
    if failed > 0 {
        warn!("{} of {} analysis units failed", failed, repos.len());
    }
    info!("Completed {} analyses", analyses.len());
    Ok(analyses)
}

fn output_fleet(summary: &FleetSummary) {
    println!("{}", style(format!("Fleet Summary: {}", summary.header.week)).bold());
    println!("{}", "─".repeat(60));
    println!("Total commits: {}", style(summary.total_commits).cyan());
    println!(
        "Active components: {}/{}",
        style(summary.active_components).cyan(),
        summary.tracked_repositories
    );
    println!("Contributors: {}", summary.authors.join(", "));

    println!("\n{}", style("Component health").bold());
    for row in &summary.components {
        println!(
            "  {} {:<28} {:>4} commits {:>3} branches",
            row.health, row.repo, row.commits, row.active_branches
        );
    }

    if !summary.alpha_deployments.is_empty() {
        println!("\n{}", style("Alpha deployments").bold());
        for d in &summary.alpha_deployments {
            println!(
                "  {} {} ({})",
                style(&d.date).dim(),
                d.feature,
                d.repo.as_deref().unwrap_or("-")
            );
        }
    }

    if !summary.top_initiatives.is_empty() {
        println!("\n{}", style("Top initiatives").bold());
        for (idx, i) in summary.top_initiatives.iter().enumerate() {
            println!("  {}. {}: {}", idx + 1, style(&i.name).green(), i.impact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const DUMP: &str = "\
COMMIT_START
a1|Al|al@x|2024-01-02|feat: login page
COMMIT_END
";

    #[test]
    fn fleet_skips_missing_and_idle_repositories() {
        let commits = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        std::fs::write(commits.path().join("web-app.txt"), DUMP).unwrap();
        std::fs::write(
            commits.path().join("workers.txt"),
            "=== NO ACTIVITY THIS WEEK ===\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.input.commit_dir = commits.path().to_path_buf();
        config.output.agent_output_dir = artifacts.path().to_path_buf();
        config.orchestrate.repositories =
            vec!["web-app".into(), "workers".into(), "k8s-charts".into()];
        config.orchestrate.max_workers = 2;

        let analyses = analyze_fleet(&config, false).unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].repo, "web-app");
        assert!(artifacts.path().join("web-app_analysis.json").exists());
        assert!(!artifacts.path().join("workers_analysis.json").exists());
    }

    #[test]
    fn aggregate_only_matches_fresh_run() {
        let commits = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        std::fs::write(commits.path().join("web-app.txt"), DUMP).unwrap();

        let mut config = Config::default();
        config.input.commit_dir = commits.path().to_path_buf();
        config.output.agent_output_dir = artifacts.path().to_path_buf();
        config.orchestrate.repositories = vec!["web-app".into()];

        let fresh = analyze_fleet(&config, false).unwrap();
        let reloaded = load_artifacts(artifacts.path()).unwrap();
        assert_eq!(fresh, reloaded);
    }
}
