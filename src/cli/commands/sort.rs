//! Sorting pass command.

use std::path::Path;

use crate::codec::DefaultBackend;
use crate::config::Config;
use crate::model::Category;
use crate::sorter::{Disposition, SortReport, Sorter};

use super::require_dir;

/// Sort the library under `root`
pub fn cmd_sort(config: &Config, root: &Path, dry_run: bool, json: bool) -> anyhow::Result<()> {
    require_dir(root)?;

    let backend = DefaultBackend::from_config(&config.tools);
    let report = Sorter::new(&backend, config).dry_run(dry_run).run(root)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if dry_run {
        println!("[DRY RUN MODE - No files will be changed]\n");
    }
    print_outcomes(&report, root);
    print_summary(&report);
    Ok(())
}

fn print_outcomes(report: &SortReport, root: &Path) {
    let verb = |done: &'static str, planned: &'static str| if report.dry_run { planned } else { done };

    for outcome in &report.outcomes {
        let source = outcome.source.strip_prefix(root).unwrap_or(&outcome.source);
        match &outcome.disposition {
            Disposition::Split { parts } => {
                println!("{} {} into {} parts", verb("SPLIT:", "WOULD SPLIT:"), source.display(), parts.len());
            }
            Disposition::Moved { dest, .. } => {
                let dest = dest.strip_prefix(root).unwrap_or(dest);
                println!("{} {} -> {}", verb("MOVED:", "WOULD MOVE:"), source.display(), dest.display());
            }
            Disposition::Failed { message, .. } => {
                eprintln!("ERROR: {}: {}", source.display(), message);
            }
            Disposition::Kept { .. } | Disposition::Ignored => {}
        }
    }
}

fn print_summary(report: &SortReport) {
    println!();
    println!("Files:      {}", report.outcomes.len());
    println!("Split:      {}", report.count(Category::Part));
    println!("One-shots:  {}", report.count(Category::OneShot));
    println!("Unlabeled:  {}", report.count(Category::Unlabeled));
    println!("Kept:       {}", report.count(Category::KeepInPlace));
    let failed = report.failures().count();
    if failed > 0 {
        println!("Errors:     {}", failed);
    }
}
