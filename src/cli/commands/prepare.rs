//! Tag preparation command.

use std::path::Path;

use crate::metadata::{self, PrepareAction};
use crate::scanner;

use super::require_dir;

/// Strip tags under `root` ahead of key analysis
pub fn cmd_prepare(root: &Path, dry_run: bool) -> anyhow::Result<()> {
    require_dir(root)?;

    let files = scanner::discover_all(root);
    println!("Preparing {} files...", files.len());
    if dry_run {
        println!("\n[DRY RUN MODE - No tags will be written]\n");
    }

    let mut prepared = 0;
    let mut skipped = 0;
    let mut errors = 0;

    for file in &files {
        let result = if dry_run {
            Ok(metadata::plan_prepare(file))
        } else {
            metadata::prepare_tags(file)
        };

        match result {
            Ok(PrepareAction::Unsupported) => skipped += 1,
            Ok(action) => {
                if dry_run {
                    let what = match &action {
                        PrepareAction::Retitle { title } => format!("strip tags, title \"{}\"", title),
                        _ => "strip tags".to_string(),
                    };
                    println!("WOULD PREPARE: {} ({})", file, what);
                }
                prepared += 1;
            }
            Err(e) => {
                eprintln!("ERROR preparing {}: {}", file, e);
                errors += 1;
            }
        }
    }

    println!(
        "\nCompleted: {} prepared, {} skipped, {} errors",
        prepared, skipped, errors
    );
    Ok(())
}
