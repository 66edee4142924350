//! Tag report command.

use std::path::Path;

use crate::metadata::report;
use crate::scanner;

use super::require_dir;

/// Print title, artist and key for every file under `root`
pub fn cmd_report(root: &Path, rename: bool, json: bool) -> anyhow::Result<()> {
    require_dir(root)?;

    let files = scanner::discover_all(root);
    let entries = report::build(&files, rename);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:<50} {:<30} {:<30} {:<6}", "File", "Title", "Artist", "Key");
    println!("{}", "-".repeat(119));
    for entry in &entries {
        let shown = entry.renamed_to.as_ref().unwrap_or(&entry.path);
        let name = shown
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:<50} {:<30} {:<30} {:<6}",
            truncate(&name, 50),
            truncate(entry.tags.title.as_deref().unwrap_or("-"), 30),
            truncate(entry.tags.artist.as_deref().unwrap_or("-"), 30),
            entry.tags.key.as_deref().unwrap_or("-"),
        );
        if let Some(error) = &entry.error {
            eprintln!("  ! {}", error);
        }
    }

    let unlabelled = entries.iter().filter(|e| !e.labelled).count();
    let renamed = entries.iter().filter(|e| e.renamed_to.is_some()).count();
    println!("\n{} files, {} without a key label", entries.len(), unlabelled);
    if rename {
        println!("Renamed {} files with the \"All - \" prefix", renamed);
    }
    Ok(())
}

/// Shorten `s` to at most `max` characters for table output.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ääääää", 3).chars().count(), 3);
    }
}
