//! The sorting pass over a source tree.
//!
//! Every discovered audio file goes through the same decision sequence and
//! ends in exactly one category:
//!
//! ```text
//! audio file ──► over-length? ── yes ──► split into Parts (original deleted)
//!                    │ no / unknown
//!                    ▼
//!              key prefix? ──── no ───► move to Unlabeled
//!                    │ yes
//!                    ▼
//!              one-shot? ────── yes ──► move to OneShots
//!                    │ no / unknown
//!                    ▼
//!               keep in place (already sorted)
//! ```
//!
//! Errors never abort the pass: each one becomes a [`Disposition::Failed`]
//! for that file and the walk continues. Re-running a pass over the same
//! root moves nothing further.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;

use crate::classifier::is_one_shot;
use crate::codec::{AudioBackend, FormatHint};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{AudioFileRef, CamelotKey, Category, OutputDirs, ProbedDuration};
use crate::organizer::{Relocator, occupied, unique_destination};
use crate::scanner;
use crate::splitter::{SplitOutcome, Splitter, part_file_name};

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Disposition {
    /// Split into parts (planned only, in a dry run)
    Split { parts: Vec<PathBuf> },
    /// Moved (or would move) into an output directory
    Moved { category: Category, dest: PathBuf },
    /// Key-labelled and not a one-shot; left where it is
    Kept {
        key: String,
        duration_ms: Option<u64>,
    },
    /// Not an audio file
    Ignored,
    /// Processing failed; the file was left where it was
    Failed { kind: &'static str, message: String },
}

impl Disposition {
    pub fn category(&self) -> Option<Category> {
        match self {
            Disposition::Split { .. } => Some(Category::Part),
            Disposition::Moved { category, .. } => Some(*category),
            Disposition::Kept { .. } => Some(Category::KeepInPlace),
            Disposition::Ignored | Disposition::Failed { .. } => None,
        }
    }

    fn failed(error: &Error) -> Self {
        Disposition::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Per-file result of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    #[serde(flatten)]
    pub disposition: Disposition,
}

/// Result of a whole pass, outcomes in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SortReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub outcomes: Vec<FileOutcome>,
}

impl SortReport {
    pub fn count(&self, category: Category) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.disposition.category() == Some(category))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.disposition, Disposition::Failed { .. }))
    }

    /// Number of files moved, split or failed: zero on an idempotent re-run.
    pub fn changes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.disposition,
                    Disposition::Split { .. } | Disposition::Moved { .. }
                )
            })
            .count()
    }
}

/// Runs sorting passes with a given backend and configuration.
pub struct Sorter<'a> {
    backend: &'a dyn AudioBackend,
    config: &'a Config,
    relocator: Relocator,
    dry_run: bool,
    /// Destinations handed out during a dry run
    planned: Mutex<HashSet<PathBuf>>,
}

impl<'a> Sorter<'a> {
    pub fn new(backend: &'a dyn AudioBackend, config: &'a Config) -> Self {
        Self {
            backend,
            config,
            relocator: Relocator::new(),
            dry_run: false,
            planned: Mutex::new(HashSet::new()),
        }
    }

    /// Compute decisions without writing, moving or deleting anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sort everything under `root`.
    pub fn run(&self, root: &Path) -> Result<SortReport> {
        if !root.is_dir() {
            return Err(Error::not_found(root));
        }
        self.config.sorting.validate()?;

        let dirs = OutputDirs::new(root, &self.config.output);
        let files = scanner::discover(root, &dirs);
        let jobs = self.config.sorting.jobs;

        let outcomes: Vec<FileOutcome> = if jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| Error::config(format!("Failed to start worker pool: {}", e)))?;
            pool.install(|| files.par_iter().map(|f| self.process(f, &dirs)).collect())
        } else {
            files.iter().map(|f| self.process(f, &dirs)).collect()
        };

        let report = SortReport {
            root: root.to_path_buf(),
            dry_run: self.dry_run,
            outcomes,
        };
        tracing::info!(
            target: "sorter",
            files = report.outcomes.len(),
            parts = report.count(Category::Part),
            one_shots = report.count(Category::OneShot),
            unlabeled = report.count(Category::Unlabeled),
            kept = report.count(Category::KeepInPlace),
            failed = report.failures().count(),
            dry_run = self.dry_run,
            "Sort pass finished"
        );
        Ok(report)
    }

    /// Run one file through the decision sequence.
    pub fn process(&self, file: &AudioFileRef, dirs: &OutputDirs) -> FileOutcome {
        let disposition = match self.decide(file, dirs) {
            Ok(disposition) => disposition,
            Err(e) => {
                tracing::warn!(target: "sorter", path = %file.path().display(), error = %e, "Skipping file");
                Disposition::failed(&e)
            }
        };
        FileOutcome {
            source: file.path().to_path_buf(),
            disposition,
        }
    }

    fn decide(&self, file: &AudioFileRef, dirs: &OutputDirs) -> Result<Disposition> {
        if !scanner::is_audio_file(file.path()) {
            return Ok(Disposition::Ignored);
        }

        if let Some(parts) = self.try_split(file, dirs)? {
            tracing::info!(target: "sorter", path = %file.path().display(), parts = parts.len(), "Split into parts");
            return Ok(Disposition::Split { parts });
        }

        let Some(key) = CamelotKey::from_filename(&file.file_name()) else {
            return self.relocate(file, dirs, Category::Unlabeled);
        };

        let hint = FormatHint::for_path(file.path());
        let duration = ProbedDuration::from_probe(file.path(), self.backend.probe(file.path(), &hint));
        if is_one_shot(duration, self.config.sorting.one_shot_limit()) {
            return self.relocate(file, dirs, Category::OneShot);
        }

        tracing::debug!(target: "sorter", path = %file.path().display(), key = %key, duration = %duration, "Already sorted");
        Ok(Disposition::Kept {
            key: key.to_string(),
            duration_ms: duration.as_millis(),
        })
    }

    /// Parts written (or planned), `None` when no split is needed.
    fn try_split(&self, file: &AudioFileRef, dirs: &OutputDirs) -> Result<Option<Vec<PathBuf>>> {
        let splitter = Splitter::new(self.backend, &self.relocator, &self.config.sorting);

        if self.dry_run {
            let (_, plan) = splitter.plan(file);
            return Ok(plan.map(|plan| {
                let suffix = file.raw_suffix();
                plan.segments
                    .iter()
                    .map(|s| self.reserve(&dirs.parts, &part_file_name(file.raw_stem(), s, &suffix)))
                    .collect()
            }));
        }

        match splitter.split(file, &dirs.parts)? {
            SplitOutcome::Split { parts } => Ok(Some(parts)),
            SplitOutcome::NotNeeded { .. } => Ok(None),
        }
    }

    fn relocate(&self, file: &AudioFileRef, dirs: &OutputDirs, category: Category) -> Result<Disposition> {
        let dest = if self.dry_run {
            let dir = dirs
                .for_category(category)
                .ok_or_else(|| Error::config("no output directory for category"))?;
            self.reserve(dir, file.raw_file_name())
        } else {
            let dir = dirs.ensure(category)?;
            self.relocator.relocate(file, &dir)?.path().to_path_buf()
        };

        tracing::info!(
            target: "sorter",
            path = %file.path().display(),
            dest = %dest.display(),
            category = category.as_str(),
            "Moved"
        );
        Ok(Disposition::Moved { category, dest })
    }

    /// Dry-run destination: free on disk and not yet handed out.
    fn reserve(&self, dir: &Path, file_name: &OsStr) -> PathBuf {
        let mut planned = self.planned.lock();
        let dest = unique_destination(dir, file_name, |p| occupied(p) || planned.contains(p));
        planned.insert(dest.clone());
        dest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedBackend, touch};
    use tempfile::tempdir;

    const MIN: u64 = 60_000;

    fn outcome_for<'r>(report: &'r SortReport, name: &str) -> &'r FileOutcome {
        report
            .outcomes
            .iter()
            .find(|o| o.source.file_name().unwrap() == name)
            .unwrap_or_else(|| panic!("no outcome for {}", name))
    }

    fn list(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[test]
    fn test_one_shot_scenario() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("7A - Intro.wav"), b"intro");

        let backend = ScriptedBackend::new().with_duration("7A - Intro.wav", 1200);
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        let dirs = OutputDirs::new(root, &config.output);
        assert_eq!(
            outcome_for(&report, "7A - Intro.wav").disposition,
            Disposition::Moved {
                category: Category::OneShot,
                dest: dirs.one_shots.join("7A - Intro.wav"),
            }
        );
        assert_eq!(std::fs::read(dirs.one_shots.join("7A - Intro.wav")).unwrap(), b"intro");
        assert!(!root.join("7A - Intro.wav").exists());
        // Probed once for the split check and once for the one-shot check
        assert_eq!(backend.probe_count(), 2);
    }

    #[test]
    fn test_unlabeled_scenario() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("weirdname.mp3"), b"mp3");

        let backend = ScriptedBackend::new().with_duration("weirdname.mp3", 4 * MIN);
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        let dirs = OutputDirs::new(root, &config.output);
        assert_eq!(report.count(Category::Unlabeled), 1);
        assert_eq!(list(&dirs.unlabeled), vec!["weirdname.mp3"]);
        // Only the split check probes unlabeled files
        assert_eq!(backend.probe_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_moves_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let root = dir.path();
        let name = OsStr::from_bytes(b"weird\xff.mp3");
        touch(&root.join(name), b"mp3");

        let backend = ScriptedBackend::new();
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        let dirs = OutputDirs::new(root, &config.output);
        assert_eq!(
            report.outcomes[0].disposition,
            Disposition::Moved {
                category: Category::Unlabeled,
                dest: dirs.unlabeled.join(name),
            }
        );
        assert_eq!(std::fs::read(dirs.unlabeled.join(name)).unwrap(), b"mp3");
        assert!(!root.join(name).exists());
    }

    #[test]
    fn test_split_scenario_parts_not_reclassified() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("3B_Track.flac"), b"flac");
        touch(&root.join("Long Mix.mp3"), b"mp3");

        let backend = ScriptedBackend::new()
            .with_duration("3B_Track.flac", 23 * MIN)
            .with_duration("Long Mix.mp3", 12 * MIN);
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        let dirs = OutputDirs::new(root, &config.output);
        assert_eq!(
            list(&dirs.parts),
            vec![
                "3B_Track_part1.flac",
                "3B_Track_part2.flac",
                "3B_Track_part3.flac",
                "Long Mix_part1.mp3",
                "Long Mix_part2.mp3",
            ]
        );
        assert!(!root.join("3B_Track.flac").exists());
        assert!(!root.join("Long Mix.mp3").exists());
        // Unlabeled parts stay in Parts
        assert!(!dirs.unlabeled.exists());
        assert!(!dirs.one_shots.exists());
        assert_eq!(report.count(Category::Part), 2);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[test]
    fn test_same_name_one_shots_get_counters() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("kit1").join("8A - drop.wav"), b"first");
        touch(&root.join("kit2").join("8A - drop.wav"), b"second");

        let backend = ScriptedBackend::new().with_duration("8A - drop.wav", 500);
        let config = Config::default();
        Sorter::new(&backend, &config).run(root).unwrap();

        let dirs = OutputDirs::new(root, &config.output);
        assert_eq!(list(&dirs.one_shots), vec!["8A - drop.wav", "8A - drop_1.wav"]);
        assert_eq!(std::fs::read(dirs.one_shots.join("8A - drop.wav")).unwrap(), b"first");
        assert_eq!(std::fs::read(dirs.one_shots.join("8A - drop_1.wav")).unwrap(), b"second");
    }

    #[test]
    fn test_unknown_duration_keeps_labelled_file() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("5A - Corrupt.mp3"), b"junk");

        let backend = ScriptedBackend::new();
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        assert_eq!(
            outcome_for(&report, "5A - Corrupt.mp3").disposition,
            Disposition::Kept {
                key: "5A".to_string(),
                duration_ms: None
            }
        );
        assert!(root.join("5A - Corrupt.mp3").exists());
    }

    #[test]
    fn test_all_marker_goes_to_unlabeled() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("All - Ambient.wav"), b"x");

        let backend = ScriptedBackend::new().with_duration("All - Ambient.wav", MIN);
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        assert_eq!(report.count(Category::Unlabeled), 1);
    }

    #[test]
    fn test_split_failure_skips_file_and_continues() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.mp3"), b"original");
        touch(&root.join("b.mp3"), b"other");

        let backend = ScriptedBackend::new()
            .with_duration("a.mp3", 25 * MIN)
            .with_duration("b.mp3", 3 * MIN)
            .failing_on_part(2);
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        assert!(matches!(
            outcome_for(&report, "a.mp3").disposition,
            Disposition::Failed { kind: "split_export", .. }
        ));
        // Not classified further: still at its original place
        assert_eq!(std::fs::read(root.join("a.mp3")).unwrap(), b"original");
        assert_eq!(report.count(Category::Unlabeled), 1);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_non_audio_files_are_untouched() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("notes.txt"), b"hi");

        let backend = ScriptedBackend::new();
        let config = Config::default();
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        assert!(report.outcomes.is_empty());
        assert!(root.join("notes.txt").exists());
        let dirs = OutputDirs::new(root, &config.output);
        assert!(!dirs.parts.exists() && !dirs.one_shots.exists() && !dirs.unlabeled.exists());
    }

    #[test]
    fn test_process_ignores_non_audio() {
        let backend = ScriptedBackend::new();
        let config = Config::default();
        let sorter = Sorter::new(&backend, &config);
        let dirs = OutputDirs::new(Path::new("/crate"), &config.output);

        let outcome = sorter.process(&AudioFileRef::new("/crate/cover.jpg"), &dirs);
        assert_eq!(outcome.disposition, Disposition::Ignored);
        assert_eq!(backend.probe_count(), 0);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("7A - Intro.wav"), b"1");
        touch(&root.join("weirdname.mp3"), b"2");
        touch(&root.join("3B_Track.flac"), b"3");
        touch(&root.join("Sets").join("9B - Anthem.mp3"), b"4");

        let backend = ScriptedBackend::new()
            .with_duration("7A - Intro.wav", 1200)
            .with_duration("weirdname.mp3", 3 * MIN)
            .with_duration("3B_Track.flac", 23 * MIN)
            .with_duration("9B - Anthem.mp3", 6 * MIN);
        let config = Config::default();

        let first = Sorter::new(&backend, &config).run(root).unwrap();
        assert_eq!(first.changes(), 3);

        let second = Sorter::new(&backend, &config).run(root).unwrap();
        assert_eq!(second.changes(), 0);
        assert_eq!(second.outcomes.len(), 1);
        assert_eq!(second.count(Category::KeepInPlace), 1);
        assert!(root.join("Sets").join("9B - Anthem.mp3").exists());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a").join("drop.wav"), b"1");
        touch(&root.join("b").join("drop.wav"), b"2");
        touch(&root.join("3B_Track.flac"), b"3");

        let backend = ScriptedBackend::new()
            .with_duration("drop.wav", 800)
            .with_duration("3B_Track.flac", 23 * MIN);
        let config = Config::default();
        let report = Sorter::new(&backend, &config).dry_run(true).run(root).unwrap();

        let dirs = OutputDirs::new(root, &config.output);
        assert!(report.dry_run);
        assert!(!dirs.unlabeled.exists());
        assert!(!dirs.parts.exists());
        assert!(root.join("3B_Track.flac").exists());
        assert!(backend.exported().is_empty());

        let dests: Vec<PathBuf> = report
            .outcomes
            .iter()
            .filter_map(|o| match &o.disposition {
                Disposition::Moved { dest, .. } => Some(dest.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            dests,
            vec![dirs.unlabeled.join("drop.wav"), dirs.unlabeled.join("drop_1.wav")]
        );
        assert!(matches!(
            &outcome_for(&report, "3B_Track.flac").disposition,
            Disposition::Split { parts } if parts.len() == 3
        ));
    }

    #[test]
    fn test_parallel_pass_matches_sequential_counts() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut backend = ScriptedBackend::new();
        for i in 0..12 {
            let sub = root.join(format!("folder{}", i));
            touch(&sub.join("hit.wav"), format!("{}", i).as_bytes());
            touch(&sub.join(format!("{}A - Pad.wav", i % 12 + 1)), b"pad");
            backend = backend.with_duration(&format!("{}A - Pad.wav", i % 12 + 1), 300);
        }
        backend = backend.with_duration("hit.wav", 300);

        let mut config = Config::default();
        config.sorting.jobs = 4;
        let report = Sorter::new(&backend, &config).run(root).unwrap();

        let dirs = OutputDirs::new(root, &config.output);
        assert_eq!(report.count(Category::Unlabeled), 12);
        assert_eq!(report.count(Category::OneShot), 12);
        assert_eq!(list(&dirs.unlabeled).len(), 12);
        assert_eq!(list(&dirs.one_shots).len(), 12);
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_missing_root_is_error() {
        let backend = ScriptedBackend::new();
        let config = Config::default();
        let result = Sorter::new(&backend, &config).run(Path::new("/nonexistent/root"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_report_serializes_dispositions() {
        let report = SortReport {
            root: PathBuf::from("/crate"),
            dry_run: false,
            outcomes: vec![FileOutcome {
                source: PathBuf::from("/crate/weirdname.mp3"),
                disposition: Disposition::Moved {
                    category: Category::Unlabeled,
                    dest: PathBuf::from("/crate/13. Unlabeled/weirdname.mp3"),
                },
            }],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"action\":\"moved\""));
        assert!(json.contains("\"category\":\"unlabeled\""));
    }
}
