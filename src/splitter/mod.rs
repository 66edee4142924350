//! Splitting of over-length recordings into fixed-length parts.
//!
//! A file longer than the threshold becomes `<stem>_part1<ext>`,
//! `<stem>_part2<ext>`, ... in the parts directory, and the original is
//! deleted. The original stays authoritative until every part exists under
//! its final name:
//!
//! 1. every segment is exported to a hidden staging file in the parts
//!    directory,
//! 2. staged files are renamed to their final, collision-free names,
//! 3. the original is deleted.
//!
//! A failure in step 1 removes the staged files and leaves the original
//! untouched. If the original is still present after a run, the split did
//! not complete.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::codec::{AudioBackend, FormatHint};
use crate::config::SortingConfig;
use crate::error::{Error, Result};
use crate::model::{AudioFileRef, ProbedDuration, Segment};
use crate::organizer::Relocator;

/// Cut `total_ms` into consecutive segments of `segment_ms`.
///
/// The last segment holds the remainder; it is never empty. Zero-length
/// input yields no segments.
pub fn plan_segments(total_ms: u64, segment_ms: u64) -> Vec<Segment> {
    if total_ms == 0 || segment_ms == 0 {
        return Vec::new();
    }
    let count = total_ms.div_ceil(segment_ms) as usize;
    (0..count)
        .map(|i| {
            let start = i as u64 * segment_ms;
            let end = ((i as u64 + 1) * segment_ms).min(total_ms);
            Segment::new(i, start, end, i + 1 == count)
        })
        .collect()
}

/// Final file name of a part: `<stem>_part<n><suffix>`.
pub fn part_file_name(stem: &OsStr, segment: &Segment, suffix: &OsStr) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_part{}", segment.number()));
    name.push(suffix);
    name
}

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Token distinguishing the staging files of concurrent splits of files
/// that share a stem.
fn staging_token() -> String {
    format!("{}-{}", std::process::id(), STAGING_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Hidden staging name, extension kept last so encoders can infer the
/// container.
fn staging_file_name(stem: &OsStr, segment: &Segment, token: &str, suffix: &OsStr) -> OsString {
    let mut name = OsString::from(".");
    name.push(part_file_name(stem, segment, OsStr::new("")));
    name.push(format!(".{}.partial", token));
    name.push(suffix);
    name
}

/// Result of a split attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Not longer than the threshold, or duration unknown. Nothing changed.
    NotNeeded { duration: ProbedDuration },
    /// Parts written and original deleted.
    Split { parts: Vec<PathBuf> },
}

/// What a split would produce, without touching the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub total_ms: u64,
    pub segments: Vec<Segment>,
}

/// Splits long files using an [`AudioBackend`].
pub struct Splitter<'a> {
    backend: &'a dyn AudioBackend,
    relocator: &'a Relocator,
    threshold_ms: u64,
    segment_ms: u64,
}

impl<'a> Splitter<'a> {
    pub fn new(backend: &'a dyn AudioBackend, relocator: &'a Relocator, sorting: &SortingConfig) -> Self {
        Self {
            backend,
            relocator,
            threshold_ms: sorting.split_threshold_ms(),
            segment_ms: sorting.segment_ms(),
        }
    }

    /// Probe `file` and decide whether it must be split.
    ///
    /// The plan is `None` when the file is within the threshold. Probe
    /// failures are not errors here: an unknown duration is never
    /// over-length.
    pub fn plan(&self, file: &AudioFileRef) -> (ProbedDuration, Option<SplitPlan>) {
        let hint = FormatHint::for_path(file.path());
        let duration = ProbedDuration::from_probe(file.path(), self.backend.probe(file.path(), &hint));

        let plan = duration
            .as_millis()
            .filter(|total_ms| *total_ms > self.threshold_ms)
            .map(|total_ms| SplitPlan {
                total_ms,
                segments: plan_segments(total_ms, self.segment_ms),
            });
        (duration, plan)
    }

    /// Split `file` into `parts_dir` if it is over the threshold.
    ///
    /// `parts_dir` is created on first use. On [`Error::SplitExport`] the
    /// original file is still in place.
    pub fn split(&self, file: &AudioFileRef, parts_dir: &Path) -> Result<SplitOutcome> {
        let (duration, plan) = self.plan(file);
        let Some(plan) = plan else {
            return Ok(SplitOutcome::NotNeeded { duration });
        };

        tracing::info!(
            target: "splitter",
            path = %file.path().display(),
            duration = %duration,
            parts = plan.segments.len(),
            "Splitting long recording"
        );

        let parts = self.execute(file, parts_dir, &plan)?;
        Ok(SplitOutcome::Split { parts })
    }

    fn execute(&self, file: &AudioFileRef, parts_dir: &Path, plan: &SplitPlan) -> Result<Vec<PathBuf>> {
        let hint = FormatHint::for_path(file.path());
        let stem = file.raw_stem();
        let suffix = file.raw_suffix();
        let token = staging_token();

        std::fs::create_dir_all(parts_dir)?;

        // 1. Export everything to staging names
        let mut staged: Vec<(PathBuf, OsString)> = Vec::with_capacity(plan.segments.len());
        for segment in &plan.segments {
            let staging = parts_dir.join(staging_file_name(stem, segment, &token, &suffix));
            let exported = self
                .backend
                .export_segment(file.path(), &staging, &hint, segment);
            if let Err(e) = exported {
                let _ = std::fs::remove_file(&staging);
                discard(&staged);
                return Err(Error::split_export(file.path(), segment.number(), e));
            }
            tracing::debug!(
                target: "splitter",
                part = segment.number(),
                of = plan.segments.len(),
                start_ms = segment.start_ms,
                end_ms = segment.end_ms,
                "Exported part"
            );
            staged.push((staging, part_file_name(stem, segment, &suffix)));
        }

        // 2. Publish under final names
        let mut parts = Vec::with_capacity(staged.len());
        for (i, (staging, final_name)) in staged.iter().enumerate() {
            match self.relocator.rename_into(staging, parts_dir, final_name) {
                Ok(path) => parts.push(path),
                Err(e) => {
                    discard(&staged[i..]);
                    for published in &parts {
                        let _ = std::fs::remove_file(published);
                    }
                    return Err(Error::split_export(file.path(), i + 1, e));
                }
            }
        }

        // 3. Only now is the original redundant
        std::fs::remove_file(file.path())?;
        tracing::info!(target: "splitter", path = %file.path().display(), "Deleted original after split");

        Ok(parts)
    }
}

fn discard(staged: &[(PathBuf, OsString)]) {
    for (path, _) in staged {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(target: "splitter", path = %path.display(), error = %e, "Could not remove staged part");
        }
    }
}
