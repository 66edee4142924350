//! Collision-free file relocation.
//!
//! Moves files into an output directory without ever overwriting: if the
//! name is taken, `_1`, `_2`, ... is appended before the extension until a
//! free name is found.
//!
//! # Features
//! - Pure name search with an injected existence check ([`unique_destination`])
//! - Names are handled as `OsStr`, so bytes that are not valid UTF-8 are kept
//! - Per-directory locking so parallel moves never pick the same name
//! - No-replace publish: the file is hard-linked under its new name and the
//!   old link removed, so an entry that appears after the check is never
//!   replaced
//! - A move is never a copy, and a failed move leaves the file where it was

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::model::AudioFileRef;

/// Whether anything occupies `path`, including a dangling symlink.
pub fn occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Split a file name into stem and extension (without dot), e.g.
/// `drop.wav` -> (`drop`, `wav`), `README` -> (`README`, none).
fn split_name(file_name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let name = Path::new(file_name);
    (name.file_stem().unwrap_or(file_name), name.extension())
}

/// `<stem>_<counter>.<ext>`, byte for byte.
fn numbered_name(stem: &OsStr, counter: u64, ext: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{}", counter));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

/// First free destination for `file_name` inside `dest_dir`.
///
/// Tries the name itself, then `<stem>_1<suffix>`, `<stem>_2<suffix>`, ...
/// in order. Terminates because the directory holds finitely many entries.
pub fn unique_destination<N, F>(dest_dir: &Path, file_name: N, exists: F) -> PathBuf
where
    N: AsRef<OsStr>,
    F: Fn(&Path) -> bool,
{
    let file_name = file_name.as_ref();
    let candidate = dest_dir.join(file_name);
    if !exists(&candidate) {
        return candidate;
    }

    let (stem, ext) = split_name(file_name);
    let mut counter: u64 = 1;
    loop {
        let candidate = dest_dir.join(numbered_name(stem, counter, ext));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Moves files into directories, serializing name selection per directory.
#[derive(Debug, Default)]
pub struct Relocator {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Relocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, dir: &Path) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(dir.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Move `file` into `dest_dir` under a free name and return the new
    /// reference.
    pub fn relocate(&self, file: &AudioFileRef, dest_dir: &Path) -> Result<AudioFileRef> {
        let moved = self.rename_into(file.path(), dest_dir, file.raw_file_name())?;
        Ok(file.with_path(moved))
    }

    /// Move `source` into `dest_dir` as `file_name`, or the first free
    /// variant of it. Name selection happens under the directory's lock.
    ///
    /// The new name is created with a hard link, which fails instead of
    /// replacing an entry another process created in the meantime; such a
    /// name is skipped. Filesystems without hard links fall back to a plain
    /// rename onto the checked name.
    pub fn rename_into(&self, source: &Path, dest_dir: &Path, file_name: impl AsRef<OsStr>) -> Result<PathBuf> {
        let file_name = file_name.as_ref();
        let lock = self.lock_for(dest_dir);
        let _guard = lock.lock();

        let rename_error = |dest: &Path, e: std::io::Error| Error::Rename {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            source: e,
        };

        loop {
            let dest = unique_destination(dest_dir, file_name, occupied);
            match std::fs::hard_link(source, &dest) {
                Ok(()) => {
                    if let Err(e) = std::fs::remove_file(source) {
                        let _ = std::fs::remove_file(&dest);
                        return Err(rename_error(&dest, e));
                    }
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(target: "organizer", path = %dest.display(), "Name taken concurrently, retrying");
                    continue;
                }
                Err(e) => {
                    tracing::debug!(target: "organizer", error = %e, "Hard link failed, renaming");
                    std::fs::rename(source, &dest).map_err(|e| rename_error(&dest, e))?;
                }
            }

            tracing::debug!(target: "organizer", from = %source.display(), to = %dest.display(), "Moved");
            return Ok(dest);
        }
    }
}
