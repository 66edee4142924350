//! Single-file diagnostics command.

use std::path::Path;

use crate::classifier::{is_key_labelled, is_one_shot};
use crate::codec::{AudioBackend, DefaultBackend, FormatHint};
use crate::config::Config;
use crate::metadata;
use crate::model::{AudioFileRef, CamelotKey, ProbedDuration};
use crate::splitter::plan_segments;

/// Show format, duration, key and the resulting decision for one file
pub fn cmd_probe(config: &Config, path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("Not a file: {}", path.display());
    }

    let file = AudioFileRef::new(path);
    let hint = FormatHint::for_path(path);
    let backend = DefaultBackend::from_config(&config.tools);
    let duration = ProbedDuration::from_probe(path, backend.probe(path, &hint));
    let key = CamelotKey::from_filename(&file.file_name());
    let sorting = &config.sorting;

    println!("File:     {}", file);
    if hint.is_remapped() {
        println!("Format:   {} (from {})", hint.as_str(), file.extension());
    } else {
        println!("Format:   {}", hint.as_str());
    }
    println!("Duration: {}", duration);
    match backend.ffmpeg() {
        Some(ffmpeg) => println!("ffmpeg:   {}", ffmpeg.display()),
        None => println!("ffmpeg:   not found (WAV-only splitting)"),
    }
    match key {
        Some(key) => println!("Key:      {}", key),
        None => println!("Key:      none"),
    }
    println!("Strict:   {}", if is_key_labelled(&file.file_name()) { "yes" } else { "no" });

    match metadata::read_tags(path) {
        Ok(tags) => {
            println!("Title:    {}", tags.title.as_deref().unwrap_or("-"));
            println!("Artist:   {}", tags.artist.as_deref().unwrap_or("-"));
            println!("Tag key:  {}", tags.key.as_deref().unwrap_or("-"));
        }
        Err(e) => println!("Tags:     unreadable ({})", e),
    }

    let decision = match duration.as_millis() {
        Some(ms) if ms > sorting.split_threshold_ms() => {
            format!("split into {} parts", plan_segments(ms, sorting.segment_ms()).len())
        }
        _ if key.is_none() => "move to unlabeled".to_string(),
        _ if is_one_shot(duration, sorting.one_shot_limit()) => "move to one-shots".to_string(),
        _ => "keep in place".to_string(),
    };
    println!("\nDecision: {}", decision);
    Ok(())
}
