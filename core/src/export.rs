//! Human-readable persistence: pretty JSON files.

use crate::{
    error::GenResult,
    event::{LabelerInput, LabelerInputList},
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

pub const EVENT_FILE_PREFIX: &str = "event-";
pub const OUTPUT_EVENTS_FILENAME: &str = "output_events.json";
pub const OUTPUT_REPORT_FILENAME: &str = "output_reports.json";

pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> GenResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> GenResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

/// Create `dir` (and parents) when it does not exist yet.
pub fn ensure_dir(dir: &Path) -> GenResult<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        log::info!("created {}", dir.display());
    }
    Ok(())
}

/// `{dir}/event-{number}.json`, numbered from 1.
pub fn event_file_path(dir: &Path, number: usize) -> PathBuf {
    dir.join(format!("{EVENT_FILE_PREFIX}{number}.json"))
}

/// Number of an `event-{n}.json` file name.
fn event_file_number(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix(EVENT_FILE_PREFIX)?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Read events from a `LabelerInputList` file, or from every
/// `event-{n}.json` in a directory ordered by `n`.
pub fn read_events(path: &Path) -> GenResult<Vec<LabelerInput>> {
    if !path.is_dir() {
        let list: LabelerInputList = read_json_file(path)?;
        return Ok(list.inputs);
    }
    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let file = entry?.path();
        if let Some(n) = event_file_number(&file) {
            numbered.push((n, file));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);
    numbered
        .iter()
        .map(|(_, file)| read_json_file(file))
        .collect()
}
