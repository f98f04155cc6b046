use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// One recording to fetch: the name shown on the lecture site and the
/// stream (usually an HLS playlist) to remux
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "url")]
    pub source_url: String,
}

impl WorkItem {
    pub fn new(display_name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            source_url: source_url.into(),
        }
    }
}

/// Scraper output: subject folder name → recordings in that subject
///
/// On disk this is a JSON object:
///
/// ```json
/// { "Analysis 1": [ { "name": "Lecture 1: Intro", "url": "https://.../playlist.m3u8" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    subjects: BTreeMap<String, Vec<WorkItem>>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a batch file written by a scraper
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;

        let batch = Self::from_json(&raw)
            .with_context(|| format!("Failed to parse batch file: {}", path.display()))?;

        info!(
            "Loaded batch {}: {} subjects, {} recordings",
            path.display(),
            batch.subjects.len(),
            batch.len()
        );

        Ok(batch)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Append recordings to a subject, creating it if needed
    pub fn extend_subject(&mut self, subject: impl Into<String>, items: impl IntoIterator<Item = WorkItem>) {
        self.subjects.entry(subject.into()).or_default().extend(items);
    }

    pub fn subjects(&self) -> impl Iterator<Item = (&str, &[WorkItem])> {
        self.subjects
            .iter()
            .map(|(subject, items)| (subject.as_str(), items.as_slice()))
    }

    /// Total number of recordings over all subjects
    pub fn len(&self) -> usize {
        self.subjects.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
