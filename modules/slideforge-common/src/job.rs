use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slide proportion. See spec §4.6.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aspect {
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
}

impl Aspect {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "16:9" => Some(Aspect::Widescreen),
            "4:3" => Some(Aspect::Standard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aspect::Widescreen => "16:9",
            Aspect::Standard => "4:3",
        }
    }

    /// Canvas pixel dimensions (width, height).
    pub fn canvas(&self) -> (u32, u32) {
        match self {
            Aspect::Widescreen => (1920, 1080),
            Aspect::Standard => (1024, 768),
        }
    }

    /// Safe margin in pixels.
    pub fn safe_margin(&self) -> u32 {
        match self {
            Aspect::Widescreen => 64,
            Aspect::Standard => 48,
        }
    }
}

/// Immutable request captured at admission. See spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    pub job_id: String,
    pub prompt: String,
    pub aspect: Aspect,
    pub image_data_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStep {
    Plan,
    ResearchWeb,
    ResearchFile,
    GenerateHtml,
    Validate,
}

impl JobStep {
    pub fn label(&self) -> &'static str {
        match self {
            JobStep::Plan => "Plan",
            JobStep::ResearchWeb => "Research(Web)",
            JobStep::ResearchFile => "Research(File)",
            JobStep::GenerateHtml => "Generate HTML",
            JobStep::Validate => "Validate",
        }
    }
}

/// A case-insensitive-deduplicated, insertion-ordered set of strings.
/// Used for `sources.urls` and `sources.files`, which are append-only
/// for the lifetime of a job (spec invariant 4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CiSet {
    items: Vec<String>,
    #[serde(skip)]
    seen_lower: HashSet<String>,
}

impl CiSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`, returning `true` if it was newly added.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        let lower = value.to_lowercase();
        if self.seen_lower.contains(&lower) {
            return false;
        }
        self.seen_lower.insert(lower);
        self.items.push(value);
        true
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = String>) {
        for v in values {
            self.insert(v);
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// `seen_lower` is a derived index, not part of the wire format; rebuild it
// after any deserialization so future `insert` calls stay correct.
impl CiSet {
    pub fn rebuild_index(&mut self) {
        self.seen_lower = self.items.iter().map(|s| s.to_lowercase()).collect();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sources {
    pub urls: CiSet,
    pub files: CiSet,
}

impl Sources {
    pub fn rebuild_index(&mut self) {
        self.urls.rebuild_index();
        self.files.rebuild_index();
    }
}

/// The observable lifecycle record for a job. See spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: String,
    pub status: JobStatus,
    pub step: Option<JobStep>,
    pub error: Option<String>,
    pub sources: Sources,
    pub result_html_path: Option<String>,
    pub preview_png_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            status: JobStatus::Queued,
            step: None,
            error: None,
            sources: Sources::default(),
            result_html_path: None,
            preview_png_path: None,
            created_at: now,
            updated_at: now,
        }
    }
}
