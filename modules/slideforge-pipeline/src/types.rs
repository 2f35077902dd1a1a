use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single-slide outline. `PlannerOutput.outline` is constrained to
/// exactly one entry by the structured-output schema. See spec §3/§4.7.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Outline {
    #[schemars(length(max = 80))]
    pub title: String,
    #[schemars(length(min = 3, max = 6))]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannerOutput {
    #[schemars(range(min = 1, max = 1))]
    pub slide_count: u32,
    #[schemars(length(min = 1, max = 1))]
    pub outline: Vec<Outline>,
    #[schemars(length(max = 8))]
    pub search_queries: Vec<String>,
    #[schemars(length(max = 24))]
    pub key_constraints: Vec<String>,
}

impl PlannerOutput {
    /// A best-effort outline synthesized from the raw prompt, used both
    /// as a normalization fallback and when the planner call fails
    /// outright. See spec §4.6.3.
    pub fn fallback(prompt: &str) -> Self {
        let title: String = prompt
            .lines()
            .next()
            .unwrap_or("Untitled")
            .trim()
            .chars()
            .take(80)
            .collect();
        let title = if title.is_empty() { "Untitled".to_string() } else { title };

        PlannerOutput {
            slide_count: 1,
            outline: vec![Outline {
                title,
                bullets: vec!["Overview".to_string(), "Key points".to_string(), "Summary".to_string()],
            }],
            search_queries: Vec::new(),
            key_constraints: Vec::new(),
        }
    }

    /// Pads/trims bullets to 3..6, dedups queries and constraints
    /// case-insensitively, and caps their lengths, per spec §4.6.3.
    pub fn normalize(mut self, prompt: &str) -> Self {
        if self.outline.is_empty() {
            return Self::fallback(prompt);
        }

        let outline = &mut self.outline[0];
        if outline.title.trim().is_empty() {
            outline.title = Self::fallback(prompt).outline[0].title.clone();
        }
        outline.title = outline.title.chars().take(80).collect();

        let defaults = ["Overview", "Key points", "Summary"];
        let mut bullets: Vec<String> = outline
            .bullets
            .iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        dedup_case_insensitive(&mut bullets);
        let mut default_idx = 0;
        while bullets.len() < 3 {
            bullets.push(defaults[default_idx % defaults.len()].to_string());
            default_idx += 1;
        }
        bullets.truncate(6);
        outline.bullets = bullets;

        self.outline.truncate(1);

        let mut queries = self.search_queries;
        dedup_case_insensitive(&mut queries);
        queries.truncate(8);
        self.search_queries = queries;

        let mut constraints = self.key_constraints;
        dedup_case_insensitive(&mut constraints);
        constraints.truncate(24);
        self.key_constraints = constraints;

        self.slide_count = 1;
        self
    }
}

fn dedup_case_insensitive(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.to_lowercase()));
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebCitation {
    pub title: String,
    pub url: String,
    pub quote: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebResearchOutput {
    pub findings: Vec<String>,
    pub citations: Vec<WebCitation>,
    pub used_queries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileCitation {
    pub file_id: String,
    pub filename: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct FileResearchOutput {
    pub snippets: Vec<String>,
    pub citations: Vec<FileCitation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorOutput {
    pub ok: bool,
    pub issues: Vec<String>,
    pub fixed_prompt_appendix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pads_bullets_to_minimum() {
        let output = PlannerOutput {
            slide_count: 1,
            outline: vec![Outline {
                title: "Title".to_string(),
                bullets: vec!["One".to_string()],
            }],
            search_queries: vec![],
            key_constraints: vec![],
        };
        let normalized = output.normalize("fallback prompt");
        assert!(normalized.outline[0].bullets.len() >= 3);
    }

    #[test]
    fn normalize_caps_bullets_to_maximum() {
        let bullets: Vec<String> = (0..10).map(|i| format!("bullet {i}")).collect();
        let output = PlannerOutput {
            slide_count: 1,
            outline: vec![Outline { title: "Title".to_string(), bullets }],
            search_queries: vec![],
            key_constraints: vec![],
        };
        let normalized = output.normalize("prompt");
        assert!(normalized.outline[0].bullets.len() <= 6);
    }

    #[test]
    fn normalize_dedups_queries_case_insensitively() {
        let output = PlannerOutput {
            slide_count: 1,
            outline: vec![Outline {
                title: "Title".to_string(),
                bullets: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            }],
            search_queries: vec!["Rust".to_string(), "rust".to_string(), "RUST".to_string()],
            key_constraints: vec![],
        };
        let normalized = output.normalize("prompt");
        assert_eq!(normalized.search_queries.len(), 1);
    }

    #[test]
    fn fallback_truncates_long_first_line() {
        let long_line = "x".repeat(200);
        let output = PlannerOutput::fallback(&long_line);
        assert_eq!(output.outline[0].title.len(), 80);
        assert_eq!(output.outline[0].bullets.len(), 3);
    }

    #[test]
    fn empty_outline_falls_back_entirely() {
        let output = PlannerOutput {
            slide_count: 1,
            outline: vec![],
            search_queries: vec![],
            key_constraints: vec![],
        };
        let normalized = output.normalize("My Slide Title\nrest");
        assert_eq!(normalized.outline[0].title, "My Slide Title");
    }
}
