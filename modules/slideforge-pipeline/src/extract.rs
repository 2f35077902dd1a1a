use agent_client::ResponseEnvelope;
use serde::de::DeserializeOwned;

use crate::error::PipelineError;

/// Returns `envelope.output_text` when present; otherwise concatenates
/// every `output_text`-typed content part across `output[*].content[*]`
/// with newline separators. Absent → empty string. See spec §4.7/§9.
pub fn extract_output_text(envelope: &ResponseEnvelope) -> String {
    if let Some(text) = &envelope.output_text {
        return text.clone();
    }

    let Some(output) = &envelope.output else {
        return String::new();
    };

    output
        .iter()
        .flat_map(|item| &item.content)
        .filter(|part| part.kind == "output_text")
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drops a leading fenced-code marker and everything after the closing
/// fence, per spec §4.7.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let after_opening = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return String::new(),
    };

    match after_opening.rfind("```") {
        Some(idx) => after_opening[..idx].trim().to_string(),
        None => after_opening.trim().to_string(),
    }
}

pub fn parse_json_from_output_text<T: DeserializeOwned>(
    envelope: &ResponseEnvelope,
) -> Result<T, PipelineError> {
    let text = extract_output_text(envelope);
    let stripped = strip_code_fences(&text);
    serde_json::from_str(&stripped).map_err(|e| PipelineError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_client::{OutputContent, OutputItem};

    #[test]
    fn extracts_flat_output_text() {
        let envelope = ResponseEnvelope {
            output_text: Some("hello".to_string()),
            output: None,
        };
        assert_eq!(extract_output_text(&envelope), "hello");
    }

    #[test]
    fn extracts_nested_output_text_parts() {
        let envelope = ResponseEnvelope {
            output_text: None,
            output: Some(vec![OutputItem {
                content: vec![
                    OutputContent { kind: "output_text".to_string(), text: Some("a".to_string()) },
                    OutputContent { kind: "reasoning".to_string(), text: Some("skip".to_string()) },
                    OutputContent { kind: "output_text".to_string(), text: Some("b".to_string()) },
                ],
            }]),
        };
        assert_eq!(extract_output_text(&envelope), "a\nb");
    }

    #[test]
    fn absent_envelope_yields_empty_string() {
        let envelope = ResponseEnvelope::default();
        assert_eq!(extract_output_text(&envelope), "");
    }

    #[test]
    fn strips_fenced_json_block() {
        let text = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\":1}");
    }

    #[test]
    fn leaves_unfenced_text_untouched() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parses_json_through_fences() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Thing {
            a: i32,
        }
        let envelope = ResponseEnvelope {
            output_text: Some("```json\n{\"a\":1}\n```".to_string()),
            output: None,
        };
        let parsed: Thing = parse_json_from_output_text(&envelope).unwrap();
        assert_eq!(parsed, Thing { a: 1 });
    }
}
