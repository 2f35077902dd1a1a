use serde_json::Value;

use crate::types::AgentRecord;

/// Parses `list_agents_by_name`'s two tolerated response shapes (an
/// envelope with a `data` array, or a bare array). See spec §4.1.
pub fn parse_agent_list(value: &Value) -> Vec<AgentRecord> {
    let items: Vec<&Value> = if let Some(arr) = value.as_array() {
        arr.iter().collect()
    } else if let Some(arr) = value.get("data").and_then(|d| d.as_array()) {
        arr.iter().collect()
    } else {
        Vec::new()
    };

    items
        .into_iter()
        .filter_map(|item| {
            let id = item.get("id")?.as_str()?.to_string();
            let name = item
                .get("name")
                .and_then(|n| n.as_str())
                .or_else(|| {
                    item.get("definition")
                        .and_then(|d| d.get("name"))
                        .and_then(|n| n.as_str())
                })
                .map(|s| s.to_string())?;
            Some(AgentRecord { id, name })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_envelope_shape() {
        let value = json!({ "data": [{"id": "a1", "name": "planner"}] });
        let records = parse_agent_list(&value);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a1");
        assert_eq!(records[0].name, "planner");
    }

    #[test]
    fn parses_bare_array_shape() {
        let value = json!([{"id": "a1", "name": "planner"}]);
        let records = parse_agent_list(&value);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn reads_name_from_nested_definition() {
        let value = json!([{"id": "a1", "definition": {"name": "planner"}}]);
        let records = parse_agent_list(&value);
        assert_eq!(records[0].name, "planner");
    }

    #[test]
    fn skips_items_missing_id_or_name() {
        let value = json!([
            {"id": "a1"},
            {"name": "planner"},
            {"id": "a2", "name": "validator"}
        ]);
        let records = parse_agent_list(&value);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a2");
    }
}
