//! Classifier reply parsing: fence stripping and the raw JSON tree shape.

use serde::{Deserialize, Deserializer};

use crate::error::{MindstormError, Result};

/// Raw tree shape the classifier is asked to produce. Everything except the
/// `nodes` array is optional; individual node defects are repaired during
/// validation instead of failing the parse.
#[derive(Debug, Deserialize)]
pub struct ResponseTree {
    #[serde(default)]
    pub summary: Option<String>,
    pub nodes: Vec<ResponseNode>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Provenance tags. The prompt calls this field "ideas".
    #[serde(default, rename = "ideas", deserialize_with = "lenient_tags")]
    pub provenance: Vec<u64>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub children: Vec<ResponseNode>,
}

/// Accepts tags as numbers, numeric strings or "#n" strings; anything else
/// is quietly skipped and handled by the provenance accounting later.
fn lenient_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
            _ => None,
        })
        .collect())
}

/// Strips one surrounding markdown code fence, if present. Models add them
/// despite being told not to.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    let body = match body.rfind("```") {
        Some(pos) => &body[..pos],
        None => body,
    };
    body.trim()
}

/// Parses a raw classifier reply into the response tree.
pub fn parse_response(raw: &str) -> Result<ResponseTree> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(MindstormError::analysis_malformed("classifier reply was empty"));
    }
    serde_json::from_str(body).map_err(|err| {
        MindstormError::analysis_malformed(format!(
            "classifier reply is not a usable mindmap tree: {err}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_bare_json() {
        let tree = parse_response(
            r#"{"summary": "s", "nodes": [{"id": "n1", "label": "A", "ideas": [1, 2]}]}"#,
        )
        .unwrap();
        assert_eq!(tree.summary.as_deref(), Some("s"));
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].provenance, vec![1, 2]);
    }

    #[test]
    fn test_strips_json_fence() {
        let raw = "```json\n{\"nodes\": []}\n```";
        let tree = parse_response(raw).unwrap();
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn test_strips_plain_fence_with_surrounding_text() {
        let raw = "  ```\n{\"nodes\": []}\n```  ";
        assert_eq!(strip_fences(raw), "{\"nodes\": []}");
    }

    #[test]
    fn test_unfenced_input_is_only_trimmed() {
        assert_eq!(strip_fences("  {\"nodes\": []} \n"), "{\"nodes\": []}");
    }

    #[test]
    fn test_lenient_tags_accept_strings() {
        let tree = parse_response(
            r##"{"nodes": [{"label": "A", "ideas": [1, "2", "#3", "x", true]}]}"##,
        )
        .unwrap();
        assert_eq!(tree.nodes[0].provenance, vec![1, 2, 3]);
    }

    #[test]
    fn test_prose_reply_is_malformed() {
        let err = parse_response("Here is your mindmap! Hope it helps.").unwrap_err();
        assert!(matches!(err, MindstormError::AnalysisMalformed { .. }));
    }

    #[test]
    fn test_missing_nodes_is_malformed() {
        let err = parse_response(r#"{"summary": "only a summary"}"#).unwrap_err();
        assert!(matches!(err, MindstormError::AnalysisMalformed { .. }));
    }

    #[test]
    fn test_empty_reply_is_malformed() {
        let err = parse_response("```json\n```").unwrap_err();
        assert!(matches!(err, MindstormError::AnalysisMalformed { .. }));
    }

    #[test]
    fn test_nested_children_parse() {
        let tree = parse_response(
            r#"{"nodes": [{"label": "A", "children": [{"label": "B", "depends_on": ["n9"]}]}]}"#,
        )
        .unwrap();
        assert_eq!(tree.nodes[0].children.len(), 1);
        assert_eq!(tree.nodes[0].children[0].depends_on, vec!["n9"]);
    }
}
