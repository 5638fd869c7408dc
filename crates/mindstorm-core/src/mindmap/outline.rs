//! Deterministic markdown outline of a mindmap tree.
//!
//! The outline is both the human-readable artifact and the input of the
//! HTML renderer, which feeds it to markmap. Heading depth follows tree
//! depth down to h6; deeper levels continue as nested bullets, which
//! markmap treats the same way.
//!
//! Rendering is a pure function of its inputs: the same tree, summary and
//! unclustered list always produce byte-identical markdown.

use std::collections::HashMap;

use super::model::{MindmapNode, UnclusteredIdea};

/// Deepest node level rendered as a heading. The topic root is h1, so
/// level 5 lands on h6.
const MAX_HEADING_DEPTH: usize = 5;

/// Renders the outline for a tree whose root label is the session topic.
pub fn render_outline(
    root: &MindmapNode,
    summary: Option<&str>,
    unclustered: &[UnclusteredIdea],
) -> String {
    let labels = label_index(root);
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# {}", root.label));
    if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
        lines.push(String::new());
        lines.push(format!("*{summary}*"));
    }

    for child in &root.children {
        write_node(child, 1, &labels, &mut lines);
    }

    if !unclustered.is_empty() {
        lines.push(String::new());
        lines.push("## Unclustered".to_string());
        lines.push(String::new());
        for idea in unclustered {
            lines.push(format!("- {} (#{}, by {})", idea.text, idea.seq, idea.author));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn write_node(
    node: &MindmapNode,
    depth: usize,
    labels: &HashMap<&str, &str>,
    lines: &mut Vec<String>,
) {
    let text = node_text(node, labels);
    if depth <= MAX_HEADING_DEPTH {
        lines.push(String::new());
        lines.push(format!("{} {}", "#".repeat(depth + 1), text));
        if let Some(note) = node.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            lines.push(String::new());
            lines.push(format!("- *{note}*"));
        }
    } else {
        let indent = "  ".repeat(depth - MAX_HEADING_DEPTH - 1);
        lines.push(format!("{indent}- {text}"));
        if let Some(note) = node.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            lines.push(format!("{indent}  - *{note}*"));
        }
    }
    for child in &node.children {
        write_node(child, depth + 1, labels, lines);
    }
}

/// Node text: label, provenance tags, and dependency annotations naming the
/// target nodes by label.
fn node_text(node: &MindmapNode, labels: &HashMap<&str, &str>) -> String {
    let mut text = node.label.clone();

    if !node.provenance.is_empty() {
        let tags: Vec<String> = node.provenance.iter().map(|seq| format!("#{seq}")).collect();
        text.push_str(&format!(" ({})", tags.join(", ")));
    }

    if !node.depends_on.is_empty() {
        let targets: Vec<&str> = node
            .depends_on
            .iter()
            .map(|id| labels.get(id.as_str()).copied().unwrap_or(id.as_str()))
            .collect();
        text.push_str(&format!(" [depends on: {}]", targets.join(", ")));
    }

    text
}

/// Maps node ids to labels. The first occurrence of a duplicated id wins.
fn label_index(root: &MindmapNode) -> HashMap<&str, &str> {
    fn walk<'a>(node: &'a MindmapNode, map: &mut HashMap<&'a str, &'a str>) {
        if let Some(id) = node.id.as_deref() {
            map.entry(id).or_insert(node.label.as_str());
        }
        for child in &node.children {
            walk(child, map);
        }
    }

    let mut map = HashMap::new();
    walk(root, &mut map);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> MindmapNode {
        let mut root = MindmapNode::new("Team offsite");

        let mut outdoor = MindmapNode::new("Outdoor day");
        outdoor.id = Some("n1".into());
        outdoor.provenance = vec![1, 3];

        let mut beach = MindmapNode::new("Beach trip");
        beach.id = Some("n2".into());
        beach.provenance = vec![2];
        beach.depends_on = vec!["n3".into()];
        outdoor.children.push(beach);

        let mut budget = MindmapNode::new("Budget");
        budget.id = Some("n3".into());

        root.children.push(outdoor);
        root.children.push(budget);
        root
    }

    #[test]
    fn test_outline_structure() {
        let unclustered = vec![UnclusteredIdea {
            seq: 4,
            author: "eve".into(),
            text: "hovercraft racing".into(),
        }];
        let outline = render_outline(
            &sample_tree(),
            Some("Mix of outdoor and indoor plans."),
            &unclustered,
        );

        let expected = "\
# Team offsite

*Mix of outdoor and indoor plans.*

## Outdoor day (#1, #3)

### Beach trip (#2) [depends on: Budget]

## Budget

## Unclustered

- hovercraft racing (#4, by eve)
";
        assert_eq!(outline, expected);
    }

    #[test]
    fn test_outline_is_deterministic() {
        let tree = sample_tree();
        let first = render_outline(&tree, Some("summary"), &[]);
        let second = render_outline(&tree, Some("summary"), &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_summary_and_no_unclustered_sections() {
        let outline = render_outline(&sample_tree(), None, &[]);
        assert!(!outline.contains('*'));
        assert!(!outline.contains("Unclustered"));
    }

    #[test]
    fn test_blank_summary_is_skipped() {
        let outline = render_outline(&sample_tree(), Some("   "), &[]);
        assert!(!outline.contains('*'));
    }

    #[test]
    fn test_unresolvable_dependency_renders_raw_id() {
        let mut root = MindmapNode::new("Topic");
        let mut node = MindmapNode::new("A");
        node.depends_on = vec!["missing".into()];
        root.children.push(node);

        let outline = render_outline(&root, None, &[]);
        assert!(outline.contains("## A [depends on: missing]"));
    }

    #[test]
    fn test_notes_become_italic_bullets() {
        let mut root = MindmapNode::new("Topic");
        let mut node = MindmapNode::new("A");
        node.note = Some("both beach ideas merged".into());
        root.children.push(node);

        let outline = render_outline(&root, None, &[]);
        assert!(outline.contains("## A\n\n- *both beach ideas merged*"));
    }

    #[test]
    fn test_deep_levels_switch_to_bullets() {
        // Chain of eight nodes under the root.
        let mut node = MindmapNode::new("L8");
        for depth in (1..8).rev() {
            let mut parent = MindmapNode::new(format!("L{depth}"));
            parent.children.push(node);
            node = parent;
        }
        let mut root = MindmapNode::new("Topic");
        root.children.push(node);

        let outline = render_outline(&root, None, &[]);
        // Depth 5 is the last heading level (h6).
        assert!(outline.contains("\n###### L5\n"));
        // Depth 6 and 7 continue as nested bullets.
        assert!(outline.contains("\n- L6\n"));
        assert!(outline.contains("\n  - L7\n"));
        assert!(!outline.contains("####### "));
    }

    #[test]
    fn test_duplicate_ids_resolve_to_first_label() {
        let mut root = MindmapNode::new("Topic");
        let mut first = MindmapNode::new("First");
        first.id = Some("x".into());
        let mut second = MindmapNode::new("Second");
        second.id = Some("x".into());
        let mut user = MindmapNode::new("User");
        user.depends_on = vec!["x".into()];
        root.children.push(first);
        root.children.push(second);
        root.children.push(user);

        let outline = render_outline(&root, None, &[]);
        assert!(outline.contains("## User [depends on: First]"));
    }
}
