//! Response validation and repair.
//!
//! The classifier output is untrusted. Validation repairs what it can
//! instead of failing the generation: unknown or repeated provenance tags
//! are dropped, dangling dependency edges are removed, unlabelled nodes get
//! a placeholder. Every repair is recorded as a warning. Ideas the tree does
//! not cover are collected as the unclustered remainder, so the union of
//! tree provenance and unclustered seqs always equals the analyzed
//! snapshot.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::mindmap::{MindmapNode, UnclusteredIdea};
use crate::session::Idea;

use super::response::{ResponseNode, ResponseTree};

/// Tree after validation, plus repair warnings and the unplaced remainder.
#[derive(Debug)]
pub struct ValidatedTree {
    pub nodes: Vec<MindmapNode>,
    pub summary: Option<String>,
    pub unclustered: Vec<UnclusteredIdea>,
    pub warnings: Vec<String>,
}

pub fn validate_tree(tree: ResponseTree, ideas: &[Idea]) -> ValidatedTree {
    let known: BTreeMap<u64, &Idea> = ideas.iter().map(|idea| (idea.seq, idea)).collect();
    let mut warnings = Vec::new();

    // First pass over ids so forward references in depends_on resolve.
    let mut ids = HashSet::new();
    collect_ids(&tree.nodes, &mut ids, &mut warnings);

    let mut seen = BTreeSet::new();
    let nodes: Vec<MindmapNode> = tree
        .nodes
        .into_iter()
        .map(|node| convert(node, &known, &ids, &mut seen, &mut warnings))
        .collect();

    let unclustered: Vec<UnclusteredIdea> = known
        .values()
        .filter(|idea| !seen.contains(&idea.seq))
        .map(|idea| UnclusteredIdea {
            seq: idea.seq,
            author: idea.author.clone(),
            text: idea.text.clone(),
        })
        .collect();

    let summary = tree
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    ValidatedTree {
        nodes,
        summary,
        unclustered,
        warnings,
    }
}

fn collect_ids(nodes: &[ResponseNode], ids: &mut HashSet<String>, warnings: &mut Vec<String>) {
    for node in nodes {
        if let Some(id) = node.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            if !ids.insert(id.to_string()) {
                warnings.push(format!(
                    "duplicate node id '{id}'; dependency edges resolve to its first occurrence"
                ));
            }
        }
        collect_ids(&node.children, ids, warnings);
    }
}

fn convert(
    node: ResponseNode,
    known: &BTreeMap<u64, &Idea>,
    ids: &HashSet<String>,
    seen: &mut BTreeSet<u64>,
    warnings: &mut Vec<String>,
) -> MindmapNode {
    let id = node.id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty());

    let label = match node.label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
        Some(label) => label,
        None => {
            warnings.push("node without label kept as '(untitled)'".to_string());
            "(untitled)".to_string()
        }
    };

    let mut provenance = Vec::new();
    for seq in node.provenance {
        if !known.contains_key(&seq) {
            warnings.push(format!("dropped unknown provenance tag #{seq}"));
        } else if !seen.insert(seq) {
            warnings.push(format!(
                "dropped repeated provenance tag #{seq}; an idea belongs to one node"
            ));
        } else {
            provenance.push(seq);
        }
    }
    provenance.sort_unstable();

    let mut depends_on: Vec<String> = Vec::new();
    for target in node.depends_on {
        let target = target.trim().to_string();
        if target.is_empty() || depends_on.contains(&target) {
            continue;
        }
        if Some(&target) == id.as_ref() {
            warnings.push(format!("dropped self-dependency on node '{target}'"));
        } else if ids.contains(&target) {
            depends_on.push(target);
        } else {
            warnings.push(format!(
                "dropped dependency edge to unknown node '{target}'"
            ));
        }
    }

    let children = node
        .children
        .into_iter()
        .map(|child| convert(child, known, ids, seen, warnings))
        .collect();

    MindmapNode {
        id,
        label,
        note: node.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        provenance,
        depends_on,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::response::parse_response;
    use chrono::Utc;

    fn ideas(count: u64) -> Vec<Idea> {
        (1..=count)
            .map(|seq| Idea {
                seq,
                author: format!("author{seq}"),
                text: format!("idea {seq}"),
                submitted_at: Utc::now(),
            })
            .collect()
    }

    fn validate(json: &str, ideas: &[Idea]) -> ValidatedTree {
        validate_tree(parse_response(json).unwrap(), ideas)
    }

    #[test]
    fn test_clean_tree_passes_without_warnings() {
        let tree = validate(
            r#"{"summary": " ok ", "nodes": [
                {"id": "n1", "label": "A", "ideas": [2, 1]},
                {"id": "n2", "label": "B", "ideas": [3], "depends_on": ["n1"]}
            ]}"#,
            &ideas(3),
        );
        assert!(tree.warnings.is_empty());
        assert!(tree.unclustered.is_empty());
        assert_eq!(tree.summary.as_deref(), Some("ok"));
        // Provenance comes out sorted.
        assert_eq!(tree.nodes[0].provenance, vec![1, 2]);
        assert_eq!(tree.nodes[1].depends_on, vec!["n1"]);
    }

    #[test]
    fn test_unknown_tag_is_dropped_with_warning() {
        let tree = validate(
            r#"{"nodes": [{"label": "A", "ideas": [1, 99]}]}"#,
            &ideas(1),
        );
        assert_eq!(tree.nodes[0].provenance, vec![1]);
        assert!(tree.warnings.iter().any(|w| w.contains("#99")));
        assert!(tree.unclustered.is_empty());
    }

    #[test]
    fn test_repeated_tag_keeps_first_placement() {
        let tree = validate(
            r#"{"nodes": [
                {"label": "A", "ideas": [1]},
                {"label": "B", "ideas": [1, 2]}
            ]}"#,
            &ideas(2),
        );
        assert_eq!(tree.nodes[0].provenance, vec![1]);
        assert_eq!(tree.nodes[1].provenance, vec![2]);
        assert!(tree.warnings.iter().any(|w| w.contains("repeated provenance tag #1")));
    }

    #[test]
    fn test_unplaced_ideas_become_unclustered_in_seq_order() {
        let tree = validate(r#"{"nodes": [{"label": "A", "ideas": [2]}]}"#, &ideas(4));
        let seqs: Vec<u64> = tree.unclustered.iter().map(|u| u.seq).collect();
        assert_eq!(seqs, vec![1, 3, 4]);
        assert_eq!(tree.unclustered[0].author, "author1");
        assert_eq!(tree.unclustered[0].text, "idea 1");
    }

    #[test]
    fn test_dangling_dependency_edge_is_dropped_with_warning() {
        let tree = validate(
            r#"{"nodes": [
                {"id": "n1", "label": "A", "ideas": [1], "depends_on": ["n2", "ghost"]},
                {"id": "n2", "label": "B", "ideas": [2]}
            ]}"#,
            &ideas(2),
        );
        assert_eq!(tree.nodes[0].depends_on, vec!["n2"]);
        assert!(tree.warnings.iter().any(|w| w.contains("'ghost'")));
    }

    #[test]
    fn test_self_dependency_is_dropped() {
        let tree = validate(
            r#"{"nodes": [{"id": "n1", "label": "A", "depends_on": ["n1"]}]}"#,
            &ideas(1),
        );
        assert!(tree.nodes[0].depends_on.is_empty());
        assert!(tree.warnings.iter().any(|w| w.contains("self-dependency")));
    }

    #[test]
    fn test_duplicate_node_ids_are_warned_but_kept() {
        let tree = validate(
            r#"{"nodes": [
                {"id": "x", "label": "First"},
                {"id": "x", "label": "Second"},
                {"id": "y", "label": "User", "depends_on": ["x"]}
            ]}"#,
            &ideas(1),
        );
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[2].depends_on, vec!["x"]);
        assert!(tree.warnings.iter().any(|w| w.contains("duplicate node id 'x'")));
    }

    #[test]
    fn test_unlabelled_node_gets_placeholder() {
        let tree = validate(r#"{"nodes": [{"ideas": [1]}]}"#, &ideas(1));
        assert_eq!(tree.nodes[0].label, "(untitled)");
        assert!(tree.warnings.iter().any(|w| w.contains("(untitled)")));
    }

    #[test]
    fn test_empty_tree_leaves_everything_unclustered() {
        let tree = validate(r#"{"nodes": []}"#, &ideas(3));
        assert!(tree.nodes.is_empty());
        assert_eq!(tree.unclustered.len(), 3);
    }

    #[test]
    fn test_every_idea_lands_in_tree_or_unclustered() {
        // Messy response: unknown tags, repeats, deep nesting.
        let all = ideas(6);
        let tree = validate(
            r#"{"nodes": [
                {"label": "A", "ideas": [1, 1, 42], "children": [
                    {"label": "A1", "ideas": [5]}
                ]},
                {"label": "B", "ideas": [2, 5]}
            ]}"#,
            &all,
        );

        let mut covered: Vec<u64> = Vec::new();
        for node in &tree.nodes {
            node.collect_provenance(&mut covered);
        }
        covered.extend(tree.unclustered.iter().map(|u| u.seq));
        covered.sort_unstable();
        assert_eq!(covered, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_blank_summary_becomes_none() {
        let tree = validate(r#"{"summary": "  ", "nodes": []}"#, &ideas(1));
        assert!(tree.summary.is_none());
    }
}
