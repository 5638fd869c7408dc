//! Mindmap tree model produced by a finished analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One node in the mindmap tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindmapNode {
    /// Classifier-assigned identifier; target of dependency edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    /// Optional remark, e.g. a recorded conflict between merged ideas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Sequence numbers of the ideas this node covers, ascending.
    #[serde(default)]
    pub provenance: Vec<u64>,
    /// Ids of nodes this node builds on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub children: Vec<MindmapNode>,
}

impl MindmapNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            note: None,
            provenance: Vec::new(),
            depends_on: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(MindmapNode::node_count)
            .sum::<usize>()
    }

    /// Appends every provenance tag in this subtree to `into`.
    pub fn collect_provenance(&self, into: &mut Vec<u64>) {
        into.extend_from_slice(&self.provenance);
        for child in &self.children {
            child.collect_provenance(into);
        }
    }
}

/// An idea the classifier left out of the tree. Carried alongside the tree
/// so no submission silently disappears from the mindmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnclusteredIdea {
    pub seq: u64,
    pub author: String,
    pub text: String,
}

/// A finished mindmap generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindmapResult {
    pub generation_id: Uuid,
    /// Root of the tree; its label is the session topic.
    pub root: MindmapNode,
    pub summary: Option<String>,
    /// Deterministic markdown outline of `root` plus the unclustered
    /// section.
    pub markdown: String,
    /// Standalone HTML document embedding `markdown`.
    pub html: String,
    /// Tag of the model that produced the tree.
    pub model: String,
    pub generated_at: DateTime<Utc>,
    /// Ideas not placed anywhere in the tree, ascending by seq.
    pub unclustered: Vec<UnclusteredIdea>,
    /// Repairs applied while validating the classifier response.
    pub warnings: Vec<String>,
}

impl MindmapResult {
    /// Classifier nodes in the tree, not counting the topic root.
    pub fn node_count(&self) -> usize {
        self.root.node_count().saturating_sub(1)
    }

    /// Seqs of every idea placed in the tree, ascending.
    pub fn clustered_seqs(&self) -> Vec<u64> {
        let mut seqs = Vec::new();
        self.root.collect_provenance(&mut seqs);
        seqs.sort_unstable();
        seqs
    }
}
