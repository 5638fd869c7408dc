//! Mindmap tree model and markdown outline rendering.
//!
//! - `model`: the tree (`MindmapNode`), finished results (`MindmapResult`)
//!   and the unclustered remainder
//! - `outline`: deterministic markdown assembly

mod model;
mod outline;

pub use model::{MindmapNode, MindmapResult, UnclusteredIdea};
pub use outline::render_outline;
