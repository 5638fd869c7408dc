//! Core domain for Mindstorm: concurrent brainstorming sessions and
//! classifier-driven mindmap generation.
//!
//! Sessions collect ideas from multiple participants and broadcast every
//! change to subscribers. On request, the analysis pipeline sends a frozen
//! idea snapshot to an LLM classifier and turns the reply into a validated,
//! provenance-tracked mindmap tree. Rendering the tree to HTML and driving
//! sessions from a UI live in the `mindstorm-application` and
//! `mindstorm-cli` crates.

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod error;
pub mod mindmap;
pub mod session;

// Re-export the common error type and the seams other crates plug into.
pub use classifier::{Classifier, ClassifierError};
pub use config::MindstormConfig;
pub use error::{MindstormError, Result};
