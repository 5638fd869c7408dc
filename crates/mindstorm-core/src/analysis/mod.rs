//! Idea analysis: prompt construction, classifier calls and response
//! validation.
//!
//! - `prompt`: builds the classification prompt with provenance tags
//! - `response`: fence stripping and the raw JSON tree shape
//! - `validate`: repairs the untrusted tree and accounts for every idea
//! - `pipeline`: ties it together with timeouts, retries and cancellation

mod pipeline;
mod prompt;
mod response;
mod validate;

pub use pipeline::{AnalysisOutcome, AnalysisPipeline};
pub use prompt::build_prompt;
pub use response::{ResponseNode, ResponseTree, parse_response, strip_fences};
pub use validate::{ValidatedTree, validate_tree};
