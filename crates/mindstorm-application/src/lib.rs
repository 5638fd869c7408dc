//! Application layer for mindstorm.
//!
//! Coordinates the domain crate (sessions, analysis) with rendering and
//! output concerns to implement the operations the CLI exposes.

pub mod output;
pub mod render;
pub mod service;
pub mod sweeper;

pub use output::OutputWriter;
pub use render::{HtmlRenderer, RenderContext};
pub use service::BrainstormService;
pub use sweeper::{start_idle_sweeper, sweep_idle_sessions};
