//! Session domain module.
//!
//! # Module Structure
//!
//! - `code`: session code newtype and random generator
//! - `model`: plain data (`Idea`, `SessionStatus`, `SessionSnapshot`)
//! - `event`: change notifications (`SessionEvent`)
//! - `gate`: submission validation and per-author throttling
//! - `live`: the live `Session` object
//! - `store`: registry with atomic create/lookup/evict
//! - `bus`: per-session broadcast channels (`NotificationBus`)

mod bus;
mod code;
mod event;
mod gate;
mod live;
mod model;
mod store;

pub use bus::{DEFAULT_EVENT_CAPACITY, EventStream, NotificationBus};
pub use code::{CodeGenerator, SessionCode};
pub use event::SessionEvent;
pub use gate::SubmissionGate;
pub use live::{IdeaSnapshot, Session};
pub use model::{CloseReason, Idea, SessionSnapshot, SessionStatus};
pub use store::SessionStore;
