pub mod ai;
pub mod attractions;
pub mod classify;
pub mod form;
pub mod gate;
pub mod i18n;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod share;
pub mod store;

pub use classify::{ErrorInfo, ErrorKind, GenerationError};
pub use orchestrator::{Dispatch, PathState, Session, SessionConfig, Ticket};
