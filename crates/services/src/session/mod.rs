mod context;
mod notice;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use context::LearnSession;
pub use notice::{navigation_for_error, NavigationTarget, SessionNotice};
