mod machine;
mod policy;

// Public API of the attempt subsystem.
pub use crate::error::AttemptError;
pub use machine::{AttemptReport, QuizAttemptMachine, SubmitOutcome};
pub use policy::{decide, ensure_can_start, PolicyDecision, MAX_FINAL_ATTEMPTS};
