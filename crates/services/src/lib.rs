#![forbid(unsafe_code)]

//! Orchestration services for learning sessions.
//!
//! [`session::LearnSession`] is the entry point: it wires the lesson
//! progression controller, the quiz attempt machinery, anti-cheat
//! monitoring and the storage contracts behind one host-facing API.

pub mod anticheat;
pub mod attempt;
pub mod certificates;
pub mod error;
pub mod progression;
pub mod session;
pub mod validator;

pub use course_core::Clock;

pub use anticheat::{AntiCheatMonitor, BlockedSignal, FocusLossOutcome};
pub use attempt::{AttemptReport, PolicyDecision, QuizAttemptMachine, SubmitOutcome};
pub use certificates::{Certificate, CertificateIssuer, InMemoryIssuer};
pub use error::{
    AttemptError, CertificateError, ProgressionError, SessionError, ValidatorError,
};
pub use progression::{LessonProgressionController, LessonStatus};
pub use session::{navigation_for_error, LearnSession, NavigationTarget, SessionNotice};
pub use validator::{AnswerKeyValidator, AnswerValidator, HttpAnswerValidator, ValidatorConfig};
