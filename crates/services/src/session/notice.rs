//! What a session operation tells the host to show or do.

use course_core::model::{CertificateId, LessonId};

use crate::anticheat::BlockedSignal;
use crate::attempt::AttemptReport;
use crate::error::SessionError;

/// Where the host application should route the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    MyLearning,
    Certificates,
    CourseAccessDenied,
}

/// One user-visible consequence of a session operation.
///
/// Operations return these oldest-first; rendering them is entirely the
/// host's concern.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionNotice {
    /// Focus-loss violation below the limit.
    FocusWarning { count: u8, limit: u8 },
    /// The focus-loss limit was hit and time was deducted.
    PenaltyApplied { seconds: u32 },
    /// A blocked shortcut was suppressed.
    ShortcutBlocked { signal: BlockedSignal },
    /// A lesson was completed for the first time.
    LessonCompleted { lesson: LessonId },
    /// A countdown toward `next` started; the host may offer a skip.
    AutoAdvanceScheduled {
        next: LessonId,
        title: String,
        seconds: u32,
    },
    /// The active lesson changed to `lesson`.
    AdvancedTo { lesson: LessonId },
    /// A quiz attempt finished; show the results screen.
    AttemptCompleted { report: AttemptReport },
    /// A failed final quiz can be retried.
    RetryAvailable { used: u32, max: u32 },
    /// Validation was unreachable; the attempt completed unscored.
    ValidationUnavailable,
    /// A write failed; local state stands and the learner should know.
    PersistFailed { what: &'static str },
    /// A completion certificate was issued.
    CertificateIssued { certificate: CertificateId },
    /// The last final-quiz attempt failed; progress was wiped and the host
    /// will be told to navigate away in `redirect_secs`.
    AttemptsExhausted { redirect_secs: u32 },
    /// Route the learner now.
    Navigate { target: NavigationTarget },
}

/// Navigation for errors that prevent a session from existing at all.
#[must_use]
pub fn navigation_for_error(error: &SessionError) -> Option<NavigationTarget> {
    match error {
        SessionError::CourseUnavailable(_) => Some(NavigationTarget::CourseAccessDenied),
        _ => None,
    }
}
