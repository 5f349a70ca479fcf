//! Focus and shortcut monitoring for active quiz attempts.

use tracing::{debug, warn};

/// Shortcut and pointer interactions that are suppressed while a quiz
/// question is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedSignal {
    Copy,
    Cut,
    Paste,
    ContextMenu,
    Print,
    DevTools,
    ViewSource,
}

impl BlockedSignal {
    /// Short label for notices and logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BlockedSignal::Copy => "copy",
            BlockedSignal::Cut => "cut",
            BlockedSignal::Paste => "paste",
            BlockedSignal::ContextMenu => "context menu",
            BlockedSignal::Print => "print",
            BlockedSignal::DevTools => "developer tools",
            BlockedSignal::ViewSource => "view source",
        }
    }
}

/// Outcome of one focus-loss violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusLossOutcome {
    /// Violations below the limit surface as "violation `count` of `limit`"
    /// warnings.
    Warning { count: u8, limit: u8 },
    /// The limit was reached: deduct `seconds` from the attempt timer. The
    /// violation count starts over afterwards, so every further group of
    /// `limit` violations costs another penalty.
    Penalty { seconds: u32 },
}

/// Counts focus-loss violations for one quiz attempt.
///
/// A monitor is created when an attempt becomes active and dropped when the
/// attempt leaves that state, so monitoring can never outlive the attempt it
/// belongs to. Blocked shortcuts are reported through the same monitor but
/// never counted as violations.
#[derive(Debug, Clone)]
pub struct AntiCheatMonitor {
    violations: u8,
    limit: u8,
    penalty_secs: u32,
}

impl AntiCheatMonitor {
    #[must_use]
    pub fn new(limit: u8, penalty_secs: u32) -> Self {
        Self {
            violations: 0,
            limit,
            penalty_secs,
        }
    }

    /// Record a focus-loss violation and report what it triggered.
    pub fn on_focus_loss(&mut self) -> FocusLossOutcome {
        self.violations = self.violations.saturating_add(1);
        if self.violations >= self.limit {
            self.violations = 0;
            warn!(
                penalty_secs = self.penalty_secs,
                "focus-loss limit reached, deducting quiz time"
            );
            FocusLossOutcome::Penalty {
                seconds: self.penalty_secs,
            }
        } else {
            debug!(
                count = self.violations,
                limit = self.limit,
                "focus-loss violation recorded"
            );
            FocusLossOutcome::Warning {
                count: self.violations,
                limit: self.limit,
            }
        }
    }

    /// Report a suppressed shortcut. Takes `&self`: blocked shortcuts never
    /// move the violation count.
    pub fn on_blocked_shortcut(&self, signal: BlockedSignal) {
        debug!(signal = signal.label(), "blocked shortcut suppressed");
    }

    /// Violations recorded since the last penalty.
    #[must_use]
    pub fn violations(&self) -> u8 {
        self.violations
    }
}
