use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("auto advance seconds must be between 1 and 60")]
    InvalidAutoAdvanceSecs,

    #[error("video end tolerance must be between 0 and 60 seconds")]
    InvalidVideoEndTolerance,

    #[error("violation limit must be between 1 and 10")]
    InvalidViolationLimit,

    #[error("focus penalty must be between 1 and 600 seconds")]
    InvalidFocusPenaltySecs,

    #[error("reset redirect delay must be between 1 and 60 seconds")]
    InvalidResetRedirectSecs,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Timing and anti-cheat tunables for a learning session.
///
/// `standard()` carries the product defaults; tests shorten them freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    auto_advance_secs: u32,
    video_end_tolerance_secs: u32,
    violation_limit: u8,
    focus_penalty_secs: u32,
    reset_redirect_secs: u32,
}

impl SessionSettings {
    /// Creates the standard session settings:
    /// - 5 s countdown before auto-advancing to the next lesson
    /// - videos count as watched within 5 s of the end
    /// - 60 s time penalty after every 3rd focus-loss violation
    /// - 3 s before navigating away after a final-quiz lockout
    #[must_use]
    pub fn standard() -> Self {
        Self {
            auto_advance_secs: 5,
            video_end_tolerance_secs: 5,
            violation_limit: 3,
            focus_penalty_secs: 60,
            reset_redirect_secs: 3,
        }
    }

    /// Creates custom session settings.
    ///
    /// # Errors
    ///
    /// Returns an error if any value falls outside its documented range.
    pub fn new(
        auto_advance_secs: u32,
        video_end_tolerance_secs: u32,
        violation_limit: u8,
        focus_penalty_secs: u32,
        reset_redirect_secs: u32,
    ) -> Result<Self, SettingsError> {
        if !(1..=60).contains(&auto_advance_secs) {
            return Err(SettingsError::InvalidAutoAdvanceSecs);
        }
        if video_end_tolerance_secs > 60 {
            return Err(SettingsError::InvalidVideoEndTolerance);
        }
        if !(1..=10).contains(&violation_limit) {
            return Err(SettingsError::InvalidViolationLimit);
        }
        if !(1..=600).contains(&focus_penalty_secs) {
            return Err(SettingsError::InvalidFocusPenaltySecs);
        }
        if !(1..=60).contains(&reset_redirect_secs) {
            return Err(SettingsError::InvalidResetRedirectSecs);
        }

        Ok(Self {
            auto_advance_secs,
            video_end_tolerance_secs,
            violation_limit,
            focus_penalty_secs,
            reset_redirect_secs,
        })
    }

    // Accessors
    #[must_use]
    pub fn auto_advance_secs(&self) -> u32 {
        self.auto_advance_secs
    }

    #[must_use]
    pub fn video_end_tolerance_secs(&self) -> u32 {
        self.video_end_tolerance_secs
    }

    #[must_use]
    pub fn violation_limit(&self) -> u8 {
        self.violation_limit
    }

    #[must_use]
    pub fn focus_penalty_secs(&self) -> u32 {
        self.focus_penalty_secs
    }

    #[must_use]
    pub fn reset_redirect_secs(&self) -> u32 {
        self.reset_redirect_secs
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
