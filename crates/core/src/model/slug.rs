use thiserror::Error;

/// Validated course slug (trimmed, non-empty, lowercase alphanumeric and hyphens).
///
/// Slugs identify a course across the content service, progress store and
/// navigation targets, e.g. `rust-for-beginners`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseSlug(String);

impl CourseSlug {
    /// Create a validated course slug.
    ///
    /// # Errors
    ///
    /// Returns `CourseSlugError::Empty` if the slug is empty after trimming,
    /// or `CourseSlugError::InvalidCharacter` on anything outside
    /// `[a-z0-9-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, CourseSlugError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CourseSlugError::Empty);
        }
        if let Some(found) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(CourseSlugError::InvalidCharacter { found });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CourseSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseSlugError {
    #[error("course slug cannot be empty")]
    Empty,

    #[error("course slug contains invalid character: {found:?}")]
    InvalidCharacter { found: char },
}
