use thiserror::Error;
use url::Url;

use crate::model::ids::{LessonId, ModuleId, QuizId};
use crate::model::slug::CourseSlug;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyCourseTitle,

    #[error("module title cannot be empty")]
    EmptyModuleTitle,

    #[error("lesson title cannot be empty")]
    EmptyLessonTitle,

    #[error("text lesson body cannot be empty")]
    EmptyTextBody,

    #[error("video uri is empty or malformed")]
    InvalidVideoUri,

    #[error("duplicate {scope} order value {order}")]
    DuplicateOrder { scope: &'static str, order: u32 },

    #[error("{scope} order values must be contiguous from 1, found {found} where {expected} was expected")]
    NonContiguousOrder {
        scope: &'static str,
        found: u32,
        expected: u32,
    },
}

//
// ─── VIDEO URI ─────────────────────────────────────────────────────────────────
//

/// Validated, parseable video source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUri(Url);

impl VideoUri {
    /// Parse a video uri from a raw string.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::InvalidVideoUri` if the string is empty or not a
    /// valid URL.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CourseError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(CourseError::InvalidVideoUri);
        }
        let url = Url::parse(s).map_err(|_| CourseError::InvalidVideoUri)?;
        Ok(Self(url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// What a lesson actually is, and the payload that kind needs.
///
/// Replaces a stringly-typed `content_type` discriminator plus a bag of
/// optional fields: a video lesson always has a uri, a text lesson always
/// has a body, a quiz lesson always points at a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonContent {
    Video { uri: VideoUri },
    Text { body: String },
    Quiz { quiz_id: QuizId },
}

impl LessonContent {
    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(self, LessonContent::Video { .. })
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, LessonContent::Text { .. })
    }

    #[must_use]
    pub fn is_quiz(&self) -> bool {
        matches!(self, LessonContent::Quiz { .. })
    }

    /// The quiz behind a quiz lesson, if this is one.
    #[must_use]
    pub fn quiz_id(&self) -> Option<QuizId> {
        match self {
            LessonContent::Quiz { quiz_id } => Some(*quiz_id),
            _ => None,
        }
    }
}

/// A single lesson within a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    order: u32,
    duration_secs: u32,
    content: LessonContent,
}

impl Lesson {
    /// Creates a new Lesson.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyLessonTitle` if the title is empty or
    /// whitespace-only, `CourseError::EmptyTextBody` for a text lesson with
    /// a blank body.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        order: u32,
        duration_secs: u32,
        content: LessonContent,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyLessonTitle);
        }
        if let LessonContent::Text { body } = &content {
            if body.trim().is_empty() {
                return Err(CourseError::EmptyTextBody);
            }
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            order,
            duration_secs,
            content,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Authored duration in seconds, display metadata only.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn content(&self) -> &LessonContent {
        &self.content
    }

    /// The quiz behind this lesson, if it is a quiz lesson.
    #[must_use]
    pub fn quiz_id(&self) -> Option<QuizId> {
        self.content.quiz_id()
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// An ordered group of lessons within a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    title: String,
    order: u32,
    duration_secs: u32,
    lessons: Vec<Lesson>,
}

impl Module {
    /// Creates a new Module. Lessons are sorted by their `order` value and
    /// the orders are then required to be unique and contiguous from 1.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyModuleTitle`, `CourseError::DuplicateOrder`
    /// or `CourseError::NonContiguousOrder`.
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        order: u32,
        duration_secs: u32,
        mut lessons: Vec<Lesson>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyModuleTitle);
        }

        lessons.sort_by_key(Lesson::order);
        verify_contiguous_orders("lesson", lessons.iter().map(Lesson::order))?;

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            order,
            duration_secs,
            lessons,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    #[must_use]
    pub fn last_lesson(&self) -> Option<&Lesson> {
        self.lessons.last()
    }
}

//
// ─── COURSE STRUCTURE ──────────────────────────────────────────────────────────
//

/// Position of a lesson inside a course: indexes into the sorted
/// module/lesson vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonPosition {
    pub module: usize,
    pub lesson: usize,
}

impl LessonPosition {
    #[must_use]
    pub fn new(module: usize, lesson: usize) -> Self {
        Self { module, lesson }
    }
}

/// A whole course as delivered by the content service: ordered modules of
/// ordered lessons.
///
/// Shape beyond the ordering invariant is deliberately not enforced here
/// (a module may be empty, a final quiz may sit anywhere); consumers must
/// tolerate whatever the content team published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseStructure {
    slug: CourseSlug,
    title: String,
    modules: Vec<Module>,
}

impl CourseStructure {
    /// Creates a new CourseStructure. Modules are sorted by their `order`
    /// value and the orders are then required to be unique and contiguous
    /// from 1.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyCourseTitle`, `CourseError::DuplicateOrder`
    /// or `CourseError::NonContiguousOrder`.
    pub fn new(
        slug: CourseSlug,
        title: impl Into<String>,
        mut modules: Vec<Module>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyCourseTitle);
        }

        modules.sort_by_key(Module::order);
        verify_contiguous_orders("module", modules.iter().map(Module::order))?;

        Ok(Self {
            slug,
            title: title.trim().to_owned(),
            modules,
        })
    }

    // Accessors
    #[must_use]
    pub fn slug(&self) -> &CourseSlug {
        &self.slug
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Total number of lessons across all modules.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons().len()).sum()
    }

    #[must_use]
    pub fn module_at(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    #[must_use]
    pub fn lesson_at(&self, position: LessonPosition) -> Option<&Lesson> {
        self.modules
            .get(position.module)?
            .lessons()
            .get(position.lesson)
    }

    /// Position of the given lesson, scanning modules in order.
    #[must_use]
    pub fn position_of(&self, lesson_id: LessonId) -> Option<LessonPosition> {
        for (m, module) in self.modules.iter().enumerate() {
            for (l, lesson) in module.lessons().iter().enumerate() {
                if lesson.id() == lesson_id {
                    return Some(LessonPosition::new(m, l));
                }
            }
        }
        None
    }

    /// First lesson of the course, skipping leading empty modules.
    #[must_use]
    pub fn first_position(&self) -> Option<LessonPosition> {
        self.modules
            .iter()
            .position(|m| !m.is_empty())
            .map(|m| LessonPosition::new(m, 0))
    }

    /// The lesson that follows `position`: the next lesson in the same
    /// module, else the first lesson of the next non-empty module.
    #[must_use]
    pub fn next_position(&self, position: LessonPosition) -> Option<LessonPosition> {
        let module = self.modules.get(position.module)?;
        if position.lesson + 1 < module.lessons().len() {
            return Some(LessonPosition::new(position.module, position.lesson + 1));
        }
        self.modules
            .iter()
            .enumerate()
            .skip(position.module + 1)
            .find(|(_, m)| !m.is_empty())
            .map(|(m, _)| LessonPosition::new(m, 0))
    }
}

fn verify_contiguous_orders(
    scope: &'static str,
    orders: impl Iterator<Item = u32>,
) -> Result<(), CourseError> {
    let mut previous: Option<u32> = None;
    for (index, order) in orders.enumerate() {
        let expected = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
        if order != expected {
            if previous == Some(order) {
                return Err(CourseError::DuplicateOrder { scope, order });
            }
            return Err(CourseError::NonContiguousOrder {
                scope,
                found: order,
                expected,
            });
        }
        previous = Some(order);
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn text_lesson(id: u64, order: u32) -> Lesson {
        Lesson::new(
            LessonId::new(id),
            format!("Lesson {id}"),
            order,
            300,
            LessonContent::Text {
                body: "read this".into(),
            },
        )
        .unwrap()
    }

    fn slug() -> CourseSlug {
        CourseSlug::new("rust-basics").unwrap()
    }

    #[test]
    fn lesson_rejects_empty_title() {
        let err = Lesson::new(
            LessonId::new(1),
            "   ",
            1,
            60,
            LessonContent::Text { body: "x".into() },
        )
        .unwrap_err();
        assert_eq!(err, CourseError::EmptyLessonTitle);
    }

    #[test]
    fn lesson_rejects_blank_text_body() {
        let err = Lesson::new(
            LessonId::new(1),
            "Reading",
            1,
            60,
            LessonContent::Text { body: "  ".into() },
        )
        .unwrap_err();
        assert_eq!(err, CourseError::EmptyTextBody);
    }

    #[test]
    fn video_uri_rejects_garbage() {
        assert_eq!(
            VideoUri::parse("").unwrap_err(),
            CourseError::InvalidVideoUri
        );
        assert_eq!(
            VideoUri::parse("not a url").unwrap_err(),
            CourseError::InvalidVideoUri
        );
        let uri = VideoUri::parse("https://cdn.example.com/v/1.mp4").unwrap();
        assert_eq!(uri.as_str(), "https://cdn.example.com/v/1.mp4");
    }

    #[test]
    fn module_sorts_lessons_by_order() {
        let module = Module::new(
            ModuleId::new(1),
            "Basics",
            1,
            900,
            vec![text_lesson(2, 2), text_lesson(1, 1), text_lesson(3, 3)],
        )
        .unwrap();

        let ids: Vec<u64> = module.lessons().iter().map(|l| l.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn module_rejects_duplicate_lesson_order() {
        let err = Module::new(
            ModuleId::new(1),
            "Basics",
            1,
            900,
            vec![text_lesson(1, 1), text_lesson(2, 1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CourseError::DuplicateOrder {
                scope: "lesson",
                order: 1
            }
        );
    }

    #[test]
    fn module_rejects_gap_in_lesson_order() {
        let err = Module::new(
            ModuleId::new(1),
            "Basics",
            1,
            900,
            vec![text_lesson(1, 1), text_lesson(2, 3)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CourseError::NonContiguousOrder {
                scope: "lesson",
                found: 3,
                expected: 2
            }
        );
    }

    #[test]
    fn course_rejects_order_not_starting_at_one() {
        let module = Module::new(ModuleId::new(1), "Basics", 2, 900, vec![text_lesson(1, 1)])
            .unwrap();
        let err = CourseStructure::new(slug(), "Rust Basics", vec![module]).unwrap_err();
        assert_eq!(
            err,
            CourseError::NonContiguousOrder {
                scope: "module",
                found: 2,
                expected: 1
            }
        );
    }

    #[test]
    fn next_position_skips_empty_modules() {
        let m1 = Module::new(ModuleId::new(1), "One", 1, 0, vec![text_lesson(1, 1)]).unwrap();
        let m2 = Module::new(ModuleId::new(2), "Empty", 2, 0, vec![]).unwrap();
        let m3 = Module::new(ModuleId::new(3), "Three", 3, 0, vec![text_lesson(2, 1)]).unwrap();
        let course = CourseStructure::new(slug(), "Rust Basics", vec![m1, m2, m3]).unwrap();

        let first = course.first_position().unwrap();
        assert_eq!(first, LessonPosition::new(0, 0));

        let next = course.next_position(first).unwrap();
        assert_eq!(next, LessonPosition::new(2, 0));
        assert!(course.next_position(next).is_none());
    }

    #[test]
    fn first_position_skips_leading_empty_module() {
        let m1 = Module::new(ModuleId::new(1), "Empty", 1, 0, vec![]).unwrap();
        let m2 = Module::new(ModuleId::new(2), "Two", 2, 0, vec![text_lesson(1, 1)]).unwrap();
        let course = CourseStructure::new(slug(), "Rust Basics", vec![m1, m2]).unwrap();

        assert_eq!(course.first_position(), Some(LessonPosition::new(1, 0)));
    }

    #[test]
    fn position_of_finds_lessons_across_modules() {
        let m1 = Module::new(ModuleId::new(1), "One", 1, 0, vec![text_lesson(1, 1)]).unwrap();
        let m2 = Module::new(
            ModuleId::new(2),
            "Two",
            2,
            0,
            vec![text_lesson(2, 1), text_lesson(3, 2)],
        )
        .unwrap();
        let course = CourseStructure::new(slug(), "Rust Basics", vec![m1, m2]).unwrap();

        assert_eq!(
            course.position_of(LessonId::new(3)),
            Some(LessonPosition::new(1, 1))
        );
        assert_eq!(course.position_of(LessonId::new(99)), None);
        assert_eq!(course.lesson_count(), 3);
    }
}
