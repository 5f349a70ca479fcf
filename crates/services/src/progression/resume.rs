//! Where a returning learner lands.

use course_core::model::{CompletionSet, CourseStructure, LessonPosition, ResumePointer};

/// Choose the lesson to activate when a session opens.
///
/// The stored pointer is only a hint and is never written back from here:
/// an absent or stale pointer falls back to the first lesson; a pointer at
/// an uncompleted lesson stays put; a pointer at a completed lesson rolls
/// forward to the first uncompleted lesson after it, or stays where it is
/// when everything ahead is done. Returns `None` only for a course with no
/// lessons at all.
#[must_use]
pub fn resume_position(
    course: &CourseStructure,
    completed: &CompletionSet,
    pointer: Option<&ResumePointer>,
) -> Option<LessonPosition> {
    let first = course.first_position()?;
    let Some(pointer) = pointer else {
        return Some(first);
    };
    let Some(pointed) = course.position_of(pointer.lesson_id) else {
        return Some(first);
    };
    if !completed.contains(pointer.lesson_id) {
        return Some(pointed);
    }

    // The pointed lesson is already done: scan forward for the next thing
    // left to do.
    let mut cursor = pointed;
    while let Some(next) = course.next_position(cursor) {
        if let Some(lesson) = course.lesson_at(next) {
            if !completed.contains(lesson.id()) {
                return Some(next);
            }
        }
        cursor = next;
    }
    Some(pointed)
}
