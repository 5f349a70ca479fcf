use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::ids::{LessonId, ModuleId};

/// The set of lessons the learner has completed in one course.
///
/// Completion is monotonic for the lifetime of a session: lessons are only
/// ever added, and server state merges in by set union. There is
/// deliberately no removal operation — a course reset replaces the whole
/// session, not this set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    lessons: HashSet<LessonId>,
}

impl CompletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a lesson completed. Returns `false` when it already was, which
    /// is what completion-persist guards key off.
    pub fn insert(&mut self, lesson: LessonId) -> bool {
        self.lessons.insert(lesson)
    }

    #[must_use]
    pub fn contains(&self, lesson: LessonId) -> bool {
        self.lessons.contains(&lesson)
    }

    /// Union-merge with lessons the server reports as completed.
    pub fn merge(&mut self, lessons: impl IntoIterator<Item = LessonId>) {
        self.lessons.extend(lessons);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LessonId> + '_ {
        self.lessons.iter().copied()
    }
}

impl FromIterator<LessonId> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = LessonId>>(iter: I) -> Self {
        Self {
            lessons: iter.into_iter().collect(),
        }
    }
}

/// Server-side bookmark of the lesson the learner last worked on.
///
/// Written only by the progress store as a side effect of a successful
/// persist; the session reads it once at load to pick a starting lesson
/// and never mutates its copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePointer {
    pub module_id: ModuleId,
    pub lesson_id: LessonId,
}

impl ResumePointer {
    #[must_use]
    pub fn new(module_id: ModuleId, lesson_id: LessonId) -> Self {
        Self {
            module_id,
            lesson_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_first_completion_only() {
        let mut set = CompletionSet::new();
        assert!(set.insert(LessonId::new(1)));
        assert!(!set.insert(LessonId::new(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn merge_is_union() {
        let mut set: CompletionSet = [LessonId::new(1), LessonId::new(2)].into_iter().collect();
        set.merge([LessonId::new(2), LessonId::new(3)]);

        assert_eq!(set.len(), 3);
        assert!(set.contains(LessonId::new(1)));
        assert!(set.contains(LessonId::new(3)));
    }

    #[test]
    fn empty_set_contains_nothing() {
        let set = CompletionSet::new();
        assert!(set.is_empty());
        assert!(!set.contains(LessonId::new(1)));
    }
}
