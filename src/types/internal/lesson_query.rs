use crate::types::internal::lesson::LessonStatus;

/// Validated data for inserting a lesson
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub description: Option<String>,
    pub teacher_id: i32,
    pub student_id: i32,
    pub created_by: Option<i32>,
    pub scheduled_at: i64,
    pub duration_minutes: i32,
    pub instrument: Option<String>,
    pub lesson_type: String,
    pub cost: Option<f64>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub materials_needed: Option<String>,
}

/// Partial lesson update; `None` leaves the column untouched
///
/// Status is not part of this struct: status moves go through
/// [`LessonStatus::transition`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub teacher_id: Option<i32>,
    pub student_id: Option<i32>,
    pub scheduled_at: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub instrument: Option<String>,
    pub lesson_type: Option<String>,
    pub notes: Option<String>,
    pub instructor_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub cost: Option<f64>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub materials_needed: Option<String>,
    pub homework_assigned: Option<String>,
    pub progress_notes: Option<String>,
}

impl LessonChanges {
    /// True when only the student-editable `notes` column is touched
    pub fn only_notes(&self) -> bool {
        let without_notes = LessonChanges {
            notes: None,
            ..self.clone()
        };
        without_notes == LessonChanges::default()
    }

    pub fn touches_participants(&self) -> bool {
        self.teacher_id.is_some() || self.student_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Query filter for listing lessons
#[derive(Debug, Clone, Default)]
pub struct LessonFilter {
    pub teacher_id: Option<i32>,
    pub student_id: Option<i32>,
    /// Matches lessons where the user is either teacher or student
    pub participant_id: Option<i32>,
    pub status: Option<LessonStatus>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub after: Option<i64>,
    pub skip: u64,
    pub limit: Option<u64>,
    pub order: SortOrder,
}

impl LessonFilter {
    pub fn teacher(mut self, teacher_id: i32) -> Self {
        self.teacher_id = Some(teacher_id);
        self
    }

    pub fn student(mut self, student_id: i32) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn participant(mut self, user_id: i32) -> Self {
        self.participant_id = Some(user_id);
        self
    }

    pub fn status(mut self, status: LessonStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Inclusive range on `scheduled_at`
    pub fn between(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Strictly after the given timestamp
    pub fn after(mut self, timestamp: i64) -> Self {
        self.after = Some(timestamp);
        self
    }

    pub fn page(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_notes_detects_student_safe_changes() {
        let notes_only = LessonChanges {
            notes: Some("bring sheet music".to_string()),
            ..Default::default()
        };
        assert!(notes_only.only_notes());

        let with_title = LessonChanges {
            notes: Some("x".to_string()),
            title: Some("New title".to_string()),
            ..Default::default()
        };
        assert!(!with_title.only_notes());
    }

    #[test]
    fn test_filter_builder_sets_fields() {
        let filter = LessonFilter::default()
            .teacher(3)
            .status(LessonStatus::Scheduled)
            .between(Some(10), Some(20))
            .page(5, 50)
            .newest_first();

        assert_eq!(filter.teacher_id, Some(3));
        assert_eq!(filter.status, Some(LessonStatus::Scheduled));
        assert_eq!((filter.from, filter.to), (Some(10), Some(20)));
        assert_eq!((filter.skip, filter.limit), (5, Some(50)));
        assert_eq!(filter.order, SortOrder::Descending);
    }
}
