use thiserror::Error;

#[derive(Error, Debug)]
pub enum LessonError {
    #[error("Lesson not found")]
    NotFound(i32),

    #[error("Invalid teacher ID")]
    InvalidTeacher(i32),

    #[error("Invalid student ID")]
    InvalidStudent(i32),

    #[error("Cannot change lesson status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Teacher {teacher_id} already has a lesson scheduled at that time")]
    ScheduleConflict { teacher_id: i32, scheduled_at: i64 },
}
