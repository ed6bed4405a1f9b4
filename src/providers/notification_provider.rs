use tokio::task::JoinHandle;

/// Messages handed to the notifier after a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Welcome {
        user_id: i32,
        username: String,
        email: String,
    },
    LessonBooked {
        lesson_id: i32,
        teacher_id: i32,
        student_id: i32,
        scheduled_at: i64,
    },
    LessonCancelled {
        lesson_id: i32,
        reason: Option<String>,
    },
}

/// Fire-and-forget delivery of notifications
///
/// Delivery is a detached tokio task that only logs. Callers never await the
/// handle; a failed delivery cannot roll back the mutation that caused it.
#[derive(Debug, Default)]
pub struct NotificationProvider;

impl NotificationProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        tokio::spawn(async move {
            match &notification {
                Notification::Welcome { user_id, username, email } => {
                    tracing::info!(user_id, %email, "Sending welcome notification to {}", username);
                }
                Notification::LessonBooked {
                    lesson_id,
                    teacher_id,
                    student_id,
                    scheduled_at,
                } => {
                    tracing::info!(lesson_id, teacher_id, student_id, scheduled_at, "Sending lesson booked notification");
                }
                Notification::LessonCancelled { lesson_id, reason } => {
                    tracing::info!(lesson_id, reason = ?reason, "Sending lesson cancelled notification");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_runs_detached() {
        let handle = NotificationProvider::new().dispatch(Notification::LessonCancelled {
            lesson_id: 1,
            reason: Some("sick".to_string()),
        });
        assert!(handle.await.is_ok());
    }
}
