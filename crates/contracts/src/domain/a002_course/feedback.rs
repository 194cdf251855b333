use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::{Comment, CourseId};

/// Отзывы о курсе: комментарии и производные от них показатели.
///
/// `avg_rate` и `rates_count` пишет только [`FeedbackAggregator`]; при
/// десериализации они не читаются, а пересчитываются по комментариям.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", from = "FeedbackPayload")]
pub struct CourseFeedback {
    comments: Vec<Comment>,
    /// Средняя оценка по всем оценённым комментариям
    avg_rate: f64,
    rates_count: u32,
}

/// Входное представление отзывов: доверяем только списку комментариев
#[derive(Deserialize)]
struct FeedbackPayload {
    #[serde(default)]
    comments: Vec<Comment>,
}

impl From<FeedbackPayload> for CourseFeedback {
    fn from(payload: FeedbackPayload) -> Self {
        CourseFeedback::with_comments(payload.comments)
    }
}

impl CourseFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comments(comments: Vec<Comment>) -> Self {
        let mut feedback = Self {
            comments,
            ..Self::default()
        };
        FeedbackAggregator::recompute(&mut feedback);
        feedback
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn avg_rate(&self) -> f64 {
        self.avg_rate
    }

    pub fn rates_count(&self) -> u32 {
        self.rates_count
    }

    pub fn find_comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
        FeedbackAggregator::recompute(self);
    }

    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let index = self.comments.iter().position(|c| c.id == comment_id)?;
        let removed = self.comments.remove(index);
        FeedbackAggregator::recompute(self);
        Some(removed)
    }

    /// Заменить весь список комментариев
    pub fn replace_comments(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
        FeedbackAggregator::recompute(self);
    }

    pub(crate) fn restamp_course(&mut self, course_id: CourseId) {
        for comment in &mut self.comments {
            comment.course_id = course_id;
        }
    }
}

/// Пересчёт средней оценки и количества оценок курса
pub struct FeedbackAggregator;

impl FeedbackAggregator {
    /// Пересчитать `rates_count` и `avg_rate` по текущему списку комментариев.
    ///
    /// Комментарии без оценки не учитываются; без оценок средняя равна 0.0.
    pub fn recompute(feedback: &mut CourseFeedback) {
        let (count, sum) = feedback
            .comments
            .iter()
            .filter_map(|c| c.rate)
            .fold((0u32, 0.0f64), |(count, sum), rate| {
                (count + 1, sum + rate.star_value())
            });

        feedback.rates_count = count;
        feedback.avg_rate = if count == 0 { 0.0 } else { sum / count as f64 };
    }
}
