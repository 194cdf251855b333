use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a001_category::aggregate::{Category, CategoryId};
use crate::domain::common::validation::{ensure_duration, ensure_price, ensure_short_description, ensure_title};
use crate::domain::common::{AggregateId, AggregateRoot, EntityMetadata, ValidationError};
use crate::enums::language::Language;
use crate::enums::rating::Rating;

pub use super::feedback::CourseFeedback;

// ============================================================================
// ID Type
// ============================================================================

/// Уникальный идентификатор курса. `0` означает, что курс ещё не сохранён.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CourseId(pub i64);

impl CourseId {
    pub const UNSAVED: CourseId = CourseId(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_unsaved(&self) -> bool {
        *self == Self::UNSAVED
    }
}

impl AggregateId for CourseId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        <i64 as AggregateId>::from_string(s).map(CourseId)
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Embedded entities
// ============================================================================

/// Описание курса: длительность, тексты, темы и требования
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseDescription {
    /// Длительность в часах
    pub duration: f64,
    /// Краткое описание для списков
    pub short_description: String,
    /// Полное описание для карточки курса
    pub long_description: String,
    pub main_topics: Vec<String>,
    pub requirements: Vec<String>,
}

impl CourseDescription {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_duration(self.duration)?;
        ensure_short_description(&self.short_description)
    }
}

/// Комментарий к курсу.
///
/// `course_id` и `author_id` - обратные ссылки (идентификаторы), а не владение.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub id: Uuid,
    pub course_id: CourseId,
    pub author_id: String,
    pub description: String,
    pub rate: Option<Rating>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Создать новый комментарий от имени пользователя
    pub fn new(
        author_id: impl Into<String>,
        description: impl Into<String>,
        rate: Option<Rating>,
    ) -> Result<Self, ValidationError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ValidationError::EmptyComment);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            course_id: CourseId::UNSAVED,
            author_id: author_id.into(),
            description,
            rate,
            created_at: Utc::now(),
        })
    }

    pub fn is_rated(&self) -> bool {
        self.rate.is_some()
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Курс: корень агрегата, владеет описанием, отзывами и комментариями
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub price: f64,
    pub languages: BTreeSet<Language>,
    pub subtitles: BTreeSet<Language>,
    pub categories: Vec<Category>,
    pub course_description: Option<CourseDescription>,
    pub course_feedback: CourseFeedback,
    /// ID пользователей, которые могут изменять и удалять курс
    pub authors: Vec<String>,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Course {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_author(&self, user_id: &str) -> bool {
        self.authors.iter().any(|author| author == user_id)
    }

    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|c| c.id).collect()
    }

    /// Присвоить ID (после первой записи) и проставить обратные ссылки комментариям
    pub fn assign_id(&mut self, id: CourseId) {
        self.id = id;
        self.course_feedback.restamp_course(id);
    }

    /// Добавить комментарий; средняя оценка пересчитывается
    pub fn add_comment(&mut self, mut comment: Comment) {
        comment.course_id = self.id;
        self.course_feedback.add_comment(comment);
        self.touch();
    }

    /// Удалить комментарий; средняя оценка пересчитывается
    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let removed = self.course_feedback.remove_comment(comment_id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_title(&self.title)?;
        ensure_price(self.price)?;
        if let Some(description) = &self.course_description {
            description.validate()?;
        }
        Ok(())
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.touch();
    }
}

impl AggregateRoot for Course {
    type Id = CourseId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn aggregate_index() -> &'static str {
        "a002"
    }

    fn collection_name() -> &'static str {
        "course"
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для частичного обновления курса. Отсутствующее поле означает "без изменений".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdateDto {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub course_description: Option<CourseDescription>,
    pub languages: Option<BTreeSet<Language>>,
    pub subtitles: Option<BTreeSet<Language>>,
    pub category_ids: Option<Vec<CategoryId>>,
}

impl CourseUpdateDto {
    /// Наложить заданные поля на копию сохранённого курса.
    ///
    /// Категории передаются уже разрешёнными, так как DTO содержит только их ID.
    pub fn overlay(&self, mut base: Course, categories: Option<Vec<Category>>) -> Course {
        if let Some(title) = &self.title {
            base.title = title.clone();
        }
        if let Some(price) = self.price {
            base.price = price;
        }
        if let Some(description) = &self.course_description {
            base.course_description = Some(description.clone());
        }
        if let Some(languages) = &self.languages {
            base.languages = languages.clone();
        }
        if let Some(subtitles) = &self.subtitles {
            base.subtitles = subtitles.clone();
        }
        if let Some(categories) = categories {
            base.categories = categories;
        }
        base
    }
}

/// DTO для добавления комментария
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub description: String,
    pub rate: Option<f64>,
}

impl CommentDto {
    pub fn into_comment(self, author_id: &str) -> Result<Comment, ValidationError> {
        let rate = self.rate.map(Rating::try_from).transpose()?;
        Comment::new(author_id, self.description, rate)
    }
}
