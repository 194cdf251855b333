//! Пошаговая сборка курса и его описания.
//!
//! Каждый шаг проверяет аргумент сразу и возвращает сам строитель, поэтому
//! шаги можно вызывать цепочкой в любом порядке и в любом подмножестве:
//!
//! ```rust,ignore
//! let mut builder = StandardCourseBuilder::new();
//! builder.build_title("Rust")?.build_price(49.0)?;
//! let course = builder.take_result();
//! ```

use std::collections::BTreeSet;

use super::aggregate::{Comment, Course, CourseDescription, CourseFeedback};
use crate::domain::a001_category::aggregate::Category;
use crate::domain::common::validation::{
    ensure_duration, ensure_price, ensure_short_description, ensure_title,
};
use crate::domain::common::ValidationError;
use crate::enums::language::Language;

// ============================================================================
// Course description
// ============================================================================

pub trait CourseDescriptionBuilder {
    fn build_duration(&mut self, hours: f64) -> Result<&mut Self, ValidationError>;

    fn build_short_description(
        &mut self,
        text: impl Into<String>,
    ) -> Result<&mut Self, ValidationError>;

    fn build_long_description(
        &mut self,
        text: impl Into<String>,
    ) -> Result<&mut Self, ValidationError>;

    fn build_main_topics(&mut self, topics: Vec<String>) -> Result<&mut Self, ValidationError>;

    fn build_requirements(
        &mut self,
        requirements: Vec<String>,
    ) -> Result<&mut Self, ValidationError>;

    /// Описание в текущем состоянии сборки (без копирования)
    fn get_result(&self) -> &CourseDescription;

    /// Сбросить все заданные поля
    fn restore(&mut self);

    /// Забрать результат и сразу сбросить строитель
    fn take_result(&mut self) -> CourseDescription {
        let result = self.get_result().clone();
        self.restore();
        result
    }
}

#[derive(Debug, Clone, Default)]
pub struct StandardCourseDescriptionBuilder {
    description: CourseDescription,
}

impl StandardCourseDescriptionBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CourseDescriptionBuilder for StandardCourseDescriptionBuilder {
    fn build_duration(&mut self, hours: f64) -> Result<&mut Self, ValidationError> {
        self.description.duration = ensure_duration(hours)?;
        Ok(self)
    }

    fn build_short_description(
        &mut self,
        text: impl Into<String>,
    ) -> Result<&mut Self, ValidationError> {
        let text = text.into();
        ensure_short_description(&text)?;
        self.description.short_description = text;
        Ok(self)
    }

    fn build_long_description(
        &mut self,
        text: impl Into<String>,
    ) -> Result<&mut Self, ValidationError> {
        self.description.long_description = text.into();
        Ok(self)
    }

    fn build_main_topics(&mut self, topics: Vec<String>) -> Result<&mut Self, ValidationError> {
        self.description.main_topics = topics;
        Ok(self)
    }

    fn build_requirements(
        &mut self,
        requirements: Vec<String>,
    ) -> Result<&mut Self, ValidationError> {
        self.description.requirements = requirements;
        Ok(self)
    }

    fn get_result(&self) -> &CourseDescription {
        &self.description
    }

    fn restore(&mut self) {
        self.description = CourseDescription::default();
    }

    fn take_result(&mut self) -> CourseDescription {
        std::mem::take(&mut self.description)
    }
}

// ============================================================================
// Course
// ============================================================================

pub trait CourseBuilder {
    fn build_title(&mut self, title: impl Into<String>) -> Result<&mut Self, ValidationError>;

    fn build_price(&mut self, price: f64) -> Result<&mut Self, ValidationError>;

    fn build_languages(
        &mut self,
        languages: BTreeSet<Language>,
    ) -> Result<&mut Self, ValidationError>;

    fn build_subtitles(
        &mut self,
        subtitles: BTreeSet<Language>,
    ) -> Result<&mut Self, ValidationError>;

    fn build_categories(&mut self, categories: Vec<Category>)
        -> Result<&mut Self, ValidationError>;

    /// Комментарии попадают в отзывы курса, оценка пересчитывается
    fn build_comments(&mut self, comments: Vec<Comment>) -> Result<&mut Self, ValidationError>;

    fn build_course_description(
        &mut self,
        description: CourseDescription,
    ) -> Result<&mut Self, ValidationError>;

    fn build_course_feedback(
        &mut self,
        feedback: CourseFeedback,
    ) -> Result<&mut Self, ValidationError>;

    fn build_authors(&mut self, authors: Vec<String>) -> Result<&mut Self, ValidationError>;

    /// Курс в текущем состоянии сборки (без копирования)
    fn get_result(&self) -> &Course;

    /// Заменить курс в сборке новым пустым
    fn restore(&mut self);

    /// Забрать результат и сразу сбросить строитель
    fn take_result(&mut self) -> Course {
        let result = self.get_result().clone();
        self.restore();
        result
    }
}

#[derive(Debug, Clone, Default)]
pub struct StandardCourseBuilder {
    course: Course,
}

impl StandardCourseBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CourseBuilder for StandardCourseBuilder {
    fn build_title(&mut self, title: impl Into<String>) -> Result<&mut Self, ValidationError> {
        let title = title.into();
        ensure_title(&title)?;
        self.course.title = title;
        Ok(self)
    }

    fn build_price(&mut self, price: f64) -> Result<&mut Self, ValidationError> {
        self.course.price = ensure_price(price)?;
        Ok(self)
    }

    fn build_languages(
        &mut self,
        languages: BTreeSet<Language>,
    ) -> Result<&mut Self, ValidationError> {
        self.course.languages = languages;
        Ok(self)
    }

    fn build_subtitles(
        &mut self,
        subtitles: BTreeSet<Language>,
    ) -> Result<&mut Self, ValidationError> {
        self.course.subtitles = subtitles;
        Ok(self)
    }

    fn build_categories(
        &mut self,
        categories: Vec<Category>,
    ) -> Result<&mut Self, ValidationError> {
        self.course.categories = categories;
        Ok(self)
    }

    fn build_comments(&mut self, comments: Vec<Comment>) -> Result<&mut Self, ValidationError> {
        self.course.course_feedback.replace_comments(comments);
        self.course.course_feedback.restamp_course(self.course.id);
        Ok(self)
    }

    fn build_course_description(
        &mut self,
        description: CourseDescription,
    ) -> Result<&mut Self, ValidationError> {
        description.validate()?;
        self.course.course_description = Some(description);
        Ok(self)
    }

    fn build_course_feedback(
        &mut self,
        feedback: CourseFeedback,
    ) -> Result<&mut Self, ValidationError> {
        self.course.course_feedback = feedback;
        self.course.course_feedback.restamp_course(self.course.id);
        Ok(self)
    }

    fn build_authors(&mut self, authors: Vec<String>) -> Result<&mut Self, ValidationError> {
        self.course.authors = authors;
        Ok(self)
    }

    fn get_result(&self) -> &Course {
        &self.course
    }

    fn restore(&mut self) {
        self.course = Course::new();
    }

    fn take_result(&mut self) -> Course {
        std::mem::take(&mut self.course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::rating::Rating;

    #[test]
    fn test_minimal_description_keeps_zero_values() {
        let mut builder = StandardCourseDescriptionBuilder::new();
        builder.build_duration(12.5).unwrap();
        let description = builder.take_result();

        assert_eq!(description.duration, 12.5);
        assert!(description.short_description.is_empty());
        assert!(description.long_description.is_empty());
        assert!(description.main_topics.is_empty());
        assert!(description.requirements.is_empty());
    }

    #[test]
    fn test_description_stages_fail_fast() {
        let mut builder = StandardCourseDescriptionBuilder::new();
        assert_eq!(
            builder.build_duration(-1.0).err(),
            Some(ValidationError::InvalidDuration(-1.0))
        );
        assert!(builder
            .build_short_description("x".repeat(300))
            .is_err());
        // неудачный шаг ничего не записывает
        assert_eq!(builder.get_result(), &CourseDescription::default());
    }

    #[test]
    fn test_stages_chain_in_any_order() {
        let mut builder = StandardCourseBuilder::new();
        builder
            .build_price(19.99)
            .unwrap()
            .build_languages(BTreeSet::from([Language::English]))
            .unwrap()
            .build_title("Rust od podstaw")
            .unwrap();

        let course = builder.get_result();
        assert_eq!(course.title, "Rust od podstaw");
        assert_eq!(course.price, 19.99);
        assert!(course.languages.contains(&Language::English));
    }

    #[test]
    fn test_rejected_stage_leaves_previous_value() {
        let mut builder = StandardCourseBuilder::new();
        builder.build_price(10.0).unwrap();
        assert_eq!(
            builder.build_price(-5.0).err(),
            Some(ValidationError::InvalidPrice(-5.0))
        );
        assert_eq!(builder.build_title(" ").err(), Some(ValidationError::EmptyTitle));
        assert_eq!(builder.get_result().price, 10.0);
    }

    #[test]
    fn test_comments_create_feedback_transparently() {
        let comments = vec![
            Comment::new("a", "good", Some(Rating::Four)).unwrap(),
            Comment::new("b", "no rate", None).unwrap(),
        ];
        let mut builder = StandardCourseBuilder::new();
        builder.build_comments(comments).unwrap();

        let feedback = &builder.get_result().course_feedback;
        assert_eq!(feedback.comments().len(), 2);
        assert_eq!(feedback.rates_count(), 1);
        assert_eq!(feedback.avg_rate(), 4.0);
    }

    #[test]
    fn test_restore_leaves_no_residue() {
        let mut builder = StandardCourseBuilder::new();
        builder
            .build_title("Old")
            .unwrap()
            .build_price(99.0)
            .unwrap()
            .build_authors(vec!["author".into()])
            .unwrap()
            .build_comments(vec![Comment::new("a", "x", Some(Rating::One)).unwrap()])
            .unwrap();
        builder.restore();

        let fresh = Course::new();
        let result = builder.get_result();
        assert_eq!(result.title, fresh.title);
        assert_eq!(result.price, fresh.price);
        assert!(result.authors.is_empty());
        assert!(result.categories.is_empty());
        assert!(result.course_description.is_none());
        assert_eq!(result.course_feedback, CourseFeedback::default());
    }

    #[test]
    fn test_take_result_resets_builder() {
        let mut builder = StandardCourseBuilder::new();
        builder.build_title("First").unwrap();
        let first = builder.take_result();
        assert_eq!(first.title, "First");
        assert!(builder.get_result().title.is_empty());

        let mut description_builder = StandardCourseDescriptionBuilder::new();
        description_builder.build_long_description("long").unwrap();
        assert_eq!(description_builder.take_result().long_description, "long");
        assert!(description_builder.get_result().long_description.is_empty());
    }
}
