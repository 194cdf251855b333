use super::aggregate::Course;
use crate::domain::common::AggregateRoot;

/// Перенос изменяемых полей из присланного представления в сохранённый курс.
///
/// Копирование безусловное: вызывающая сторона собирает `updated` из копии
/// `persisted`, поверх которой наложены только изменяемые поля запроса
/// (см. `CourseUpdateDto::overlay`). Права автора проверяются до слияния.
pub struct PartialUpdateMerger;

impl PartialUpdateMerger {
    /// Имена полей (как на проводе), которые переносит слияние
    pub const MERGED_FIELDS: [&'static str; 6] = [
        "title",
        "price",
        "courseDescription",
        "languages",
        "subtitles",
        "categories",
    ];

    /// ID, отзывы с комментариями, авторы и дата создания не переносятся
    pub fn merge(mut persisted: Course, updated: Course) -> Course {
        persisted.title = updated.title;
        persisted.price = updated.price;
        persisted.course_description = updated.course_description;
        persisted.languages = updated.languages;
        persisted.subtitles = updated.subtitles;
        persisted.categories = updated.categories;
        persisted.touch();
        persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::aggregate::{Category, CategoryId};
    use crate::domain::a002_course::aggregate::{
        Comment, CourseDescription, CourseFeedback, CourseId,
    };
    use crate::enums::language::Language;
    use crate::enums::rating::Rating;
    use std::collections::BTreeSet;

    fn persisted() -> Course {
        let mut course = Course {
            title: "Old title".into(),
            price: 10.0,
            authors: vec!["owner".into()],
            ..Default::default()
        };
        course.assign_id(CourseId(7));
        course.add_comment(Comment::new("fan", "great", Some(Rating::Five)).unwrap());
        course
    }

    #[test]
    fn test_merge_copies_allow_listed_fields() {
        let mut category = Category::new("Biznes", 0);
        category.id = CategoryId(2);
        let updated = Course {
            title: "New title".into(),
            price: 25.5,
            languages: BTreeSet::from([Language::Polish]),
            subtitles: BTreeSet::from([Language::English]),
            categories: vec![category.clone()],
            course_description: Some(CourseDescription {
                duration: 3.0,
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = PartialUpdateMerger::merge(persisted(), updated);
        assert_eq!(merged.title, "New title");
        assert_eq!(merged.price, 25.5);
        assert_eq!(merged.languages, BTreeSet::from([Language::Polish]));
        assert_eq!(merged.subtitles, BTreeSet::from([Language::English]));
        assert_eq!(merged.categories, vec![category]);
        assert_eq!(merged.course_description.map(|d| d.duration), Some(3.0));
    }

    #[test]
    fn test_merge_never_touches_identity_feedback_or_authors() {
        let original = persisted();
        let mut hostile = Course {
            title: "x".into(),
            authors: vec!["intruder".into()],
            course_feedback: CourseFeedback::with_comments(vec![]),
            ..Default::default()
        };
        hostile.assign_id(CourseId(999));
        hostile.metadata.version = 100;

        let merged = PartialUpdateMerger::merge(original.clone(), hostile);
        assert_eq!(merged.id, CourseId(7));
        assert_eq!(merged.course_feedback, original.course_feedback);
        assert_eq!(merged.course_feedback.comments().len(), 1);
        assert_eq!(merged.authors, vec!["owner".to_string()]);
        assert_eq!(merged.metadata.created_at, original.metadata.created_at);
        assert_eq!(merged.metadata.version, original.metadata.version);
        assert!(merged.metadata.last_update >= original.metadata.last_update);
    }

    #[test]
    fn test_merge_is_unconditional_copy() {
        // пустые значения в updated тоже переносятся
        let merged = PartialUpdateMerger::merge(persisted(), Course::default());
        assert!(merged.title.is_empty());
        assert_eq!(merged.price, 0.0);
    }
}
