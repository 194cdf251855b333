use std::sync::Arc;

use contracts::domain::a001_category::aggregate::{Category, CategoryId};
use contracts::domain::a002_course::aggregate::{
    CommentDto, Course, CourseFeedback, CourseId, CourseUpdateDto,
};
use contracts::domain::a002_course::factory::CourseFactory;
use contracts::domain::a002_course::merge::PartialUpdateMerger;
use contracts::domain::common::ValidationError;
use thiserror::Error;
use uuid::Uuid;

use super::repository::{CourseRepository, StaleCourse};
use crate::domain::a001_category::repository::CategoryRepository;

/// Сколько раз перечитывать курс, если его успели изменить параллельно
const MAX_SAVE_ATTEMPTS: usize = 32;

#[derive(Debug, Error)]
pub enum CourseServiceError {
    #[error("Course {0} not found")]
    NotFound(CourseId),
    #[error("Category {0} not found")]
    CategoryNotFound(i32),
    #[error("User {user_id} is not an author of course {course_id}")]
    NotAnAuthor { course_id: CourseId, user_id: String },
    #[error("Comment {0} not found")]
    CommentNotFound(Uuid),
    #[error("User {user_id} is not the author of comment {comment_id}")]
    NotCommentAuthor { comment_id: Uuid, user_id: String },
    #[error("Course {0} is being modified concurrently, try again")]
    Conflict(CourseId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CourseServiceError>;

/// Сценарии работы с курсами: каталог, авторское редактирование, комментарии, покупки
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    categories: Arc<dyn CategoryRepository>,
    factory: CourseFactory,
}

impl CourseService {
    pub fn new(courses: Arc<dyn CourseRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self {
            courses,
            categories,
            factory: CourseFactory::new(),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Course>> {
        Ok(self.courses.find_all().await?)
    }

    pub async fn get_by_id(&self, id: CourseId) -> Result<Course> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or(CourseServiceError::NotFound(id))
    }

    /// Создание курса из очищенного представления клиента.
    ///
    /// Курс собирается заново через фабрику: отзывы пустые, автор - только вызывающий.
    pub async fn create(&self, draft: Course, author_id: &str) -> Result<Course> {
        let categories = self.resolve_categories(&draft.category_ids()).await?;

        let mut course = self.factory.create_full_course(
            draft.title,
            draft.price,
            draft.course_description.unwrap_or_default(),
            draft.languages,
            draft.subtitles,
            categories,
            CourseFeedback::new(),
        )?;
        course.authors = vec![author_id.to_string()];
        course.validate()?;

        let saved = self.courses.save(course).await?;
        tracing::info!(
            "Course '{}' created with id {} by {}",
            saved.title,
            saved.id,
            author_id
        );
        Ok(saved)
    }

    /// Частичное обновление: только автор, только изменяемые поля
    pub async fn update(&self, id: CourseId, user_id: &str, dto: CourseUpdateDto) -> Result<Course> {
        self.get_authored(id, user_id).await?;

        let categories = match &dto.category_ids {
            Some(ids) => Some(self.resolve_categories(ids).await?),
            None => None,
        };
        self.modify(id, |persisted| {
            ensure_author(&persisted, user_id)?;
            let updated = dto.overlay(persisted.clone(), categories.clone());
            let merged = PartialUpdateMerger::merge(persisted, updated);
            merged.validate()?;
            Ok(merged)
        })
        .await
    }

    /// Удаление курса вместе с описанием, отзывами и комментариями
    pub async fn delete(&self, id: CourseId, user_id: &str) -> Result<()> {
        self.get_authored(id, user_id).await?;
        self.courses.delete(id).await?;
        tracing::info!("Course {} deleted by {}", id, user_id);
        Ok(())
    }

    /// Комментарий может оставить любой авторизованный пользователь
    pub async fn add_comment(&self, id: CourseId, user_id: &str, dto: CommentDto) -> Result<Course> {
        let comment = dto.into_comment(user_id)?;
        self.modify(id, |mut course| {
            course.add_comment(comment.clone());
            Ok(course)
        })
        .await
    }

    /// Удалить комментарий может только его автор
    pub async fn remove_comment(
        &self,
        id: CourseId,
        comment_id: Uuid,
        user_id: &str,
    ) -> Result<Course> {
        self.modify(id, |mut course| {
            let comment = course
                .course_feedback
                .find_comment(comment_id)
                .ok_or(CourseServiceError::CommentNotFound(comment_id))?;
            if comment.author_id != user_id {
                return Err(CourseServiceError::NotCommentAuthor {
                    comment_id,
                    user_id: user_id.to_string(),
                });
            }
            course.remove_comment(comment_id);
            Ok(course)
        })
        .await
    }

    /// Запись о покупке (без оплаты). Повторная покупка ничего не меняет.
    pub async fn purchase(&self, id: CourseId, user_id: &str) -> Result<bool> {
        self.get_by_id(id).await?;
        let added = self.courses.add_purchase(id, user_id).await?;
        if added {
            tracing::info!("User {} purchased course {}", user_id, id);
        }
        Ok(added)
    }

    pub async fn purchased_courses(&self, user_id: &str) -> Result<Vec<Course>> {
        Ok(self.courses.find_purchased(user_id).await?)
    }

    async fn get_authored(&self, id: CourseId, user_id: &str) -> Result<Course> {
        let course = self.get_by_id(id).await?;
        ensure_author(&course, user_id)?;
        Ok(course)
    }

    /// Прочитать курс, изменить и записать. Если запись отклонена из-за
    /// параллельного изменения, изменение применяется заново к свежей версии.
    async fn modify<F>(&self, id: CourseId, mut change: F) -> Result<Course>
    where
        F: FnMut(Course) -> Result<Course> + Send,
    {
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            let course = change(self.get_by_id(id).await?)?;
            match self.courses.save(course).await {
                Ok(saved) => return Ok(saved),
                Err(e) if e.is::<StaleCourse>() => {
                    tracing::debug!("Course {} changed concurrently, attempt {}", id, attempt);
                    tokio::task::yield_now().await;
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::warn!("Course {}: gave up after {} attempts", id, MAX_SAVE_ATTEMPTS);
        Err(CourseServiceError::Conflict(id))
    }

    async fn resolve_categories(&self, ids: &[CategoryId]) -> Result<Vec<Category>> {
        let found = self.categories.find_by_ids(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|c| c.id == **id)) {
            return Err(CourseServiceError::CategoryNotFound(missing.value()));
        }
        Ok(found)
    }
}

fn ensure_author(course: &Course, user_id: &str) -> Result<()> {
    if !course.is_author(user_id) {
        return Err(CourseServiceError::NotAnAuthor {
            course_id: course.id,
            user_id: user_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_category::repository::in_memory::InMemoryCategoryRepository;
    use crate::domain::a001_category::repository::SqliteCategoryRepository;
    use crate::domain::a002_course::repository::in_memory::InMemoryCourseRepository;
    use crate::domain::a002_course::repository::SqliteCourseRepository;
    use crate::shared::data::db::testing::temp_database;
    use contracts::domain::a002_course::aggregate::CourseDescription;
    use contracts::enums::language::Language;
    use std::collections::BTreeSet;

    fn web_category() -> Category {
        Category {
            id: CategoryId(4),
            name: "Tworzenie stron internetowych".into(),
            parent_category_id: 1,
        }
    }

    fn service() -> CourseService {
        CourseService::new(
            Arc::new(InMemoryCourseRepository::default()),
            Arc::new(InMemoryCategoryRepository::with(vec![web_category()])),
        )
    }

    fn draft() -> Course {
        Course {
            title: "Kurs HTML i CSS".into(),
            price: 59.99,
            languages: BTreeSet::from([Language::Polish]),
            categories: vec![Category {
                id: CategoryId(4),
                ..Default::default()
            }],
            course_description: Some(CourseDescription {
                duration: 48.5,
                short_description: "HTML".into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn comment(text: &str, rate: Option<f64>) -> CommentDto {
        CommentDto {
            description: text.into(),
            rate,
        }
    }

    #[tokio::test]
    async fn test_create_sets_author_and_resolves_categories() {
        let service = service();
        let course = service.create(draft(), "author-1").await.unwrap();

        assert!(!course.id.is_unsaved());
        assert_eq!(course.authors, vec!["author-1".to_string()]);
        assert_eq!(course.categories, vec![web_category()]);
        assert!(course.course_feedback.comments().is_empty());
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category_and_bad_price() {
        let service = service();
        let mut unknown = draft();
        unknown.categories[0].id = CategoryId(99);
        assert!(matches!(
            service.create(unknown, "a").await,
            Err(CourseServiceError::CategoryNotFound(99))
        ));

        let mut negative = draft();
        negative.price = -1.0;
        assert!(matches!(
            service.create(negative, "a").await,
            Err(CourseServiceError::Validation(ValidationError::InvalidPrice(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_by_author_keeps_feedback() {
        let service = service();
        let course = service.create(draft(), "author").await.unwrap();
        service
            .add_comment(course.id, "student", comment("Super", Some(5.0)))
            .await
            .unwrap();

        let dto = CourseUpdateDto {
            title: Some("Nowy tytuł".into()),
            ..Default::default()
        };
        let updated = service.update(course.id, "author", dto).await.unwrap();

        assert_eq!(updated.id, course.id);
        assert_eq!(updated.title, "Nowy tytuł");
        assert_eq!(updated.price, 59.99);
        assert_eq!(updated.categories, vec![web_category()]);
        assert_eq!(updated.course_feedback.comments().len(), 1);
        assert_eq!(updated.course_feedback.avg_rate(), 5.0);
        assert_eq!(updated.authors, vec!["author".to_string()]);
    }

    #[tokio::test]
    async fn test_only_authors_update_or_delete() {
        let service = service();
        let course = service.create(draft(), "author").await.unwrap();

        assert!(matches!(
            service.update(course.id, "stranger", CourseUpdateDto::default()).await,
            Err(CourseServiceError::NotAnAuthor { .. })
        ));
        assert!(matches!(
            service.delete(course.id, "stranger").await,
            Err(CourseServiceError::NotAnAuthor { .. })
        ));

        service.delete(course.id, "author").await.unwrap();
        assert!(matches!(
            service.get_by_id(course.id).await,
            Err(CourseServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_drive_rating() {
        let service = service();
        let course = service.create(draft(), "author").await.unwrap();

        service
            .add_comment(course.id, "u1", comment("great", Some(5.0)))
            .await
            .unwrap();
        service
            .add_comment(course.id, "u2", comment("no rate", None))
            .await
            .unwrap();
        let course = service
            .add_comment(course.id, "u3", comment("ok", Some(3.0)))
            .await
            .unwrap();
        assert_eq!(course.course_feedback.rates_count(), 2);
        assert_eq!(course.course_feedback.avg_rate(), 4.0);

        assert!(matches!(
            service.add_comment(course.id, "u4", comment("bad", Some(7.0))).await,
            Err(CourseServiceError::Validation(ValidationError::InvalidRate(_)))
        ));
    }

    #[tokio::test]
    async fn test_remove_comment_only_by_its_author() {
        let service = service();
        let course = service.create(draft(), "author").await.unwrap();
        let course = service
            .add_comment(course.id, "u1", comment("great", Some(5.0)))
            .await
            .unwrap();
        let comment_id = course.course_feedback.comments()[0].id;

        assert!(matches!(
            service.remove_comment(course.id, comment_id, "author").await,
            Err(CourseServiceError::NotCommentAuthor { .. })
        ));
        assert!(matches!(
            service.remove_comment(course.id, Uuid::new_v4(), "u1").await,
            Err(CourseServiceError::CommentNotFound(_))
        ));

        let course = service.remove_comment(course.id, comment_id, "u1").await.unwrap();
        assert!(course.course_feedback.comments().is_empty());
        assert_eq!(course.course_feedback.rates_count(), 0);
        assert_eq!(course.course_feedback.avg_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_purchase_is_recorded_once() {
        let service = service();
        let course = service.create(draft(), "author").await.unwrap();

        assert!(service.purchase(course.id, "buyer").await.unwrap());
        assert!(!service.purchase(course.id, "buyer").await.unwrap());
        assert!(matches!(
            service.purchase(CourseId(404), "buyer").await,
            Err(CourseServiceError::NotFound(_))
        ));

        let purchased = service.purchased_courses("buyer").await.unwrap();
        assert_eq!(purchased.len(), 1);
        assert_eq!(purchased[0].id, course.id);
        assert!(service.purchased_courses("nobody").await.unwrap().is_empty());
    }

    async fn sqlite_service(conn: sea_orm::DatabaseConnection) -> (CourseService, Course) {
        let service = CourseService::new(
            Arc::new(SqliteCourseRepository::new(conn.clone())),
            Arc::new(SqliteCategoryRepository::new(conn)),
        );
        let uncategorized = Course {
            categories: Vec::new(),
            ..draft()
        };
        let course = service.create(uncategorized, "author").await.unwrap();
        (service, course)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_comments_are_all_kept() {
        let (_dir, conn) = temp_database().await;
        let (service, course) = sqlite_service(conn).await;
        let id = course.id;

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .add_comment(id, &format!("u{i}"), comment("Super", Some(5.0)))
                        .await
                })
            })
            .collect();
        let mut accepted = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        let stored = service.get_by_id(id).await.unwrap();
        assert_eq!(accepted, 20);
        assert_eq!(stored.course_feedback.comments().len(), accepted);
        assert_eq!(stored.course_feedback.rates_count(), 20);
        assert_eq!(stored.course_feedback.avg_rate(), 5.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_update_does_not_drop_parallel_comments() {
        let (_dir, conn) = temp_database().await;
        let (service, course) = sqlite_service(conn).await;
        let id = course.id;

        let mut tasks = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                service
                    .add_comment(id, &format!("u{i}"), comment("Dobry", Some(4.0)))
                    .await
                    .map(|_| ())
            }));
        }
        let updater = service.clone();
        tasks.push(tokio::spawn(async move {
            let dto = CourseUpdateDto {
                title: Some("Nowy tytuł".into()),
                ..Default::default()
            };
            updater.update(id, "author", dto).await.map(|_| ())
        }));
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = service.get_by_id(id).await.unwrap();
        assert_eq!(stored.title, "Nowy tytuł");
        assert_eq!(stored.course_feedback.comments().len(), 10);
        assert_eq!(stored.course_feedback.avg_rate(), 4.0);
    }

    #[tokio::test]
    async fn test_outdated_save_is_retried_with_fresh_state() {
        let repository = Arc::new(InMemoryCourseRepository::default());
        let service = CourseService::new(
            repository.clone(),
            Arc::new(InMemoryCategoryRepository::with(vec![web_category()])),
        );
        let course = service.create(draft(), "author").await.unwrap();

        let outdated = course.clone();
        service
            .add_comment(course.id, "u1", comment("Pierwszy", None))
            .await
            .unwrap();
        assert!(repository
            .save(outdated)
            .await
            .unwrap_err()
            .is::<StaleCourse>());

        let course = service
            .add_comment(course.id, "u2", comment("Drugi", Some(3.0)))
            .await
            .unwrap();
        assert_eq!(course.course_feedback.comments().len(), 2);
    }
}
