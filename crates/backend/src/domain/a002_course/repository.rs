use std::collections::BTreeSet;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a001_category::aggregate::{Category, CategoryId};
use contracts::domain::a002_course::aggregate::{
    Comment, Course, CourseDescription, CourseFeedback, CourseId,
};
use contracts::domain::common::{AggregateRoot, EntityMetadata};
use contracts::enums::language::Language;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter,
    QueryOrder, Set, Statement,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::a001_category::repository::{CategoryRepository, SqliteCategoryRepository};

/// Строка курса изменилась после чтения: запись отклонена, нужно перечитать
#[derive(Debug, Error)]
#[error("Course {id} was modified concurrently (expected version {expected})")]
pub struct StaleCourse {
    pub id: CourseId,
    pub expected: i32,
}

/// Хранилище курсов. Описание, отзывы и комментарии живут внутри курса
/// и удаляются вместе с ним.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: CourseId) -> anyhow::Result<Option<Course>>;

    async fn find_all(&self) -> anyhow::Result<Vec<Course>>;

    /// Сохранить курс. При первой записи присваивает ID, всегда обновляет `last_update`.
    ///
    /// Обновление проходит, только если версия в хранилище совпадает с версией курса;
    /// иначе возвращается [`StaleCourse`].
    async fn save(&self, course: Course) -> anyhow::Result<Course>;

    async fn delete(&self, id: CourseId) -> anyhow::Result<bool>;

    /// Связать пользователя с купленным курсом; `false`, если связь уже была
    async fn add_purchase(&self, course_id: CourseId, user_id: &str) -> anyhow::Result<bool>;

    async fn find_purchased(&self, user_id: &str) -> anyhow::Result<Vec<Course>>;

    /// Сколько курсов ссылается на категорию
    async fn count_by_category(&self, category_id: CategoryId) -> anyhow::Result<u64>;
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_course")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub price: f64,
    /// JSON-массивы кодов языков
    pub languages: String,
    pub subtitles: String,
    pub category_ids: String,
    pub authors: String,
    pub course_description: Option<String>,
    pub comments: String,
    pub avg_rate: f64,
    pub rates_count: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_update: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn to_active(course: &Course) -> anyhow::Result<ActiveModel> {
    let description = course
        .course_description
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    Ok(ActiveModel {
        id: if course.id.is_unsaved() {
            NotSet
        } else {
            Set(course.id.value())
        },
        title: Set(course.title.clone()),
        price: Set(course.price),
        languages: Set(serde_json::to_string(&course.languages)?),
        subtitles: Set(serde_json::to_string(&course.subtitles)?),
        category_ids: Set(serde_json::to_string(&course.category_ids())?),
        authors: Set(serde_json::to_string(&course.authors)?),
        course_description: Set(description),
        comments: Set(serde_json::to_string(course.course_feedback.comments())?),
        avg_rate: Set(course.course_feedback.avg_rate()),
        rates_count: Set(course.course_feedback.rates_count() as i32),
        created_at: Set(Some(course.metadata.created_at)),
        last_update: Set(Some(course.metadata.last_update)),
        version: Set(course.metadata.version),
    })
}

/// Восстановить агрегат из строки таблицы; категории уже загружены
fn into_course(m: Model, all_categories: &[Category]) -> anyhow::Result<Course> {
    let category_ids: Vec<CategoryId> = serde_json::from_str(&m.category_ids)
        .with_context(|| format!("Course {}: bad category_ids", m.id))?;
    let categories = category_ids
        .iter()
        .filter_map(|id| all_categories.iter().find(|c| c.id == *id).cloned())
        .collect();
    let languages: BTreeSet<Language> = serde_json::from_str(&m.languages)
        .with_context(|| format!("Course {}: bad languages", m.id))?;
    let subtitles: BTreeSet<Language> = serde_json::from_str(&m.subtitles)
        .with_context(|| format!("Course {}: bad subtitles", m.id))?;
    let authors: Vec<String> = serde_json::from_str(&m.authors)
        .with_context(|| format!("Course {}: bad authors", m.id))?;
    let comments: Vec<Comment> = serde_json::from_str(&m.comments)
        .with_context(|| format!("Course {}: bad comments", m.id))?;
    let course_description = m
        .course_description
        .as_deref()
        .map(serde_json::from_str::<CourseDescription>)
        .transpose()
        .with_context(|| format!("Course {}: bad course_description", m.id))?;

    let mut course = Course {
        id: CourseId::UNSAVED,
        title: m.title,
        price: m.price,
        languages,
        subtitles,
        categories,
        course_description,
        // avg_rate/rates_count из строки не читаются, а пересчитываются
        course_feedback: CourseFeedback::with_comments(comments),
        authors,
        metadata: EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            last_update: m.last_update.unwrap_or_else(Utc::now),
            version: m.version,
        },
    };
    course.assign_id(CourseId(m.id));
    Ok(course)
}

/// Реализация на sea-orm (таблица `a002_course`, покупки в `sys_user_courses`)
#[derive(Clone)]
pub struct SqliteCourseRepository {
    conn: DatabaseConnection,
    categories: SqliteCategoryRepository,
}

impl SqliteCourseRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self {
            categories: SqliteCategoryRepository::new(conn.clone()),
            conn,
        }
    }

    async fn hydrate(&self, models: Vec<Model>) -> anyhow::Result<Vec<Course>> {
        let mut ids: Vec<CategoryId> = Vec::new();
        for m in &models {
            let row_ids: Vec<CategoryId> = serde_json::from_str(&m.category_ids)
                .with_context(|| format!("Course {}: bad category_ids", m.id))?;
            for id in row_ids {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        let categories = self.categories.find_by_ids(&ids).await?;
        models
            .into_iter()
            .map(|m| into_course(m, &categories))
            .collect()
    }
}

#[async_trait]
impl CourseRepository for SqliteCourseRepository {
    async fn find_by_id(&self, id: CourseId) -> anyhow::Result<Option<Course>> {
        let Some(model) = Entity::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn find_all(&self) -> anyhow::Result<Vec<Course>> {
        let models = Entity::find()
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to load courses")?;
        self.hydrate(models).await
    }

    async fn save(&self, mut course: Course) -> anyhow::Result<Course> {
        course.before_write();
        if course.id.is_unsaved() {
            let model = to_active(&course)?
                .insert(&self.conn)
                .await
                .with_context(|| format!("Failed to insert course '{}'", course.title))?;
            course.assign_id(CourseId(model.id));
            tracing::debug!("{}: inserted row {}", Course::full_name(), course.id);
        } else {
            let expected = course.metadata.version;
            course.metadata_mut().increment_version();
            let result = Entity::update_many()
                .set(to_active(&course)?)
                .filter(Column::Id.eq(course.id.value()))
                .filter(Column::Version.eq(expected))
                .exec(&self.conn)
                .await
                .with_context(|| format!("Failed to update course {}", course.id))?;
            if result.rows_affected == 0 {
                return Err(StaleCourse {
                    id: course.id,
                    expected,
                }
                .into());
            }
        }
        Ok(course)
    }

    async fn delete(&self, id: CourseId) -> anyhow::Result<bool> {
        let result = Entity::delete_by_id(id.value()).exec(&self.conn).await?;
        self.conn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "DELETE FROM sys_user_courses WHERE course_id = ?",
                [id.value().into()],
            ))
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn add_purchase(&self, course_id: CourseId, user_id: &str) -> anyhow::Result<bool> {
        let result = self
            .conn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "INSERT OR IGNORE INTO sys_user_courses (user_id, course_id, purchased_at)
                 VALUES (?, ?, ?)",
                [
                    user_id.into(),
                    course_id.value().into(),
                    Utc::now().to_rfc3339().into(),
                ],
            ))
            .await
            .context("Failed to record purchase")?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_purchased(&self, user_id: &str) -> anyhow::Result<Vec<Course>> {
        let rows = self
            .conn
            .query_all(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT course_id FROM sys_user_courses WHERE user_id = ? ORDER BY purchased_at",
                [user_id.into()],
            ))
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("", "course_id")?;
            ids.push(id);
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = Entity::find()
            .filter(Column::Id.is_in(ids))
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await?;
        self.hydrate(models).await
    }

    async fn count_by_category(&self, category_id: CategoryId) -> anyhow::Result<u64> {
        let row = self
            .conn
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT COUNT(*) AS cnt FROM a002_course, json_each(a002_course.category_ids)
                 WHERE json_each.value = ?",
                [category_id.value().into()],
            ))
            .await
            .context("Failed to count courses by category")?;

        match row {
            Some(row) => Ok(row.try_get::<i64>("", "cnt")? as u64),
            None => Ok(0),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::testing::temp_database;
    use contracts::enums::rating::Rating;
    use std::time::Duration;

    async fn seed_categories(conn: &DatabaseConnection) -> Vec<Category> {
        let repository = SqliteCategoryRepository::new(conn.clone());
        let mut saved = Vec::new();
        for name in ["Programowanie", "Biznes"] {
            saved.push(repository.save(Category::new(name, 0)).await.unwrap());
        }
        saved
    }

    fn course(categories: Vec<Category>) -> Course {
        let mut course = Course {
            title: "Kurs HTML i CSS".into(),
            price: 59.99,
            languages: BTreeSet::from([Language::Polish, Language::English]),
            categories,
            course_description: Some(CourseDescription {
                duration: 48.5,
                short_description: "HTML".into(),
                main_topics: vec!["Selektory".into()],
                ..Default::default()
            }),
            authors: vec!["author".into()],
            ..Default::default()
        };
        course.add_comment(Comment::new("u1", "Super", Some(Rating::Five)).unwrap());
        course.add_comment(Comment::new("u2", "Tak sobie", Some(Rating::Two)).unwrap());
        course.add_comment(Comment::new("u3", "Bez oceny", None).unwrap());
        course
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_reload_restores_aggregate() {
        let (_dir, conn) = temp_database().await;
        let categories = seed_categories(&conn).await;
        // порядок категорий в курсе отличается от порядка вставки
        let ordered = vec![categories[1].clone(), categories[0].clone()];
        let repository = SqliteCourseRepository::new(conn);

        let saved = repository.save(course(ordered.clone())).await.unwrap();
        assert!(!saved.id.is_unsaved());
        assert!(saved
            .course_feedback
            .comments()
            .iter()
            .all(|c| c.course_id == saved.id));

        let reloaded = repository.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.id, saved.id);
        assert_eq!(reloaded.title, saved.title);
        assert_eq!(reloaded.price, saved.price);
        assert_eq!(reloaded.languages, saved.languages);
        assert_eq!(reloaded.categories, ordered);
        assert_eq!(reloaded.course_description, saved.course_description);
        assert_eq!(reloaded.authors, saved.authors);
        assert_eq!(reloaded.course_feedback, saved.course_feedback);
        assert_eq!(reloaded.course_feedback.rates_count(), 2);
        assert_eq!(reloaded.course_feedback.avg_rate(), 3.5);
        assert_eq!(reloaded.metadata.version, saved.metadata.version);
    }

    #[tokio::test]
    async fn test_derived_rating_is_recomputed_on_load() {
        let (_dir, conn) = temp_database().await;
        let repository = SqliteCourseRepository::new(conn.clone());
        let saved = repository.save(course(Vec::new())).await.unwrap();

        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE a002_course SET avg_rate = 1.0, rates_count = 40 WHERE id = ?",
            [saved.id.value().into()],
        ))
        .await
        .unwrap();

        let reloaded = repository.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.course_feedback.rates_count(), 2);
        assert_eq!(reloaded.course_feedback.avg_rate(), 3.5);
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_last_update() {
        let (_dir, conn) = temp_database().await;
        let repository = SqliteCourseRepository::new(conn);
        let saved = repository.save(course(Vec::new())).await.unwrap();

        std::thread::sleep(Duration::from_millis(5));
        let mut changed = saved.clone();
        changed.title = "Nowy tytuł".into();
        let updated = repository.save(changed).await.unwrap();

        assert_eq!(updated.metadata.version, saved.metadata.version + 1);
        assert!(updated.metadata.last_update > saved.metadata.last_update);
        assert_eq!(updated.metadata.created_at, saved.metadata.created_at);

        let reloaded = repository.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.title, "Nowy tytuł");
        assert_eq!(reloaded.metadata.version, updated.metadata.version);
        assert_eq!(reloaded.metadata.last_update, updated.metadata.last_update);
    }

    #[tokio::test]
    async fn test_save_of_outdated_copy_is_rejected() {
        let (_dir, conn) = temp_database().await;
        let repository = SqliteCourseRepository::new(conn);
        let saved = repository.save(course(Vec::new())).await.unwrap();

        let mut first = saved.clone();
        first.add_comment(Comment::new("u4", "Pierwszy", None).unwrap());
        repository.save(first).await.unwrap();

        let mut outdated = saved.clone();
        outdated.title = "Zgubi komentarz".into();
        let err = repository.save(outdated).await.unwrap_err();
        assert!(err.downcast_ref::<StaleCourse>().is_some());

        let stored = repository.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.course_feedback.comments().len(), 4);
        assert_eq!(stored.title, saved.title);
    }

    #[tokio::test]
    async fn test_delete_removes_purchases() {
        let (_dir, conn) = temp_database().await;
        let repository = SqliteCourseRepository::new(conn.clone());
        let kept = repository.save(course(Vec::new())).await.unwrap();
        let removed = repository.save(course(Vec::new())).await.unwrap();

        assert!(repository.add_purchase(kept.id, "buyer").await.unwrap());
        assert!(repository.add_purchase(removed.id, "buyer").await.unwrap());
        assert!(!repository.add_purchase(removed.id, "buyer").await.unwrap());
        assert_eq!(repository.find_purchased("buyer").await.unwrap().len(), 2);

        assert!(repository.delete(removed.id).await.unwrap());
        assert!(!repository.delete(removed.id).await.unwrap());
        assert!(repository.find_by_id(removed.id).await.unwrap().is_none());

        let purchased = repository.find_purchased("buyer").await.unwrap();
        assert_eq!(purchased.len(), 1);
        assert_eq!(purchased[0].id, kept.id);

        let rows = conn
            .query_all(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT user_id FROM sys_user_courses WHERE course_id = ?",
                [removed.id.value().into()],
            ))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_count_by_category() {
        let (_dir, conn) = temp_database().await;
        let categories = seed_categories(&conn).await;
        let repository = SqliteCourseRepository::new(conn);
        repository.save(course(categories.clone())).await.unwrap();
        repository
            .save(course(vec![categories[0].clone()]))
            .await
            .unwrap();

        assert_eq!(repository.count_by_category(categories[0].id).await.unwrap(), 2);
        assert_eq!(repository.count_by_category(categories[1].id).await.unwrap(), 1);
        assert_eq!(repository.count_by_category(CategoryId(99)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bad_category_ids_column_is_reported() {
        let (_dir, conn) = temp_database().await;
        let repository = SqliteCourseRepository::new(conn.clone());
        let saved = repository.save(course(Vec::new())).await.unwrap();

        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE a002_course SET category_ids = 'not json' WHERE id = ?",
            [saved.id.value().into()],
        ))
        .await
        .unwrap();

        let err = repository.find_all().await.unwrap_err();
        assert!(format!("{:#}", err).contains("bad category_ids"));
    }
}
