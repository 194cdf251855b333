use std::sync::Arc;

use contracts::domain::a001_category::aggregate::{Category, CategoryDto, CategoryId, ROOT_PARENT_ID};
use contracts::domain::common::ValidationError;
use thiserror::Error;

use super::repository::CategoryRepository;
use crate::domain::a002_course::repository::CourseRepository;

#[derive(Debug, Error)]
pub enum CategoryServiceError {
    #[error("Category {0} not found")]
    CategoryNotFound(i32),
    #[error("Category {id} is used by {courses} course(s)")]
    CategoryInUse { id: i32, courses: u64 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CategoryServiceError>;

/// Дерево категорий: корневые и дочерние, управление - только администратор
#[derive(Clone)]
pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl CategoryService {
    pub fn new(
        repository: Arc<dyn CategoryRepository>,
        courses: Arc<dyn CourseRepository>,
    ) -> Self {
        Self {
            repository,
            courses,
        }
    }

    /// Корневые категории (родитель = 0)
    pub async fn main_categories(&self) -> Result<Vec<Category>> {
        Ok(self.repository.find_by_parent(ROOT_PARENT_ID).await?)
    }

    pub async fn child_categories(&self, parent_category_id: i32) -> Result<Vec<Category>> {
        Ok(self.repository.find_by_parent(parent_category_id).await?)
    }

    pub async fn get_by_id(&self, id: CategoryId) -> Result<Category> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CategoryServiceError::CategoryNotFound(id.value()))
    }

    /// Создание новой категории
    pub async fn create(&self, dto: CategoryDto) -> Result<Category> {
        let category = Category::new(dto.name, dto.parent_category_id);
        category.validate()?;
        self.ensure_parent_exists(category.parent_category_id).await?;

        let saved = self.repository.save(category).await?;
        tracing::info!("Category '{}' created with id {}", saved.name, saved.id.value());
        Ok(saved)
    }

    pub async fn update(&self, id: CategoryId, dto: CategoryDto) -> Result<Category> {
        let mut category = self.get_by_id(id).await?;
        category.update(&dto);
        category.validate()?;
        self.ensure_parent_exists(category.parent_category_id).await?;

        Ok(self.repository.save(category).await?)
    }

    /// Удалить можно только категорию, на которую не ссылается ни один курс
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        let courses = self.courses.count_by_category(id).await?;
        if courses > 0 {
            return Err(CategoryServiceError::CategoryInUse {
                id: id.value(),
                courses,
            });
        }
        if !self.repository.delete(id).await? {
            return Err(CategoryServiceError::CategoryNotFound(id.value()));
        }
        tracing::info!("Category {} deleted", id.value());
        Ok(())
    }

    async fn ensure_parent_exists(&self, parent_category_id: i32) -> Result<()> {
        if parent_category_id == ROOT_PARENT_ID {
            return Ok(());
        }
        self.get_by_id(CategoryId(parent_category_id)).await.map(|_| ())
    }
}
