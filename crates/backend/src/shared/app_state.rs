use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::domain::a001_category::repository::SqliteCategoryRepository;
use crate::domain::a001_category::service::CategoryService;
use crate::domain::a002_course::repository::SqliteCourseRepository;
use crate::domain::a002_course::service::CourseService;

/// Сервисы, доступные обработчикам через `State`
#[derive(Clone)]
pub struct AppState {
    pub courses: CourseService,
    pub categories: CategoryService,
}

impl AppState {
    /// Сервисы поверх SQLite
    pub fn sqlite(conn: DatabaseConnection) -> Self {
        let category_repository = Arc::new(SqliteCategoryRepository::new(conn.clone()));
        let course_repository = Arc::new(SqliteCourseRepository::new(conn));
        Self {
            courses: CourseService::new(course_repository.clone(), category_repository.clone()),
            categories: CategoryService::new(category_repository, course_repository),
        }
    }
}
