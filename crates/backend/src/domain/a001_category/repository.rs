use anyhow::Context;
use async_trait::async_trait;
use contracts::domain::a001_category::aggregate::{Category, CategoryId};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

/// Хранилище категорий
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: CategoryId) -> anyhow::Result<Option<Category>>;

    /// Категории в порядке переданных ID; отсутствующие пропускаются
    async fn find_by_ids(&self, ids: &[CategoryId]) -> anyhow::Result<Vec<Category>>;

    async fn find_by_parent(&self, parent_category_id: i32) -> anyhow::Result<Vec<Category>>;

    /// Вставка (ID = 0) или обновление; возвращает сохранённую категорию
    async fn save(&self, category: Category) -> anyhow::Result<Category>;

    async fn delete(&self, id: CategoryId) -> anyhow::Result<bool>;

    async fn count(&self) -> anyhow::Result<u64>;
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub parent_category_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Category {
    fn from(m: Model) -> Self {
        Category {
            id: CategoryId(m.id),
            name: m.name,
            parent_category_id: m.parent_category_id,
        }
    }
}

/// Реализация на sea-orm (таблица `a001_category`)
#[derive(Clone)]
pub struct SqliteCategoryRepository {
    conn: DatabaseConnection,
}

impl SqliteCategoryRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> anyhow::Result<Option<Category>> {
        let result = Entity::find_by_id(id.value()).one(&self.conn).await?;
        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[CategoryId]) -> anyhow::Result<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<Category> = Entity::find()
            .filter(Column::Id.is_in(ids.iter().map(|id| id.value())))
            .all(&self.conn)
            .await
            .context("Failed to load categories")?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|c| c.id == *id).cloned())
            .collect())
    }

    async fn find_by_parent(&self, parent_category_id: i32) -> anyhow::Result<Vec<Category>> {
        let items = Entity::find()
            .filter(Column::ParentCategoryId.eq(parent_category_id))
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(items)
    }

    async fn save(&self, category: Category) -> anyhow::Result<Category> {
        let active = ActiveModel {
            id: if category.id.value() == 0 {
                NotSet
            } else {
                Set(category.id.value())
            },
            name: Set(category.name.clone()),
            parent_category_id: Set(category.parent_category_id),
        };
        let model = if category.id.value() == 0 {
            active.insert(&self.conn).await
        } else {
            active.update(&self.conn).await
        }
        .with_context(|| format!("Failed to save category '{}'", category.name))?;
        Ok(model.into())
    }

    async fn delete(&self, id: CategoryId) -> anyhow::Result<bool> {
        let result = Entity::delete_by_id(id.value()).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        let count = Entity::find().count(&self.conn).await?;
        Ok(count)
    }
}
