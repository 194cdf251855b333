use serde::{Deserialize, Serialize};

use crate::domain::common::{AggregateId, ValidationError};

/// Идентификатор корневой категории (у корня нет родителя)
pub const ROOT_PARENT_ID: i32 = 0;

// ============================================================================
// ID Type
// ============================================================================

/// Уникальный идентификатор категории
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CategoryId(pub i32);

impl CategoryId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl AggregateId for CategoryId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        <i32 as AggregateId>::from_string(s).map(CategoryId)
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Категория курсов. Курсы ссылаются на категории, но категории курсами не владеют.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_category_id: i32,
}

impl Category {
    pub fn new(name: impl Into<String>, parent_category_id: i32) -> Self {
        Self {
            id: CategoryId::default(),
            name: name.into(),
            parent_category_id,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_category_id == ROOT_PARENT_ID
    }

    /// Обновить данные из DTO
    pub fn update(&mut self, dto: &CategoryDto) {
        self.name = dto.name.clone();
        self.parent_category_id = dto.parent_category_id;
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }
        if self.id.value() != 0 && self.id.value() == self.parent_category_id {
            return Err(ValidationError::SelfParentCategory);
        }
        Ok(())
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для создания/обновления категории
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub name: String,
    #[serde(default)]
    pub parent_category_id: i32,
}
