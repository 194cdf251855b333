//! Проекция агрегатов в JSON с исключением полей.
//!
//! Один список исключений применяется ко всем вложенным объектам, поэтому
//! `["comments"]` убирает комментарии и у курса, и у его отзывов.

use std::collections::HashSet;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct FieldProjectionFilter {
    omit_empty: bool,
}

impl Default for FieldProjectionFilter {
    /// По умолчанию null и пустые коллекции не попадают в ответ
    fn default() -> Self {
        Self { omit_empty: true }
    }
}

impl FieldProjectionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Фильтр, оставляющий null и пустые коллекции
    pub fn keep_empty() -> Self {
        Self { omit_empty: false }
    }

    /// Сериализовать `value`; при `include_all == false` удалить поля из `except_fields`
    pub fn project<T, I, S>(
        &self,
        value: &T,
        include_all: bool,
        except_fields: I,
    ) -> Result<Value, serde_json::Error>
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut json = serde_json::to_value(value)?;

        if !include_all {
            let except: HashSet<String> = except_fields
                .into_iter()
                .map(|f| f.as_ref().to_string())
                .collect();
            if !except.is_empty() {
                strip_fields(&mut json, &except);
            }
        }

        if self.omit_empty {
            compact(&mut json);
        }

        Ok(json)
    }

    /// Проекция без исключений
    pub fn project_all<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value, serde_json::Error> {
        self.project(value, true, std::iter::empty::<&str>())
    }

    pub fn project_to_string<T, I, S>(
        &self,
        value: &T,
        include_all: bool,
        except_fields: I,
    ) -> Result<String, serde_json::Error>
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let json = self.project(value, include_all, except_fields)?;
        serde_json::to_string(&json)
    }

    /// Очистка входных данных: исключённые поля получают значения по умолчанию
    pub fn filter_fields<T, I, S>(&self, value: &T, except_fields: I) -> Result<T, serde_json::Error>
    where
        T: Serialize + DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter_value(serde_json::to_value(value)?, except_fields)
    }

    /// То же для сырого JSON: поля удаляются до разбора в `T`,
    /// поэтому содержимое отброшенных полей не проверяется
    pub fn filter_value<T, I, S>(&self, value: Value, except_fields: I) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let json = self.project(&value, false, except_fields)?;
        serde_json::from_value(json)
    }
}

fn strip_fields(value: &mut Value, except: &HashSet<String>) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !except.contains(key));
            for nested in map.values_mut() {
                strip_fields(nested, except);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_fields(item, except);
            }
        }
        _ => {}
    }
}

fn compact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for nested in map.values_mut() {
                compact(nested);
            }
            map.retain(|_, v| !is_empty_value(v));
        }
        Value::Array(items) => {
            for item in items {
                compact(item);
            }
        }
        _ => {}
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
