//! Шаблон с эталонными значениями полей
//!
//! Шаблон — единица хранения и сравнения: упорядоченный список полей,
//! у каждого — эталонное значение, допустимые варианты и известные
//! ошибочные варианты (механизм обучения). Во время одного прохода
//! проверки/исправления шаблон не меняется.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use store::TemplateStore;

/// Поле шаблона с эталонным значением и вариантами
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub id: u32,
    pub name: String,
    /// Основное эталонное значение; пустое — поле не проверяется
    #[serde(default)]
    pub reference_value: String,
    /// Допустимые варианты (синонимы, альтернативные формулировки)
    #[serde(default)]
    pub valid_variants: Vec<String>,
    /// Известные некорректные варианты (пополняются при обучении)
    #[serde(default)]
    pub invalid_variants: Vec<String>,
}

impl Field {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            reference_value: String::new(),
            valid_variants: Vec::new(),
            invalid_variants: Vec::new(),
        }
    }

    /// Добавить вариант; возвращает false, если такой уже есть
    pub fn add_variant(&mut self, text: &str, valid: bool) -> bool {
        let list = if valid {
            &mut self.valid_variants
        } else {
            &mut self.invalid_variants
        };
        if list.iter().any(|v| v == text) {
            return false;
        }
        list.push(text.to_string());
        true
    }

    /// Удалить вариант; возвращает false, если его не было
    pub fn remove_variant(&mut self, text: &str, valid: bool) -> bool {
        let list = if valid {
            &mut self.valid_variants
        } else {
            &mut self.invalid_variants
        };
        let before = list.len();
        list.retain(|v| v != text);
        list.len() != before
    }
}

/// Шаблон документа: 11 обязательных полей по умолчанию
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub fields: Vec<Field>,
}

impl Template {
    /// Создать шаблон со стандартным набором полей
    pub fn with_default_fields(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: String::new(),
            created_date: now,
            modified_date: now,
            fields: default_fields(),
        }
    }

    pub fn field(&self, field_id: u32) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn field_mut(&mut self, field_id: u32) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == field_id)
    }
}

/// Стандартный набор из 11 обязательных полей
///
/// Каждый вызов возвращает свежий список — никакого общего состояния.
pub fn default_fields() -> Vec<Field> {
    vec![
        Field::new(1, "Наименование изделия"),
        Field::new(2, "Модель/модификация"),
        Field::new(3, "Наименование производителя"),
        Field::new(4, "Страна производителя"),
        Field::new(5, "Наименование заявителя"),
        Field::new(6, "Страна заявителя"),
        Field::new(7, "Адрес производителя"),
        Field::new(8, "Адрес заявителя"),
        Field::new(9, "Наименование испытательной лаборатории"),
        Field::new(10, "Регистрационный номер/код изделия"),
        Field::new(11, "Дополнительное поле"),
    ]
}
