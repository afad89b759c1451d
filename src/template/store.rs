//! Хранилище шаблонов (JSON-файл)
//!
//! Все шаблоны лежат в одном файле `templates.json` в каталоге данных
//! пользователя. Поврежденный файл не роняет программу: он читается
//! как пустой список.

use crate::error::{DocCheckerError, Result};
use crate::template::Template;
use chrono::Utc;
use std::path::{Path, PathBuf};

const TEMPLATES_FILE_NAME: &str = "templates.json";

pub struct TemplateStore {
    directory: PathBuf,
}

impl TemplateStore {
    /// Хранилище в указанном каталоге (для тестов и переносимых установок)
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
        }
    }

    /// Хранилище в каталоге данных пользователя
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| DocCheckerError::Config("Каталог данных пользователя не найден".into()))?;
        Ok(Self {
            directory: data_dir.join("doc-checker"),
        })
    }

    fn file_path(&self) -> PathBuf {
        self.directory.join(TEMPLATES_FILE_NAME)
    }

    /// Загрузить все шаблоны
    pub fn load_all(&self) -> Vec<Template> {
        let path = self.file_path();
        if !path.exists() {
            return Vec::new();
        }

        std::fs::read_to_string(&path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    /// Найти шаблон по идентификатору или имени
    pub fn find(&self, id_or_name: &str) -> Result<Template> {
        self.load_all()
            .into_iter()
            .find(|t| t.id == id_or_name || t.name == id_or_name)
            .ok_or_else(|| DocCheckerError::TemplateNotFound(id_or_name.to_string()))
    }

    /// Сохранить шаблон (обновить существующий или добавить новый)
    pub fn save(&self, template: &Template) -> Result<()> {
        let mut template = template.clone();
        template.modified_date = Utc::now();

        let mut templates = self.load_all();
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }

        self.save_all(&templates)
    }

    /// Удалить шаблон по идентификатору или имени
    pub fn delete(&self, id_or_name: &str) -> Result<()> {
        let mut templates = self.load_all();
        let before = templates.len();
        templates.retain(|t| t.id != id_or_name && t.name != id_or_name);
        if templates.len() == before {
            return Err(DocCheckerError::TemplateNotFound(id_or_name.to_string()));
        }
        self.save_all(&templates)
    }

    fn save_all(&self, templates: &[Template]) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        let json = serde_json::to_string_pretty(templates)?;
        std::fs::write(self.file_path(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = TemplateStore::new(dir.path());

        let mut template = Template::with_default_fields("Сертификат соответствия");
        template.field_mut(4).unwrap().reference_value = "Германия".to_string();
        store.save(&template).unwrap();

        let loaded = store.find("Сертификат соответствия").unwrap();
        assert_eq!(loaded.id, template.id);
        assert_eq!(loaded.field(4).unwrap().reference_value, "Германия");
    }

    #[test]
    fn test_save_updates_existing() {
        let dir = tempdir().unwrap();
        let store = TemplateStore::new(dir.path());

        let mut template = Template::with_default_fields("Шаблон");
        store.save(&template).unwrap();

        template.description = "обновлено".to_string();
        store.save(&template).unwrap();

        let all = store.load_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].description, "обновлено");
        assert!(all[0].modified_date >= all[0].created_date);
    }

    #[test]
    fn test_learned_variant_can_be_unlearned() {
        let dir = tempdir().unwrap();
        let store = TemplateStore::new(dir.path());

        let mut template = Template::with_default_fields("Сертификат");
        template.field_mut(4).unwrap().add_variant("Алемания", false);
        store.save(&template).unwrap();

        let mut loaded = store.find("Сертификат").unwrap();
        assert!(loaded.field_mut(4).unwrap().remove_variant("Алемания", false));
        store.save(&loaded).unwrap();

        let reloaded = store.find("Сертификат").unwrap();
        assert!(reloaded.field(4).unwrap().invalid_variants.is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = TemplateStore::new(dir.path());

        let template = Template::with_default_fields("Шаблон");
        store.save(&template).unwrap();
        store.delete(&template.id).unwrap();

        assert!(store.load_all().is_empty());
        assert!(matches!(
            store.delete("Шаблон"),
            Err(DocCheckerError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_store_reads_as_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(TEMPLATES_FILE_NAME), "не json").unwrap();

        let store = TemplateStore::new(dir.path());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_missing_template() {
        let dir = tempdir().unwrap();
        let store = TemplateStore::new(dir.path());
        assert!(matches!(
            store.find("нет такого"),
            Err(DocCheckerError::TemplateNotFound(_))
        ));
    }
}
