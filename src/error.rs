use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocCheckerError {
    #[error("Файл не найден: {0}")]
    FileNotFound(String),

    #[error("Неверный формат документа: {0}")]
    InvalidFormat(String),

    #[error("Шаблон не найден: {0}")]
    TemplateNotFound(String),

    #[error("Поле не найдено в шаблоне: {0}")]
    FieldNotFound(u32),

    #[error("Ошибка настроек: {0}")]
    Config(String),

    #[error("Ошибка разбора JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DocCheckerError>;
