//! Модель документа: дерево текстовых контейнеров
//!
//! Документ — упорядоченные параграфы, таблицы и колонтитулы. Текст внутри
//! параграфа разбит на «раны» (run) — непрерывные фрагменты с единым
//! форматированием. Ядро проверки не разбирает упакованные форматы:
//! документ загружается и сохраняется как JSON-дерево.

use crate::error::{DocCheckerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Свойства форматирования рана (переносятся при разбиении целиком)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Непрерывный фрагмент текста с единым форматированием
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub properties: RunProperties,
}

impl Run {
    pub fn new(text: &str, properties: RunProperties) -> Self {
        Self {
            text: text.to_string(),
            properties,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn from_text(text: &str) -> Self {
        Self {
            runs: vec![Run::new(text, RunProperties::default())],
        }
    }

    /// Сквозной текст параграфа (конкатенация ранов)
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

impl TableCell {
    /// Текст ячейки: тексты параграфов через один пробел
    ///
    /// Позиции несоответствий в ячейке считаются именно по этой строке.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

/// Адрес контейнера в документе
///
/// Идентичность контейнера позиционная: после внешнего изменения документа
/// найденные несоответствия устаревают, проверку нужно запускать заново.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ContainerRef {
    Paragraph {
        paragraph_index: usize,
    },
    TableCell {
        table_index: usize,
        row_index: usize,
        column_index: usize,
    },
    Header {
        header_index: usize,
    },
    Footer {
        footer_index: usize,
    },
}

impl ContainerRef {
    /// Человекочитаемое описание места (нумерация с единицы)
    pub fn location(&self) -> String {
        match self {
            ContainerRef::Paragraph { paragraph_index } => {
                format!("Параграф {}", paragraph_index + 1)
            }
            ContainerRef::TableCell {
                table_index,
                row_index,
                column_index,
            } => format!(
                "Таблица {}, строка {}, столбец {}",
                table_index + 1,
                row_index + 1,
                column_index + 1
            ),
            ContainerRef::Header { header_index } => {
                format!("Верхний колонтитул {}", header_index + 1)
            }
            ContainerRef::Footer { footer_index } => {
                format!("Нижний колонтитул {}", footer_index + 1)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub headers: Vec<Paragraph>,
    #[serde(default)]
    pub footers: Vec<Paragraph>,
}

impl Document {
    /// Загрузить документ из JSON-файла
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocCheckerError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| DocCheckerError::InvalidFormat(format!("{}: {}", path.display(), e)))
    }

    /// Сохранить документ в тот же файл, из которого он был открыт
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Все контейнеры с их текстом в порядке обхода:
    /// параграфы тела, затем таблицы (по строкам и ячейкам), затем колонтитулы
    pub fn containers(&self) -> Vec<(ContainerRef, String)> {
        let mut containers = Vec::new();

        for (paragraph_index, paragraph) in self.paragraphs.iter().enumerate() {
            containers.push((ContainerRef::Paragraph { paragraph_index }, paragraph.text()));
        }

        for (table_index, table) in self.tables.iter().enumerate() {
            for (row_index, row) in table.rows.iter().enumerate() {
                for (column_index, cell) in row.cells.iter().enumerate() {
                    containers.push((
                        ContainerRef::TableCell {
                            table_index,
                            row_index,
                            column_index,
                        },
                        cell.text(),
                    ));
                }
            }
        }

        for (header_index, header) in self.headers.iter().enumerate() {
            containers.push((ContainerRef::Header { header_index }, header.text()));
        }

        for (footer_index, footer) in self.footers.iter().enumerate() {
            containers.push((ContainerRef::Footer { footer_index }, footer.text()));
        }

        containers
    }
}
