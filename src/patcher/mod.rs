//! Исправление несоответствий в документе
//!
//! Выбранные несоответствия группируются по контейнеру и применяются к
//! живому дереву документа. Переписывание ранов — чистая функция над
//! списком ранов: диапазон замены классифицируется как попадание в один
//! ран (разбиение на префикс/замену/суффикс с сохранением форматирования)
//! или в несколько (грубая стратегия: один ран с текстом всего контейнера
//! и форматированием первого затронутого рана).
//!
//! Внутри контейнера замены применяются по убыванию `start_position`,
//! чтобы ранние смещения не устаревали после замен, меняющих длину.
//! Несоответствие с устаревшей позицией, текст которого больше не
//! находится, молча пропускается: оно считается уже исправленным.

use crate::detector::Discrepancy;
use crate::document::{ContainerRef, Document, Paragraph, Run, RunProperties, TableCell};
use crate::error::Result;
use crate::template::Template;
use std::path::Path;

/// Классификация диапазона замены относительно границ ранов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanTarget {
    /// Диапазон целиком внутри одного рана
    SingleRun { index: usize, local_start: usize },
    /// Диапазон пересекает границы ранов
    MultiRun { first_index: usize },
}

/// Исправить несоответствия в файле документа
///
/// Документ сохраняется один раз после применения всех замен, строго в
/// тот же файл, из которого был открыт.
pub fn fix_document(path: &Path, discrepancies: &[Discrepancy], template: &Template) -> Result<()> {
    let mut document = Document::load(path)?;
    apply_fixes(&mut document, discrepancies, template);
    document.save(path)
}

/// Применить выбранные несоответствия к документу в памяти
///
/// Берутся только несоответствия с `should_fix`; замена — эталонное
/// значение соответствующего поля шаблона. Неизвестное поле, устаревший
/// контейнер или ненайденный текст пропускаются без ошибки.
pub fn apply_fixes(document: &mut Document, discrepancies: &[Discrepancy], template: &Template) {
    // Группировка по контейнеру в порядке первого появления
    let mut groups: Vec<(ContainerRef, Vec<&Discrepancy>)> = Vec::new();
    for discrepancy in discrepancies.iter().filter(|d| d.should_fix) {
        match groups.iter_mut().find(|(c, _)| *c == discrepancy.container) {
            Some((_, list)) => list.push(discrepancy),
            None => groups.push((discrepancy.container, vec![discrepancy])),
        }
    }

    for (container, mut group) in groups {
        group.sort_by(|a, b| b.start_position.cmp(&a.start_position));

        for discrepancy in group {
            let Some(field) = template.field(discrepancy.field_id) else {
                continue;
            };
            let replacement = field.reference_value.clone();

            match container {
                ContainerRef::Paragraph { paragraph_index } => {
                    if let Some(paragraph) = document.paragraphs.get_mut(paragraph_index) {
                        fix_in_paragraph(paragraph, Some(discrepancy.start_position), discrepancy, &replacement);
                    }
                }
                ContainerRef::Header { header_index } => {
                    if let Some(paragraph) = document.headers.get_mut(header_index) {
                        fix_in_paragraph(paragraph, Some(discrepancy.start_position), discrepancy, &replacement);
                    }
                }
                ContainerRef::Footer { footer_index } => {
                    if let Some(paragraph) = document.footers.get_mut(footer_index) {
                        fix_in_paragraph(paragraph, Some(discrepancy.start_position), discrepancy, &replacement);
                    }
                }
                ContainerRef::TableCell {
                    table_index,
                    row_index,
                    column_index,
                } => {
                    let cell = document
                        .tables
                        .get_mut(table_index)
                        .and_then(|t| t.rows.get_mut(row_index))
                        .and_then(|r| r.cells.get_mut(column_index));
                    if let Some(cell) = cell {
                        fix_in_cell(cell, discrepancy, &replacement);
                    }
                }
            }
        }
    }
}

/// Применить замену в параграфе; `false` — несоответствие пропущено
///
/// Записанный диапазон сверяется с текущим текстом; если он больше не
/// воспроизводит `found_text`, текст ищется заново с начала параграфа.
fn fix_in_paragraph(
    paragraph: &mut Paragraph,
    recorded_start: Option<usize>,
    discrepancy: &Discrepancy,
    replacement: &str,
) -> bool {
    let chars: Vec<char> = paragraph.text().chars().collect();
    let found: Vec<char> = discrepancy.found_text.chars().collect();
    if found.is_empty() {
        return false;
    }

    let span = recorded_start
        .filter(|&start| {
            start + found.len() <= chars.len() && chars[start..start + found.len()] == found[..]
        })
        .or_else(|| find_chars(&chars, &found));

    let Some(start) = span else {
        return false;
    };

    paragraph.runs = replace_span(&paragraph.runs, start, found.len(), replacement);
    true
}

/// Применить замену в ячейке таблицы
///
/// Позиция несоответствия записана в объединенном тексте ячейки
/// (параграфы через один пробел); она переводится в координаты
/// владеющего параграфа. Диапазон, пересекающий границу параграфов,
/// обрабатывается поиском дословного текста по каждому параграфу.
fn fix_in_cell(cell: &mut TableCell, discrepancy: &Discrepancy, replacement: &str) -> bool {
    let mut segment_start = 0;
    for paragraph in &mut cell.paragraphs {
        let paragraph_len = paragraph.text().chars().count();
        let start = discrepancy.start_position;
        if start >= segment_start && start + discrepancy.length <= segment_start + paragraph_len {
            return fix_in_paragraph(paragraph, Some(start - segment_start), discrepancy, replacement);
        }
        segment_start += paragraph_len + 1;
    }

    // Позиция не попала ни в один параграф: дословный поиск
    for paragraph in &mut cell.paragraphs {
        if fix_in_paragraph(paragraph, None, discrepancy, replacement) {
            return true;
        }
    }
    false
}

/// Заменить символьный диапазон `[start, start + len)` сквозного текста
/// ранов на `replacement`, вернув новый список ранов
///
/// Чистая функция: попадание в один ран разбивает его на неизменный
/// префикс, замену и неизменный суффикс с одинаковым форматированием;
/// диапазон через несколько ранов сводит контейнер к одному рану с
/// форматированием первого затронутого (смешанное форматирование
/// замененной области при этом теряется).
pub fn replace_span(runs: &[Run], start: usize, len: usize, replacement: &str) -> Vec<Run> {
    if runs.is_empty() {
        return vec![Run::new(replacement, RunProperties::default())];
    }

    match locate_span(runs, start, len) {
        SpanTarget::SingleRun { index, local_start } => {
            let run = &runs[index];
            let chars: Vec<char> = run.text.chars().collect();
            let prefix: String = chars[..local_start].iter().collect();
            let suffix: String = chars[local_start + len..].iter().collect();

            let mut out: Vec<Run> = runs[..index].to_vec();
            if !prefix.is_empty() {
                out.push(Run::new(&prefix, run.properties.clone()));
            }
            if !replacement.is_empty() {
                out.push(Run::new(replacement, run.properties.clone()));
            }
            if !suffix.is_empty() {
                out.push(Run::new(&suffix, run.properties.clone()));
            }
            out.extend_from_slice(&runs[index + 1..]);
            out
        }
        SpanTarget::MultiRun { first_index } => {
            let full: Vec<char> = runs.iter().flat_map(|r| r.text.chars()).collect();
            let mut text: String = full[..start.min(full.len())].iter().collect();
            text.push_str(replacement);
            if start + len < full.len() {
                text.extend(&full[start + len..]);
            }
            vec![Run::new(&text, runs[first_index].properties.clone())]
        }
    }
}

/// Классифицировать диапазон замены относительно границ ранов
pub fn locate_span(runs: &[Run], start: usize, len: usize) -> SpanTarget {
    let mut offset = 0;
    for (index, run) in runs.iter().enumerate() {
        let run_len = run.text.chars().count();
        if start < offset + run_len {
            if start + len <= offset + run_len {
                return SpanTarget::SingleRun {
                    index,
                    local_start: start - offset,
                };
            }
            return SpanTarget::MultiRun { first_index: index };
        }
        offset += run_len;
    }
    SpanTarget::MultiRun { first_index: 0 }
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}
