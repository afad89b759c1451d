//! Поиск несоответствий в документе
//!
//! Документ обходится по контейнерам (параграфы, ячейки таблиц,
//! колонтитулы); для каждого поля шаблона с непустым эталоном выполняются
//! три независимых прохода с убывающей точностью:
//! 1. Известные ошибочные варианты (точное вхождение, высшая точность)
//! 2. Нечеткое совпадение фраз с эталоном (вероятные опечатки)
//! 3. Частичное вхождение эталона (самая широкая сеть)
//!
//! Если нормализованный текст контейнера содержит эталон или допустимый
//! вариант, поле для этого контейнера считается удовлетворенным и проходы
//! не выполняются. Найденная известная ошибка имеет приоритет: нечеткий и
//! частичный проходы для пары (контейнер, поле) уже не запускаются.
//!
//! Все позиции — символьные смещения в ИСХОДНОМ тексте контейнера,
//! полученные через карту смещений нормализации.

use crate::document::{ContainerRef, Document};
use crate::error::Result;
use crate::matcher;
use crate::normalizer::{self, NormalizedText};
use crate::template::{Field, Template};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Радиус контекстного фрагмента вокруг совпадения (в символах)
const CONTEXT_RADIUS: usize = 30;

/// Минимальная длина эталона для поиска частичного вхождения
const PARTIAL_MIN_PREFIX: usize = 5;

/// Полоса схожести частичного вхождения: ниже — шум, выше — опечатка
const PARTIAL_LOWER_BOUND: f64 = 0.3;
const PARTIAL_UPPER_BOUND: f64 = 0.7;

/// Частичное вхождение подавляется нечетким совпадением ближе этого
/// расстояния (в символах нормализованного текста)
const FUZZY_DEDUP_DISTANCE: usize = 5;

/// Минимальная длина одиночного слова-кандидата для нечеткого прохода
const MIN_TOKEN_LEN: usize = 3;

/// Классификация несоответствия
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscrepancyType {
    /// Точное несовпадение (частичное вхождение эталона)
    ExactMismatch,
    /// Частичное совпадение / вероятная опечатка
    PartialMatch,
    /// Известная ошибка из списка некорректных вариантов
    KnownError,
}

impl std::fmt::Display for DiscrepancyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscrepancyType::ExactMismatch => write!(f, "Несовпадение"),
            DiscrepancyType::PartialMatch => write!(f, "Опечатка"),
            DiscrepancyType::KnownError => write!(f, "Известная ошибка"),
        }
    }
}

fn default_should_fix() -> bool {
    true
}

/// Найденное несоответствие
///
/// Снимок на момент проверки: после изменения документа позиции
/// устаревают, проверку нужно запускать заново. Инвариант: диапазон
/// `[start_position, start_position + length)` исходного текста
/// контейнера в точности воспроизводит `found_text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field_id: u32,
    pub field_name: String,
    pub expected_value: String,
    /// Дословный фрагмент исходного (ненормализованного) текста
    pub found_text: String,
    pub kind: DiscrepancyType,
    /// Ограниченный фрагмент вокруг совпадения для просмотра
    pub context: String,
    pub location: String,
    pub container: ContainerRef,
    /// Символьное смещение в исходном тексте контейнера
    pub start_position: usize,
    /// Длина фрагмента в символах
    pub length: usize,
    #[serde(default = "default_should_fix")]
    pub should_fix: bool,
}

/// Проверить документ из файла на соответствие шаблону
pub fn check_document(path: &Path, template: &Template) -> Result<Vec<Discrepancy>> {
    let document = Document::load(path)?;
    Ok(detect(&document, template))
}

/// Найти все несоответствия документа шаблону
///
/// Контейнеры независимы и проверяются параллельно; порядок результата —
/// порядок обхода документа, внутри контейнера — порядок полей шаблона.
pub fn detect(document: &Document, template: &Template) -> Vec<Discrepancy> {
    let containers = document.containers();
    containers
        .par_iter()
        .map(|(container, text)| check_container(*container, text, template))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

fn check_container(container: ContainerRef, text: &str, template: &Template) -> Vec<Discrepancy> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let norm = normalizer::normalize_with_map(text);
    let norm_chars: Vec<char> = norm.text.chars().collect();
    let orig_chars: Vec<char> = text.chars().collect();

    let mut discrepancies = Vec::new();
    for field in &template.fields {
        if field.reference_value.trim().is_empty() {
            continue;
        }
        check_field(field, container, &norm, &norm_chars, &orig_chars, &mut discrepancies);
    }
    discrepancies
}

fn check_field(
    field: &Field,
    container: ContainerRef,
    norm: &NormalizedText,
    norm_chars: &[char],
    orig_chars: &[char],
    out: &mut Vec<Discrepancy>,
) {
    let norm_reference = normalizer::normalize(&field.reference_value);
    let norm_valid: Vec<String> = field
        .valid_variants
        .iter()
        .map(|v| normalizer::normalize(v))
        .filter(|v| !v.is_empty())
        .collect();
    let norm_invalid: Vec<String> = field
        .invalid_variants
        .iter()
        .map(|v| normalizer::normalize(v))
        .filter(|v| !v.is_empty())
        .collect();

    // Точное совпадение с эталоном или допустимым вариантом:
    // поле удовлетворено, дальнейшие проверки не нужны
    if norm.text.contains(&norm_reference) || norm_valid.iter().any(|v| norm.text.contains(v)) {
        return;
    }

    let emit = |kind: DiscrepancyType, norm_start: usize, norm_len: usize, out: &mut Vec<Discrepancy>| {
        let (start, length) = norm.map_span(norm_start, norm_len);
        let found_text: String = orig_chars[start..(start + length).min(orig_chars.len())]
            .iter()
            .collect();
        out.push(Discrepancy {
            field_id: field.id,
            field_name: field.name.clone(),
            expected_value: field.reference_value.clone(),
            found_text,
            kind,
            context: make_context(orig_chars, start, length),
            location: container.location(),
            container,
            start_position: start,
            length,
            should_fix: true,
        });
    };

    // Проход 1: известные ошибочные варианты, все неперекрывающиеся вхождения
    let mut known_errors_found = false;
    for variant in &norm_invalid {
        let variant_chars: Vec<char> = variant.chars().collect();
        let mut from = 0;
        while let Some(pos) = find_chars(norm_chars, &variant_chars, from) {
            emit(DiscrepancyType::KnownError, pos, variant_chars.len(), out);
            known_errors_found = true;
            from = pos + variant_chars.len();
        }
    }
    // Известная ошибка классифицируется только как известная ошибка
    if known_errors_found {
        return;
    }

    // Проход 2: нечеткое совпадение фраз с эталоном и допустимыми вариантами
    let reference_chars: Vec<char> = norm_reference.chars().collect();
    let mut fuzzy_positions: Vec<usize> = Vec::new();
    for phrase in extract_phrases(norm_chars) {
        let similar = matcher::is_similar(&phrase.text, &norm_reference)
            || norm_valid.iter().any(|v| matcher::is_similar(&phrase.text, v));
        if similar {
            emit(DiscrepancyType::PartialMatch, phrase.start, phrase.len, out);
            fuzzy_positions.push(phrase.start);
        }
    }

    // Проход 3: частичное вхождение эталона (только для достаточно длинных)
    if reference_chars.len() < PARTIAL_MIN_PREFIX {
        return;
    }
    // Все длины префикса бьют в одни и те же позиции — каждая позиция
    // рассматривается один раз
    let mut seen_positions: HashSet<usize> = HashSet::new();
    for prefix_len in PARTIAL_MIN_PREFIX..=reference_chars.len() {
        let prefix = &reference_chars[..prefix_len];
        let mut from = 0;
        while let Some(pos) = find_chars(norm_chars, prefix, from) {
            from = pos + 1;
            if !seen_positions.insert(pos) {
                continue;
            }
            // Нечеткое совпадение рядом перекрывает более слабое частичное
            if fuzzy_positions
                .iter()
                .any(|f| f.abs_diff(pos) <= FUZZY_DEDUP_DISTANCE)
            {
                continue;
            }
            let region_len = reference_chars.len().min(norm_chars.len() - pos);
            let region: String = norm_chars[pos..pos + region_len].iter().collect();
            let similarity = matcher::similarity(&region, &norm_reference);
            if (PARTIAL_LOWER_BOUND..PARTIAL_UPPER_BOUND).contains(&similarity) {
                emit(DiscrepancyType::ExactMismatch, pos, region_len, out);
            }
        }
    }
}

/// Фраза-кандидат нечеткого прохода: позиция и длина в нормализованном тексте
struct Phrase {
    start: usize,
    len: usize,
    text: String,
}

/// Извлечь фразы-кандидаты: слова длиной от трех символов,
/// биграммы и триграммы соседних слов; без повторов (первое вхождение)
fn extract_phrases(norm_chars: &[char]) -> Vec<Phrase> {
    // В нормализованном тексте разделитель — ровно один пробел
    let mut tokens: Vec<(usize, usize)> = Vec::new();
    let mut token_start: Option<usize> = None;
    for (i, &ch) in norm_chars.iter().enumerate() {
        if ch == ' ' {
            if let Some(start) = token_start.take() {
                tokens.push((start, i - start));
            }
        } else if token_start.is_none() {
            token_start = Some(i);
        }
    }
    if let Some(start) = token_start {
        tokens.push((start, norm_chars.len() - start));
    }

    let mut phrases = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut push = |start: usize, len: usize, phrases: &mut Vec<Phrase>| {
        let text: String = norm_chars[start..start + len].iter().collect();
        if seen.insert(text.clone()) {
            phrases.push(Phrase { start, len, text });
        }
    };

    for &(start, len) in &tokens {
        if len >= MIN_TOKEN_LEN {
            push(start, len, &mut phrases);
        }
    }
    for window in tokens.windows(2) {
        let (start, _) = window[0];
        let (last_start, last_len) = window[1];
        push(start, last_start + last_len - start, &mut phrases);
    }
    for window in tokens.windows(3) {
        let (start, _) = window[0];
        let (last_start, last_len) = window[2];
        push(start, last_start + last_len - start, &mut phrases);
    }

    phrases
}

/// Найти вхождение `needle` в `haystack`, начиная с позиции `from`
fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Фрагмент исходного текста вокруг совпадения, с многоточиями по краям
fn make_context(orig_chars: &[char], start: usize, length: usize) -> String {
    let from = start.saturating_sub(CONTEXT_RADIUS);
    let to = (start + length + CONTEXT_RADIUS).min(orig_chars.len());
    let mut context = String::new();
    if from > 0 {
        context.push_str("...");
    }
    context.extend(&orig_chars[from..to]);
    if to < orig_chars.len() {
        context.push_str("...");
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Paragraph, Table, TableCell, TableRow};
    use crate::template::Template;

    fn template_with(field_id: u32, reference: &str) -> Template {
        let mut template = Template::with_default_fields("Тест");
        template.field_mut(field_id).unwrap().reference_value = reference.to_string();
        template
    }

    fn paragraph_document(text: &str) -> Document {
        Document {
            paragraphs: vec![Paragraph::from_text(text)],
            ..Default::default()
        }
    }

    #[test]
    fn test_case_only_difference_is_satisfied() {
        let template = template_with(4, "РОССИЯ");
        let document = Document {
            tables: vec![Table {
                rows: vec![TableRow {
                    cells: vec![TableCell {
                        paragraphs: vec![Paragraph::from_text("Россия")],
                    }],
                }],
            }],
            ..Default::default()
        };
        assert!(detect(&document, &template).is_empty());
    }

    #[test]
    fn test_known_error_single_report() {
        let mut template = template_with(4, "Германия");
        template.field_mut(4).unwrap().add_variant("Алемания", false);

        let document = paragraph_document("страна: Алемания");
        let discrepancies = detect(&document, &template);

        assert_eq!(discrepancies.len(), 1);
        let d = &discrepancies[0];
        assert_eq!(d.kind, DiscrepancyType::KnownError);
        assert_eq!(d.found_text, "Алемания");
        assert_eq!(d.field_id, 4);
        assert_eq!(d.expected_value, "Германия");
        assert_eq!(d.location, "Параграф 1");
    }

    #[test]
    fn test_known_error_beats_fuzzy_similarity() {
        // «ГЕРМОНИЯ» похожа на эталон «ГЕРМАНИЯ» (0.875 ≥ 0.85): без
        // приоритета известной ошибки нечеткий проход нашел бы то же
        // место второй раз
        let mut template = template_with(4, "Германия");
        template.field_mut(4).unwrap().add_variant("Гермония", false);

        let document = paragraph_document("Страна: Гермония");
        let discrepancies = detect(&document, &template);

        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].kind, DiscrepancyType::KnownError);
        assert_eq!(discrepancies[0].found_text, "Гермония");
    }

    #[test]
    fn test_exact_match_beats_invalid_variants() {
        let mut template = template_with(4, "Германия");
        template.field_mut(4).unwrap().add_variant("Алемания", false);

        // Эталон присутствует: поле удовлетворено, ошибочный вариант рядом
        // не превращается в несоответствие
        let document = paragraph_document("Страна: Германия (ранее: Алемания)");
        assert!(detect(&document, &template).is_empty());
    }

    #[test]
    fn test_valid_variant_satisfies_field() {
        let mut template = template_with(4, "Германия");
        template.field_mut(4).unwrap().add_variant("ФРГ", true);

        let document = paragraph_document("Страна производителя: ФРГ");
        assert!(detect(&document, &template).is_empty());
    }

    #[test]
    fn test_fuzzy_typo_detected() {
        let template = template_with(4, "Германия");
        let document = paragraph_document("Страна: Гермония");
        let discrepancies = detect(&document, &template);

        assert_eq!(discrepancies.len(), 1);
        let d = &discrepancies[0];
        assert_eq!(d.kind, DiscrepancyType::PartialMatch);
        assert_eq!(d.found_text, "Гермония");
    }

    #[test]
    fn test_span_invariant() {
        let mut template = template_with(3, "Contoso LLC");
        template.field_mut(4).unwrap().reference_value = "Германия".to_string();
        template.field_mut(4).unwrap().add_variant("Алемания", false);

        let document = paragraph_document("Производитель:  Контoso LLC,  страна — Алемания");
        let discrepancies = detect(&document, &template);
        assert!(!discrepancies.is_empty());

        for d in &discrepancies {
            let (_, text) = &document.containers()[0];
            let slice: String = text
                .chars()
                .skip(d.start_position)
                .take(d.length)
                .collect();
            assert_eq!(slice, d.found_text, "диапазон должен воспроизводить found_text");
        }
    }

    #[test]
    fn test_blank_and_unset_fields_skipped() {
        // Ни у одного поля нет эталона — проверять нечего
        let template = Template::with_default_fields("Пустой");
        let document = paragraph_document("произвольный текст");
        assert!(detect(&document, &template).is_empty());

        // Пустые контейнеры просто пропускаются
        let template = template_with(4, "Германия");
        let document = Document {
            paragraphs: vec![Paragraph::default(), Paragraph::from_text("   ")],
            ..Default::default()
        };
        assert!(detect(&document, &template).is_empty());
    }

    #[test]
    fn test_traversal_order_of_results() {
        let mut template = template_with(4, "Германия");
        template.field_mut(4).unwrap().add_variant("Алемания", false);

        let document = Document {
            paragraphs: vec![
                Paragraph::from_text("страна: Алемания"),
                Paragraph::from_text("снова Алемания"),
            ],
            footers: vec![Paragraph::from_text("и в подвале Алемания")],
            ..Default::default()
        };

        let discrepancies = detect(&document, &template);
        assert_eq!(discrepancies.len(), 3);
        assert_eq!(discrepancies[0].container, ContainerRef::Paragraph { paragraph_index: 0 });
        assert_eq!(discrepancies[1].container, ContainerRef::Paragraph { paragraph_index: 1 });
        assert_eq!(discrepancies[2].container, ContainerRef::Footer { footer_index: 0 });
    }

    #[test]
    fn test_extract_phrases_tokens_and_ngrams() {
        let chars: Vec<char> = "ОДИН ДВА ТРИ".chars().collect();
        let phrases = extract_phrases(&chars);
        let texts: Vec<&str> = phrases.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["ОДИН", "ДВА", "ТРИ", "ОДИН ДВА", "ДВА ТРИ", "ОДИН ДВА ТРИ"]
        );
        // Позиция — первое вхождение в нормализованном тексте
        assert_eq!(phrases[1].start, 5);
        assert_eq!(phrases[1].len, 3);
    }

    #[test]
    fn test_extract_phrases_short_tokens_skipped() {
        let chars: Vec<char> = "ГОРОД НА НЕВЕ".chars().collect();
        let phrases = extract_phrases(&chars);
        let texts: Vec<&str> = phrases.iter().map(|p| p.text.as_str()).collect();
        // "НА" короче трех символов как слово, но входит в биграммы
        assert!(texts.contains(&"ГОРОД"));
        assert!(!texts.contains(&"НА"));
        assert!(texts.contains(&"ГОРОД НА"));
        assert!(texts.contains(&"НА НЕВЕ"));
    }

    #[test]
    fn test_partial_containment_band() {
        // Начало эталона присутствует, но хвост сильно отличается:
        // схожесть попадает в полосу 0.3..0.7
        let template = template_with(9, "ЛАБОРАТОРИЯ ИСПЫТАНИЙ СРЕДСТВ СВЯЗИ");
        let document = paragraph_document("ЛАБОРАТОРИЯ КОНТРОЛЯ КАЧЕСТВА ПРОДУКЦИИ");
        let discrepancies = detect(&document, &template);

        assert_eq!(discrepancies.len(), 1);
        assert_eq!(discrepancies[0].kind, DiscrepancyType::ExactMismatch);
        assert_eq!(discrepancies[0].start_position, 0);
    }

    #[test]
    fn test_missing_document_fails() {
        let template = template_with(4, "Германия");
        let result = check_document(Path::new("/нет/документа.json"), &template);
        assert!(result.is_err());
    }
}
