//! Нормализация текста перед сравнением
//!
//! Приводит текст к канонической форме для сравнения с эталоном:
//! 1. Приведение к верхнему регистру
//! 2. Схлопывание пробельных последовательностей в один пробел
//! 3. Унификация кавычек («умные» → прямые ASCII)
//! 4. Унификация дефисов и тире
//! 5. Удаление пробелов в начале и конце
//!
//! Исходный текст сохраняется отдельно: позиции совпадений в нормализованном
//! тексте переводятся обратно в символьные позиции исходного текста через
//! карту смещений [`NormalizedText`].

/// Нормализованный текст с картой смещений в исходный текст
///
/// `offsets[i]` — индекс символа исходного текста, из которого получен
/// i-й символ нормализованного текста. Все позиции — в символах, не в байтах.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub text: String,
    offsets: Vec<usize>,
}

impl NormalizedText {
    /// Перевести диапазон нормализованного текста в диапазон исходного
    ///
    /// Возвращает `(start, len)` в символах исходного текста. Диапазон
    /// ограничивается границами текста.
    pub fn map_span(&self, start: usize, len: usize) -> (usize, usize) {
        if self.offsets.is_empty() || len == 0 {
            return (self.offsets.first().copied().unwrap_or(0), 0);
        }
        let start = start.min(self.offsets.len() - 1);
        let last = (start + len - 1).min(self.offsets.len() - 1);
        let orig_start = self.offsets[start];
        let orig_end = self.offsets[last] + 1;
        (orig_start, orig_end - orig_start)
    }
}

/// Нормализовать текст для сравнения
///
/// Чистая тотальная функция: для пустого или пробельного текста возвращает
/// пустую строку. Идемпотентна: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    normalize_with_map(text).text
}

/// Нормализовать текст, сохранив карту смещений в исходный текст
pub fn normalize_with_map(text: &str) -> NormalizedText {
    let mut out = String::new();
    let mut offsets = Vec::new();
    // Индекс первого пробельного символа текущей пробельной серии
    let mut pending_space: Option<usize> = None;

    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            if pending_space.is_none() {
                pending_space = Some(i);
            }
            continue;
        }
        if let Some(ws) = pending_space.take() {
            // Ведущие пробелы отбрасываются, внутренние схлопываются в один
            if !out.is_empty() {
                out.push(' ');
                offsets.push(ws);
            }
        }
        for upper in ch.to_uppercase() {
            out.push(substitute(upper));
            offsets.push(i);
        }
    }

    NormalizedText { text: out, offsets }
}

/// Унификация кавычек и тире
fn substitute(ch: char) -> char {
    match ch {
        '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
        '\u{2018}' | '\u{2019}' | '\u{201A}' => '\'',
        '\u{2013}' | '\u{2014}' => '-',
        _ => ch,
    }
}
