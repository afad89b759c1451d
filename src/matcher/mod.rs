//! Нечеткое сравнение строк (расстояние Левенштейна)
//!
//! Все функции чистые и детерминированные, работают по символам
//! (не по байтам), поэтому кириллица считается корректно.

/// Порог схожести: строки с `similarity >= 0.85` считаются совпадающими
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Вычислить расстояние Левенштейна между двумя строками
///
/// Классическая динамика по полной сетке: вставка, удаление и замена
/// стоят по единице. Симметрична по аргументам.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let n = a.len();
    let m = b.len();

    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}

/// Вычислить коэффициент схожести двух строк (0.0 — 1.0)
///
/// `1 - d / max(len)`. Две пустые строки считаются идентичными (1.0),
/// пустая и непустая — полностью различными (0.0).
pub fn similarity(s1: &str, s2: &str) -> f64 {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    if len1 == 0 && len2 == 0 {
        return 1.0;
    }
    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    let max_len = len1.max(len2);
    let distance = levenshtein_distance(s1, s2);
    1.0 - distance as f64 / max_len as f64
}

/// Проверить, похожи ли строки с учетом порога [`SIMILARITY_THRESHOLD`]
pub fn is_similar(s1: &str, s2: &str) -> bool {
    similarity(s1, s2) >= SIMILARITY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basic() {
        assert_eq!(levenshtein_distance("КОТ", "КОТ"), 0);
        assert_eq!(levenshtein_distance("КОТ", "КИТ"), 1);
        assert_eq!(levenshtein_distance("ГЕРМАНИЯ", "ГЕРМНИЯ"), 1);
        assert_eq!(levenshtein_distance("", "АБВ"), 3);
        assert_eq!(levenshtein_distance("АБВ", ""), 3);
    }

    #[test]
    fn test_levenshtein_symmetric() {
        let pairs = [("РОССИЯ", "РАССИЯ"), ("CONTOSO", "КОНТOSO"), ("", "X")];
        for (a, b) in pairs {
            assert_eq!(levenshtein_distance(a, b), levenshtein_distance(b, a));
        }
    }

    #[test]
    fn test_similarity_identities() {
        assert_eq!(similarity("ГЕРМАНИЯ", "ГЕРМАНИЯ"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "X"), 0.0);
        assert_eq!(similarity("X", ""), 0.0);
    }

    #[test]
    fn test_similarity_typo() {
        // Одна замена в слове из восьми букв
        let sim = similarity("ГЕРМАНИЯ", "ГЕРМОНИЯ");
        assert!((sim - 0.875).abs() < 1e-9);
        assert!(is_similar("ГЕРМАНИЯ", "ГЕРМОНИЯ"));
        assert!(!is_similar("ГЕРМАНИЯ", "ФРАНЦИЯ"));
    }
}
