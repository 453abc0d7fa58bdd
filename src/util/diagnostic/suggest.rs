//! 拼写建议
//!
//! 为未知参数名、未导入的运算符符号提供 "did you mean" 提示

use std::cmp::Ordering;

/// 相似度阈值
const SIMILARITY_THRESHOLD: f64 = 0.5;

/// 相似度（0.0 ~ 1.0），基于编辑距离
pub fn similarity(
    s1: &str,
    s2: &str,
) -> f64 {
    if s1 == s2 {
        return 1.0;
    }
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let dist = levenshtein_distance(s1, s2);
    1.0 - dist as f64 / max_len as f64
}

/// 编辑距离
pub fn levenshtein_distance(
    a: &str,
    b: &str,
) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // 使用行优化
    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = Vec::with_capacity(b_chars.len() + 1);

    for i in 1..=a_chars.len() {
        curr_row.clear();
        curr_row.push(i);

        for j in 1..=b_chars.len() {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            let value = prev_row[j]
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
            curr_row.push(value);
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

/// 在候选中找出最相似的名字
pub fn closest_match<'a>(
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|candidate| (candidate, similarity(name, candidate)))
        .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(candidate, _)| candidate)
}
