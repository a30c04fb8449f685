//! # 拼写建议 ("Did you mean ...")
//!
//! 在用户输入的键与所有合法键之间寻找最相近的一个，
//! 用于拼接到错误消息中。相似度采用 Ratcliff/Obershelp 匹配率：
//! `2 * M / (len(a) + len(b))`，M 为递归求得的公共子串总长度。
//!
//! ## 依赖关系
//! - 被 `index/` 和 `refinery/` 使用
//! - 无外部模块依赖

/// 低于此相似度的候选不会被建议
pub const CUTOFF: f64 = 0.6;

/// 返回 `Did you mean "X"? `，没有足够接近的候选时返回空字符串
///
/// 末尾的空格使结果可以直接嵌入错误消息。数字等非字符串的键
/// 先转换为字符串再比较。
pub fn did_you_mean<I, T>(actual: impl ToString, possibilities: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    match closest_match(actual, possibilities) {
        Some(best) => format!("Did you mean \"{}\"? ", best),
        None => String::new(),
    }
}

/// 找到相似度最高且不低于 [`CUTOFF`] 的候选
///
/// 相似度相同时取字典序较大的候选，结果与候选的迭代顺序无关。
pub fn closest_match<I, T>(actual: impl ToString, possibilities: I) -> Option<String>
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    let actual: Vec<char> = actual.to_string().chars().collect();
    let mut best: Option<(f64, String)> = None;

    for candidate in possibilities {
        let candidate = candidate.to_string();
        let chars: Vec<char> = candidate.chars().collect();
        let score = similarity(&chars, &actual);
        if score < CUTOFF {
            continue;
        }
        let better = match &best {
            None => true,
            Some((best_score, best_name)) => {
                score > *best_score || (score == *best_score && candidate > *best_name)
            }
        };
        if better {
            best = Some((score, candidate));
        }
    }

    best.map(|(_, name)| name)
}

/// 两个字符序列的匹配率，范围 [0, 1]
pub fn similarity(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(a, b) as f64 / total as f64
}

/// 递归地累加最长公共子串的长度
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// 在 a[alo..ahi] 与 b[blo..bhi] 中寻找最长公共子串
///
/// 多个等长子串时取 a 中最靠前者，其次取 b 中最靠前者。
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // previous[j - blo] = 以 a[i-1], b[j] 结尾的公共子串长度
    let mut previous = vec![0usize; bhi - blo];

    for i in alo..ahi {
        let mut current = vec![0usize; bhi - blo];
        for j in blo..bhi {
            if a[i] != b[j] {
                continue;
            }
            let k = if j > blo { previous[j - blo - 1] + 1 } else { 1 };
            current[j - blo] = k;
            if k > best_k {
                best_i = i + 1 - k;
                best_j = j + 1 - k;
                best_k = k;
            }
        }
        previous = current;
    }

    (best_i, best_j, best_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_similarity_identical_and_disjoint() {
        assert!((similarity(&chars("abc"), &chars("abc")) - 1.0).abs() < 1e-12);
        assert!(similarity(&chars("abc"), &chars("xyz")).abs() < 1e-12);
        assert!((similarity(&[], &[]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_partial_overlap() {
        // "bar" vs "baz": 公共部分 "ba"
        let score = similarity(&chars("baz"), &chars("bar"));
        assert!((score - 4.0 / 6.0).abs() < 1e-12);
        // "abxcd" vs "abcd": "ab" + "cd"
        let score = similarity(&chars("abxcd"), &chars("abcd"));
        assert!((score - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_suggestion_for_close_key() {
        assert_eq!(did_you_mean("bar", ["foo", "baz"]), "Did you mean \"baz\"? ");
    }

    #[test]
    fn test_no_suggestion_for_distant_key() {
        assert_eq!(did_you_mean("foo", ["bar", "baz"]), "");
        assert_eq!(did_you_mean("foo", Vec::<String>::new()), "");
    }

    #[test]
    fn test_numbers_participate_as_strings() {
        assert_eq!(did_you_mean(12, [10, 21, 123]), "Did you mean \"123\"? ");
        assert_eq!(closest_match("Ti", vec!["Sr", "Ti", "O"]), Some("Ti".to_string()));
    }

    #[test]
    fn test_ties_are_order_independent() {
        let forward = closest_match("abc", ["abd", "abe"]);
        let backward = closest_match("abc", ["abe", "abd"]);
        assert_eq!(forward, backward);
        assert_eq!(forward, Some("abe".to_string()));
    }
}
