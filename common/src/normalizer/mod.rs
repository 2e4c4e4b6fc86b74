//! テキスト正規化モジュール
//!
//! 見出しや画像メタデータのテキストをキーワード列に変換する。
//!
//! ## 処理フロー（順序は結果に影響するため変更しないこと）
//! 1. 小文字化
//! 2. 所有格の除去（`bird's` → `bird`）
//! 3. 区切り記号 `/ , | ; : ( ) [ ]` を空白に置換
//! 4. 英数字・空白・ハイフン以外を除去
//! 5. 空白で分割
//! 6. ストップワードと2文字以下の語を除去
//! 7. ステミング（有効時）
//! 8. 綴り違いの展開と重複除去（有効時）

pub mod stemmer;
pub mod variants;

pub use stemmer::stem;
pub use variants::spelling_variants;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref POSSESSIVE: Regex = Regex::new(r"([a-z])['’](?:s\b)?").unwrap();
    static ref DISALLOWED_CHARS: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
}

/// 区切りとして扱う記号。他の記号の除去より先に空白へ置換する
const SEPARATORS: &[char] = &['/', ',', '|', ';', ':', '(', ')', '[', ']'];

/// ストップワード（冠詞・接続詞・前置詞・助動詞・指示詞）
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
    "of", "with", "by", "from", "as", "is", "was", "are", "been", "be",
    "have", "has", "had", "do", "does", "did", "will", "would", "could",
    "should", "may", "might", "can", "this", "that", "these", "those",
];

/// 正規化オプション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// 単数形・複数形の同一視
    pub stemming: bool,
    /// 米英綴りの同一視
    pub spelling_variants: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            stemming: true,
            spelling_variants: true,
        }
    }
}

impl NormalizeOptions {
    /// ステミング・綴り展開なし
    pub fn plain() -> Self {
        Self {
            stemming: false,
            spelling_variants: false,
        }
    }
}

/// ストップワードか
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// 所有格を除去（`bird's` → `bird`, `birds'` → `birds`）
pub fn strip_possessives(text: &str) -> String {
    POSSESSIVE.replace_all(text, "$1").into_owned()
}

/// テキストを正規化してキーワード列を返す
///
/// 綴り展開が無効の場合は重複を保持する。
///
/// # Examples
/// ```
/// use image_matcher_common::normalizer::{normalize, NormalizeOptions};
///
/// let keywords = normalize("The Bird's Nests", NormalizeOptions::default());
/// assert_eq!(keywords, vec!["bird", "nest"]);
/// ```
pub fn normalize(text: &str, options: NormalizeOptions) -> Vec<String> {
    let lowered = text.to_lowercase();
    let without_possessives = strip_possessives(&lowered);
    let separated: String = without_possessives
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();
    let cleaned = DISALLOWED_CHARS.replace_all(&separated, "");

    let mut keywords: Vec<String> = cleaned
        .split_whitespace()
        .filter(|word| word.len() > 2 && !is_stop_word(word))
        .map(str::to_string)
        .collect();

    if options.stemming {
        keywords = keywords.iter().map(|word| stem(word)).collect();
    }

    if options.spelling_variants {
        let mut expanded: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let variants = spelling_variants(&keyword);
            push_unique(&mut expanded, keyword);
            for variant in variants {
                push_unique(&mut expanded, variant.to_string());
            }
        }
        keywords = expanded;
    }

    keywords
}

fn push_unique(words: &mut Vec<String>, word: String) {
    if !words.contains(&word) {
        words.push(word);
    }
}

/// 2語が一致するか（所有格・語形・綴り違いを考慮）
pub fn words_match(a: &str, b: &str, options: NormalizeOptions) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a == b {
        return true;
    }

    if strip_possessives(&a) == strip_possessives(&b) {
        return true;
    }

    if options.stemming && stem(&a) == stem(&b) {
        return true;
    }

    if options.spelling_variants {
        let mut forms_a = vec![a.as_str()];
        forms_a.extend(spelling_variants(&a));
        let mut forms_b = vec![b.as_str()];
        forms_b.extend(spelling_variants(&b));

        if forms_a.iter().any(|form| forms_b.contains(form)) {
            return true;
        }
    }

    false
}

/// `set1` のうち `set2` のいずれかと一致する語の数（各語は1回のみ数える）
pub fn count_matches<S1, S2>(set1: &[S1], set2: &[S2], options: NormalizeOptions) -> usize
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    set1.iter()
        .filter(|&kw1| {
            set2.iter()
                .any(|kw2| words_match(kw1.as_ref(), kw2.as_ref(), options))
        })
        .count()
}
