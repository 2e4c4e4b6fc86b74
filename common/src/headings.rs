//! 見出し抽出モジュール
//!
//! 文書マークアップから h2〜h6 の見出しを文書順に抽出する。
//! 開始タグの後に最初に現れる同じレベルの終了タグまでを本文とみなす。

use crate::types::{Heading, HeadingTag};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OPEN_TAG: Regex = Regex::new(r"(?i)<h([2-6])(?:\s[^>]*)?>").unwrap();
    /// レベル2〜6の終了タグ（インデックス = レベル - 2）
    static ref CLOSE_TAGS: Vec<Regex> = (2..=6)
        .map(|level| Regex::new(&format!(r"(?i)</h{}\s*>", level)).unwrap())
        .collect();
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
    static ref STYLE_BLOCK: Regex = Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap();
    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// 文書から見出しを抽出
///
/// テキストが空になる見出しは出力しない。見出しがなければ空のVecを返す。
///
/// # Examples
/// ```
/// use image_matcher_common::extract_headings;
///
/// let headings = extract_headings("<p>Intro</p><h2>Garden <em>Spiders</em></h2>");
/// assert_eq!(headings.len(), 1);
/// assert_eq!(headings[0].text, "Garden Spiders");
/// assert_eq!(headings[0].position, 12);
/// ```
pub fn extract_headings(markup: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut cursor = 0;

    while let Some(open) = OPEN_TAG.find_at(markup, cursor) {
        // "<h" の直後がレベルの数字
        let level = open.as_str().as_bytes()[2] - b'0';
        let Some(tag) = HeadingTag::from_level(level) else {
            cursor = open.end();
            continue;
        };

        match CLOSE_TAGS[(level - 2) as usize].find_at(markup, open.end()) {
            Some(close) => {
                let text = heading_text(&markup[open.end()..close.start()]);
                if !text.is_empty() {
                    headings.push(Heading::new(tag, text, open.start()));
                }
                cursor = close.end();
            }
            // 閉じていない開始タグは読み飛ばす
            None => cursor = open.start() + 1,
        }
    }

    headings
}

/// 見出し内部のマークアップをプレーンテキストに変換
pub fn heading_text(inner: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(inner, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = LINE_BREAK.replace_all(&text, " ");
    let text = ANY_TAG.replace_all(&text, "");
    let decoded = html_escape::decode_html_entities(&text);
    decoded.trim().to_string()
}
