//! スコア計算モジュール
//!
//! 見出しキーワードと候補画像のメタデータ（ファイル名・タイトル・alt）から
//! 0〜100の信頼度を算出する。
//!
//! 見出しキーワードは綴り違いを展開しない形（`scoring_keywords`）で受け取る。
//! フィールド側のトークンは綴り違いをキーワードの綴りに揃えてから数える。
//!
//! フィールドごとの計算順:
//! 1. ヒット数（キーワードがトークン列にそのまま含まれる数）
//! 2. ヒット率 × 基本重み
//! 3. フレーズ一致なら基本重み
//! 4. 全キーワード一致の下限（ファイル名・タイトルのみ）
//! 5. 語数補正
//! 6. タイトルの意図ボーナス
//!
//! 最終スコアは各フィールドの (スコア × フィールド係数) の最大値。

use crate::normalizer::{normalize, spelling_variants, NormalizeOptions};
use crate::types::{CandidateImage, MatchField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// スコア計算の定数表
///
/// 値は経験的に決めた校正パラメータ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub filename_weight: f64,
    pub title_weight: f64,
    pub alt_weight: f64,

    /// 集計時のフィールド係数
    pub filename_factor: f64,
    pub title_factor: f64,
    pub alt_factor: f64,

    /// 語数補正（余分な語数 0 / 1 / 2 / 3以上）
    pub exact_length_boost: f64,
    pub one_extra_word: f64,
    pub two_extra_words: f64,
    pub many_extra_words: f64,

    /// タイトルが意図的に付けられている場合の加点
    pub title_intent_bonus: f64,

    /// 全キーワード一致時の下限
    pub filename_all_keywords_floor: f64,
    pub filename_all_keywords_phrase_floor: f64,
    pub title_all_keywords_floor: f64,
    pub title_all_keywords_phrase_floor: f64,
    pub title_all_keywords_intent_bonus: f64,

    /// 綴り違い（color / colour など）のトークンもヒットとみなす
    pub spelling_variants: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            filename_weight: 100.0,
            title_weight: 90.0,
            alt_weight: 85.0,
            filename_factor: 1.0,
            title_factor: 0.9,
            alt_factor: 0.85,
            exact_length_boost: 1.10,
            one_extra_word: 0.90,
            two_extra_words: 0.82,
            many_extra_words: 0.75,
            title_intent_bonus: 10.0,
            filename_all_keywords_floor: 95.0,
            filename_all_keywords_phrase_floor: 100.0,
            title_all_keywords_floor: 92.0,
            title_all_keywords_phrase_floor: 98.0,
            title_all_keywords_intent_bonus: 5.0,
            spelling_variants: true,
        }
    }
}

impl ScoringPolicy {
    fn base_weight(&self, field: MatchField) -> f64 {
        match field {
            MatchField::Filename => self.filename_weight,
            MatchField::Title => self.title_weight,
            MatchField::Alt => self.alt_weight,
        }
    }

    fn factor(&self, field: MatchField) -> f64 {
        match field {
            MatchField::Filename => self.filename_factor,
            MatchField::Title => self.title_factor,
            MatchField::Alt => self.alt_factor,
        }
    }

    /// 語数補正の倍率（フィールドの方が短い場合は補正なし）
    fn length_multiplier(&self, extra_words: isize) -> f64 {
        match extra_words {
            e if e < 0 => 1.0,
            0 => self.exact_length_boost,
            1 => self.one_extra_word,
            2 => self.two_extra_words,
            _ => self.many_extra_words,
        }
    }
}

/// 1枚の画像のスコア
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageScore {
    pub score: u8,
    /// ヒットが1件以上あったフィールド
    pub matched_fields: BTreeSet<MatchField>,
}

/// ファイル名をトークン化（拡張子除去、`-`/`_` を区切りに）
pub fn filename_tokens(filename: &str) -> Vec<String> {
    filename_stem(filename)
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// タイトル・altをトークン化（英数字と空白以外を除去）
pub fn text_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// パスを除いたファイル名から拡張子を外し、小文字化
fn filename_stem(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base)
        .to_lowercase()
}

fn alphanumeric_only(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// タイトルがファイル名の自動コピーではなく意図して付けられたものか
pub fn title_is_intentional(image: &CandidateImage) -> bool {
    let title = alphanumeric_only(&image.title);
    !title.is_empty() && title != alphanumeric_only(&filename_stem(&image.filename))
}

/// スコア計算用の見出しキーワード
///
/// 綴り違いは展開しない（展開するとキーワード数とフレーズが変わる）。
pub fn scoring_keywords(text: &str, options: NormalizeOptions) -> Vec<String> {
    normalize(
        text,
        NormalizeOptions {
            spelling_variants: false,
            ..options
        },
    )
}

/// 綴り違いのトークンをキーワード側の綴りに置き換える
fn align_variants(tokens: Vec<String>, keywords: &[String], policy: &ScoringPolicy) -> Vec<String> {
    if !policy.spelling_variants {
        return tokens;
    }

    tokens
        .into_iter()
        .map(|token| {
            if keywords.contains(&token) {
                return token;
            }
            keywords
                .iter()
                .find(|kw| spelling_variants(kw).contains(&token.as_str()))
                .cloned()
                .unwrap_or(token)
        })
        .collect()
}

/// 見出しキーワードと画像のスコア（0〜100）
pub fn score(keywords: &[String], image: &CandidateImage, policy: &ScoringPolicy) -> u8 {
    score_image(keywords, image, policy).score
}

/// スコアと寄与したフィールドを算出
///
/// キーワードが空の場合はスコア0。
pub fn score_image(keywords: &[String], image: &CandidateImage, policy: &ScoringPolicy) -> ImageScore {
    if keywords.is_empty() {
        return ImageScore::default();
    }

    let phrase = keywords.join(" ");
    let intentional = title_is_intentional(image);

    let fields = [
        (MatchField::Filename, filename_tokens(&image.filename)),
        (MatchField::Title, text_tokens(&image.title)),
        (MatchField::Alt, text_tokens(&image.alt)),
    ]
    .map(|(field, tokens)| (field, align_variants(tokens, keywords, policy)));

    let mut best = 0.0_f64;
    let mut matched_fields = BTreeSet::new();

    for (field, tokens) in &fields {
        let Some(field_score) = score_field(*field, keywords, &phrase, tokens, intentional, policy)
        else {
            continue;
        };
        matched_fields.insert(*field);
        best = best.max(field_score * policy.factor(*field));
    }

    ImageScore {
        score: best.round().clamp(0.0, 100.0) as u8,
        matched_fields,
    }
}

/// 1フィールドのスコア（ヒットなしはNone）
fn score_field(
    field: MatchField,
    keywords: &[String],
    phrase: &str,
    tokens: &[String],
    title_intentional: bool,
    policy: &ScoringPolicy,
) -> Option<f64> {
    let hits = keywords.iter().filter(|kw| tokens.contains(*kw)).count();
    if hits == 0 {
        return None;
    }

    let weight = policy.base_weight(field);
    let has_phrase = tokens.join(" ").contains(phrase);
    let all_keywords = hits == keywords.len();

    let mut field_score = hits as f64 / keywords.len() as f64 * weight;
    if has_phrase {
        field_score = weight;
    }

    if all_keywords {
        match field {
            MatchField::Filename => {
                let floor = if has_phrase {
                    policy.filename_all_keywords_phrase_floor
                } else {
                    policy.filename_all_keywords_floor
                };
                field_score = field_score.max(floor);
            }
            MatchField::Title => {
                let floor = if has_phrase {
                    policy.title_all_keywords_phrase_floor
                } else {
                    policy.title_all_keywords_floor
                };
                field_score = field_score.max(floor);
                if title_intentional {
                    field_score = (field_score + policy.title_all_keywords_intent_bonus).min(100.0);
                }
            }
            MatchField::Alt => {}
        }
    }

    let extra_words = tokens.len() as isize - keywords.len() as isize;
    let multiplier = policy.length_multiplier(extra_words);
    if extra_words == 0 {
        // 語数一致の加点は上限まで（下限適用で既に超えていれば据え置き）
        let ceiling = match field {
            MatchField::Title if title_intentional => 100.0,
            _ => weight,
        };
        field_score = (field_score * multiplier).min(ceiling.max(field_score));
    } else {
        field_score *= multiplier;
    }

    if field == MatchField::Title && title_intentional {
        field_score = (field_score + policy.title_intent_bonus).min(100.0);
    }

    Some(field_score)
}
