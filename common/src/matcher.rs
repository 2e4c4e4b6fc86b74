//! 照合オーケストレーター
//!
//! 見出し抽出 → 階層フィルタ → 見出しごとのランキング → 閾値・上位3件
//! の順に処理し、見出しごとの MatchGroup を返す。
//!
//! ランキング方式は `Ranker` トレイトで差し替える。
//! キーワード照合は `KeywordRanker`、AIランキングはホスト側で実装する。

use crate::error::{Error, Result};
use crate::headings::extract_headings;
use crate::hierarchy::{filter_headings, HierarchyMode};
use crate::normalizer::NormalizeOptions;
use crate::scorer::{score_image, scoring_keywords, ScoringPolicy};
use crate::types::{CandidateImage, Heading, MatchGroup, ScoredMatch};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// 見出しあたりの最大マッチ数
pub const MAX_MATCHES_PER_HEADING: usize = 3;

/// 照合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Keyword,
    Ai,
}

impl FromStr for MatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(MatchMode::Keyword),
            "ai" => Ok(MatchMode::Ai),
            _ => Err(Error::InvalidConfig(format!(
                "unknown match mode: {}. Use keyword or ai",
                s
            ))),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Keyword => write!(f, "keyword"),
            MatchMode::Ai => write!(f, "ai"),
        }
    }
}

/// 照合設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub mode: MatchMode,
    /// これ未満のスコアは出力しない（0〜100）
    pub confidence_threshold: u8,
    pub hierarchy_mode: HierarchyMode,
    /// smart階層の重複率しきい値（0〜100）
    pub overlap_threshold: u8,
    pub normalize: NormalizeOptions,
    pub max_matches: usize,
    pub scoring: ScoringPolicy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            mode: MatchMode::Keyword,
            confidence_threshold: 70,
            hierarchy_mode: HierarchyMode::Smart,
            overlap_threshold: 70,
            normalize: NormalizeOptions::default(),
            max_matches: MAX_MATCHES_PER_HEADING,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl MatchOptions {
    /// 設定値の検証
    pub fn validate(&self) -> Result<()> {
        if self.confidence_threshold > 100 {
            return Err(Error::InvalidConfig(format!(
                "confidence_threshold must be 0-100, got {}",
                self.confidence_threshold
            )));
        }
        if self.overlap_threshold > 100 {
            return Err(Error::InvalidConfig(format!(
                "overlap_threshold must be 0-100, got {}",
                self.overlap_threshold
            )));
        }
        if self.max_matches == 0 || self.max_matches > MAX_MATCHES_PER_HEADING {
            return Err(Error::InvalidConfig(format!(
                "max_matches must be 1-{}, got {}",
                MAX_MATCHES_PER_HEADING, self.max_matches
            )));
        }
        Ok(())
    }
}

/// 見出し1件に対する候補画像のランキング
pub trait Ranker {
    /// 候補ごとのスコアを返す（閾値・並べ替え・件数制限は呼び出し側）
    fn rank(
        &self,
        heading: &Heading,
        keywords: &[String],
        candidates: &[CandidateImage],
    ) -> Result<Vec<ScoredMatch>>;
}

/// キーワード照合によるランキング
#[derive(Debug, Clone, Default)]
pub struct KeywordRanker {
    policy: ScoringPolicy,
}

impl KeywordRanker {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }
}

impl Ranker for KeywordRanker {
    fn rank(
        &self,
        _heading: &Heading,
        keywords: &[String],
        candidates: &[CandidateImage],
    ) -> Result<Vec<ScoredMatch>> {
        Ok(candidates
            .iter()
            .map(|image| {
                let scored = score_image(keywords, image, &self.policy);
                ScoredMatch::keyword(image, scored.score, scored.matched_fields)
            })
            .collect())
    }
}

/// 閾値以上をスコア降順で上位 `max` 件（同点は入力順、同一画像は最初の1件のみ）
pub fn select_top_matches(matches: Vec<ScoredMatch>, threshold: u8, max: usize) -> Vec<ScoredMatch> {
    let mut seen = HashSet::new();
    let mut selected: Vec<ScoredMatch> = matches
        .into_iter()
        .filter(|m| m.confidence_score >= threshold)
        .filter(|m| seen.insert(m.image_id.clone()))
        .collect();

    selected.sort_by(|a, b| b.confidence_score.cmp(&a.confidence_score));
    selected.truncate(max);
    selected
}

/// 見出し1件を照合
pub fn match_heading<R: Ranker + ?Sized>(
    heading: &Heading,
    candidates: &[CandidateImage],
    options: &MatchOptions,
    ranker: &R,
) -> Result<MatchGroup> {
    let keywords = scoring_keywords(&heading.text, options.normalize);
    let ranked = if keywords.is_empty() {
        Vec::new()
    } else {
        ranker.rank(heading, &keywords, candidates)?
    };

    let matches = select_top_matches(ranked, options.confidence_threshold, options.max_matches);
    tracing::debug!(
        heading = %heading.text,
        keywords = ?keywords,
        matches = matches.len(),
        "heading matched"
    );

    Ok(MatchGroup {
        heading: heading.clone(),
        matches,
    })
}

/// 任意のランキング方式で文書を照合
///
/// 設定は最初に検証する。見出しがない文書は空のVecを返す。
pub fn find_matches_with<R: Ranker + ?Sized>(
    markup: &str,
    candidates: &[CandidateImage],
    options: &MatchOptions,
    ranker: &R,
) -> Result<Vec<MatchGroup>> {
    options.validate()?;

    let headings = extract_headings(markup);
    let retained = filter_headings(
        &headings,
        options.hierarchy_mode,
        options.overlap_threshold,
        options.normalize,
    );
    tracing::debug!(
        extracted = headings.len(),
        retained = retained.len(),
        hierarchy = %options.hierarchy_mode,
        "headings filtered"
    );

    retained
        .iter()
        .map(|heading| match_heading(heading, candidates, options, ranker))
        .collect()
}

/// キーワード照合で文書を照合
///
/// AIモードはランキング方式の注入が必要なため `find_matches_with` を使うこと。
///
/// # Examples
/// ```
/// use image_matcher_common::{find_matches, CandidateImage, MatchOptions};
///
/// let images = vec![CandidateImage::new(1u64, "black-swallowtail-caterpillar.jpg")];
/// let groups = find_matches(
///     "<h2>Black Swallowtail Caterpillar</h2>",
///     &images,
///     &MatchOptions::default(),
/// )
/// .unwrap();
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].matches[0].confidence_score, 100);
/// ```
pub fn find_matches(
    markup: &str,
    candidates: &[CandidateImage],
    options: &MatchOptions,
) -> Result<Vec<MatchGroup>> {
    if options.mode == MatchMode::Ai {
        return Err(Error::InvalidConfig(
            "ai mode requires a ranker; use find_matches_with".into(),
        ));
    }
    find_matches_with(markup, candidates, options, &KeywordRanker::new(options.scoring.clone()))
}

/// AIランキングに渡す候補を絞り込む
///
/// キーワードスコアが閾値以上のものをスコア順に最大 `count` 件。
/// 1件もなければプールの先頭 `count` 件。
pub fn shortlist_candidates(
    keywords: &[String],
    candidates: &[CandidateImage],
    options: &MatchOptions,
    count: usize,
) -> Vec<CandidateImage> {
    let mut scored: Vec<(u8, &CandidateImage)> = candidates
        .iter()
        .map(|image| (score_image(keywords, image, &options.scoring).score, image))
        .filter(|(score, _)| *score >= options.confidence_threshold)
        .collect();

    if scored.is_empty() {
        return candidates.iter().take(count).cloned().collect();
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(count)
        .map(|(_, image)| image.clone())
        .collect()
}
