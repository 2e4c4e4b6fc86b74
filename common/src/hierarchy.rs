//! 見出し階層フィルタモジュール
//!
//! 抽出した見出しのうち、画像照合の対象にするものを選ぶ。
//!
//! - `all`: すべて
//! - `primary`: h2 のみ
//! - `smart`: 直前の h2 とキーワードが大きく重なる下位見出しを除外

use crate::error::{Error, Result};
use crate::normalizer::{normalize, NormalizeOptions};
use crate::types::Heading;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// 階層モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyMode {
    All,
    Primary,
    #[default]
    Smart,
}

impl FromStr for HierarchyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(HierarchyMode::All),
            "primary" => Ok(HierarchyMode::Primary),
            "smart" => Ok(HierarchyMode::Smart),
            _ => Err(Error::InvalidConfig(format!(
                "unknown hierarchy mode: {}. Use all, primary, or smart",
                s
            ))),
        }
    }
}

impl fmt::Display for HierarchyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyMode::All => write!(f, "all"),
            HierarchyMode::Primary => write!(f, "primary"),
            HierarchyMode::Smart => write!(f, "smart"),
        }
    }
}

/// 階層モードに従って見出しを絞り込む（文書順を保持）
///
/// # Arguments
/// * `headings` - 抽出済みの見出し
/// * `mode` - 階層モード
/// * `overlap_threshold` - smartモードの重複率しきい値（%）
/// * `normalize_options` - キーワード化の設定
pub fn filter_headings(
    headings: &[Heading],
    mode: HierarchyMode,
    overlap_threshold: u8,
    normalize_options: NormalizeOptions,
) -> Vec<Heading> {
    match mode {
        HierarchyMode::All => headings.to_vec(),
        HierarchyMode::Primary => headings
            .iter()
            .filter(|h| h.is_top_level())
            .cloned()
            .collect(),
        HierarchyMode::Smart => apply_smart_hierarchy(headings, overlap_threshold, normalize_options),
    }
}

/// smartモード: 親のh2と重複率がしきい値以上の下位見出しを除外
pub fn apply_smart_hierarchy(
    headings: &[Heading],
    overlap_threshold: u8,
    normalize_options: NormalizeOptions,
) -> Vec<Heading> {
    let mut filtered = Vec::new();
    let mut top_level_keywords: Vec<String> = Vec::new();

    for heading in headings {
        if heading.is_top_level() {
            top_level_keywords = normalize(&heading.text, normalize_options);
            filtered.push(heading.clone());
            continue;
        }

        if top_level_keywords.is_empty() {
            filtered.push(heading.clone());
            continue;
        }

        let keywords = normalize(&heading.text, normalize_options);
        let overlap = keyword_overlap(&top_level_keywords, &keywords);

        if overlap < f64::from(overlap_threshold) {
            filtered.push(heading.clone());
        } else {
            tracing::debug!(
                heading = %heading.text,
                tag = %heading.tag,
                overlap,
                "sub-heading dropped as redundant with its h2"
            );
        }
    }

    filtered
}

/// 2つのキーワード集合の重複率（Jaccard係数 × 100）
///
/// 単純な文字列一致で比較する。どちらかが空なら0。
pub fn keyword_overlap<S: AsRef<str>>(keywords1: &[S], keywords2: &[S]) -> f64 {
    let set1: HashSet<&str> = keywords1.iter().map(|k| k.as_ref()).collect();
    let set2: HashSet<&str> = keywords2.iter().map(|k| k.as_ref()).collect();

    if set1.is_empty() || set2.is_empty() {
        return 0.0;
    }

    let intersection = set1.intersection(&set2).count();
    let union = set1.union(&set2).count();

    intersection as f64 / union as f64 * 100.0
}
