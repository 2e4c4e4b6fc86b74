//! プロンプト生成モジュール
//!
//! AIランキング用のプロンプトを組み立てる:
//! - build_ranking_prompt: 見出しと候補画像の一覧から関連度ランキングを依頼

use crate::types::{CandidateImage, Heading};

/// 候補1件分の行
fn candidate_line(image: &CandidateImage) -> String {
    format!(
        "ID: {}, Filename: {}, Title: {}, Alt: {}, Caption: {}",
        image.id, image.filename, image.title, image.alt, image.caption
    )
}

/// ランキング用プロンプト生成
///
/// # Arguments
/// * `heading` - 対象の見出し
/// * `candidates` - 絞り込み済みの候補画像
///
/// # Returns
/// JSON形式（`{"matches": [...]}`）での回答を求めるプロンプト
pub fn build_ranking_prompt(heading: &Heading, candidates: &[CandidateImage]) -> String {
    let candidate_list = candidates
        .iter()
        .map(candidate_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Given heading: "{heading}"

Rank these images by relevance (0-100):
{candidate_list}

Respond ONLY with valid JSON in this exact format:
{{"matches": [{{"image_id": 123, "relevance_score": 95, "reasoning": "Exact match...", "confidence": "high"}}]}}"#,
        heading = heading.text,
    )
}
