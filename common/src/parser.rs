//! APIレスポンスパーサー
//!
//! AIプロバイダのレスポンスからJSONを抽出し、
//! ランキング結果を ScoredMatch に変換する

use crate::error::{Error, Result};
use crate::types::{CandidateImage, ImageId, MatchMethod, ScoredMatch};
use serde::Deserialize;
use std::collections::BTreeSet;

/// ランキングレスポンス全体
#[derive(Debug, Deserialize)]
struct RankingResponse {
    #[serde(default)]
    matches: Vec<RankedImage>,
}

/// AIが返す1件分（`confidence` は使わない）
#[derive(Debug, Deserialize)]
struct RankedImage {
    image_id: ImageId,
    relevance_score: f64,
    #[serde(default)]
    reasoning: String,
}

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use image_matcher_common::extract_json;
///
/// let response = "Sure! {\"matches\": []} Hope that helps.";
/// assert_eq!(extract_json(response).unwrap(), "{\"matches\": []}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("no JSON object found in response".into()))
}

/// ランキングレスポンスをパース
///
/// 候補に存在しないIDは捨て、スコアは0〜100に丸める。
///
/// # Arguments
/// * `response` - AIプロバイダのレスポンス文字列
/// * `candidates` - プロンプトに渡した候補画像
///
/// # Returns
/// * `Ok(Vec<ScoredMatch>)` - AIの並び順のまま（閾値・並べ替えは呼び出し側）
/// * `Err` - JSONが見つからない、パース失敗、または `matches` が空
pub fn parse_ranking_response(response: &str, candidates: &[CandidateImage]) -> Result<Vec<ScoredMatch>> {
    let json_str = extract_json(response)?;
    let parsed: RankingResponse = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("ranking JSON: {}", e)))?;

    if parsed.matches.is_empty() {
        return Err(Error::Parse("ranking response has no matches".into()));
    }

    let results = parsed
        .matches
        .into_iter()
        .filter_map(|ranked| {
            let image = candidates.iter().find(|c| c.id == ranked.image_id)?;
            Some(ScoredMatch {
                image_id: image.id.clone(),
                confidence_score: ranked.relevance_score.round().clamp(0.0, 100.0) as u8,
                matched_fields: BTreeSet::new(),
                match_method: MatchMethod::Ai,
                filename: image.filename.clone(),
                url: image.url.clone(),
                justification: Some(ranked.reasoning),
            })
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<CandidateImage> {
        vec![
            CandidateImage::new(12u64, "garden-spider.jpg"),
            CandidateImage::new(34u64, "moth.jpg"),
        ]
    }

    // =============================================
    // extract_json テスト
    // =============================================

    #[test]
    fn test_extract_json_with_block() {
        let response = r#"Here is the ranking:
```json
{"matches": [{"image_id": 12, "relevance_score": 90}]}
```
Some additional text."#;

        let json = extract_json(response).unwrap();
        assert!(json.starts_with("{\"matches\""));
        assert!(json.ends_with('}'));
    }

    #[test]
    fn test_extract_json_raw() {
        let response = r#"{"matches": []}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_nested_braces() {
        let response = r#"Result: {"matches": [{"image_id": 1, "relevance_score": 80}]} done"#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"matches": [{"image_id": 1, "relevance_score": 80}]}"#);
    }

    #[test]
    fn test_extract_json_error() {
        let result = extract_json("No JSON here, just plain text.");
        if let Err(Error::Parse(msg)) = result {
            assert!(msg.contains("no JSON object"));
        } else {
            panic!("Expected Parse error");
        }
        assert!(extract_json("").is_err());
    }

    // =============================================
    // parse_ranking_response テスト
    // =============================================

    #[test]
    fn test_parse_ranking_response() {
        let response = r#"```json
{"matches": [
  {"image_id": 12, "relevance_score": 95, "reasoning": "Exact match on garden spider", "confidence": "high"},
  {"image_id": 34, "relevance_score": 40, "reasoning": "Unrelated insect", "confidence": "low"}
]}
```"#;

        let result = parse_ranking_response(response, &candidates()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].image_id, ImageId::from(12u64));
        assert_eq!(result[0].confidence_score, 95);
        assert_eq!(result[0].match_method, MatchMethod::Ai);
        assert_eq!(result[0].filename, "garden-spider.jpg");
        assert_eq!(result[0].justification.as_deref(), Some("Exact match on garden spider"));
        assert!(result[0].matched_fields.is_empty());
        assert_eq!(result[1].confidence_score, 40);
    }

    #[test]
    fn test_parse_ranking_response_drops_unknown_ids() {
        let response = r#"{"matches": [
            {"image_id": 999, "relevance_score": 99, "reasoning": "hallucinated"},
            {"image_id": "34", "relevance_score": 75}
        ]}"#;

        let result = parse_ranking_response(response, &candidates()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].image_id, ImageId::from(34u64));
        assert_eq!(result[0].justification.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_ranking_response_clamps_scores() {
        let response = r#"{"matches": [
            {"image_id": 12, "relevance_score": 140},
            {"image_id": 34, "relevance_score": -5}
        ]}"#;

        let result = parse_ranking_response(response, &candidates()).unwrap();
        assert_eq!(result[0].confidence_score, 100);
        assert_eq!(result[1].confidence_score, 0);
    }

    #[test]
    fn test_parse_ranking_response_empty_matches_is_error() {
        let result = parse_ranking_response(r#"{"matches": []}"#, &candidates());
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_ranking_response_invalid_json() {
        let result = parse_ranking_response("{matches: oops}", &candidates());
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_ranking_response_no_json() {
        let result = parse_ranking_response("I could not rank these images.", &candidates());
        assert!(result.is_err());
    }
}
