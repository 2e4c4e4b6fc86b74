//! マッチング処理の型定義
//!
//! CLIとホスト側で共有される型:
//! - Heading: 文書から抽出した見出し
//! - CandidateImage: メディアプールの候補画像（読み取り専用）
//! - ScoredMatch: 見出しと画像の照合結果
//! - MatchGroup: 見出しごとの最終出力

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 見出しタグ（h2〜h6）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    /// 見出しレベル（2〜6）からタグを生成
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            2 => Some(HeadingTag::H2),
            3 => Some(HeadingTag::H3),
            4 => Some(HeadingTag::H4),
            5 => Some(HeadingTag::H5),
            6 => Some(HeadingTag::H6),
            _ => None,
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            HeadingTag::H2 => 2,
            HeadingTag::H3 => 3,
            HeadingTag::H4 => 4,
            HeadingTag::H5 => 5,
            HeadingTag::H6 => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingTag::H2 => "h2",
            HeadingTag::H3 => "h3",
            HeadingTag::H4 => "h4",
            HeadingTag::H5 => "h5",
            HeadingTag::H6 => "h6",
        }
    }
}

impl fmt::Display for HeadingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文書から抽出した見出し
///
/// `position` は開始タグのバイトオフセット。画像の挿入位置を決める
/// 外部処理のためのもので、スコア計算には使わない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub tag: HeadingTag,
    pub text: String,
    pub position: usize,
    pub level: u8,
}

impl Heading {
    pub fn new(tag: HeadingTag, text: impl Into<String>, position: usize) -> Self {
        Self {
            tag,
            text: text.into(),
            position,
            level: tag.level(),
        }
    }

    /// トップレベル見出し（h2）か
    pub fn is_top_level(&self) -> bool {
        self.level == 2
    }
}

/// 画像ID（メディアストア側の不透明な識別子）
///
/// JSONでは数値・文字列のどちらでも受け付け、文字列として出力する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ImageId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => ImageId(n.to_string()),
            RawId::Text(s) => ImageId(s),
        })
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ImageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for ImageId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// 候補画像のメタデータ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateImage {
    pub id: ImageId,
    pub filename: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub alt: String,
    /// 旧バージョン由来のフィールド。スコア計算では使わず、AIプロンプトにのみ渡す
    #[serde(default)]
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CandidateImage {
    pub fn new(id: impl Into<ImageId>, filename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }
}

/// スコアに寄与したフィールド（優先順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Filename,
    Title,
    Alt,
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchField::Filename => write!(f, "filename"),
            MatchField::Title => write!(f, "title"),
            MatchField::Alt => write!(f, "alt"),
        }
    }
}

/// 照合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    #[default]
    Keyword,
    Ai,
}

/// 見出しと1枚の画像の照合結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub image_id: ImageId,
    pub confidence_score: u8,
    #[serde(default)]
    pub matched_fields: BTreeSet<MatchField>,
    #[serde(default)]
    pub match_method: MatchMethod,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// AIランキング時の判定理由
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

impl ScoredMatch {
    /// キーワード照合の結果を生成
    pub fn keyword(image: &CandidateImage, score: u8, matched_fields: BTreeSet<MatchField>) -> Self {
        Self {
            image_id: image.id.clone(),
            confidence_score: score,
            matched_fields,
            match_method: MatchMethod::Keyword,
            filename: image.filename.clone(),
            url: image.url.clone(),
            justification: None,
        }
    }
}

/// 見出しごとの出力単位
///
/// `matches` は空、またはスコアの降順（最大3件）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    pub heading: Heading,
    pub matches: Vec<ScoredMatch>,
}

impl MatchGroup {
    pub fn best(&self) -> Option<&ScoredMatch> {
        self.matches.first()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_tag_from_level() {
        assert_eq!(HeadingTag::from_level(2), Some(HeadingTag::H2));
        assert_eq!(HeadingTag::from_level(6), Some(HeadingTag::H6));
        assert_eq!(HeadingTag::from_level(1), None);
        assert_eq!(HeadingTag::from_level(7), None);
    }

    #[test]
    fn test_heading_new_sets_level() {
        let heading = Heading::new(HeadingTag::H4, "Spider Webs", 120);
        assert_eq!(heading.level, 4);
        assert!(!heading.is_top_level());
    }

    #[test]
    fn test_heading_serialize() {
        let heading = Heading::new(HeadingTag::H2, "Garden Birds", 0);
        let json = serde_json::to_string(&heading).expect("シリアライズ失敗");
        assert!(json.contains("\"tag\":\"h2\""));
        assert!(json.contains("\"text\":\"Garden Birds\""));
        assert!(json.contains("\"level\":2"));
    }

    #[test]
    fn test_image_id_accepts_number_and_string() {
        let from_num: ImageId = serde_json::from_str("123").expect("数値ID");
        let from_str: ImageId = serde_json::from_str("\"img-7\"").expect("文字列ID");
        assert_eq!(from_num.as_str(), "123");
        assert_eq!(from_str.as_str(), "img-7");
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"123\"");
    }

    #[test]
    fn test_candidate_image_deserialize_missing_fields() {
        let json = r#"{"id": 42, "filename": "cat.jpg"}"#;
        let image: CandidateImage = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(image.id, ImageId::from(42u64));
        assert_eq!(image.filename, "cat.jpg");
        assert_eq!(image.title, "");
        assert_eq!(image.alt, "");
        assert!(image.url.is_none());
    }

    #[test]
    fn test_scored_match_omits_empty_justification() {
        let image = CandidateImage::new("1", "moth.jpg");
        let fields: BTreeSet<MatchField> = [MatchField::Filename].into_iter().collect();
        let scored = ScoredMatch::keyword(&image, 88, fields);

        let json = serde_json::to_string(&scored).expect("シリアライズ失敗");
        assert!(json.contains("\"confidence_score\":88"));
        assert!(json.contains("\"matched_fields\":[\"filename\"]"));
        assert!(json.contains("\"match_method\":\"keyword\""));
        assert!(!json.contains("justification"));
    }

    #[test]
    fn test_match_fields_ordered_by_priority() {
        let fields: BTreeSet<MatchField> =
            [MatchField::Alt, MatchField::Filename, MatchField::Title].into_iter().collect();
        let ordered: Vec<_> = fields.into_iter().collect();
        assert_eq!(ordered, vec![MatchField::Filename, MatchField::Title, MatchField::Alt]);
    }
}
