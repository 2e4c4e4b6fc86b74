use crate::ai_provider::AiProvider;
use crate::error::{MatcherError, Result};
use image_matcher_common::{HierarchyMode, MatchMode, MatchOptions, NormalizeOptions, ScoringPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 既定のAIモデル
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub match_mode: MatchMode,
    pub confidence_threshold: u8,
    pub hierarchy_mode: HierarchyMode,
    pub heading_overlap_threshold: u8,
    pub enable_stemming: bool,
    pub enable_spelling_variants: bool,
    pub ai_provider: AiProvider,
    pub model: String,
    /// AIに渡す候補の最大数
    pub ai_candidate_count: usize,
    pub timeout_seconds: u64,
    /// AI失敗時にキーワード照合で代替する
    pub auto_fallback_keyword: bool,
    pub max_api_calls_per_hour: u32,
    pub max_api_calls_per_day: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Keyword,
            confidence_threshold: 70,
            hierarchy_mode: HierarchyMode::Smart,
            heading_overlap_threshold: 70,
            enable_stemming: true,
            enable_spelling_variants: true,
            ai_provider: AiProvider::Claude,
            model: DEFAULT_MODEL.into(),
            ai_candidate_count: 10,
            timeout_seconds: 30,
            auto_fallback_keyword: true,
            max_api_calls_per_hour: 50,
            max_api_calls_per_day: 500,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 指定パスから読み込み（ファイルがなければ既定値）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MatcherError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("image-matcher").join("config.json"))
    }

    /// 照合設定に変換（範囲外の値はエラー）
    pub fn to_match_options(&self) -> Result<MatchOptions> {
        let options = MatchOptions {
            mode: self.match_mode,
            confidence_threshold: self.confidence_threshold,
            hierarchy_mode: self.hierarchy_mode,
            overlap_threshold: self.heading_overlap_threshold,
            normalize: NormalizeOptions {
                stemming: self.enable_stemming,
                spelling_variants: self.enable_spelling_variants,
            },
            scoring: ScoringPolicy {
                spelling_variants: self.enable_spelling_variants,
                ..ScoringPolicy::default()
            },
            ..MatchOptions::default()
        };
        options.validate()?;
        Ok(options)
    }

    pub fn set_threshold(&mut self, threshold: u8) -> Result<()> {
        if threshold > 100 {
            return Err(MatcherError::Config(format!(
                "信頼度しきい値は0〜100で指定してください: {}",
                threshold
            )));
        }
        self.confidence_threshold = threshold;
        Ok(())
    }

    pub fn set_overlap(&mut self, overlap: u8) -> Result<()> {
        if overlap > 100 {
            return Err(MatcherError::Config(format!(
                "重複率しきい値は0〜100で指定してください: {}",
                overlap
            )));
        }
        self.heading_overlap_threshold = overlap;
        Ok(())
    }
}
