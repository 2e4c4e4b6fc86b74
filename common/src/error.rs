//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Ranker error: {0}")]
    Ranker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_config() {
        let error = Error::InvalidConfig("confidence_threshold must be 0-100, got 120".to_string());
        let display = format!("{}", error);
        assert_eq!(display, "Invalid config: confidence_threshold must be 0-100, got 120");
    }

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_parse() {
        let error = Error::Parse("JSONが見つかりません".to_string());
        assert_eq!(format!("{}", error), "Parse error: JSONが見つかりません");
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Ranker("timeout".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Ranker"));
        assert!(debug.contains("timeout"));
    }
}
