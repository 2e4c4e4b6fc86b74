use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error(transparent)]
    Common(#[from] image_matcher_common::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("API呼び出し上限に達しました: {0}")]
    RateLimited(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("文書が見つかりません: {0}")]
    NoDocumentsFound(String),

    #[error("対話入力エラー: {0}")]
    Interaction(String),
}

pub type Result<T> = std::result::Result<T, MatcherError>;
