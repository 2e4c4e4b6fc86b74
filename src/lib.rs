//! Image Matcher
//!
//! 見出しと画像の照合ツールのライブラリ部分。
//! 照合ロジックは image_matcher_common、ここではファイル・AI・対話処理を扱う。

pub mod ai_provider;
pub mod bulk;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod ranker;
pub mod review;
pub mod scanner;
