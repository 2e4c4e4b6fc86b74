use clap::{Args, Parser, Subcommand};
use crate::ai_provider::AiProvider;
use image_matcher_common::{HierarchyMode, MatchMode, MatchOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-matcher")]
#[command(about = "見出しと画像の自動照合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ（省略時は設定ファイルの値）
    #[arg(long, global = true)]
    pub ai_provider: Option<AiProvider>,
}

/// 候補画像の読み込み元
#[derive(Args, Debug, Clone)]
pub struct MediaArgs {
    /// 候補画像のJSONファイル
    #[arg(long, conflicts_with = "media_dir", required_unless_present = "media_dir")]
    pub media: Option<PathBuf>,

    /// 候補画像のフォルダ（直下の画像をスキャン）
    #[arg(long)]
    pub media_dir: Option<PathBuf>,
}

/// 照合設定の上書き（この実行のみ）
#[derive(Args, Debug, Clone, Default)]
pub struct MatchArgs {
    /// 照合方式 (keyword/ai)
    #[arg(long)]
    pub mode: Option<MatchMode>,

    /// 信頼度しきい値（0〜100）
    #[arg(short, long)]
    pub threshold: Option<u8>,

    /// 見出し階層モード (all/primary/smart)
    #[arg(long)]
    pub hierarchy: Option<HierarchyMode>,

    /// smart階層の重複率しきい値（0〜100）
    #[arg(long)]
    pub overlap: Option<u8>,
}

impl MatchArgs {
    /// 指定された値で照合設定を上書き
    pub fn apply(&self, options: &mut MatchOptions) {
        if let Some(mode) = self.mode {
            options.mode = mode;
        }
        if let Some(threshold) = self.threshold {
            options.confidence_threshold = threshold;
        }
        if let Some(hierarchy) = self.hierarchy {
            options.hierarchy_mode = hierarchy;
        }
        if let Some(overlap) = self.overlap {
            options.overlap_threshold = overlap;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 文書の見出しと候補画像を照合してJSONを出力
    Match {
        /// 文書ファイル（HTML）
        #[arg(required = true)]
        document: PathBuf,

        #[command(flatten)]
        media: MediaArgs,

        #[command(flatten)]
        overrides: MatchArgs,

        /// 出力JSONファイル（デフォルト: 標準出力に要約のみ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// AIレスポンスのキャッシュフォルダ（省略時は文書と同じフォルダ）
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// 文書の見出しを一覧表示
    Headings {
        /// 文書ファイル（HTML）
        #[arg(required = true)]
        document: PathBuf,

        /// 見出し階層モード (all/primary/smart)
        #[arg(long)]
        hierarchy: Option<HierarchyMode>,

        /// smart階層の重複率しきい値（0〜100）
        #[arg(long)]
        overlap: Option<u8>,
    },

    /// 見出しと1枚の画像のスコアを表示
    Score {
        /// 見出しテキスト
        #[arg(required = true)]
        heading: String,

        /// ファイル名
        #[arg(short, long)]
        filename: String,

        /// タイトル
        #[arg(long, default_value = "")]
        title: String,

        /// 代替テキスト
        #[arg(long, default_value = "")]
        alt: String,
    },

    /// フォルダ内の文書を一括照合
    Bulk {
        /// 文書フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        #[command(flatten)]
        media: MediaArgs,

        #[command(flatten)]
        overrides: MatchArgs,

        /// 出力レポート（デフォルト: 入力フォルダ/bulk-report.json）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 照合結果を対話的にレビュー
    Review {
        /// 照合結果JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 選択結果の出力先（デフォルト: selections.json）
        #[arg(short, long, default_value = "selections.json")]
        output: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 照合方式を設定 (keyword/ai)
        #[arg(long)]
        set_mode: Option<MatchMode>,

        /// 信頼度しきい値を設定
        #[arg(long)]
        set_threshold: Option<u8>,

        /// 見出し階層モードを設定
        #[arg(long)]
        set_hierarchy: Option<HierarchyMode>,

        /// 重複率しきい値を設定
        #[arg(long)]
        set_overlap: Option<u8>,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_match_command() {
        let cli = Cli::try_parse_from([
            "image-matcher", "match", "post.html", "--media", "media.json",
            "--mode", "keyword", "--threshold", "80", "--hierarchy", "primary",
        ])
        .unwrap();

        match cli.command {
            Commands::Match { document, media, overrides, .. } => {
                assert_eq!(document, PathBuf::from("post.html"));
                assert_eq!(media.media, Some(PathBuf::from("media.json")));
                assert_eq!(overrides.mode, Some(MatchMode::Keyword));
                assert_eq!(overrides.threshold, Some(80));
                assert_eq!(overrides.hierarchy, Some(HierarchyMode::Primary));
            }
            _ => panic!("Expected match command"),
        }
    }

    #[test]
    fn test_match_args_apply() {
        let args = MatchArgs {
            threshold: Some(55),
            overlap: Some(90),
            ..MatchArgs::default()
        };
        let mut options = MatchOptions::default();
        args.apply(&mut options);

        assert_eq!(options.confidence_threshold, 55);
        assert_eq!(options.overlap_threshold, 90);
        assert_eq!(options.mode, MatchMode::Keyword);
        assert_eq!(options.hierarchy_mode, HierarchyMode::Smart);
    }

    #[test]
    fn test_media_source_required() {
        let result = Cli::try_parse_from(["image-matcher", "match", "post.html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_media_sources_conflict() {
        let result = Cli::try_parse_from([
            "image-matcher", "match", "post.html", "--media", "m.json", "--media-dir", "img",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_hierarchy_rejected() {
        let result = Cli::try_parse_from([
            "image-matcher", "headings", "post.html", "--hierarchy", "deep",
        ]);
        assert!(result.is_err());
    }
}
