//! 一括処理モジュール
//!
//! フォルダ内の文書を並列に照合し、文書ごとの結果と件数をまとめる。

use image_matcher_common::{find_matches_with, CandidateImage, MatchGroup, MatchOptions, Ranker};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 文書ごとの処理状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// 1文書の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub status: JobStatus,
    #[serde(default)]
    pub groups: Vec<MatchGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一括処理レポート
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReport {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub documents: Vec<DocumentResult>,
}

impl BulkReport {
    fn from_results(documents: Vec<DocumentResult>) -> Self {
        let completed = documents
            .iter()
            .filter(|d| d.status == JobStatus::Completed)
            .count();
        let failed = documents
            .iter()
            .filter(|d| d.status == JobStatus::Failed)
            .count();
        Self {
            total: documents.len(),
            completed,
            failed,
            documents,
        }
    }

    /// マッチが1件以上ある見出しの数
    pub fn matched_headings(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|d| d.groups.iter())
            .filter(|g| !g.is_empty())
            .count()
    }
}

fn process_document<R: Ranker + ?Sized>(
    path: &Path,
    candidates: &[CandidateImage],
    options: &MatchOptions,
    ranker: &R,
) -> DocumentResult {
    let outcome = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|markup| {
            find_matches_with(&markup, candidates, options, ranker).map_err(|e| e.to_string())
        });

    match outcome {
        Ok(groups) => DocumentResult {
            path: path.to_path_buf(),
            status: JobStatus::Completed,
            groups,
            error: None,
        },
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "document failed");
            DocumentResult {
                path: path.to_path_buf(),
                status: JobStatus::Failed,
                groups: Vec::new(),
                error: Some(error),
            }
        }
    }
}

/// 文書を並列に照合（結果は入力順）
pub fn process_documents<R: Ranker + Sync + ?Sized>(
    documents: &[PathBuf],
    candidates: &[CandidateImage],
    options: &MatchOptions,
    ranker: &R,
    show_progress: bool,
) -> BulkReport {
    let progress = if show_progress {
        let bar = ProgressBar::new(documents.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<DocumentResult> = documents
        .par_iter()
        .map(|path| {
            let result = process_document(path, candidates, options, ranker);
            progress.inc(1);
            result
        })
        .collect();

    progress.finish_and_clear();
    BulkReport::from_results(results)
}
