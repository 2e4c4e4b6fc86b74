//! メディアプール・文書の読み込み
//!
//! - JSONファイルから候補画像を読み込む
//! - 画像フォルダをスキャンして候補画像を作る（タイトルはEXIFの説明）
//! - 一括処理用に文書ファイルを列挙する

mod exif;

use crate::error::{MatcherError, Result};
use image_matcher_common::CandidateImage;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["html", "htm"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            extensions.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// JSON配列から候補画像を読み込み
pub fn load_media_file(path: &Path) -> Result<Vec<CandidateImage>> {
    if !path.exists() {
        return Err(MatcherError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let images: Vec<CandidateImage> = serde_json::from_str(&content)?;
    Ok(images)
}

/// 画像フォルダ直下をスキャンして候補画像を作成
pub fn scan_media_dir(folder: &Path) -> Result<Vec<CandidateImage>> {
    if !folder.is_dir() {
        return Err(MatcherError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !has_extension(path, IMAGE_EXTENSIONS) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let title = exif::extract_description(path).unwrap_or_default();

        images.push(CandidateImage::new(file_name.as_str(), file_name.as_str()).with_title(title));
    }

    // ファイル名でソート
    images.sort_by(|a, b| a.filename.cmp(&b.filename));

    tracing::debug!(folder = %folder.display(), count = images.len(), "media folder scanned");
    Ok(images)
}

/// 文書ファイル（.html / .htm）を列挙
pub fn scan_documents(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(MatcherError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut documents: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && has_extension(p, DOCUMENT_EXTENSIONS))
        .collect();

    documents.sort();
    Ok(documents)
}
