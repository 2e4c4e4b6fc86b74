//! 対話式レビューモジュール
//!
//! 照合結果のJSONを読み込み、見出しごとに採用する画像を1つ選ぶ（またはスキップ）。
//! 採用した組み合わせを選択結果ファイルに書き出す。

use crate::error::{MatcherError, Result};
use dialoguer::Select;
use image_matcher_common::{HeadingTag, ImageId, MatchGroup};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 採用された見出しと画像の組み合わせ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub heading_text: String,
    pub heading_tag: HeadingTag,
    pub heading_position: usize,
    pub image_id: ImageId,
    pub confidence_score: u8,
}

/// 見出しごとの操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// n番目のマッチを採用
    Approve(usize),
    /// この見出しをスキップ
    Skip,
    /// 保存して終了
    Quit,
}

/// 操作からSelectionを作る（範囲外・スキップはNone）
pub fn selection_for(group: &MatchGroup, action: ReviewAction) -> Option<Selection> {
    let ReviewAction::Approve(index) = action else {
        return None;
    };
    let chosen = group.matches.get(index)?;
    Some(Selection {
        heading_text: group.heading.text.clone(),
        heading_tag: group.heading.tag,
        heading_position: group.heading.position,
        image_id: chosen.image_id.clone(),
        confidence_score: chosen.confidence_score,
    })
}

/// 選択肢の表示文字列
pub fn choice_labels(group: &MatchGroup) -> Vec<String> {
    let mut labels: Vec<String> = group
        .matches
        .iter()
        .map(|m| {
            let mut label = format!("{} ({}) 信頼度 {}", m.filename, m.image_id, m.confidence_score);
            if let Some(reason) = &m.justification {
                label.push_str(&format!(" - {}", reason));
            }
            label
        })
        .collect();
    labels.push("スキップ".into());
    labels.push("保存して終了".into());
    labels
}

fn action_from_index(group: &MatchGroup, index: usize) -> ReviewAction {
    let count = group.matches.len();
    if index < count {
        ReviewAction::Approve(index)
    } else if index == count {
        ReviewAction::Skip
    } else {
        ReviewAction::Quit
    }
}

/// 対話式でマッチを選択
pub fn run_interactive_review(input_path: &Path, output_path: &Path) -> Result<()> {
    if !input_path.exists() {
        return Err(MatcherError::FileNotFound(input_path.display().to_string()));
    }

    let content = std::fs::read_to_string(input_path)?;
    let groups: Vec<MatchGroup> = serde_json::from_str(&content)?;

    let reviewable: Vec<&MatchGroup> = groups.iter().filter(|g| !g.is_empty()).collect();
    if reviewable.is_empty() {
        println!("✓ レビュー対象のマッチがありません");
        return Ok(());
    }

    println!("🖼  レビュー対象の見出し: {}件", reviewable.len());
    println!("---\n");

    let mut selections = Vec::new();

    for (count, group) in reviewable.iter().enumerate() {
        println!(
            "[{}/{}] <{}> {}",
            count + 1,
            reviewable.len(),
            group.heading.tag,
            group.heading.text
        );

        let index = Select::new()
            .with_prompt("採用する画像")
            .items(&choice_labels(group))
            .default(0)
            .interact()
            .map_err(|e| MatcherError::Interaction(e.to_string()))?;

        let action = action_from_index(group, index);
        match action {
            ReviewAction::Approve(_) => {
                if let Some(selection) = selection_for(group, action) {
                    println!("  → {} を採用\n", selection.image_id);
                    selections.push(selection);
                }
            }
            ReviewAction::Skip => println!("  → スキップ\n"),
            ReviewAction::Quit => {
                println!("保存して終了します...");
                break;
            }
        }
    }

    let json = serde_json::to_string_pretty(&selections)?;
    std::fs::write(output_path, json)?;

    println!("\n✓ {}件の選択を保存しました: {}", selections.len(), output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_matcher_common::{CandidateImage, Heading, MatchField, ScoredMatch};
    use std::collections::BTreeSet;

    fn group() -> MatchGroup {
        let fields: BTreeSet<MatchField> = [MatchField::Filename].into_iter().collect();
        MatchGroup {
            heading: Heading::new(HeadingTag::H3, "Garden Spiders", 42),
            matches: vec![
                ScoredMatch::keyword(&CandidateImage::new(7u64, "garden-spider.jpg"), 100, fields.clone()),
                ScoredMatch::keyword(&CandidateImage::new(9u64, "spider-web.jpg"), 75, fields),
            ],
        }
    }

    #[test]
    fn test_action_from_index() {
        let g = group();
        assert_eq!(action_from_index(&g, 0), ReviewAction::Approve(0));
        assert_eq!(action_from_index(&g, 1), ReviewAction::Approve(1));
        assert_eq!(action_from_index(&g, 2), ReviewAction::Skip);
        assert_eq!(action_from_index(&g, 3), ReviewAction::Quit);
    }

    #[test]
    fn test_selection_for_approve() {
        let selection = selection_for(&group(), ReviewAction::Approve(1)).unwrap();
        assert_eq!(selection.heading_text, "Garden Spiders");
        assert_eq!(selection.heading_tag, HeadingTag::H3);
        assert_eq!(selection.heading_position, 42);
        assert_eq!(selection.image_id.as_str(), "9");
        assert_eq!(selection.confidence_score, 75);
    }

    #[test]
    fn test_selection_for_skip_and_out_of_range() {
        assert!(selection_for(&group(), ReviewAction::Skip).is_none());
        assert!(selection_for(&group(), ReviewAction::Approve(5)).is_none());
    }

    #[test]
    fn test_choice_labels() {
        let labels = choice_labels(&group());
        assert_eq!(labels.len(), 4);
        assert!(labels[0].contains("garden-spider.jpg"));
        assert!(labels[0].contains("100"));
        assert_eq!(labels[2], "スキップ");
    }

    #[test]
    fn test_selection_serialized_shape() {
        let selection = selection_for(&group(), ReviewAction::Approve(0)).unwrap();
        let json = serde_json::to_string(&selection).unwrap();
        assert!(json.contains("\"heading_tag\":\"h3\""));
        assert!(json.contains("\"image_id\":\"7\""));
        assert!(json.contains("\"heading_position\":42"));
    }
}
