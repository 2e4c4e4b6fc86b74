//! Image Matcher Common Library
//!
//! 見出しと画像の照合ロジック（I/Oなし）。CLIとホスト側で共有する。

pub mod error;
pub mod headings;
pub mod hierarchy;
pub mod matcher;
pub mod normalizer;
pub mod parser;
pub mod prompts;
pub mod scorer;
pub mod types;

pub use error::{Error, Result};
pub use headings::extract_headings;
pub use hierarchy::{filter_headings, keyword_overlap, HierarchyMode};
pub use matcher::{
    find_matches, find_matches_with, match_heading, select_top_matches, shortlist_candidates,
    KeywordRanker, MatchMode, MatchOptions, Ranker, MAX_MATCHES_PER_HEADING,
};
pub use normalizer::{normalize, words_match, NormalizeOptions};
pub use parser::{extract_json, parse_ranking_response};
pub use prompts::build_ranking_prompt;
pub use scorer::{score, score_image, scoring_keywords, ImageScore, ScoringPolicy};
pub use types::{
    CandidateImage, Heading, HeadingTag, ImageId, MatchField, MatchGroup, MatchMethod, ScoredMatch,
};
