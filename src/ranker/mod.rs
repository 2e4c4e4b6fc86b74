//! AIランキング
//!
//! キーワードスコアで絞り込んだ候補をAIプロバイダに渡して並べ替える。
//! レスポンスはキャッシュし、呼び出し回数は使用量ログで制限する。
//! 失敗時は設定によりキーワード照合へ切り替える。

pub mod cache;
mod claude_cli;

pub use cache::{prompt_hash, RateLimits, ResponseCache, UsageLog};
pub use claude_cli::run_provider_cli;

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::{MatcherError, Result};
use chrono::Utc;
use image_matcher_common::{
    build_ranking_prompt, parse_ranking_response, shortlist_candidates, CandidateImage, Heading,
    KeywordRanker, MatchOptions, Ranker, ScoredMatch,
};
use std::sync::Mutex;
use std::time::Duration;

/// プロンプトを受け取りレスポンス文字列を返す
pub trait PromptRunner: Send + Sync {
    fn run(&self, prompt: &str) -> Result<String>;
}

/// AIプロバイダCLIを呼び出すランナー
pub struct CliRunner {
    provider: AiProvider,
    model: String,
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
}

impl CliRunner {
    pub fn new(provider: AiProvider, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            provider,
            model: model.into(),
            timeout,
            runtime,
        })
    }
}

impl PromptRunner for CliRunner {
    fn run(&self, prompt: &str) -> Result<String> {
        self.runtime
            .block_on(run_provider_cli(self.provider, prompt, &self.model, self.timeout))
    }
}

/// AIランキングの設定
#[derive(Debug, Clone, Copy)]
pub struct AiSettings {
    pub candidate_count: usize,
    pub limits: RateLimits,
    pub fallback_to_keyword: bool,
}

impl AiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            candidate_count: config.ai_candidate_count,
            limits: RateLimits {
                per_hour: config.max_api_calls_per_hour,
                per_day: config.max_api_calls_per_day,
            },
            fallback_to_keyword: config.auto_fallback_keyword,
        }
    }
}

/// AIによるランキング
pub struct AiRanker<P: PromptRunner> {
    runner: P,
    options: MatchOptions,
    settings: AiSettings,
    keyword: KeywordRanker,
    cache: Mutex<ResponseCache>,
    usage: Mutex<UsageLog>,
}

impl<P: PromptRunner> AiRanker<P> {
    pub fn new(
        runner: P,
        options: MatchOptions,
        settings: AiSettings,
        cache: ResponseCache,
        usage: UsageLog,
    ) -> Self {
        let keyword = KeywordRanker::new(options.scoring.clone());
        Self {
            runner,
            options,
            settings,
            keyword,
            cache: Mutex::new(cache),
            usage: Mutex::new(usage),
        }
    }

    /// 保存用にキャッシュと使用量ログを取り出す
    pub fn into_state(self) -> (ResponseCache, UsageLog) {
        let cache = self.cache.into_inner().unwrap_or_else(|e| e.into_inner());
        let usage = self.usage.into_inner().unwrap_or_else(|e| e.into_inner());
        (cache, usage)
    }

    fn rank_with_ai(
        &self,
        heading: &Heading,
        keywords: &[String],
        candidates: &[CandidateImage],
    ) -> Result<Vec<ScoredMatch>> {
        let shortlist =
            shortlist_candidates(keywords, candidates, &self.options, self.settings.candidate_count);
        if shortlist.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_ranking_prompt(heading, &shortlist);
        let hash = prompt_hash(&prompt);

        let cached = {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.get(&hash).map(str::to_string)
        };

        if let Some(response) = cached {
            tracing::debug!(heading = %heading.text, "AI response served from cache");
            return parse_ranking_response(&response, &shortlist)
                .map_err(|e| MatcherError::ApiParse(e.to_string()));
        }

        {
            let mut usage = self.usage.lock().unwrap_or_else(|e| e.into_inner());
            let now = Utc::now();
            usage.check(now, self.settings.limits)?;
            usage.record(now);
        }

        let response = self.runner.run(&prompt)?;
        let matches = parse_ranking_response(&response, &shortlist)
            .map_err(|e| MatcherError::ApiParse(e.to_string()))?;

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(hash, heading.text.clone(), response);

        Ok(matches)
    }
}

impl<P: PromptRunner> Ranker for AiRanker<P> {
    fn rank(
        &self,
        heading: &Heading,
        keywords: &[String],
        candidates: &[CandidateImage],
    ) -> image_matcher_common::Result<Vec<ScoredMatch>> {
        match self.rank_with_ai(heading, keywords, candidates) {
            Ok(matches) => Ok(matches),
            Err(e) if self.settings.fallback_to_keyword => {
                tracing::warn!(heading = %heading.text, error = %e, "AI ranking failed, using keyword matching");
                self.keyword.rank(heading, keywords, candidates)
            }
            Err(e) => Err(image_matcher_common::Error::Ranker(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_matcher_common::{find_matches_with, HeadingTag, MatchMethod, MatchMode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 固定レスポンスを返すランナー
    struct StubRunner {
        response: std::result::Result<String, String>,
        calls: AtomicUsize,
    }

    impl StubRunner {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err("provider offline".to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PromptRunner for StubRunner {
        fn run(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(MatcherError::ApiCall)
        }
    }

    fn settings(fallback: bool) -> AiSettings {
        AiSettings {
            candidate_count: 10,
            limits: RateLimits { per_hour: 50, per_day: 500 },
            fallback_to_keyword: fallback,
        }
    }

    fn options() -> MatchOptions {
        MatchOptions {
            mode: MatchMode::Ai,
            ..MatchOptions::default()
        }
    }

    fn pool() -> Vec<CandidateImage> {
        vec![
            CandidateImage::new(1u64, "garden-spider.jpg"),
            CandidateImage::new(2u64, "IMG_0042.jpg").with_alt("orb weaver on a web"),
        ]
    }

    const RESPONSE: &str = r#"{"matches": [
        {"image_id": 2, "relevance_score": 93, "reasoning": "Orb weavers are garden spiders", "confidence": "high"},
        {"image_id": 1, "relevance_score": 88, "reasoning": "Filename match", "confidence": "high"}
    ]}"#;

    #[test]
    fn test_ai_ranking_used_when_provider_succeeds() {
        let ranker = AiRanker::new(
            StubRunner::ok(RESPONSE),
            options(),
            settings(true),
            ResponseCache::default(),
            UsageLog::default(),
        );

        // キーワードで閾値を超える候補がないため、プール全体がAIに渡る
        let groups = find_matches_with("<h2>Orb Weavers</h2>", &pool(), &options(), &ranker).unwrap();
        let matches = &groups[0].matches;

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].image_id.as_str(), "2");
        assert_eq!(matches[0].match_method, MatchMethod::Ai);
        assert_eq!(matches[0].justification.as_deref(), Some("Orb weavers are garden spiders"));
    }

    #[test]
    fn test_cache_hit_skips_provider_call() {
        let ranker = AiRanker::new(
            StubRunner::ok(RESPONSE),
            options(),
            settings(false),
            ResponseCache::default(),
            UsageLog::default(),
        );
        let heading = Heading::new(HeadingTag::H2, "Garden Spiders", 0);
        let keywords = vec!["garden".to_string(), "spider".to_string()];

        ranker.rank(&heading, &keywords, &pool()).unwrap();
        ranker.rank(&heading, &keywords, &pool()).unwrap();

        assert_eq!(ranker.runner.calls.load(Ordering::SeqCst), 1);
        let (cache, usage) = ranker.into_state();
        assert_eq!(cache.len(), 1);
        assert_eq!(usage.calls_in_last_hour(Utc::now()), 1);
    }

    #[test]
    fn test_failure_falls_back_to_keyword() {
        let ranker = AiRanker::new(
            StubRunner::failing(),
            options(),
            settings(true),
            ResponseCache::default(),
            UsageLog::default(),
        );

        let groups = find_matches_with("<h2>Garden Spider</h2>", &pool(), &options(), &ranker).unwrap();
        let best = groups[0].best().unwrap();
        assert_eq!(best.image_id.as_str(), "1");
        assert_eq!(best.match_method, MatchMethod::Keyword);
    }

    #[test]
    fn test_failure_without_fallback_is_error() {
        let ranker = AiRanker::new(
            StubRunner::failing(),
            options(),
            settings(false),
            ResponseCache::default(),
            UsageLog::default(),
        );

        let result = find_matches_with("<h2>Garden Spider</h2>", &pool(), &options(), &ranker);
        assert!(matches!(result, Err(image_matcher_common::Error::Ranker(_))));
    }

    #[test]
    fn test_rate_limit_blocks_call() {
        let limited = AiSettings {
            limits: RateLimits { per_hour: 0, per_day: 500 },
            ..settings(false)
        };
        let ranker = AiRanker::new(
            StubRunner::ok(RESPONSE),
            options(),
            limited,
            ResponseCache::default(),
            UsageLog::default(),
        );
        let heading = Heading::new(HeadingTag::H2, "Garden Spiders", 0);

        let err = ranker.rank(&heading, &["spider".to_string()], &pool()).unwrap_err();
        assert!(err.to_string().contains("上限"));
        assert_eq!(ranker.runner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unparsable_response_is_not_cached() {
        let ranker = AiRanker::new(
            StubRunner::ok("Sorry, I cannot help with that."),
            options(),
            settings(false),
            ResponseCache::default(),
            UsageLog::default(),
        );
        let heading = Heading::new(HeadingTag::H2, "Garden Spiders", 0);

        assert!(ranker.rank(&heading, &["spider".to_string()], &pool()).is_err());
        let (cache, _) = ranker.into_state();
        assert!(cache.is_empty());
    }
}
