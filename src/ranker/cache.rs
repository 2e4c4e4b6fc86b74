//! AIレスポンスキャッシュ・API使用量ログ
//!
//! プロンプトのSHA-256をキーにしてレスポンスをキャッシュし、
//! 同じ見出し・候補の組み合わせでの再呼び出しをスキップする。
//! 使用量ログは直近の呼び出し時刻を保持し、時間・日あたりの上限を判定する。

use crate::error::{MatcherError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".image-matcher-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseCache {
    /// バージョン（互換性チェック用）
    version: u32,
    /// プロンプトハッシュ → レスポンス
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 見出しテキスト
    pub heading: String,
    /// AIの生レスポンス
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl ResponseCache {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（読めなければ空）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, ResponseCache>(reader) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(_) => {
                tracing::warn!(path = %cache_path.display(), "cache version mismatch, starting fresh");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "unreadable cache, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければfalse）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn get(&self, hash: &str) -> Option<&str> {
        self.entries.get(hash).map(|e| e.response.as_str())
    }

    pub fn insert(&mut self, hash: String, heading: String, response: String) {
        self.entries.insert(
            hash,
            CacheEntry {
                heading,
                response,
                created_at: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// プロンプトのハッシュ（SHA-256, hex）
pub fn prompt_hash(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

/// API呼び出しの上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub per_hour: u32,
    pub per_day: u32,
}

/// API使用量ログ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageLog {
    calls: Vec<DateTime<Utc>>,
}

impl UsageLog {
    /// 既定の保存先（設定ファイルと同じフォルダ）
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MatcherError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("image-matcher").join("usage.json"))
    }

    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn calls_since(&self, since: DateTime<Utc>) -> u32 {
        self.calls.iter().filter(|&&t| t > since).count() as u32
    }

    pub fn calls_in_last_hour(&self, now: DateTime<Utc>) -> u32 {
        self.calls_since(now - Duration::hours(1))
    }

    pub fn calls_in_last_day(&self, now: DateTime<Utc>) -> u32 {
        self.calls_since(now - Duration::days(1))
    }

    /// 上限に達していればエラー
    pub fn check(&self, now: DateTime<Utc>, limits: RateLimits) -> Result<()> {
        if self.calls_in_last_hour(now) >= limits.per_hour {
            return Err(MatcherError::RateLimited(format!(
                "1時間あたり{}回",
                limits.per_hour
            )));
        }
        if self.calls_in_last_day(now) >= limits.per_day {
            return Err(MatcherError::RateLimited(format!("1日あたり{}回", limits.per_day)));
        }
        Ok(())
    }

    /// 呼び出しを記録し、24時間より古い記録を捨てる
    pub fn record(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(1);
        self.calls.retain(|&t| t > cutoff);
        self.calls.push(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_hash_is_stable_hex() {
        let a = prompt_hash("Given heading: \"Moths\"");
        let b = prompt_hash("Given heading: \"Moths\"");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, prompt_hash("Given heading: \"Spiders\""));
    }

    #[test]
    fn test_usage_log_hourly_limit() {
        let now = Utc::now();
        let limits = RateLimits { per_hour: 2, per_day: 10 };
        let mut log = UsageLog::default();

        log.record(now - Duration::minutes(30));
        assert!(log.check(now, limits).is_ok());

        log.record(now - Duration::minutes(10));
        assert!(matches!(log.check(now, limits), Err(MatcherError::RateLimited(_))));

        // 1時間経過後は再び呼び出せる
        assert!(log.check(now + Duration::minutes(45), limits).is_ok());
    }

    #[test]
    fn test_usage_log_daily_limit() {
        let now = Utc::now();
        let limits = RateLimits { per_hour: 50, per_day: 3 };
        let mut log = UsageLog::default();
        for hours_ago in [20, 10, 5] {
            log.record(now - Duration::hours(hours_ago));
        }

        let err = log.check(now, limits).unwrap_err();
        assert!(err.to_string().contains("1日あたり3回"));
    }

    #[test]
    fn test_usage_log_record_prunes_old_calls() {
        let now = Utc::now();
        let mut log = UsageLog::default();
        log.record(now - Duration::days(3));
        log.record(now);

        assert_eq!(log.calls.len(), 1);
        assert_eq!(log.calls_in_last_day(now), 1);
    }
}
