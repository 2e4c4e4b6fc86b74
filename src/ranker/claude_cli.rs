//! AIプロバイダCLI連携
//!
//! プロンプトをCLI（claude / codex / gemini）に渡し、標準出力を返す。
//! 応答がタイムアウトした場合はプロセスを終了させる。

use crate::ai_provider::AiProvider;
use crate::error::{MatcherError, Result};
use std::time::Duration;
use tokio::process::Command;

/// CLIを実行してレスポンス文字列を返す
pub async fn run_provider_cli(
    provider: AiProvider,
    prompt: &str,
    model: &str,
    timeout: Duration,
) -> Result<String> {
    let args = provider.command_args(prompt, model);

    // Windowsではcmd /c経由
    #[cfg(windows)]
    let mut command = {
        let mut c = Command::new("cmd");
        c.arg("/c").arg(provider.command_name()).args(&args);
        c
    };

    #[cfg(not(windows))]
    let mut command = {
        let mut c = Command::new(provider.command_name());
        c.args(&args);
        c
    };

    command.kill_on_drop(true);

    tracing::debug!(
        provider = provider.command_name(),
        prompt_len = prompt.len(),
        "calling AI provider"
    );

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| {
            MatcherError::ApiCall(format!(
                "{} CLIが{}秒以内に応答しませんでした",
                provider.command_name(),
                timeout.as_secs()
            ))
        })?
        .map_err(|e| MatcherError::ApiCall(format!("{} CLI実行エラー: {}", provider.command_name(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MatcherError::ApiCall(format!(
            "{} CLI failed (code {:?}): {}",
            provider.command_name(),
            output.status.code(),
            stderr.trim()
        )));
    }

    let response = String::from_utf8_lossy(&output.stdout).to_string();
    let preview: String = response.chars().take(500).collect();
    tracing::debug!(response_len = response.len(), preview = %preview, "AI provider responded");

    Ok(response)
}
