use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Claude,
    Codex,
    Gemini,
}

impl AiProvider {
    pub fn command_name(&self) -> &'static str {
        match self {
            AiProvider::Claude => "claude",
            AiProvider::Codex => "codex",
            AiProvider::Gemini => "gemini",
        }
    }

    /// プロンプトを渡すためのCLI引数
    pub fn command_args(&self, prompt: &str, model: &str) -> Vec<String> {
        match self {
            AiProvider::Claude => vec![
                "-p".into(),
                prompt.into(),
                "--model".into(),
                model.into(),
                "--output-format".into(),
                "text".into(),
            ],
            AiProvider::Codex => vec!["exec".into(), prompt.into()],
            AiProvider::Gemini => vec!["-p".into(), prompt.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_args() {
        let args = AiProvider::Claude.command_args("rank", "claude-sonnet-4-20250514");
        assert_eq!(args[0], "-p");
        assert_eq!(args[1], "rank");
        assert!(args.contains(&"text".to_string()));
        assert!(args.contains(&"claude-sonnet-4-20250514".to_string()));
    }

    #[test]
    fn test_provider_serde_lowercase() {
        let json = serde_json::to_string(&AiProvider::Gemini).unwrap();
        assert_eq!(json, "\"gemini\"");
        let parsed: AiProvider = serde_json::from_str("\"codex\"").unwrap();
        assert_eq!(parsed, AiProvider::Codex);
    }
}
