use std::time::Duration;

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/responses";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODELS: [&str; 3] =
    ["gemini-flash-latest", "gemini-2.0-flash", "gemini-2.5-flash"];

const DEFAULT_QUESTION_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_FEEDBACK_TIMEOUT_MS: u64 = 9_000;

/// External text-generation backend. Also owns the per-provider response
/// shape: OpenAI nests output text under `output`/`output_text`, Gemini
/// under `candidates[0].content.parts[0].text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "gemini" => Some(Provider::Gemini),
            _ => None,
        }
    }

    /// Pulls the generated text out of a raw provider response body.
    pub fn extract_output_text(&self, payload: &serde_json::Value) -> Option<String> {
        match self {
            Provider::OpenAi => extract_openai_output_text(payload),
            Provider::Gemini => extract_gemini_output_text(payload),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    General,
    Question,
}

/// Explicit provider configuration. Built once from the environment at boot
/// and passed into the services that need it; nothing in the pipeline reads
/// env vars ambiently.
#[derive(Debug, Clone, Default)]
pub struct AiConfig {
    pub provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_url: Option<String>,
    pub openai_model: Option<String>,
    pub openai_question_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_question_model: Option<String>,
    pub question_timeout_ms: Option<u64>,
    pub feedback_timeout_ms: Option<u64>,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            provider: env_string("AI_PROVIDER"),
            openai_api_key: env_string("OPENAI_API_KEY"),
            openai_api_url: env_string("OPENAI_API_URL"),
            openai_model: env_string("OPENAI_MODEL"),
            openai_question_model: env_string("OPENAI_QUESTION_MODEL"),
            gemini_api_key: env_string("GEMINI_API_KEY"),
            gemini_api_url: env_string("GEMINI_API_URL"),
            gemini_model: env_string("GEMINI_MODEL"),
            gemini_question_model: env_string("GEMINI_QUESTION_MODEL"),
            question_timeout_ms: env_u64("AI_QUESTION_TIMEOUT_MS"),
            feedback_timeout_ms: env_u64("AI_FEEDBACK_TIMEOUT_MS"),
        }
    }
}

/// Resolves which provider is active and which model ids to try, in
/// priority order.
#[derive(Debug, Clone)]
pub struct ProviderRouter {
    config: AiConfig,
}

impl ProviderRouter {
    pub fn new(config: AiConfig) -> Self {
        Self { config }
    }

    /// Explicit configuration wins when recognized; otherwise Gemini is
    /// auto-picked when only a Gemini credential is configured; the default
    /// is OpenAI.
    pub fn active_provider(&self) -> Provider {
        if let Some(provider) = self.config.provider.as_deref().and_then(Provider::parse) {
            return provider;
        }
        if self.config.gemini_api_key.is_some() && self.config.openai_api_key.is_none() {
            return Provider::Gemini;
        }
        Provider::OpenAi
    }

    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.config.openai_api_key.as_deref(),
            Provider::Gemini => self.config.gemini_api_key.as_deref(),
        }
    }

    pub fn openai_api_url(&self) -> &str {
        self.config
            .openai_api_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_API_URL)
    }

    pub fn gemini_api_url(&self) -> &str {
        self.config
            .gemini_api_url
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_API_URL)
    }

    /// Deduplicated model ids to try, most-specific-configured first, ending
    /// in the built-in defaults. Never empty.
    pub fn model_candidates(&self, provider: Provider, kind: ModelKind) -> Vec<String> {
        let candidates: Vec<Option<&str>> = match provider {
            Provider::OpenAi => {
                let preferred = match kind {
                    ModelKind::Question => self.config.openai_question_model.as_deref(),
                    ModelKind::General => self.config.openai_model.as_deref(),
                };
                vec![
                    preferred,
                    self.config.openai_model.as_deref(),
                    Some(DEFAULT_OPENAI_MODEL),
                ]
            }
            Provider::Gemini => {
                let preferred = match kind {
                    ModelKind::Question => self.config.gemini_question_model.as_deref(),
                    ModelKind::General => self.config.gemini_model.as_deref(),
                };
                let mut list = vec![
                    preferred,
                    self.config.gemini_model.as_deref(),
                    self.config.gemini_question_model.as_deref(),
                ];
                list.extend(DEFAULT_GEMINI_MODELS.iter().map(|m| Some(*m)));
                list
            }
        };
        unique_non_empty(candidates)
    }

    pub fn question_timeout(&self) -> Duration {
        Duration::from_millis(
            self.config
                .question_timeout_ms
                .unwrap_or(DEFAULT_QUESTION_TIMEOUT_MS),
        )
    }

    pub fn feedback_timeout(&self) -> Duration {
        Duration::from_millis(
            self.config
                .feedback_timeout_ms
                .unwrap_or(DEFAULT_FEEDBACK_TIMEOUT_MS),
        )
    }
}

fn unique_non_empty(candidates: Vec<Option<&str>>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates.into_iter().flatten() {
        let value = candidate.trim();
        if value.is_empty() || !seen.insert(value.to_string()) {
            continue;
        }
        out.push(value.to_string());
    }
    out
}

fn extract_openai_output_text(payload: &serde_json::Value) -> Option<String> {
    if let Some(text) = payload.get("output_text").and_then(|v| v.as_str()) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    for item in payload.get("output")?.as_array()? {
        let Some(content) = item.get("content").and_then(|v| v.as_array()) else {
            continue;
        };
        for block in content {
            if let Some(text) = block.get("text").and_then(|v| v.as_str()) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

fn extract_gemini_output_text(payload: &serde_json::Value) -> Option<String> {
    let text = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()?
        .trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn router(config: AiConfig) -> ProviderRouter {
        ProviderRouter::new(config)
    }

    #[test]
    fn test_explicit_provider_wins() {
        let r = router(AiConfig {
            provider: Some("gemini".into()),
            openai_api_key: Some("sk-x".into()),
            ..AiConfig::default()
        });
        assert_eq!(r.active_provider(), Provider::Gemini);
    }

    #[test]
    fn test_unrecognized_provider_falls_through() {
        let r = router(AiConfig {
            provider: Some("mistral".into()),
            ..AiConfig::default()
        });
        assert_eq!(r.active_provider(), Provider::OpenAi);
    }

    #[test]
    fn test_gemini_key_only_auto_picks_gemini() {
        let r = router(AiConfig {
            gemini_api_key: Some("g-x".into()),
            ..AiConfig::default()
        });
        assert_eq!(r.active_provider(), Provider::Gemini);

        let both = router(AiConfig {
            gemini_api_key: Some("g-x".into()),
            openai_api_key: Some("sk-x".into()),
            ..AiConfig::default()
        });
        assert_eq!(both.active_provider(), Provider::OpenAi);
    }

    #[test]
    fn test_gemini_candidates_are_ordered_and_deduplicated() {
        let r = router(AiConfig {
            gemini_model: Some("gemini-2.0-flash".into()),
            gemini_question_model: Some("gemini-exp".into()),
            ..AiConfig::default()
        });
        let candidates = r.model_candidates(Provider::Gemini, ModelKind::Question);
        assert_eq!(
            candidates,
            vec![
                "gemini-exp",
                "gemini-2.0-flash",
                "gemini-flash-latest",
                "gemini-2.5-flash",
            ]
        );
    }

    #[test]
    fn test_candidates_never_empty() {
        let r = router(AiConfig::default());
        assert!(!r.model_candidates(Provider::OpenAi, ModelKind::General).is_empty());
        assert!(!r.model_candidates(Provider::Gemini, ModelKind::Question).is_empty());
    }

    #[test]
    fn test_openai_output_text_extraction() {
        let direct = json!({"output_text": "  hello "});
        assert_eq!(
            Provider::OpenAi.extract_output_text(&direct).as_deref(),
            Some("hello")
        );

        let nested = json!({
            "output": [
                {"content": []},
                {"content": [{"type": "output_text", "text": "from blocks"}]}
            ]
        });
        assert_eq!(
            Provider::OpenAi.extract_output_text(&nested).as_deref(),
            Some("from blocks")
        );

        assert_eq!(Provider::OpenAi.extract_output_text(&json!({})), None);
    }

    #[test]
    fn test_gemini_output_text_extraction() {
        let payload = json!({
            "candidates": [
                {"content": {"parts": [{"text": " answer "}]}}
            ]
        });
        assert_eq!(
            Provider::Gemini.extract_output_text(&payload).as_deref(),
            Some("answer")
        );
        assert_eq!(Provider::Gemini.extract_output_text(&json!({"candidates": []})), None);
    }
}
