use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use crate::services::difficulty::Difficulty;
use crate::services::provider::{ModelKind, Provider, ProviderRouter};

/// Produces the short coaching note attached to every attempt. One provider
/// round-trip sequence at most; any failure or blank output falls back to a
/// deterministic templated sentence, so composing never fails and the text
/// is never empty.
#[derive(Clone)]
pub struct FeedbackComposer {
    router: Arc<ProviderRouter>,
    client: reqwest::Client,
}

impl FeedbackComposer {
    pub fn new(router: Arc<ProviderRouter>) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { router, client }
    }

    pub async fn compose(
        &self,
        score: f64,
        topic: &str,
        time_taken: f64,
        attempts: u32,
        predicted_level: Difficulty,
    ) -> String {
        let prompt = build_prompt(score, topic, time_taken, attempts, predicted_level);

        let text = match self.router.active_provider() {
            Provider::OpenAi => self.ask_openai(&prompt).await,
            Provider::Gemini => self.ask_gemini(&prompt).await,
        };

        match text {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => fallback_feedback(score, topic, time_taken, attempts, predicted_level),
        }
    }

    async fn ask_openai(&self, prompt: &str) -> Option<String> {
        let api_key = self.router.api_key(Provider::OpenAi)?;
        let model = self
            .router
            .model_candidates(Provider::OpenAi, ModelKind::General)
            .remove(0);

        let payload = json!({"model": model, "input": prompt});
        let response = self
            .client
            .post(self.router.openai_api_url())
            .timeout(self.router.feedback_timeout())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let body = resp.json::<Value>().await.ok()?;
                Provider::OpenAi.extract_output_text(&body)
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "feedback request rejected");
                None
            }
            Err(err) => {
                warn!(error = %err, "feedback request failed");
                None
            }
        }
    }

    async fn ask_gemini(&self, prompt: &str) -> Option<String> {
        let api_key = self.router.api_key(Provider::Gemini)?;

        for model in self.router.model_candidates(Provider::Gemini, ModelKind::General) {
            let url = format!(
                "{}/models/{}:generateContent?key={}",
                self.router.gemini_api_url(),
                urlencoding::encode(&model),
                urlencoding::encode(api_key),
            );
            let payload = json!({
                "contents": [{"parts": [{"text": prompt}]}],
            });

            let response = self
                .client
                .post(&url)
                .timeout(self.router.feedback_timeout())
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    if let Ok(body) = resp.json::<Value>().await {
                        if let Some(text) = Provider::Gemini.extract_output_text(&body) {
                            return Some(text);
                        }
                    }
                }
                Ok(resp) => {
                    warn!(status = %resp.status(), %model, "gemini feedback model rejected request");
                }
                Err(err) => {
                    warn!(error = %err, %model, "gemini feedback request failed");
                }
            }
            // Next candidate model, immediately, no delay.
        }
        None
    }
}

fn build_prompt(
    score: f64,
    topic: &str,
    time_taken: f64,
    attempts: u32,
    predicted_level: Difficulty,
) -> String {
    [
        "You are a concise, encouraging quiz coach.".to_string(),
        format!("The learner just answered a question on {topic}."),
        format!("Score: {score}/10."),
        format!("Time taken: {time_taken} minutes."),
        format!("Tries: {attempts}."),
        format!("Their next difficulty level is {predicted_level}."),
        "Reply with 1-2 sentences of specific coaching. No lists, no headings.".to_string(),
    ]
    .join("\n")
}

/// Template selected purely by score thresholds; used whenever no provider
/// returns usable text.
fn fallback_feedback(
    score: f64,
    topic: &str,
    time_taken: f64,
    attempts: u32,
    predicted_level: Difficulty,
) -> String {
    if score >= 8.0 {
        format!("Great job on {topic}! You're ready for harder problems. Next level: {predicted_level}.")
    } else if score >= 5.0 {
        format!(
            "Good attempt on {topic}. You took {time_taken} min. Try a few more {predicted_level} questions to strengthen your understanding."
        )
    } else {
        format!(
            "You struggled with {topic} ({attempts} attempt(s)). We've set your next level to {predicted_level}. Revise the basics and try again, you've got this!"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::AiConfig;

    fn composer() -> FeedbackComposer {
        // No credentials configured: compose must take the fallback path
        // without touching the network.
        FeedbackComposer::new(Arc::new(ProviderRouter::new(AiConfig::default())))
    }

    #[tokio::test]
    async fn test_compose_always_returns_text() {
        let text = composer()
            .compose(10.0, "Algorithms", 1.0, 1, Difficulty::Hard)
            .await;
        assert!(!text.is_empty());
        assert!(text.contains("Algorithms"));
    }

    #[test]
    fn test_fallback_bands() {
        let high = fallback_feedback(9.0, "Math", 1.0, 1, Difficulty::Hard);
        assert!(high.starts_with("Great job on Math"));
        assert!(high.contains("hard"));

        let mid = fallback_feedback(5.0, "Math", 3.0, 2, Difficulty::Medium);
        assert!(mid.contains("3 min"));
        assert!(mid.contains("medium"));

        let low = fallback_feedback(4.0, "Math", 6.0, 3, Difficulty::Easy);
        assert!(low.contains("3 attempt(s)"));
        assert!(low.contains("easy"));
    }

    #[tokio::test]
    async fn test_compose_mentions_attempts_on_low_scores() {
        let text = composer()
            .compose(4.0, "History", 2.0, 4, Difficulty::Easy)
            .await;
        assert!(text.contains("4 attempt(s)"));
    }
}
