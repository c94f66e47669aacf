use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::services::difficulty::Difficulty;
use crate::services::provider::{ModelKind, Provider, ProviderRouter};

const MAX_QUESTIONS_PER_BATCH: usize = 15;

/// A model-produced MCQ that survived normalization. Same shape as a bank
/// question, plus an optional explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

/// Best-effort question source backed by a generative text provider.
/// Returns fewer than requested, or nothing, on any upstream failure; it
/// never surfaces an error to the caller.
#[derive(Clone)]
pub struct QuestionGenerator {
    router: Arc<ProviderRouter>,
    client: reqwest::Client,
}

impl QuestionGenerator {
    pub fn new(router: Arc<ProviderRouter>) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { router, client }
    }

    pub async fn generate(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<GeneratedQuestion> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Vec::new();
        }
        let count = count.clamp(1, MAX_QUESTIONS_PER_BATCH);

        let raw = match self.router.active_provider() {
            Provider::OpenAi => self.fetch_from_openai(topic, difficulty, count).await,
            Provider::Gemini => self.fetch_from_gemini(topic, difficulty, count).await,
        };

        let mut questions: Vec<GeneratedQuestion> = raw
            .iter()
            .filter_map(|item| normalize_question(item, topic, difficulty))
            .collect();
        questions.truncate(count);
        questions
    }

    async fn fetch_from_openai(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<Value> {
        let Some(api_key) = self.router.api_key(Provider::OpenAi) else {
            return Vec::new();
        };
        let model = self
            .router
            .model_candidates(Provider::OpenAi, ModelKind::Question)
            .remove(0);

        let payload = json!({
            "model": model,
            "input": build_prompt(topic, difficulty, count),
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "quiz_questions",
                    "schema": question_batch_schema(count),
                }
            }
        });

        let response = self
            .client
            .post(self.router.openai_api_url())
            .timeout(self.router.question_timeout())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), "question generation request rejected");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %err, "question generation request failed");
                return Vec::new();
            }
        };

        let Ok(body) = response.json::<Value>().await else {
            return Vec::new();
        };
        extract_questions(Provider::OpenAi, &body)
    }

    async fn fetch_from_gemini(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<Value> {
        let Some(api_key) = self.router.api_key(Provider::Gemini) else {
            return Vec::new();
        };
        let prompt = build_prompt(topic, difficulty, count);

        for model in self.router.model_candidates(Provider::Gemini, ModelKind::Question) {
            let url = format!(
                "{}/models/{}:generateContent?key={}",
                self.router.gemini_api_url(),
                urlencoding::encode(&model),
                urlencoding::encode(api_key),
            );
            let payload = json!({
                "contents": [{"parts": [{"text": prompt}]}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "temperature": 0.4,
                    "maxOutputTokens": 4096,
                }
            });

            let response = self
                .client
                .post(&url)
                .timeout(self.router.question_timeout())
                .json(&payload)
                .send()
                .await;

            let body = match response {
                Ok(resp) if resp.status().is_success() => resp.json::<Value>().await.ok(),
                Ok(resp) => {
                    warn!(status = %resp.status(), %model, "gemini model rejected request");
                    None
                }
                Err(err) => {
                    warn!(error = %err, %model, "gemini request failed");
                    None
                }
            };

            if let Some(body) = body {
                let questions = extract_questions(Provider::Gemini, &body);
                if !questions.is_empty() {
                    return questions;
                }
            }
            // Fall through to the next model candidate.
        }

        Vec::new()
    }
}

fn build_prompt(topic: &str, difficulty: Difficulty, count: usize) -> String {
    [
        "Generate quiz questions as strict JSON.".to_string(),
        format!("Subject: {topic}"),
        format!("Difficulty: {difficulty}"),
        format!("Count: {count}"),
        "Only MCQ format is allowed.".to_string(),
        "Each question must have exactly 4 options.".to_string(),
        "The correctAnswer must exactly match one option.".to_string(),
        "Return concise explanation for each question.".to_string(),
        "Return this exact JSON shape:".to_string(),
        r#"{"questions":[{"questionText":"...","options":["...","...","...","..."],"correctAnswer":"...","explanation":"..."}]}"#
            .to_string(),
        "Do not include markdown, prose, numbering, or extra keys.".to_string(),
    ]
    .join("\n")
}

fn question_batch_schema(count: usize) -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["questions"],
        "properties": {
            "questions": {
                "type": "array",
                "minItems": count,
                "maxItems": count,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["questionText", "options", "correctAnswer", "explanation"],
                    "properties": {
                        "questionText": {"type": "string"},
                        "options": {
                            "type": "array",
                            "minItems": 4,
                            "maxItems": 4,
                            "items": {"type": "string"},
                        },
                        "correctAnswer": {"type": "string"},
                        "explanation": {"type": "string"},
                    },
                },
            },
        },
    })
}

fn extract_questions(provider: Provider, body: &Value) -> Vec<Value> {
    let Some(text) = provider.extract_output_text(body) else {
        return Vec::new();
    };
    let Some(parsed) = parse_json_object(&text) else {
        return Vec::new();
    };
    parsed
        .get("questions")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Parses model output as JSON with a three-stage fallback: as-is, with
/// Markdown code fences stripped, then the outermost `{...}` span.
pub(crate) fn parse_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let without_fences = strip_code_fences(trimmed);
    if let Ok(value) = serde_json::from_str::<Value>(&without_fences) {
        return Some(value);
    }

    let start = without_fences.find('{')?;
    let end = without_fences.rfind('}')?;
    if end > start {
        if let Ok(value) = serde_json::from_str::<Value>(&without_fences[start..=end]) {
            return Some(value);
        }
    }
    None
}

fn strip_code_fences(text: &str) -> String {
    let mut out = text.trim();
    for prefix in ["```json", "```JSON", "```"] {
        if let Some(rest) = out.strip_prefix(prefix) {
            out = rest.trim_start();
            break;
        }
    }
    if let Some(rest) = out.strip_suffix("```") {
        out = rest.trim_end();
    }
    out.to_string()
}

/// Normalizes one raw model item: trims fields, deduplicates and truncates
/// options to 4, and repairs a correct answer that differs from an option
/// only in letter case. Rejects anything that still violates the
/// one-correct-answer invariant.
pub(crate) fn normalize_question(
    raw: &Value,
    topic: &str,
    difficulty: Difficulty,
) -> Option<GeneratedQuestion> {
    let question_text = raw
        .get("questionText")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or_default();
    if question_text.is_empty() {
        return None;
    }

    let mut options: Vec<String> = Vec::new();
    for option in raw.get("options").and_then(|v| v.as_array())? {
        let text = option.as_str().map(str::trim).unwrap_or_default();
        if text.is_empty() || options.iter().any(|existing| existing == text) {
            continue;
        }
        options.push(text.to_string());
    }
    options.truncate(4);
    if options.len() < 4 {
        return None;
    }

    let mut correct_answer = raw
        .get("correctAnswer")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if !options.contains(&correct_answer) {
        correct_answer = options
            .iter()
            .find(|opt| opt.eq_ignore_ascii_case(&correct_answer))
            .cloned()
            .unwrap_or_default();
    }
    if correct_answer.is_empty() || !options.contains(&correct_answer) {
        return None;
    }

    let explanation = raw
        .get("explanation")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(GeneratedQuestion {
        topic: topic.to_string(),
        difficulty,
        question_text: question_text.to_string(),
        options,
        correct_answer,
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let parsed = parse_json_object(r#"{"questions":[]}"#).unwrap();
        assert!(parsed.get("questions").is_some());
    }

    #[test]
    fn test_parse_strips_markdown_fences() {
        let text = "```json\n{\"questions\":[{\"questionText\":\"q\"}]}\n```";
        let parsed = parse_json_object(text).unwrap();
        assert_eq!(parsed["questions"][0]["questionText"], "q");
    }

    #[test]
    fn test_parse_recovers_embedded_object() {
        let text = "Here is your quiz: {\"questions\":[]} hope it helps";
        assert!(parse_json_object(text).is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_json_object("no json here").is_none());
        assert!(parse_json_object("").is_none());
    }

    #[test]
    fn test_normalize_truncates_extra_options_and_repairs_case() {
        let raw = json!({
            "questionText": "Pick one",
            "options": ["Alpha", "Beta", "Gamma", "Delta", "Epsilon"],
            "correctAnswer": "alpha",
        });
        let q = normalize_question(&raw, "Science", Difficulty::Medium).unwrap();
        assert_eq!(q.options, vec!["Alpha", "Beta", "Gamma", "Delta"]);
        assert_eq!(q.correct_answer, "Alpha");
        assert_eq!(q.explanation, None);
    }

    #[test]
    fn test_normalize_rejects_too_few_options() {
        let raw = json!({
            "questionText": "Pick one",
            "options": ["A", "B", "C"],
            "correctAnswer": "A",
        });
        assert!(normalize_question(&raw, "Science", Difficulty::Easy).is_none());
    }

    #[test]
    fn test_normalize_rejects_duplicate_padding() {
        // Duplicates collapse, leaving fewer than 4 distinct options.
        let raw = json!({
            "questionText": "Pick one",
            "options": ["A", "A", "B", "C"],
            "correctAnswer": "A",
        });
        assert!(normalize_question(&raw, "Science", Difficulty::Easy).is_none());
    }

    #[test]
    fn test_normalize_rejects_unmatched_answer() {
        let raw = json!({
            "questionText": "Pick one",
            "options": ["A", "B", "C", "D"],
            "correctAnswer": "E",
        });
        assert!(normalize_question(&raw, "Science", Difficulty::Hard).is_none());
    }

    #[test]
    fn test_normalize_keeps_explanation() {
        let raw = json!({
            "questionText": "Pick one",
            "options": ["A", "B", "C", "D"],
            "correctAnswer": "B",
            "explanation": " because ",
        });
        let q = normalize_question(&raw, "Math", Difficulty::Easy).unwrap();
        assert_eq!(q.explanation.as_deref(), Some("because"));
    }
}
