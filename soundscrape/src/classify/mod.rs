//! Batch classification of raw audio titles into song records.

pub mod gemini;

use crate::configuration::Configuration;
use crate::error::ScrapeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A text generation backend. One prompt in, one completion out.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> ScrapeResult<String>;
    /// The model identifier in use.
    fn model_name(&self) -> &str;
    /// Whether the backend has credentials configured.
    fn is_configured(&self) -> bool;
}

/// One classified title. Exactly one record exists per input title,
/// even when the request or the response parse failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub original_title: String,
    #[serde(default)]
    pub is_real_song: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_remix: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cover: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub parse_error: bool,
}

impl ClassificationRecord {
    /// Placeholder for a title whose batch response failed to parse.
    pub fn parse_failure(title: &str) -> Self {
        Self {
            original_title: title.to_string(),
            is_real_song: None,
            song_name: None,
            artist: None,
            is_remix: None,
            is_cover: None,
            confidence: None,
            notes: None,
            error: None,
            parse_error: true,
        }
    }

    /// Placeholder for a title whose batch request failed outright.
    pub fn request_failure(title: &str, error: &str) -> Self {
        Self {
            original_title: title.to_string(),
            is_real_song: None,
            song_name: None,
            artist: None,
            is_remix: None,
            is_cover: None,
            confidence: None,
            notes: None,
            error: Some(error.to_string()),
            parse_error: false,
        }
    }

    /// Whether the model marked this as a real song.
    pub fn is_real(&self) -> bool {
        self.is_real_song == Some(true)
    }
}

/// Runs titles through a [`TextModel`] in fixed-size batches.
pub struct Classifier<'a> {
    model: &'a dyn TextModel,
    batch_size: usize,
    batch_delay: Duration,
}

impl<'a> Classifier<'a> {
    pub fn new(model: &'a dyn TextModel) -> Self {
        Self {
            model,
            batch_size: 20,
            batch_delay: Duration::from_secs(1),
        }
    }

    /// Build a classifier with the batch shape a [`Configuration`]
    /// carries.
    pub fn from_config(model: &'a dyn TextModel, config: &Configuration) -> Self {
        Self {
            model,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Classify every title. The output always has exactly one record
    /// per input title, in input order. Batches are sent sequentially
    /// with a delay between them for rate limiting.
    pub async fn classify(&self, titles: &[String]) -> Vec<ClassificationRecord> {
        let mut records = Vec::with_capacity(titles.len());
        let total_batches = titles.len().div_ceil(self.batch_size);

        for (batch_index, batch) in titles.chunks(self.batch_size).enumerate() {
            log::info!(
                "classifying batch {}/{} ({} titles) with {}",
                batch_index + 1,
                total_batches,
                batch.len(),
                self.model.model_name()
            );

            match self.model.generate(&build_prompt(batch)).await {
                Ok(response) => {
                    let parsed = parse_batch(&response, batch);
                    let real = parsed.iter().filter(|r| r.is_real()).count();
                    log::info!("batch {}: {} real songs", batch_index + 1, real);
                    records.extend(parsed);
                }
                Err(e) => {
                    log::warn!("batch {} failed: {}", batch_index + 1, e);
                    let message = e.to_string();
                    records.extend(
                        batch
                            .iter()
                            .map(|t| ClassificationRecord::request_failure(t, &message)),
                    );
                }
            }

            if batch_index + 1 < total_batches {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        records
    }
}

/// Build the classification prompt for one batch.
pub(crate) fn build_prompt(titles: &[String]) -> String {
    let numbered = titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze these TikTok audio titles and identify which ones are real songs (not user-created original sounds).

For each title, determine:
1. Is it a real song? (not "original sound" by a random user)
2. If it's a real song, provide the correct song name and artist
3. If the title contains lyrics, try to identify the actual song
4. Note if it's a remix, cover, or mashup

TikTok Audio Titles:
{numbered}

Respond in JSON format as a list of objects:
[
  {{
    "original_title": "the original title",
    "is_real_song": true/false,
    "song_name": "Actual Song Name" or null,
    "artist": "Artist Name" or null,
    "is_remix": true/false,
    "is_cover": true/false,
    "confidence": "high/medium/low",
    "notes": "any relevant notes"
  }}
]

Important rules:
- "original sound - [username]" entries are NOT real songs (is_real_song: false)
- Songs with real artist names in the title ARE real songs
- If you recognize lyrics, identify the actual song
- Be somewhat liberal - if you think it could be a real song, mark it as such, but use confidence levels to indicate uncertainty
- Return ONLY valid JSON, no other text"#
    )
}

/// Strip a markdown code fence around a JSON payload, if present.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with("```") {
        return text;
    }
    let inner = match text.find('\n') {
        Some(pos) => &text[pos + 1..],
        None => return text,
    };
    inner.trim_end().trim_end_matches("```").trim_end()
}

/// Parse a batch response into records aligned with the input titles.
///
/// When the model returns one record per title the output order is
/// trusted, with `original_title` overwritten by the input so a
/// paraphrasing model cannot desync the pipeline. On a count mismatch
/// records are realigned by exact title match and the gaps filled with
/// parse-failure placeholders.
pub(crate) fn parse_batch(response: &str, titles: &[String]) -> Vec<ClassificationRecord> {
    let payload = strip_code_fence(response);

    let parsed: Vec<ClassificationRecord> = match serde_json::from_str(payload) {
        Ok(records) => records,
        Err(e) => {
            log::warn!("response was not valid JSON: {}", e);
            return titles
                .iter()
                .map(|t| ClassificationRecord::parse_failure(t))
                .collect();
        }
    };

    if parsed.len() == titles.len() {
        return parsed
            .into_iter()
            .zip(titles)
            .map(|(mut record, title)| {
                record.original_title = title.clone();
                record
            })
            .collect();
    }

    log::warn!(
        "model returned {} records for {} titles, realigning by title",
        parsed.len(),
        titles.len()
    );

    titles
        .iter()
        .map(|title| {
            parsed
                .iter()
                .find(|r| r.original_title == *title)
                .cloned()
                .unwrap_or_else(|| ClassificationRecord::parse_failure(title))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves canned responses in order; errors once out of responses.
    struct CannedModel {
        responses: Mutex<Vec<String>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(responses: Vec<&str>) -> Self {
            let mut responses: Vec<String> = responses.into_iter().map(Into::into).collect();
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextModel for CannedModel {
        async fn generate(&self, prompt: &str) -> ScrapeResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.responses.lock().unwrap().pop() {
                Some(response) => Ok(response),
                None => Err(ScrapeError::Llm("model unavailable".into())),
            }
        }

        fn model_name(&self) -> &str {
            "canned"
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn record_json(title: &str, real: bool, song: Option<&str>) -> String {
        serde_json::json!({
            "original_title": title,
            "is_real_song": real,
            "song_name": song,
            "artist": song.map(|_| "Artist"),
            "is_remix": false,
            "is_cover": false,
            "confidence": "high",
            "notes": ""
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_happy_path_classification() {
        let response = format!(
            "[{},{}]",
            record_json("Song A - Artist", true, Some("Song A")),
            record_json("original sound - user", false, None)
        );
        let model = CannedModel::new(vec![&response]);
        let input = titles(&["Song A - Artist", "original sound - user"]);

        let records = Classifier::new(&model).classify(&input).await;

        assert_eq!(records.len(), 2);
        assert!(records[0].is_real());
        assert_eq!(records[0].song_name.as_deref(), Some("Song A"));
        assert!(!records[1].is_real());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batching_splits_by_size() {
        let batch: Vec<String> = (0..3).map(|i| record_json(&format!("t{}", i), false, None)).collect();
        let first = format!("[{}]", batch.join(","));
        let second = format!("[{}]", record_json("t3", false, None));
        let model = CannedModel::new(vec![&first, &second]);
        let input = titles(&["t0", "t1", "t2", "t3"]);

        let records = Classifier::new(&model)
            .with_batch_size(3)
            .with_batch_delay(Duration::from_millis(1))
            .classify(&input)
            .await;

        assert_eq!(records.len(), 4);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("1. t0"));
        assert!(prompts[0].contains("3. t2"));
        assert!(prompts[1].contains("1. t3"));
    }

    #[tokio::test]
    async fn test_from_config_batch_shape() {
        let batch: Vec<String> = (0..2).map(|i| record_json(&format!("t{}", i), false, None)).collect();
        let first = format!("[{}]", batch.join(","));
        let second = format!("[{}]", record_json("t2", false, None));
        let model = CannedModel::new(vec![&first, &second]);

        let config = Configuration::new()
            .with_batch_size(2)
            .with_batch_delay(Duration::from_millis(1))
            .build();
        let records = Classifier::from_config(&model, &config)
            .classify(&titles(&["t0", "t1", "t2"]))
            .await;

        assert_eq!(records.len(), 3);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_request_failure_keeps_count() {
        let model = CannedModel::new(vec![]);
        let input: Vec<String> = (0..20).map(|i| format!("title {}", i)).collect();

        let records = Classifier::new(&model).classify(&input).await;

        assert_eq!(records.len(), 20);
        for (record, title) in records.iter().zip(&input) {
            assert_eq!(&record.original_title, title);
            assert_eq!(record.is_real_song, None);
            assert!(record.error.as_deref().unwrap().contains("model unavailable"));
        }
    }

    #[tokio::test]
    async fn test_unparseable_response_marks_parse_error() {
        let model = CannedModel::new(vec!["I could not process that."]);
        let input = titles(&["a", "b"]);

        let records = Classifier::new(&model).classify(&input).await;

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.parse_error));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  ```json\n[1,\n2]\n```  "), "[1,\n2]");
    }

    #[test]
    fn test_parse_batch_fenced_and_bare_agree() {
        let input = titles(&["Song A - Artist"]);
        let bare = format!("[{}]", record_json("Song A - Artist", true, Some("Song A")));
        let fenced = format!("```json\n{}\n```", bare);
        assert_eq!(parse_batch(&bare, &input), parse_batch(&fenced, &input));
    }

    #[test]
    fn test_parse_batch_overwrites_paraphrased_titles() {
        let input = titles(&["Song A - Artist"]);
        let response = format!("[{}]", record_json("song a by artist", true, Some("Song A")));
        let records = parse_batch(&response, &input);
        assert_eq!(records[0].original_title, "Song A - Artist");
    }

    #[test]
    fn test_parse_batch_realigns_on_count_mismatch() {
        let input = titles(&["a", "b", "c"]);
        let response = format!(
            "[{},{}]",
            record_json("c", true, Some("C Song")),
            record_json("a", false, None)
        );
        let records = parse_batch(&response, &input);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].original_title, "a");
        assert!(!records[0].is_real());
        assert!(records[1].parse_error);
        assert_eq!(records[2].song_name.as_deref(), Some("C Song"));
    }

    #[test]
    fn test_prompt_numbers_titles() {
        let prompt = build_prompt(&titles(&["first", "second"]));
        assert!(prompt.contains("1. first"));
        assert!(prompt.contains("2. second"));
        assert!(prompt.contains("ONLY valid JSON"));
    }
}
