//! Article summarization pipeline on top of an [`LLMProvider`]
//!
//! With event extraction enabled a summary takes two provider calls: one
//! listing the article's key events, one writing the summary from the article,
//! those events, and the optional title and intro.

use std::sync::Arc;
use std::time::Instant;

use super::traits::{CompletionRequest, LLMProvider, Message, ProviderResult};
use crate::config::{BenchmarkConfig, ProviderConfig};
use crate::samples::{GenerationResult, TokenUsage};

/// Upper bound on extracted key events
pub const MAX_EVENTS: usize = 6;

const EVENTS_TEMPERATURE: f32 = 0.2;
const EVENT_BULLETS: &[char] = &[' ', '-', '•', '*', '\t'];

/// Tunables for the summarization pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerOptions {
    pub extract_events: bool,
    pub max_article_chars: usize,
    pub max_output_tokens: u32,
    pub events_temperature: f32,
    pub summary_temperature: f32,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            extract_events: true,
            max_article_chars: 5000,
            max_output_tokens: 2048,
            events_temperature: EVENTS_TEMPERATURE,
            summary_temperature: 0.4,
        }
    }
}

impl SummarizerOptions {
    /// Resolve options for `model`, pinning temperatures for model families
    /// that accept only one value
    pub fn for_model(benchmark: &BenchmarkConfig, provider: &ProviderConfig, model: &str) -> Self {
        Self {
            extract_events: benchmark.extract_events,
            max_article_chars: benchmark.max_article_chars,
            max_output_tokens: provider.max_output_tokens,
            events_temperature: provider.temperature_for(model, EVENTS_TEMPERATURE),
            summary_temperature: provider.temperature_for(model, provider.temperature),
        }
    }
}

/// Generates summaries for one model
pub struct Summarizer {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: SummarizerOptions,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, options: SummarizerOptions) -> Self {
        Self {
            provider,
            model: model.into(),
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn options(&self) -> &SummarizerOptions {
        &self.options
    }

    /// Summarize one article.
    ///
    /// Usage is summed over every call made, with the total derived from
    /// prompt and completion counts when the provider leaves it out. Latency
    /// is wall time around the whole pipeline.
    pub async fn generate(
        &self,
        article: &str,
        title: Option<&str>,
        intro: Option<&str>,
    ) -> ProviderResult<GenerationResult> {
        let start = Instant::now();
        let article = truncate_chars(article, self.options.max_article_chars);

        let mut usage = TokenUsage::default();
        let mut calls = 0u32;
        let mut api_latency_ms = 0u64;

        let events = if self.options.extract_events {
            let prompt = events_prompt(article);
            let response = self.call(prompt, self.options.events_temperature).await?;
            usage = usage.merge(response.usage());
            api_latency_ms += response.latency_ms;
            calls += 1;
            Some(parse_events(&response.content))
        } else {
            None
        };

        let prompt = summary_prompt(article, events.as_deref(), title, intro);
        let response = self.call(prompt, self.options.summary_temperature).await?;
        usage = usage.merge(response.usage());
        api_latency_ms += response.latency_ms;
        calls += 1;

        let api_latency = api_latency_ms as f64 / 1000.0;
        let latency = start.elapsed().as_secs_f64();
        tracing::debug!(
            model = %self.model,
            calls,
            latency_seconds = latency,
            api_latency_seconds = api_latency,
            "Generated summary"
        );

        Ok(GenerationResult::new(response.content.trim())
            .with_usage(usage.with_derived_total())
            .with_latency(latency)
            .with_api_latency(api_latency)
            .with_calls(calls))
    }

    async fn call(&self, prompt: String, temperature: f32) -> ProviderResult<super::CompletionResponse> {
        let request = CompletionRequest::new(vec![Message::user(prompt)], self.options.max_output_tokens)
            .with_model(&self.model)
            .with_temperature(temperature);
        self.provider.complete(&request).await
    }
}

/// Prefix of `input` holding at most `max_chars` characters
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// One event per non-blank line, bullets stripped, at most [`MAX_EVENTS`]
pub fn parse_events(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_matches(EVENT_BULLETS))
        .filter(|line| !line.is_empty())
        .take(MAX_EVENTS)
        .map(String::from)
        .collect()
}

fn events_prompt(article: &str) -> String {
    format!(
        "You are an investigative reporter analysing a single news article in isolation. \
Answer in the language of the article.\n\n\
## TASK\n\
List at most {MAX_EVENTS} key events from the article, one sentence each.\n\n\
## METHOD\n\
- capture what happened, who was involved, where and when if stated,\n\
- no bullets or numbering,\n\
- do not invent facts.\n\n\
## ARTICLE\n\
{article}\n\n\
## OUTPUT\n\
One event per line."
    )
}

fn summary_prompt(article: &str, events: Option<&[String]>, title: Option<&str>, intro: Option<&str>) -> String {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let intro = intro.map(str::trim).filter(|i| !i.is_empty());

    let mut parts = vec![
        "You are a professional news editor working in an isolated session. \
Answer in the language of the article. Write a factual, neutral summary without hallucinations."
            .to_string(),
        "## TASK\nWrite a compact news summary of 3 to 5 sentences covering the most important points."
            .to_string(),
        format!("## ARTICLE\n{article}"),
    ];

    if let Some(events) = events {
        let events_text = if events.is_empty() {
            "- (no key events could be extracted)".to_string()
        } else {
            events
                .iter()
                .map(|event| format!("- {event}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        parts.push(format!("## KEY EVENTS\n{events_text}"));
    }

    if let Some(title) = title {
        parts.push(format!("## TITLE\n{title}"));
    }
    if let Some(intro) = intro {
        parts.push(format!("## INTRO\n{intro}"));
    }

    let closing = match (title, intro) {
        (Some(title), Some(intro)) => {
            format!("- finish with exactly: \"Conclusion: {title}. Intro: {intro}\".")
        }
        _ => "- finish with a sentence that states the title and intro written for the article.".to_string(),
    };

    parts.push(format!(
        "## STRUCTURE\n\
- keep the chronology or logical order of events,\n\
- add no new information,\n\
- use factual wording without judgement,\n\
{closing}"
    ));
    parts.push("## OUTPUT\nContinuous prose.".to_string());

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::providers::{CompletionResponse, ProviderError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned responses and records every request
    struct ScriptedProvider {
        responses: Mutex<Vec<CompletionResponse>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<CompletionResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted-model"
        }

        async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ProviderError::Api {
                    status: 500,
                    message: "script exhausted".to_string(),
                })
        }
    }

    fn reply(content: &str, input: Option<u64>, output: Option<u64>) -> CompletionResponse {
        CompletionResponse {
            content: content.to_string(),
            input_tokens: input,
            output_tokens: output,
            ..Default::default()
        }
    }

    fn timed(response: CompletionResponse, latency_ms: u64) -> CompletionResponse {
        CompletionResponse { latency_ms, ..response }
    }

    #[tokio::test]
    async fn test_two_stage_pipeline() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            timed(reply("- Council met\n\n• Budget passed\n", Some(100), Some(10)), 250),
            timed(reply("  The council passed the budget.  ", Some(150), Some(20)), 500),
        ]));
        let summarizer = Summarizer::new(provider.clone(), "test-model", SummarizerOptions::default());

        let result = summarizer
            .generate("The council met and passed the budget.", Some("Budget"), Some("Vote held"))
            .await
            .unwrap();

        assert_eq!(result.text, "The council passed the budget.");
        assert_eq!(result.calls, 2);
        let usage = result.usage.unwrap();
        assert_eq!(usage.prompt_tokens, Some(250));
        assert_eq!(usage.completion_tokens, Some(30));
        assert_eq!(usage.total_tokens, Some(280));
        assert!(result.latency_seconds.unwrap() >= 0.0);
        assert_eq!(result.api_latency_seconds, Some(0.75));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].temperature, Some(EVENTS_TEMPERATURE));
        assert_eq!(requests[1].model.as_deref(), Some("test-model"));
        let summary_prompt = requests[1].prompt_text();
        assert!(summary_prompt.contains("- Council met\n- Budget passed"));
        assert!(summary_prompt.contains("Conclusion: Budget. Intro: Vote held"));
    }

    #[tokio::test]
    async fn test_single_stage_without_events() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply("Short.", None, None)]));
        let options = SummarizerOptions {
            extract_events: false,
            max_article_chars: 6,
            ..Default::default()
        };
        let summarizer = Summarizer::new(provider.clone(), "m", options);

        let result = summarizer.generate("Článok o rozpočte", None, None).await.unwrap();
        assert_eq!(result.calls, 1);
        assert_eq!(result.usage.unwrap().total_tokens, None);

        let requests = provider.requests.lock().unwrap();
        let prompt = requests[0].prompt_text();
        assert!(prompt.contains("## ARTICLE\nČlánok\n"));
        assert!(!prompt.contains("rozpočte"));
        assert!(!prompt.contains("KEY EVENTS"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply("events", Some(1), Some(1))]));
        let summarizer = Summarizer::new(provider, "m", SummarizerOptions::default());

        let result = summarizer.generate("Body", None, None).await;
        assert!(matches!(result, Err(ProviderError::Api { status: 500, .. })));
    }

    #[test]
    fn test_parse_events() {
        let events = parse_events("- one\n\n* two\n\tthree\n4\n5\n6\n7\n");
        assert_eq!(events.len(), MAX_EVENTS);
        assert_eq!(events[0], "one");
        assert_eq!(events[1], "two");
        assert_eq!(events[2], "three");
        assert!(parse_events("  \n").is_empty());
    }

    #[test]
    fn test_empty_events_placeholder() {
        let prompt = summary_prompt("Body", Some(&[][..]), None, None);
        assert!(prompt.contains("(no key events could be extracted)"));
        assert!(prompt.contains("states the title and intro"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("čšž", 2), "čš");
    }

    #[test]
    fn test_options_pin_temperature() {
        let benchmark = BenchmarkConfig::default();
        let provider = ProviderConfig::defaults_for(ProviderKind::OpenAI);

        let pinned = SummarizerOptions::for_model(&benchmark, &provider, "gpt-5-mini");
        assert_eq!(pinned.events_temperature, 1.0);
        assert_eq!(pinned.summary_temperature, 1.0);

        let free = SummarizerOptions::for_model(&benchmark, &provider, "gpt-4o-mini");
        assert_eq!(free.events_temperature, EVENTS_TEMPERATURE);
        assert_eq!(free.summary_temperature, provider.temperature);
        assert_eq!(free.max_article_chars, benchmark.max_article_chars);
    }
}
