use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::LessonError;
use crate::llm::prompt::{build_prompt, GenerationRequest};
use crate::llm::{LlmClient, LlmResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPlan {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Backend that turns a generation request into lesson-plan text.
///
/// Implementors only provide the raw model call; `generate` owns prompt
/// building, the empty-response check and asterisk cleanup for every backend.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Model identifier recorded in run logs.
    fn model(&self) -> &str;

    /// Sends a finished prompt and returns the untouched model output.
    async fn complete(&self, prompt: &str) -> Result<LlmResponse, LessonError>;

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedPlan, LessonError> {
        let prompt = build_prompt(request);
        let response = self.complete(&prompt).await.map_err(|e| {
            error!(error = %e, model = %self.model(), "lesson plan generation failed");
            e
        })?;

        if response.text.trim().is_empty() {
            warn!(model = %self.model(), "backend returned no text");
            return Err(LessonError::EmptyResponse);
        }

        let text = clean_response(&response.text);
        info!(
            model = %self.model(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "generated lesson plan"
        );

        Ok(GeneratedPlan {
            text,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
        })
    }
}

pub struct GeminiGenerator {
    llm: Option<LlmClient>,
    model: String,
}

impl GeminiGenerator {
    /// A missing key is not an error here; it surfaces on the first
    /// `generate` call so every other command keeps working.
    pub fn new(api_key: Option<&str>, base_url: &str, model: String) -> Self {
        let llm = api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| LlmClient::new(key, base_url));
        Self { llm, model }
    }
}

#[async_trait]
impl PlanGenerator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<LlmResponse, LessonError> {
        let llm = self.llm.as_ref().ok_or(LessonError::Configuration)?;
        llm.complete(&self.model, prompt).await
    }
}

/// Strips stray asterisks from model output while keeping `**` bold pairs.
///
/// Per line: a lone `*` is dropped, a run of two or more becomes one `**`
/// marker, and if the line ends up with an odd number of markers the last
/// one is dropped so every kept marker has a partner.
pub fn clean_response(text: &str) -> String {
    text.split('\n')
        .map(clean_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut markers = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '*' {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&'*') {
            chars.next();
            run += 1;
        }
        if run >= 2 {
            markers.push(out.len());
            out.push_str("**");
        }
    }

    if markers.len() % 2 == 1 {
        if let Some(last) = markers.pop() {
            out.replace_range(last..last + 2, "");
        }
    }
    out
}
