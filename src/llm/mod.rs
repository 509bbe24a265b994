pub mod client;
pub mod generator;
pub mod prompt;

pub use client::{LlmClient, LlmResponse};
pub use generator::{GeminiGenerator, GeneratedPlan, PlanGenerator};
pub use prompt::{build_prompt, GenerationRequest, DEFAULT_DURATION};
