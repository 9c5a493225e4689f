mod error;
mod gemini;
mod prompt;

use async_trait::async_trait;

use crate::model::CopyInputs;

pub use error::GenerationError;
pub use gemini::GeminiClient;
pub use prompt::{build_prompt, HASHTAGS};

/// Shown instead of an empty caption when the backend answers with no text.
pub const EMPTY_RESULT_FALLBACK: &str = "Erro ao gerar conteúdo.";

/// The only failure text a user ever sees from the generation backend.
pub const FAILURE_MESSAGE: &str =
    "Falha na comunicação com a inteligência artificial. Tente novamente.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
        }
    }
}

#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate_caption(&self, inputs: &CopyInputs) -> Result<String, GenerationError>;
}

pub fn caption_or_fallback(text: Option<String>) -> String {
    match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => EMPTY_RESULT_FALLBACK.to_string(),
    }
}
