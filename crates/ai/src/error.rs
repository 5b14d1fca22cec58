use async_openai::error::OpenAIError;

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
  #[error("embedding provider is not configured: {0}")]
  NotConfigured(&'static str),

  #[error("openai request failed: {0}")]
  OpenAi(#[from] OpenAIError),

  #[error("http request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("embedding endpoint returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("invalid embedding response: {0}")]
  InvalidResponse(String),

  #[error("embedding dimension {actual} does not match expected {expected}")]
  Dimension { expected: usize, actual: usize },

  #[error("embedding contains non-finite values")]
  NonFinite,
}
