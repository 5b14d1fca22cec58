use async_openai::{Client, config::OpenAIConfig, types::embeddings::CreateEmbeddingRequestArgs};
use async_trait::async_trait;
use camsight_shared::APP_ENV;

use crate::{EmbedError, EmbeddingProvider, embed_shared::process_embedding};

/// Embeds queries through any OpenAI-compatible `/embeddings` endpoint.
///
/// The endpoint must serve a model whose text vectors live in the same space
/// as the indexed camera images (a CLIP text tower, typically).
pub struct OpenAiEmbedder {
  client: Client<OpenAIConfig>,
  model: String,
  dim: usize,
}

impl OpenAiEmbedder {
  #[must_use]
  pub fn new(config: OpenAIConfig, model: impl Into<String>, dim: usize) -> Self {
    Self {
      client: Client::with_config(config),
      model: model.into(),
      dim,
    }
  }

  pub fn from_env() -> Result<Self, EmbedError> {
    let api_key = APP_ENV
      .openai_api_key
      .as_deref()
      .ok_or(EmbedError::NotConfigured("OPENAI_API_KEY"))?;
    let model = APP_ENV
      .openai_embedding_model
      .as_deref()
      .ok_or(EmbedError::NotConfigured("OPENAI_EMBEDDING_MODEL"))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = APP_ENV.openai_base_url.as_deref() {
      config = config.with_api_base(base);
    }

    Ok(Self::new(config, model, APP_ENV.embedding_dim))
  }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
  async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbedError> {
    let request = CreateEmbeddingRequestArgs::default()
      .model(&self.model)
      .input(input)
      .build()?;

    let embedding = self
      .client
      .embeddings()
      .create(request)
      .await
      .map(|r| r.data.into_iter())?
      .map(|e| e.embedding)
      .next_back()
      .ok_or_else(|| EmbedError::InvalidResponse("empty embedding data".to_owned()))?;

    process_embedding(embedding, self.dim)
  }

  fn dimensions(&self) -> usize {
    self.dim
  }
}
