use std::sync::Arc;

use camsight_shared::{APP_ENV, EmbeddingProviderKind};

mod embed_shared;
pub use embed_shared::process_embedding;

mod error;
pub use error::EmbedError;

mod openai;
pub use openai::OpenAiEmbedder;

mod provider;
pub use provider::{EmbeddingProvider, ImageEmbeddingProvider};

mod roboflow;
pub use roboflow::{RoboflowEmbedder, RoboflowImageEmbedder};

/// Build the embedding provider selected by `EMBEDDING_PROVIDER`.
pub fn embedder_from_env() -> Result<Arc<dyn EmbeddingProvider>, EmbedError> {
  let provider: Arc<dyn EmbeddingProvider> = match APP_ENV.embedding_provider {
    EmbeddingProviderKind::OpenAi => Arc::new(OpenAiEmbedder::from_env()?),
    EmbeddingProviderKind::Roboflow => Arc::new(RoboflowEmbedder::from_env()?),
  };
  Ok(provider)
}
