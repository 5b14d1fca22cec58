use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use camsight_shared::APP_ENV;
use serde::Serialize;
use serde_json::Value;

use crate::{
  EmbedError, EmbeddingProvider, ImageEmbeddingProvider, embed_shared::process_embedding,
};

/// Embeds queries by running a Roboflow workflow whose first output carries
/// an `embedding` array.
pub struct RoboflowEmbedder {
  http: reqwest::Client,
  workflow_url: String,
  api_key: String,
  placeholder_image_url: Option<String>,
  dim: usize,
}

#[derive(Serialize)]
struct WorkflowRequest<'a, I> {
  api_key: &'a str,
  inputs: I,
}

#[derive(Serialize)]
struct WorkflowInputs<'a> {
  query: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  image: Option<ImageInput<'a>>,
}

#[derive(Serialize)]
struct ImageWorkflowInputs<'a> {
  image: ImageInput<'a>,
}

#[derive(Serialize)]
struct ImageInput<'a> {
  #[serde(rename = "type")]
  kind: &'static str,
  value: &'a str,
}

impl RoboflowEmbedder {
  #[must_use]
  pub fn new(
    http: reqwest::Client,
    workflow_url: impl Into<String>,
    api_key: impl Into<String>,
    placeholder_image_url: Option<String>,
    dim: usize,
  ) -> Self {
    Self {
      http,
      workflow_url: workflow_url.into(),
      api_key: api_key.into(),
      placeholder_image_url,
      dim,
    }
  }

  pub fn from_env() -> Result<Self, EmbedError> {
    let workflow_url = APP_ENV
      .roboflow_workflow_url
      .clone()
      .ok_or(EmbedError::NotConfigured("ROBOFLOW_WORKFLOW_URL"))?;
    let api_key = APP_ENV
      .roboflow_api_key
      .clone()
      .ok_or(EmbedError::NotConfigured("ROBOFLOW_API_KEY"))?;

    Ok(Self::new(
      reqwest::Client::new(),
      workflow_url,
      api_key,
      APP_ENV.roboflow_placeholder_image_url.clone(),
      APP_ENV.embedding_dim,
    ))
  }
}

async fn post_workflow<I: Serialize + Sync>(
  http: &reqwest::Client,
  url: &str,
  request: &WorkflowRequest<'_, I>,
) -> Result<Value, EmbedError> {
  let response = http.post(url).json(request).send().await?;

  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "roboflow workflow request failed");
    return Err(EmbedError::Status {
      status: status.as_u16(),
      body,
    });
  }

  Ok(response.json().await?)
}

/// Pull `outputs[0].embedding` out of a workflow response.
pub(crate) fn parse_workflow_response(body: &Value) -> Result<Vec<f32>, EmbedError> {
  let first = body
    .get("outputs")
    .and_then(Value::as_array)
    .and_then(|outputs| outputs.first())
    .ok_or_else(|| EmbedError::InvalidResponse("missing or empty outputs array".to_owned()))?;

  let embedding = first
    .get("embedding")
    .and_then(Value::as_array)
    .ok_or_else(|| EmbedError::InvalidResponse("outputs[0].embedding is not an array".to_owned()))?;

  embedding
    .iter()
    .map(|v| {
      v.as_f64()
        .map(|f| f as f32)
        .ok_or_else(|| EmbedError::InvalidResponse(format!("non-numeric embedding value: {v}")))
    })
    .collect()
}

#[async_trait]
impl EmbeddingProvider for RoboflowEmbedder {
  async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbedError> {
    let request = WorkflowRequest {
      api_key: &self.api_key,
      inputs: WorkflowInputs {
        query: input,
        image: self.placeholder_image_url.as_deref().map(|value| ImageInput {
          kind: "url",
          value,
        }),
      },
    };

    let body = post_workflow(&self.http, &self.workflow_url, &request).await?;
    let embedding = parse_workflow_response(&body)?;
    process_embedding(embedding, self.dim)
  }

  fn dimensions(&self) -> usize {
    self.dim
  }
}

/// Embeds camera stills through the image branch of a Roboflow workflow.
/// The image travels inline as base64.
pub struct RoboflowImageEmbedder {
  http: reqwest::Client,
  workflow_url: String,
  api_key: String,
  dim: usize,
}

impl RoboflowImageEmbedder {
  #[must_use]
  pub fn new(
    http: reqwest::Client,
    workflow_url: impl Into<String>,
    api_key: impl Into<String>,
    dim: usize,
  ) -> Self {
    Self {
      http,
      workflow_url: workflow_url.into(),
      api_key: api_key.into(),
      dim,
    }
  }

  pub fn from_env() -> Result<Self, EmbedError> {
    let workflow_url = APP_ENV
      .roboflow_image_workflow_url
      .clone()
      .ok_or(EmbedError::NotConfigured("ROBOFLOW_IMAGE_WORKFLOW_URL"))?;
    let api_key = APP_ENV
      .roboflow_api_key
      .clone()
      .ok_or(EmbedError::NotConfigured("ROBOFLOW_API_KEY"))?;

    Ok(Self::new(
      reqwest::Client::new(),
      workflow_url,
      api_key,
      APP_ENV.embedding_dim,
    ))
  }
}

#[async_trait]
impl ImageEmbeddingProvider for RoboflowImageEmbedder {
  async fn embed_image(&self, image: &[u8]) -> Result<Vec<f32>, EmbedError> {
    let encoded = STANDARD.encode(image);
    let request = WorkflowRequest {
      api_key: &self.api_key,
      inputs: ImageWorkflowInputs {
        image: ImageInput {
          kind: "base64",
          value: &encoded,
        },
      },
    };

    let body = post_workflow(&self.http, &self.workflow_url, &request).await?;
    let embedding = parse_workflow_response(&body)?;
    process_embedding(embedding, self.dim)
  }

  fn dimensions(&self) -> usize {
    self.dim
  }
}
