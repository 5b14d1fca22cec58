use std::env;
use std::str::FromStr;
use std::sync::LazyLock;

/// Which text embedding backend the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
  /// Any OpenAI-compatible `/embeddings` endpoint.
  OpenAi,
  /// A Roboflow workflow that returns `outputs[0].embedding`.
  Roboflow,
}

impl FromStr for EmbeddingProviderKind {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "openai" => Ok(Self::OpenAi),
      "roboflow" => Ok(Self::Roboflow),
      other => Err(anyhow::anyhow!("unknown embedding provider: {other}")),
    }
  }
}

pub struct AppEnv {
  pub database_url: String,
  pub bind_addr: String,

  pub embedding_provider: EmbeddingProviderKind,
  pub embedding_dim: usize,
  pub openai_base_url: Option<String>,
  pub openai_api_key: Option<String>,
  pub openai_embedding_model: Option<String>,
  pub roboflow_api_key: Option<String>,
  pub roboflow_workflow_url: Option<String>,
  /// Some workflows declare an image input even when only the text branch
  /// is used; this URL fills it.
  pub roboflow_placeholder_image_url: Option<String>,
  /// Workflow that embeds camera stills, used by the indexer.
  pub roboflow_image_workflow_url: Option<String>,

  /// Maximum rows requested from the similarity search.
  pub match_count: u64,
  /// Minimum cosine similarity (`1 - distance`) a row needs to be returned.
  pub match_threshold: f64,
  /// Size of the unranked sample used when ranked search comes back empty.
  pub fallback_limit: u64,
  /// Size of the sample served by the random results endpoint.
  pub random_limit: u64,
  /// `input_order` or `min_distance`.
  pub best_match_policy: String,

  /// Upstream still-image URL, `{camera_id}` is substituted.
  pub camera_image_url_template: String,
  /// Pause between two cameras in the indexing loop.
  pub index_interval_secs: u64,
}

/// `default` when unset; a set but malformed value is an error rather than
/// being silently replaced.
fn parse_var<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, String> {
  match raw {
    None => Ok(default),
    Some(raw) => raw
      .trim()
      .parse()
      .map_err(|_| format!("{key} has an invalid value: {raw:?}")),
  }
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
  parse_var(key, env::var(key).ok(), default).unwrap_or_else(|msg| panic!("{msg}"))
}

impl AppEnv {
  fn new() -> Self {
    let embedding_provider = env::var("EMBEDDING_PROVIDER")
      .map(|v| {
        v.parse()
          .expect("EMBEDDING_PROVIDER must be `openai` or `roboflow`")
      })
      .unwrap_or(EmbeddingProviderKind::OpenAi);

    Self {
      database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
      bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned()),
      embedding_provider,
      embedding_dim: var_or("EMBEDDING_DIM", 512),
      openai_base_url: env::var("OPENAI_BASE_URL").ok(),
      openai_api_key: env::var("OPENAI_API_KEY").ok(),
      openai_embedding_model: env::var("OPENAI_EMBEDDING_MODEL").ok(),
      roboflow_api_key: env::var("ROBOFLOW_API_KEY").ok(),
      roboflow_workflow_url: env::var("ROBOFLOW_WORKFLOW_URL").ok(),
      roboflow_placeholder_image_url: env::var("ROBOFLOW_PLACEHOLDER_IMAGE_URL").ok(),
      roboflow_image_workflow_url: env::var("ROBOFLOW_IMAGE_WORKFLOW_URL").ok(),
      match_count: var_or("MATCH_COUNT", 25),
      match_threshold: var_or("MATCH_THRESHOLD", 0.0),
      fallback_limit: var_or("FALLBACK_LIMIT", 25),
      random_limit: var_or("RANDOM_LIMIT", 50),
      best_match_policy: env::var("BEST_MATCH_POLICY").unwrap_or_else(|_| "input_order".to_owned()),
      camera_image_url_template: env::var("CAMERA_IMAGE_URL_TEMPLATE").unwrap_or_else(|_| {
        "https://webcams.nyctmc.org/api/cameras/{camera_id}/image".to_owned()
      }),
      index_interval_secs: var_or("INDEX_INTERVAL_SECS", 2),
    }
  }
}

pub static APP_ENV: LazyLock<AppEnv> = LazyLock::new(AppEnv::new);
