use std::sync::Arc;

use camsight_ai::{EmbedError, EmbeddingProvider};
use camsight_shared::APP_ENV;
use tracing::{debug, info, warn};

use crate::{
  CameraSource, Candidate, MatchEngine, MatchError, MatchResult, SearchParams,
  SimilaritySearchProvider, StoreError,
};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
  #[error("query cannot be empty")]
  EmptyQuery,

  #[error("embedding failed: {0}")]
  Embedding(#[from] EmbedError),

  #[error("similarity search failed: {0}")]
  SimilaritySearch(#[source] StoreError),

  #[error("loading fallback cameras failed: {0}")]
  CameraSource(#[source] StoreError),

  #[error("no cameras found")]
  NoCandidates,
}

impl From<MatchError> for SearchError {
  fn from(err: MatchError) -> Self {
    match err {
      MatchError::NoCandidates => Self::NoCandidates,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
  pub params: SearchParams,
  /// Cameras sampled when the ranked search returns nothing usable.
  pub fallback_limit: u64,
  /// Cameras sampled by [`CameraSearch::random`].
  pub random_limit: u64,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      params: SearchParams::default(),
      fallback_limit: 25,
      random_limit: 50,
    }
  }
}

impl SearchConfig {
  #[must_use]
  pub fn from_env() -> Self {
    Self {
      params: SearchParams {
        match_count: APP_ENV.match_count,
        match_threshold: APP_ENV.match_threshold,
      },
      fallback_limit: APP_ENV.fallback_limit,
      random_limit: APP_ENV.random_limit,
    }
  }
}

/// Query → embedding → similarity search → [`MatchEngine`].
///
/// Collaborator failures surface as their own [`SearchError`] variants. Only
/// an empty (or entirely unusable) ranked result switches to fallback mode.
#[derive(Clone)]
pub struct CameraSearch {
  embedder: Arc<dyn EmbeddingProvider>,
  index: Arc<dyn SimilaritySearchProvider>,
  cameras: Arc<dyn CameraSource>,
  engine: MatchEngine,
  config: SearchConfig,
}

impl CameraSearch {
  pub fn new(
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SimilaritySearchProvider>,
    cameras: Arc<dyn CameraSource>,
  ) -> Self {
    Self {
      embedder,
      index,
      cameras,
      engine: MatchEngine::new(),
      config: SearchConfig::default(),
    }
  }

  #[must_use]
  pub const fn with_engine(mut self, engine: MatchEngine) -> Self {
    self.engine = engine;
    self
  }

  #[must_use]
  pub const fn with_config(mut self, config: SearchConfig) -> Self {
    self.config = config;
    self
  }

  pub async fn search(&self, query: &str) -> Result<MatchResult, SearchError> {
    let query = query.trim();
    if query.is_empty() {
      return Err(SearchError::EmptyQuery);
    }

    let embedding = self.embedder.embed(query).await?;
    debug!(dim = embedding.len(), "query embedded");

    let rows = self
      .index
      .search(&embedding, self.config.params)
      .await
      .map_err(SearchError::SimilaritySearch)?;

    if rows.is_empty() {
      warn!(query, "similarity search returned no rows, using fallback cameras");
      return self.fallback(self.config.fallback_limit).await;
    }

    let (nearest, farthest) = rows
      .iter()
      .filter_map(Candidate::usable_distance)
      .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
        (lo.min(d), hi.max(d))
      });
    debug!(rows = rows.len(), nearest, farthest, "similarity search distances");

    match self.engine.normalize(&rows) {
      Ok(result) => {
        info!(
          query,
          candidates = rows.len(),
          points = result.heatmap.len(),
          best_match = %result.best_match,
          degenerate = result.is_degenerate(),
          "ranked match"
        );
        Ok(result)
      }
      Err(MatchError::NoCandidates) => {
        warn!(
          query,
          candidates = rows.len(),
          "no candidate had a usable distance, using fallback cameras"
        );
        self.fallback(self.config.fallback_limit).await
      }
    }
  }

  /// Explicit fallback-mode result over a random sample, no query involved.
  pub async fn random(&self) -> Result<MatchResult, SearchError> {
    self.fallback(self.config.random_limit).await
  }

  async fn fallback(&self, limit: u64) -> Result<MatchResult, SearchError> {
    let cameras = self
      .cameras
      .sample(limit)
      .await
      .map_err(SearchError::CameraSource)?;

    let result = self.engine.fallback(&cameras)?;
    info!(
      candidates = cameras.len(),
      points = result.heatmap.len(),
      best_match = %result.best_match,
      "fallback match"
    );
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use async_trait::async_trait;

  use super::*;
  use crate::MatchMode;

  struct FakeEmbedder {
    fail: bool,
  }

  #[async_trait]
  impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbedError> {
      if self.fail {
        return Err(EmbedError::Status {
          status: 503,
          body: "model loading".to_owned(),
        });
      }
      Ok(vec![input.len() as f32, 1.0])
    }

    fn dimensions(&self) -> usize {
      2
    }
  }

  struct FakeIndex {
    rows: Result<Vec<Candidate>, String>,
    seen: Mutex<Option<SearchParams>>,
  }

  impl FakeIndex {
    fn returning(rows: Vec<Candidate>) -> Self {
      Self {
        rows: Ok(rows),
        seen: Mutex::new(None),
      }
    }

    fn failing() -> Self {
      Self {
        rows: Err("connection refused".to_owned()),
        seen: Mutex::new(None),
      }
    }
  }

  #[async_trait]
  impl SimilaritySearchProvider for FakeIndex {
    async fn search(
      &self,
      _embedding: &[f32],
      params: SearchParams,
    ) -> Result<Vec<Candidate>, StoreError> {
      *self.seen.lock().unwrap() = Some(params);
      self.rows.clone().map_err(StoreError::Unavailable)
    }
  }

  struct FakeCameras {
    cameras: Vec<Candidate>,
  }

  #[async_trait]
  impl CameraSource for FakeCameras {
    async fn sample(&self, limit: u64) -> Result<Vec<Candidate>, StoreError> {
      Ok(
        self
          .cameras
          .iter()
          .take(usize::try_from(limit).unwrap())
          .cloned()
          .collect(),
      )
    }
  }

  fn fallback_cameras() -> Vec<Candidate> {
    vec![
      Candidate::unranked("X", 40.70, -73.99),
      Candidate::unranked("Y", 40.71, -73.98),
      Candidate::unranked("Z", 40.72, -73.97),
    ]
  }

  fn search_with(index: FakeIndex, cameras: Vec<Candidate>) -> (CameraSearch, Arc<FakeIndex>) {
    let index = Arc::new(index);
    let search = CameraSearch::new(
      Arc::new(FakeEmbedder { fail: false }),
      index.clone(),
      Arc::new(FakeCameras { cameras }),
    );
    (search, index)
  }

  #[tokio::test]
  async fn ranked_rows_are_normalized() {
    let rows = vec![
      Candidate::ranked("A", 40.70, -73.99, 2.0),
      Candidate::ranked("B", 40.71, -73.98, 4.0),
      Candidate::ranked("C", 40.72, -73.97, 6.0),
    ];
    let (search, index) = search_with(FakeIndex::returning(rows), fallback_cameras());

    let result = search.search("yellow taxi").await.unwrap();

    assert_eq!(result.mode, MatchMode::Ranked);
    assert_eq!(result.best_match, "A");
    let values = result.heatmap.iter().map(|p| p.intensity).collect::<Vec<_>>();
    assert_eq!(values, vec![Some(1.0), Some(0.5), Some(0.0)]);
    assert_eq!(*index.seen.lock().unwrap(), Some(SearchParams::default()));
  }

  #[tokio::test]
  async fn empty_ranked_result_falls_back() {
    let (search, _) = search_with(FakeIndex::returning(vec![]), fallback_cameras());

    let result = search.search("snow").await.unwrap();

    assert_eq!(result.mode, MatchMode::Fallback);
    assert_eq!(result.heatmap.len(), 3);
    assert!(["X", "Y", "Z"].contains(&result.best_match.as_str()));
  }

  #[tokio::test]
  async fn unusable_distances_fall_back() {
    let mut row = Candidate::ranked("A", 40.7, -73.9, 0.0);
    row.distance = Some(f64::NAN);
    let (search, _) = search_with(FakeIndex::returning(vec![row]), fallback_cameras());

    let result = search.search("fog").await.unwrap();
    assert_eq!(result.mode, MatchMode::Fallback);
  }

  #[tokio::test]
  async fn both_sources_empty_is_no_candidates() {
    let (search, _) = search_with(FakeIndex::returning(vec![]), vec![]);

    let err = search.search("bridge").await.unwrap_err();
    assert!(matches!(err, SearchError::NoCandidates));
  }

  #[tokio::test]
  async fn blank_query_is_rejected() {
    let (search, _) = search_with(FakeIndex::returning(vec![]), fallback_cameras());
    assert!(matches!(
      search.search("   ").await,
      Err(SearchError::EmptyQuery)
    ));
  }

  #[tokio::test]
  async fn embedding_failure_is_not_fallback() {
    let search = CameraSearch::new(
      Arc::new(FakeEmbedder { fail: true }),
      Arc::new(FakeIndex::returning(vec![])),
      Arc::new(FakeCameras {
        cameras: fallback_cameras(),
      }),
    );

    assert!(matches!(
      search.search("bus").await,
      Err(SearchError::Embedding(_))
    ));
  }

  #[tokio::test]
  async fn search_failure_is_not_fallback() {
    let (search, _) = search_with(FakeIndex::failing(), fallback_cameras());

    assert!(matches!(
      search.search("bus").await,
      Err(SearchError::SimilaritySearch(_))
    ));
  }

  #[tokio::test]
  async fn random_uses_its_own_limit() {
    let (search, _) = search_with(FakeIndex::returning(vec![]), fallback_cameras());
    let search = search.with_config(SearchConfig {
      random_limit: 2,
      ..SearchConfig::default()
    });

    let result = search.random().await.unwrap();
    assert_eq!(result.mode, MatchMode::Fallback);
    assert_eq!(result.heatmap.len(), 2);
  }
}
