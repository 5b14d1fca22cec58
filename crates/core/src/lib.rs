mod camera_images;
pub use camera_images::{CameraImages, ImageUrlError};

mod candidate;
pub use candidate::{Candidate, CandidateError, Coordinate, HeatmapPoint};

mod engine;
pub use engine::{
  BestMatchPolicy, MatchEngine, MatchError, MatchMode, MatchResult, MatchWarning, ParsePolicyError,
};

mod provider;
pub use provider::{
  CameraSource, EmbeddingStore, SearchParams, SimilaritySearchProvider, StoreError,
};

mod search;
pub use search::{CameraSearch, SearchConfig, SearchError};

mod store;
pub use store::PgCameraStore;

pub mod import;
pub mod index;
