use camsight_core::{CameraImages, CameraSearch};


#[derive(Clone)]
pub struct AppState {
  pub search: CameraSearch,
  pub images: CameraImages,
  pub http: reqwest::Client,
}

impl AppState {
  #[must_use]
  pub fn new(search: CameraSearch, images: CameraImages) -> Self {
    Self {
      search,
      images,
      http: reqwest::Client::new(),
    }
  }
}
