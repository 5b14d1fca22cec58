use reqwest::Url;

const ID_PLACEHOLDER: &str = "{camera_id}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageUrlError {
  #[error("camera image url template must contain {ID_PLACEHOLDER}: {0}")]
  Template(String),

  #[error("invalid camera id: {0}")]
  CameraId(String),

  #[error("invalid image url: {0}")]
  Url(String),

  #[error("only images from {0} can be proxied")]
  ForeignHost(String),
}

/// Where live camera stills come from.
#[derive(Clone, Debug)]
pub struct CameraImages {
  template: String,
  host: String,
}

impl CameraImages {
  /// `template` is an absolute URL containing `{camera_id}`.
  pub fn new(template: impl Into<String>) -> Result<Self, ImageUrlError> {
    let template = template.into();
    if !template.contains(ID_PLACEHOLDER) {
      return Err(ImageUrlError::Template(template));
    }
    let host = Url::parse(&template.replace(ID_PLACEHOLDER, "x"))
      .map_err(|err| ImageUrlError::Url(err.to_string()))?
      .host_str()
      .ok_or_else(|| ImageUrlError::Template(template.clone()))?
      .to_owned();

    Ok(Self { template, host })
  }

  /// Still-image URL for a camera with a `t` freshness token so no cache
  /// along the way serves an old frame.
  pub fn url_for(&self, camera_id: &str, epoch_secs: i64) -> Result<Url, ImageUrlError> {
    let valid = !camera_id.is_empty()
      && camera_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
      return Err(ImageUrlError::CameraId(camera_id.to_owned()));
    }

    let mut url = Url::parse(&self.template.replace(ID_PLACEHOLDER, camera_id))
      .map_err(|err| ImageUrlError::Url(err.to_string()))?;
    url
      .query_pairs_mut()
      .append_pair("t", &epoch_secs.to_string());
    Ok(url)
  }

  /// Only the camera host may be proxied.
  pub fn check_proxy_target(&self, raw: &str) -> Result<Url, ImageUrlError> {
    let url = Url::parse(raw).map_err(|err| ImageUrlError::Url(err.to_string()))?;
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    if !scheme_ok || url.host_str() != Some(self.host.as_str()) {
      return Err(ImageUrlError::ForeignHost(self.host.clone()));
    }
    Ok(url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TEMPLATE: &str = "https://webcams.nyctmc.org/api/cameras/{camera_id}/image";

  #[test]
  fn builds_url_with_freshness_token() {
    let images = CameraImages::new(TEMPLATE).unwrap();
    let url = images
      .url_for("0bcfbc92-d455-4f62-846a-32afbefa3b4b", 1_700_000_000)
      .unwrap();
    assert_eq!(
      url.as_str(),
      "https://webcams.nyctmc.org/api/cameras/0bcfbc92-d455-4f62-846a-32afbefa3b4b/image?t=1700000000"
    );
  }

  #[test]
  fn rejects_path_tricks_in_camera_id() {
    let images = CameraImages::new(TEMPLATE).unwrap();
    for id in ["", "../admin", "a/b", "x?y=1"] {
      assert!(
        matches!(images.url_for(id, 0), Err(ImageUrlError::CameraId(_))),
        "{id}"
      );
    }
  }

  #[test]
  fn template_needs_placeholder() {
    assert!(matches!(
      CameraImages::new("https://example.com/image.jpg"),
      Err(ImageUrlError::Template(_))
    ));
  }

  #[test]
  fn proxy_only_allows_camera_host() {
    let images = CameraImages::new(TEMPLATE).unwrap();
    assert!(
      images
        .check_proxy_target("https://webcams.nyctmc.org/api/cameras/abc/image?t=1")
        .is_ok()
    );
    for raw in [
      "http://169.254.169.254/latest/meta-data",
      "file:///etc/passwd",
      "https://webcams.nyctmc.org.evil.test/x",
    ] {
      assert!(
        matches!(
          images.check_proxy_target(raw),
          Err(ImageUrlError::ForeignHost(_))
        ),
        "{raw}"
      );
    }
    assert!(matches!(
      images.check_proxy_target("not a url"),
      Err(ImageUrlError::Url(_))
    ));
  }
}
