use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A camera under consideration for one query.
///
/// Coordinates are optional so that a malformed row can be reported and
/// dropped by the engine instead of failing the whole request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Candidate {
  pub camera_id: String,
  pub latitude: Option<f64>,
  pub longitude: Option<f64>,
  /// Dissimilarity from the query, lower is better. Absent for unranked
  /// candidates.
  #[serde(default)]
  pub distance: Option<f64>,
}

impl Candidate {
  pub fn ranked(camera_id: impl Into<String>, latitude: f64, longitude: f64, distance: f64) -> Self {
    Self {
      camera_id: camera_id.into(),
      latitude: Some(latitude),
      longitude: Some(longitude),
      distance: Some(distance),
    }
  }

  pub fn unranked(camera_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
    Self {
      camera_id: camera_id.into(),
      latitude: Some(latitude),
      longitude: Some(longitude),
      distance: None,
    }
  }

  /// Both coordinates, or the first one that is missing or not finite.
  pub(crate) fn position(&self, index: usize) -> Result<(f64, f64), CandidateError> {
    let check = |value: Option<f64>, coordinate| {
      value
        .filter(|v| v.is_finite())
        .ok_or_else(|| CandidateError::MissingCoordinate {
          camera_id: self.camera_id.clone(),
          index,
          coordinate,
        })
    };
    Ok((
      check(self.latitude, Coordinate::Latitude)?,
      check(self.longitude, Coordinate::Longitude)?,
    ))
  }

  /// The distance, if it is a number the engine can rank with.
  pub(crate) fn usable_distance(&self) -> Option<f64> {
    self.distance.filter(|d| d.is_finite() && *d >= 0.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Coordinate {
  Latitude,
  Longitude,
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Latitude => f.write_str("latitude"),
      Self::Longitude => f.write_str("longitude"),
    }
  }
}

/// A candidate the engine could not place on the map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateError {
  #[error("candidate {camera_id} at position {index} has no valid {coordinate}")]
  MissingCoordinate {
    camera_id: String,
    index: usize,
    coordinate: Coordinate,
  },
}

/// One point of the heatmap layer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HeatmapPoint {
  pub latitude: f64,
  pub longitude: f64,
  /// `[0, 1]`, 1 is the strongest match. `null` when there is nothing to
  /// normalize against.
  pub intensity: Option<f64>,
}
